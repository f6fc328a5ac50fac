//! Raw classifier declarations as contributed by modules.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Identifies the module a contribution came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	/// Placeholder owner for declarations built outside a [`ModuleContribution`].
	pub fn anonymous() -> Self {
		Self(Arc::from("<anonymous>"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ModuleId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ModuleId {
	fn from(id: String) -> Self {
		Self::new(id)
	}
}

impl fmt::Display for ModuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Semantic type of a member: a kind plus an optional representation detail.
///
/// Two types are compatible when their kinds match; representations may differ
/// (e.g. `decimal(18,2)` and `decimal(10,4)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticType {
	kind: Arc<str>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	representation: Option<Arc<str>>,
}

impl SemanticType {
	pub fn new(kind: impl Into<Arc<str>>) -> Self {
		Self {
			kind: kind.into(),
			representation: None,
		}
	}

	pub fn with_representation(mut self, representation: impl Into<Arc<str>>) -> Self {
		self.representation = Some(representation.into());
		self
	}

	pub fn kind(&self) -> &str {
		&self.kind
	}

	pub fn representation(&self) -> Option<&str> {
		self.representation.as_deref()
	}

	pub fn is_compatible_with(&self, other: &SemanticType) -> bool {
		self.kind == other.kind
	}
}

impl fmt::Display for SemanticType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.representation {
			Some(repr) => write!(f, "{}({repr})", self.kind),
			None => f.write_str(&self.kind),
		}
	}
}

/// Error parsing a [`SemanticType`] from `kind` or `kind(representation)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid semantic type {input:?}: {reason}")]
pub struct ParseSemanticTypeError {
	pub input: String,
	pub reason: &'static str,
}

impl FromStr for SemanticType {
	type Err = ParseSemanticTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = |reason| ParseSemanticTypeError {
			input: s.to_string(),
			reason,
		};
		let s = s.trim();
		let (kind, representation) = match s.split_once('(') {
			Some((kind, rest)) => {
				let repr = rest.strip_suffix(')').ok_or_else(|| err("unterminated representation"))?;
				if repr.trim().is_empty() {
					return Err(err("empty representation"));
				}
				(kind.trim(), Some(repr.trim()))
			}
			None => (s, None),
		};
		if kind.is_empty() {
			return Err(err("empty kind"));
		}
		if kind.contains(|c: char| c.is_whitespace() || c == ')') {
			return Err(err("kind must be a single identifier"));
		}
		let ty = SemanticType::new(kind);
		Ok(match representation {
			Some(repr) => ty.with_representation(repr),
			None => ty,
		})
	}
}

/// A named member of a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
	pub name: Arc<str>,
	#[serde(rename = "type")]
	pub ty: SemanticType,
}

impl MemberDescriptor {
	pub fn new(name: impl Into<Arc<str>>, ty: SemanticType) -> Self {
		Self { name: name.into(), ty }
	}
}

/// Reference from a declaration to its base classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRef {
	pub name: Arc<str>,
	/// Pins the base to exactly this coordinate instead of the most specific ancestor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub coordinate: Option<Coordinate>,
}

impl BaseRef {
	pub fn named(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			coordinate: None,
		}
	}

	pub fn pinned(name: impl Into<Arc<str>>, coordinate: Coordinate) -> Self {
		Self {
			name: name.into(),
			coordinate: Some(coordinate),
		}
	}
}

/// Unique identity of a declaration: qualified name plus coordinate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationKey {
	pub name: Arc<str>,
	pub coordinate: Coordinate,
}

impl DeclarationKey {
	pub fn new(name: impl Into<Arc<str>>, coordinate: Coordinate) -> Self {
		Self {
			name: name.into(),
			coordinate,
		}
	}
}

impl fmt::Display for DeclarationKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.name, self.coordinate)
	}
}

/// A classifier as contributed by one module at one coordinate.
///
/// Write-once: the engine never mutates a declaration after it is indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierDeclaration {
	pub name: Arc<str>,
	pub coordinate: Coordinate,
	pub members: Vec<MemberDescriptor>,
	pub base: Option<BaseRef>,
	pub is_override: bool,
	pub module: ModuleId,
}

impl ClassifierDeclaration {
	pub fn new(name: impl Into<Arc<str>>, coordinate: Coordinate) -> Self {
		Self {
			name: name.into(),
			coordinate,
			members: Vec::new(),
			base: None,
			is_override: false,
			module: ModuleId::anonymous(),
		}
	}

	pub fn member(mut self, name: impl Into<Arc<str>>, ty: SemanticType) -> Self {
		self.members.push(MemberDescriptor::new(name, ty));
		self
	}

	pub fn based_on(mut self, base: BaseRef) -> Self {
		self.base = Some(base);
		self
	}

	/// Marks the declaration as an override. Without an explicit base, the
	/// override targets its own qualified name.
	pub fn overriding(mut self) -> Self {
		self.is_override = true;
		self
	}

	pub fn from_module(mut self, module: ModuleId) -> Self {
		self.module = module;
		self
	}

	pub fn key(&self) -> DeclarationKey {
		DeclarationKey::new(self.name.clone(), self.coordinate.clone())
	}

	/// Qualified name (and optional pinned coordinate) this declaration inherits from.
	pub fn base_target(&self) -> Option<(&Arc<str>, Option<&Coordinate>)> {
		match &self.base {
			Some(base) => Some((&base.name, base.coordinate.as_ref())),
			None if self.is_override => Some((&self.name, None)),
			None => None,
		}
	}
}

/// One dimension element contributed by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementContribution {
	pub dimension: Arc<str>,
	pub element: Arc<str>,
	/// Element of the same dimension that this one refines.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent: Option<Arc<str>>,
}

/// Everything one loaded module contributes: dimension elements and declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleContribution {
	pub module: ModuleId,
	pub elements: Vec<ElementContribution>,
	pub declarations: Vec<ClassifierDeclaration>,
}

impl ModuleContribution {
	pub fn new(module: impl Into<ModuleId>) -> Self {
		Self {
			module: module.into(),
			elements: Vec::new(),
			declarations: Vec::new(),
		}
	}

	/// Contributes a flat element. A flat element refines only itself, so a
	/// declaration at it never inherits from one at a broader element. Use
	/// [`ModuleContribution::element_under`] when it should.
	pub fn element(mut self, dimension: impl Into<Arc<str>>, element: impl Into<Arc<str>>) -> Self {
		self.elements.push(ElementContribution {
			dimension: dimension.into(),
			element: element.into(),
			parent: None,
		});
		self
	}

	/// Adds an element that refines `parent` within the same dimension.
	pub fn element_under(mut self, dimension: impl Into<Arc<str>>, element: impl Into<Arc<str>>, parent: impl Into<Arc<str>>) -> Self {
		self.elements.push(ElementContribution {
			dimension: dimension.into(),
			element: element.into(),
			parent: Some(parent.into()),
		});
		self
	}

	/// Adds a declaration, stamping it with this contribution's module.
	pub fn declare(mut self, declaration: ClassifierDeclaration) -> Self {
		self.declarations.push(declaration.from_module(self.module.clone()));
		self
	}
}
