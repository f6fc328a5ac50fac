//! Serde schema of a module manifest and its conversion into a contribution.

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use lattice_model::{BaseRef, ClassifierDeclaration, Coordinate, ModuleContribution, SemanticType};
use serde::Deserialize;

use crate::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
	pub module: String,
	/// Elements per dimension, contributed in the order written.
	#[serde(default)]
	pub dimensions: IndexMap<String, Vec<ElementEntry>>,
	#[serde(default, rename = "classifier")]
	pub classifiers: Vec<ClassifierEntry>,
}

/// A dimension element, either bare or refining a parent element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ElementEntry {
	Name(String),
	Refined(RefinedElement),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefinedElement {
	pub name: String,
	pub parent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClassifierEntry {
	pub name: String,
	#[serde(default)]
	pub at: BTreeMap<String, String>,
	#[serde(default, rename = "override")]
	pub is_override: bool,
	pub base: Option<String>,
	pub base_at: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub members: Vec<MemberEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberEntry {
	pub name: String,
	/// `kind` or `kind(representation)`.
	#[serde(rename = "type")]
	pub ty: String,
}

impl Manifest {
	/// Parses a manifest; `origin` only labels errors.
	pub fn parse(input: &str, origin: &Path) -> Result<Self, ManifestError> {
		toml::from_str(input).map_err(|source| ManifestError::Parse {
			path: origin.to_path_buf(),
			source,
		})
	}

	pub fn into_contribution(self, origin: &Path) -> Result<ModuleContribution, ManifestError> {
		let mut contribution = ModuleContribution::new(self.module);
		for (dimension, elements) in self.dimensions {
			for entry in elements {
				contribution = match entry {
					ElementEntry::Name(name) => contribution.element(dimension.as_str(), name),
					ElementEntry::Refined(RefinedElement { name, parent }) => contribution.element_under(dimension.as_str(), name, parent),
				};
			}
		}
		for entry in self.classifiers {
			contribution = contribution.declare(entry.into_declaration(origin)?);
		}
		Ok(contribution)
	}
}

impl ClassifierEntry {
	fn into_declaration(self, origin: &Path) -> Result<ClassifierDeclaration, ManifestError> {
		let invalid = |reason: String| ManifestError::Invalid {
			path: origin.to_path_buf(),
			classifier: self.name.clone(),
			reason,
		};

		let mut decl = ClassifierDeclaration::new(self.name.as_str(), self.at.iter().map(|(d, e)| (d.as_str(), e.as_str())).collect());
		for member in &self.members {
			let ty: SemanticType = member
				.ty
				.parse()
				.map_err(|err| invalid(format!("member {:?}: {err}", member.name)))?;
			decl = decl.member(member.name.as_str(), ty);
		}

		let pinned = self.base_at.as_ref().map(|at| at.iter().map(|(d, e)| (d.as_str(), e.as_str())).collect::<Coordinate>());
		let base = match (&self.base, pinned) {
			(Some(name), pinned) => Some(BaseRef {
				name: name.as_str().into(),
				coordinate: pinned,
			}),
			(None, Some(pinned)) if self.is_override => Some(BaseRef::pinned(self.name.as_str(), pinned)),
			(None, Some(_)) => return Err(invalid("`base-at` needs `base` or `override = true`".to_string())),
			(None, None) => None,
		};
		if let Some(base) = base {
			decl = decl.based_on(base);
		}
		if self.is_override {
			decl = decl.overriding();
		}
		Ok(decl)
	}
}
