use std::fmt;
use std::sync::Arc;

use crate::coordinate::Coordinate;
use crate::declaration::{DeclarationKey, ModuleId, SemanticType};
use crate::diagnostic::{Diagnostic, DiagnosticKind};

/// Why a base reference failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
	/// No declaration of the base name exists at the same or an ancestor coordinate.
	NoCandidate,
	/// The pinned base coordinate has no declaration of the base name.
	MissingPinned(Coordinate),
	/// The pinned base coordinate is not the same as or an ancestor of the declaration's.
	NotAncestor(Coordinate),
}

impl fmt::Display for UnresolvedReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoCandidate => f.write_str("no declaration at the same or an ancestor coordinate"),
			Self::MissingPinned(at) => write!(f, "nothing declared at pinned coordinate {at}"),
			Self::NotAncestor(at) => write!(f, "pinned coordinate {at} is not an ancestor"),
		}
	}
}

/// Which part of a coordinate was not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndeclaredPart {
	Dimension,
	Element,
}

/// Why an element's parent is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentProblem {
	/// The parent is not an element of the same dimension.
	Unregistered,
	/// Following parents leads back to the element.
	Cycle,
}

/// Build-time errors, one variant per structural or resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
	#[error("element {element:?} of dimension {dimension:?} from module {module} is already owned by module {owner}")]
	DuplicateElement {
		dimension: Arc<str>,
		element: Arc<str>,
		owner: ModuleId,
		module: ModuleId,
	},

	#[error("element {element:?} of dimension {dimension:?} refines {parent:?}, {}", parent_problem(.problem))]
	InvalidElementParent {
		dimension: Arc<str>,
		element: Arc<str>,
		parent: Arc<str>,
		problem: ParentProblem,
		module: ModuleId,
	},

	#[error("classifier {key} from module {module} is already declared by module {existing}")]
	DuplicateDeclaration {
		key: DeclarationKey,
		existing: ModuleId,
		module: ModuleId,
	},

	#[error("classifier {key}: base {base:?} does not resolve: {reason}")]
	UnresolvedBaseReference {
		key: DeclarationKey,
		base: Arc<str>,
		reason: UnresolvedReason,
		module: ModuleId,
	},

	#[error("override cycle: {}", join(.path, " -> "))]
	CyclicOverride {
		key: DeclarationKey,
		/// Cycle in base order, closed by repeating its first key.
		path: Vec<DeclarationKey>,
		module: ModuleId,
	},

	#[error("classifier {key}: base {base:?} is ambiguous between {}", join(.candidates, ", "))]
	AmbiguousBase {
		key: DeclarationKey,
		base: Arc<str>,
		candidates: Vec<Coordinate>,
		module: ModuleId,
	},

	#[error("classifier {key}: member {member:?} of type {incoming} conflicts with {existing} from {existing_owner}")]
	ConflictingMember {
		key: DeclarationKey,
		member: Arc<str>,
		existing: SemanticType,
		incoming: SemanticType,
		existing_owner: DeclarationKey,
		module: ModuleId,
	},

	#[error("classifier {key}: {} {:?} is not registered", part_label(.part), undeclared_label(.part, .dimension, .element))]
	UndeclaredCoordinate {
		key: DeclarationKey,
		dimension: Arc<str>,
		element: Arc<str>,
		part: UndeclaredPart,
		module: ModuleId,
	},
}

impl ModelError {
	pub fn kind(&self) -> DiagnosticKind {
		match self {
			Self::DuplicateElement { .. } => DiagnosticKind::DuplicateElement,
			Self::InvalidElementParent { .. } => DiagnosticKind::InvalidElementParent,
			Self::DuplicateDeclaration { .. } => DiagnosticKind::DuplicateDeclaration,
			Self::UnresolvedBaseReference { .. } => DiagnosticKind::UnresolvedBaseReference,
			Self::CyclicOverride { .. } => DiagnosticKind::CyclicOverride,
			Self::AmbiguousBase { .. } => DiagnosticKind::AmbiguousBase,
			Self::ConflictingMember { .. } => DiagnosticKind::ConflictingMember,
			Self::UndeclaredCoordinate { .. } => DiagnosticKind::UndeclaredCoordinate,
		}
	}

	/// Declaration the error is scoped to, if any.
	pub fn key(&self) -> Option<&DeclarationKey> {
		match self {
			Self::DuplicateElement { .. } | Self::InvalidElementParent { .. } => None,
			Self::DuplicateDeclaration { key, .. }
			| Self::UnresolvedBaseReference { key, .. }
			| Self::CyclicOverride { key, .. }
			| Self::AmbiguousBase { key, .. }
			| Self::ConflictingMember { key, .. }
			| Self::UndeclaredCoordinate { key, .. } => Some(key),
		}
	}

	/// Module whose contribution triggered the error.
	pub fn module(&self) -> &ModuleId {
		match self {
			Self::DuplicateElement { module, .. }
			| Self::InvalidElementParent { module, .. }
			| Self::DuplicateDeclaration { module, .. }
			| Self::UnresolvedBaseReference { module, .. }
			| Self::CyclicOverride { module, .. }
			| Self::AmbiguousBase { module, .. }
			| Self::ConflictingMember { module, .. }
			| Self::UndeclaredCoordinate { module, .. } => module,
		}
	}

	fn dimension(&self) -> Option<&Arc<str>> {
		match self {
			Self::DuplicateElement { dimension, .. }
			| Self::InvalidElementParent { dimension, .. }
			| Self::UndeclaredCoordinate { dimension, .. } => Some(dimension),
			_ => None,
		}
	}
}

impl From<ModelError> for Diagnostic {
	fn from(err: ModelError) -> Self {
		let mut diagnostic = Diagnostic::new(err.kind(), err.to_string()).with_module(err.module().clone());
		if let Some(key) = err.key() {
			diagnostic = diagnostic.with_key(key.clone());
		}
		if let Some(dimension) = err.dimension() {
			diagnostic = diagnostic.with_dimension(dimension.clone());
		}
		diagnostic
	}
}

/// Parts of a module contribution the registry or index refused.
///
/// The accepted parts stay registered; every rejection is also reported again
/// as a diagnostic when the space is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("module {module}: {} contribution(s) rejected: {}", .errors.len(), join(.errors, "; "))]
pub struct ContributionRejected {
	pub module: ModuleId,
	pub errors: Vec<ModelError>,
}

/// What a failed query was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySubject {
	Classifier { name: Arc<str>, coordinate: Option<Coordinate> },
	Dimension(Arc<str>),
	Element { dimension: Arc<str>, element: Arc<str> },
}

impl fmt::Display for QuerySubject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Classifier { name, coordinate: Some(at) } => write!(f, "classifier {name:?} at {at}"),
			Self::Classifier { name, coordinate: None } => write!(f, "classifier {name:?}"),
			Self::Dimension(name) => write!(f, "dimension {name:?}"),
			Self::Element { dimension, element } => write!(f, "element {element:?} of dimension {dimension:?}"),
		}
	}
}

/// Per-call query failures. Never affect the queried space.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("{subject} not found")]
	NotFound { subject: QuerySubject },

	#[error("classifier {name:?} is ambiguous{}; candidates: {}", at_suffix(.coordinate), join(.candidates, ", "))]
	AmbiguousQuery {
		name: Arc<str>,
		coordinate: Option<Coordinate>,
		candidates: Vec<Coordinate>,
	},
}

impl QueryError {
	pub(crate) fn classifier_not_found(name: &str, coordinate: Option<&Coordinate>) -> Self {
		Self::NotFound {
			subject: QuerySubject::Classifier {
				name: Arc::from(name),
				coordinate: coordinate.cloned(),
			},
		}
	}
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
	items.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

fn at_suffix(coordinate: &Option<Coordinate>) -> String {
	match coordinate {
		Some(at) => format!(" at {at}"),
		None => " without a coordinate".to_string(),
	}
}

fn parent_problem(problem: &ParentProblem) -> &'static str {
	match problem {
		ParentProblem::Unregistered => "which is not an element of that dimension",
		ParentProblem::Cycle => "which leads back to itself",
	}
}

fn part_label(part: &UndeclaredPart) -> &'static str {
	match part {
		UndeclaredPart::Dimension => "dimension",
		UndeclaredPart::Element => "element",
	}
}

fn undeclared_label(part: &UndeclaredPart, dimension: &str, element: &str) -> String {
	match part {
		UndeclaredPart::Dimension => dimension.to_string(),
		UndeclaredPart::Element => format!("{dimension}={element}"),
	}
}
