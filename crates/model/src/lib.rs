//! Multi-dimensional classifier model composition.
//!
//! Modules contribute dimension elements and classifier declarations; the engine
//! indexes them, resolves override chains into effective classifiers, validates
//! the result, and freezes it into an immutable, concurrently queryable
//! [`ModelSpace`].
//!
//! # Components
//!
//! - [`dimension`] - Dimension registry (elements, ownership, element order)
//! - [`index`] - Declaration index keyed by `(qualified name, coordinate)`
//! - [`resolve`] - Override graph, base precedence, member merge
//! - [`validate`] - Structural and post-resolution checks
//! - [`build`] - Build state machine and options
//! - [`space`] - Frozen query surface and the rebuild host
//!
//! # Data Flow
//!
//! contributions → index → resolution → frozen space → queries. Nothing
//! downstream of [`ModelSpaceBuilder::build`] mutates state.
//!
//! ```
//! use lattice_model::{BuildOptions, ClassifierDeclaration, Coordinate, ModuleContribution, build_model_space};
//!
//! let accounts = ModuleContribution::new("accounts")
//! 	.element("Scope", "Global")
//! 	.element_under("Scope", "User", "Global")
//! 	.declare(ClassifierDeclaration::new("Profile", Coordinate::new().with("Scope", "Global")).member("A", "int".parse().unwrap()))
//! 	.declare(
//! 		ClassifierDeclaration::new("Profile", Coordinate::new().with("Scope", "User"))
//! 			.overriding()
//! 			.member("B", "string".parse().unwrap()),
//! 	);
//!
//! let space = build_model_space([accounts], &BuildOptions::default()).unwrap();
//! let user = space.classifier("Profile", Some(&Coordinate::new().with("Scope", "User"))).unwrap();
//! assert_eq!(user.members().len(), 2);
//! ```

pub mod build;
pub mod coordinate;
pub mod declaration;
pub mod diagnostic;
pub mod dimension;
pub mod error;
pub mod index;
pub mod resolve;
pub mod space;
pub mod validate;

#[cfg(any(test, doc))]
pub(crate) mod invariants;

pub use build::{BuildOptions, BuildPhase, ModelSpaceBuilder, Strictness, ValidationStage, build_model_space};
pub use coordinate::{Coordinate, ElementOrder};
pub use declaration::{
	BaseRef, ClassifierDeclaration, DeclarationKey, ElementContribution, MemberDescriptor, ModuleContribution, ModuleId, SemanticType,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSet, Severity};
pub use dimension::{Dimension, DimensionElement, DimensionRegistry};
pub use error::{ContributionRejected, ModelError, QueryError, QuerySubject};
pub use index::{DeclId, DeclarationIndex};
pub use resolve::{EffectiveClassifier, EffectiveMember, OverrideResolver};
pub use space::{ModelHost, ModelSpace};
pub use validate::ModelValidator;
