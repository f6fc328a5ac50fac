//! Model space builder.
//!
//! # Role
//!
//! Collects module contributions and drives a build through its phases:
//!
//! ```text
//! Scanning → Indexing → Validating(Structure) → Resolving → Validating(Resolution) → Frozen
//!                                                                                   ↘ Failed
//! ```
//!
//! Transitions only move forward. `Frozen` yields a [`ModelSpace`]; `Failed`
//! yields the [`DiagnosticSet`]. A rebuild always starts a fresh builder.
//!
//! # Concurrency
//!
//! Contributions may arrive from several threads while scanning. The registry
//! and the index each sit behind their own lock, taken only for the duration of
//! one registration, so uniqueness checks always see a consistent view.
//! [`ModelSpaceBuilder::build`] consumes the builder, so nothing can register
//! after the build starts.
//!
//! # Invariants
//!
//! - A failed build never produces a [`ModelSpace`].
//!   - Enforced in: [`ModelSpaceBuilder::build`].
//!   - Tested by: [`crate::invariants::test_failure_atomicity`]
//!   - Failure symptom: consumers query a model missing the classifiers of one broken module.

mod options;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

pub use self::options::{BuildOptions, OptionsError, Strictness};
use crate::declaration::{ClassifierDeclaration, ModuleContribution, ModuleId};
use crate::diagnostic::{Collector, Diagnostic, DiagnosticKind, DiagnosticSet};
use crate::dimension::{DimensionRegistry, RegisterOutcome};
use crate::error::{ContributionRejected, ModelError};
use crate::index::{DeclId, DeclarationIndex};
use crate::resolve::OverrideResolver;
use crate::space::ModelSpace;
use crate::validate::ModelValidator;

/// Which group of checks a validating build is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStage {
	/// Checks independent of resolution.
	Structure,
	/// Checks over the resolved classifiers.
	Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
	Scanning,
	Indexing,
	Validating(ValidationStage),
	Resolving,
	Frozen,
	Failed,
}

impl BuildPhase {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Frozen | Self::Failed)
	}

	/// Returns true if a build may move from `self` to `next`.
	pub fn can_advance_to(self, next: BuildPhase) -> bool {
		use BuildPhase::*;
		use ValidationStage::*;
		match (self, next) {
			(Scanning, Indexing)
			| (Indexing, Validating(Structure))
			| (Validating(Structure), Resolving)
			| (Resolving, Validating(Resolution))
			| (Validating(Resolution), Frozen) => true,
			(from, Failed) => !from.is_terminal(),
			_ => false,
		}
	}
}

impl fmt::Display for BuildPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Scanning => "scanning",
			Self::Indexing => "indexing",
			Self::Validating(ValidationStage::Structure) => "validating structure",
			Self::Resolving => "resolving",
			Self::Validating(ValidationStage::Resolution) => "validating resolution",
			Self::Frozen => "frozen",
			Self::Failed => "failed",
		})
	}
}

/// Tracks the current phase, and the phase in which the first error surfaced.
struct PhaseLog {
	phase: BuildPhase,
	first_error: Option<BuildPhase>,
	started: Instant,
}

impl PhaseLog {
	fn new() -> Self {
		Self {
			phase: BuildPhase::Scanning,
			first_error: None,
			started: Instant::now(),
		}
	}

	fn advance(&mut self, next: BuildPhase) {
		debug_assert!(self.phase.can_advance_to(next), "illegal build transition {} -> {next}", self.phase);
		tracing::debug!(from = %self.phase, to = %next, elapsed_us = self.started.elapsed().as_micros() as u64, "build phase");
		self.phase = next;
	}

	/// Records the phase of the first error; returns true if the build must stop now.
	fn settle(&mut self, out: &Collector) -> bool {
		if out.has_errors() && self.first_error.is_none() {
			self.first_error = Some(self.phase);
		}
		out.halted()
	}

	fn fail(mut self, out: Collector) -> DiagnosticSet {
		let phase = self.first_error.unwrap_or(self.phase);
		self.advance(BuildPhase::Failed);
		let failure = out.into_failure(phase);
		tracing::warn!(phase = %phase, diagnostics = failure.len(), "model build failed");
		failure
	}
}

/// Accepts contributions, then builds a frozen [`ModelSpace`].
pub struct ModelSpaceBuilder {
	options: BuildOptions,
	registry: Mutex<DimensionRegistry>,
	index: Mutex<DeclarationIndex>,
}

impl Default for ModelSpaceBuilder {
	fn default() -> Self {
		Self::new(BuildOptions::default())
	}
}

impl ModelSpaceBuilder {
	pub fn new(options: BuildOptions) -> Self {
		Self {
			options,
			registry: Mutex::new(DimensionRegistry::new()),
			index: Mutex::new(DeclarationIndex::new()),
		}
	}

	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	pub fn register_element(
		&self,
		dimension: impl Into<Arc<str>>,
		element: impl Into<Arc<str>>,
		module: &ModuleId,
	) -> Result<RegisterOutcome, ModelError> {
		self.registry.lock().register_element(dimension, element, module)
	}

	pub fn register_element_under(
		&self,
		dimension: impl Into<Arc<str>>,
		element: impl Into<Arc<str>>,
		parent: impl Into<Arc<str>>,
		module: &ModuleId,
	) -> Result<RegisterOutcome, ModelError> {
		self.registry.lock().register_element_under(dimension, element, Some(parent), module)
	}

	pub fn add_declaration(&self, declaration: ClassifierDeclaration) -> Result<DeclId, ModelError> {
		self.index.lock().add(declaration)
	}

	/// Registers everything one module contributes.
	///
	/// Declarations are attributed to the contributing module. A rejected element
	/// or declaration does not stop the rest of the contribution; rejections are
	/// returned together and also become diagnostics when the space is built.
	pub fn contribute(&self, contribution: ModuleContribution) -> Result<(), ContributionRejected> {
		let ModuleContribution {
			module,
			elements,
			declarations,
		} = contribution;
		let (element_count, declaration_count) = (elements.len(), declarations.len());
		let mut errors = Vec::new();

		{
			let mut registry = self.registry.lock();
			for element in elements {
				if let Err(err) = registry.register_element_under(element.dimension, element.element, element.parent, &module) {
					errors.push(err);
				}
			}
		}
		{
			let mut index = self.index.lock();
			for declaration in declarations {
				if let Err(err) = index.add(declaration.from_module(module.clone())) {
					errors.push(err);
				}
			}
		}

		tracing::debug!(
			module = %module,
			elements = element_count,
			declarations = declaration_count,
			rejected = errors.len(),
			"module contributed"
		);
		if errors.is_empty() {
			Ok(())
		} else {
			Err(ContributionRejected { module, errors })
		}
	}

	/// Validates, resolves and freezes everything contributed so far.
	pub fn build(self) -> Result<ModelSpace, DiagnosticSet> {
		let mut log = PhaseLog::new();
		let Self { options, registry, index } = self;

		log.advance(BuildPhase::Indexing);
		let registry = registry.into_inner();
		let index = index.into_inner();
		tracing::debug!(dimensions = registry.len(), declarations = index.len(), "contributions sealed");

		let mut out = Collector::new(&options);
		let validator = ModelValidator::new(&registry, &index);

		log.advance(BuildPhase::Validating(ValidationStage::Structure));
		validator.check_structure(&mut out);
		if log.settle(&out) {
			return Err(log.fail(out));
		}

		log.advance(BuildPhase::Resolving);
		let (graph, order) = validator.check_overrides(&mut out);
		if log.settle(&out) {
			return Err(log.fail(out));
		}
		let resolution = OverrideResolver::new(&index, &graph).resolve_into(&order, &mut out);
		if log.settle(&out) {
			return Err(log.fail(out));
		}

		log.advance(BuildPhase::Validating(ValidationStage::Resolution));
		validator.check_resolution(&graph, &resolution, &mut out);
		validator.check_usage(&mut out);
		log.settle(&out);
		if out.has_errors() {
			return Err(log.fail(out));
		}

		let Some(effective) = resolution.into_complete() else {
			out.push(Diagnostic::new(
				DiagnosticKind::IncompleteResolution,
				"resolution left declarations without an effective classifier",
			));
			log.settle(&out);
			return Err(log.fail(out));
		};

		log.advance(BuildPhase::Frozen);
		let (_, warnings) = out.into_parts();
		let space = ModelSpace::new(registry, index, effective, warnings);
		tracing::info!(
			dimensions = space.dimensions().len(),
			declarations = space.len(),
			warnings = space.warnings().len(),
			elapsed_us = log.started.elapsed().as_micros() as u64,
			"model space frozen"
		);
		Ok(space)
	}
}

/// Builds a model space from module contributions in one call.
///
/// Contributions are registered in iteration order; rejected parts are reported
/// through the returned diagnostics.
pub fn build_model_space(
	contributions: impl IntoIterator<Item = ModuleContribution>,
	options: &BuildOptions,
) -> Result<ModelSpace, DiagnosticSet> {
	let builder = ModelSpaceBuilder::new(options.clone());
	for contribution in contributions {
		if let Err(rejected) = builder.contribute(contribution) {
			tracing::trace!(error = %rejected, "contribution partially rejected");
		}
	}
	builder.build()
}

#[cfg(test)]
mod tests;
