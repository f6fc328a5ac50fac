//! Atomic publication of rebuilt model spaces.
//!
//! # Role
//!
//! [`ModelHost`] keeps the currently published [`ModelSpace`] behind an
//! [`ArcSwapOption`]. Readers load an `Arc` without locking and keep a
//! consistent space for as long as they hold it. Rebuilds run from scratch and
//! replace the published space in one store, or leave it untouched on failure.
//!
//! # Invariants
//!
//! - A space held by a reader never changes after a later rebuild.
//!   - Enforced in: [`ModelHost::rebuild`] (publication swaps the pointer; spaces are immutable).
//!   - Tested by: [`crate::invariants::test_rebuild_isolation`]
//!   - Failure symptom: a consumer sees classifiers appear or vanish mid-request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use super::ModelSpace;
use crate::build::{BuildOptions, build_model_space};
use crate::declaration::ModuleContribution;
use crate::diagnostic::DiagnosticSet;

pub struct ModelHost {
	options: BuildOptions,
	current: ArcSwapOption<ModelSpace>,
	generation: AtomicU64,
	/// Serializes rebuilds and publications; never taken by readers.
	writer: Mutex<()>,
}

impl ModelHost {
	pub fn new(options: BuildOptions) -> Self {
		Self {
			options,
			current: ArcSwapOption::empty(),
			generation: AtomicU64::new(0),
			writer: Mutex::new(()),
		}
	}

	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	/// The published space, if any build has succeeded.
	pub fn current(&self) -> Option<Arc<ModelSpace>> {
		self.current.load_full()
	}

	/// Number of spaces published so far.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Builds a fresh space from `contributions` and publishes it.
	///
	/// On failure the previously published space stays current.
	pub fn rebuild(&self, contributions: impl IntoIterator<Item = ModuleContribution>) -> Result<Arc<ModelSpace>, DiagnosticSet> {
		let _writer = self.writer.lock();
		match build_model_space(contributions, &self.options) {
			Ok(space) => Ok(self.install(space)),
			Err(failure) => {
				tracing::warn!(
					generation = self.generation(),
					diagnostics = failure.len(),
					"rebuild failed; keeping current model space"
				);
				Err(failure)
			}
		}
	}

	/// Publishes an already-built space.
	pub fn publish(&self, space: ModelSpace) -> Arc<ModelSpace> {
		let _writer = self.writer.lock();
		self.install(space)
	}

	fn install(&self, space: ModelSpace) -> Arc<ModelSpace> {
		let space = Arc::new(space);
		self.current.store(Some(space.clone()));
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(generation, classifiers = space.len(), "published model space");
		space
	}
}

impl Default for ModelHost {
	fn default() -> Self {
		Self::new(BuildOptions::default())
	}
}
