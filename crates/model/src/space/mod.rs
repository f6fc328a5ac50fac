//! Frozen model space and its query surface.
//!
//! # Role
//!
//! A [`ModelSpace`] owns the dimensions, raw declarations and effective
//! classifiers of one successful build. It has no mutating methods; queries
//! take `&self` and are safe to run from any number of threads at once.
//!
//! # Invariants
//!
//! - Queries never mutate the space, and repeated queries return equal results.
//!   - Enforced in: [`ModelSpace`] (no `&mut self` methods after freezing).
//!   - Tested by: [`crate::invariants::test_idempotent_queries`]
//!   - Failure symptom: a lookup result that depends on earlier lookups.

mod host;

use std::sync::Arc;

pub use self::host::ModelHost;
use crate::build::BuildOptions;
use crate::coordinate::Coordinate;
use crate::declaration::ClassifierDeclaration;
use crate::diagnostic::Diagnostic;
use crate::dimension::{Dimension, DimensionRegistry};
use crate::error::{QueryError, QuerySubject};
use crate::index::{DeclId, DeclarationIndex};
use crate::resolve::EffectiveClassifier;
use crate::resolve::precedence::{Specificity, most_specific};
use crate::validate::ModelValidator;

#[derive(Debug)]
pub struct ModelSpace {
	registry: DimensionRegistry,
	index: DeclarationIndex,
	/// Indexed by [`DeclId`].
	effective: Vec<Arc<EffectiveClassifier>>,
	warnings: Vec<Diagnostic>,
}

impl ModelSpace {
	pub(crate) fn new(
		registry: DimensionRegistry,
		index: DeclarationIndex,
		effective: Vec<Arc<EffectiveClassifier>>,
		warnings: Vec<Diagnostic>,
	) -> Self {
		Self {
			registry,
			index,
			effective,
			warnings,
		}
	}

	/// Looks up the effective classifier of `name`.
	///
	/// Without a coordinate: the only declaration of the name, else the one at
	/// the empty coordinate, else [`QueryError::AmbiguousQuery`].
	///
	/// With a coordinate: the declaration at exactly that coordinate, else the
	/// one at the most specific declared ancestor coordinate. Incomparable
	/// ancestors are ambiguous; no ancestor at all is [`QueryError::NotFound`].
	pub fn classifier(&self, name: &str, coordinate: Option<&Coordinate>) -> Result<Arc<EffectiveClassifier>, QueryError> {
		let ids = self.index.ids_by_name(name);
		if ids.is_empty() {
			return Err(QueryError::classifier_not_found(name, coordinate));
		}

		let Some(coordinate) = coordinate else {
			return match ids {
				[only] => Ok(self.effective_of(*only)),
				_ => match self.index.find(name, &Coordinate::new()) {
					Some(id) => Ok(self.effective_of(id)),
					None => Err(QueryError::AmbiguousQuery {
						name: Arc::from(name),
						coordinate: None,
						candidates: self.coordinates_of(ids),
					}),
				},
			};
		};

		self.check_query_coordinate(coordinate)?;
		if let Some(id) = self.index.find(name, coordinate) {
			return Ok(self.effective_of(id));
		}

		let ancestors = ids
			.iter()
			.copied()
			.filter(|&id| self.index[id].coordinate.is_ancestor_of(coordinate, &self.registry))
			.map(|id| (&self.index[id].coordinate, id));
		match most_specific(ancestors, &self.registry) {
			Specificity::Unique(id) => Ok(self.effective_of(id)),
			Specificity::None => Err(QueryError::classifier_not_found(name, Some(coordinate))),
			Specificity::Ambiguous(tied) => Err(QueryError::AmbiguousQuery {
				name: Arc::from(name),
				coordinate: Some(coordinate.clone()),
				candidates: self.coordinates_of(&tied),
			}),
		}
	}

	/// Every effective classifier of `name`, in declaration order.
	pub fn classifiers<'a>(&'a self, name: &str) -> impl ExactSizeIterator<Item = &'a Arc<EffectiveClassifier>> + use<'a> {
		self.index.ids_by_name(name).iter().map(|id| &self.effective[id.index()])
	}

	pub fn dimension(&self, name: &str) -> Result<&Dimension, QueryError> {
		self.registry.dimension(name).ok_or_else(|| QueryError::NotFound {
			subject: QuerySubject::Dimension(Arc::from(name)),
		})
	}

	/// Dimensions in first-seen order.
	pub fn dimensions(&self) -> impl ExactSizeIterator<Item = &Dimension> + Clone + '_ {
		self.registry.dimensions()
	}

	/// Qualified names in first-seen order.
	pub fn names(&self) -> impl ExactSizeIterator<Item = &Arc<str>> + '_ {
		self.index.names()
	}

	/// Raw declarations as contributed, in insertion order.
	pub fn declarations(&self) -> impl ExactSizeIterator<Item = &ClassifierDeclaration> + '_ {
		self.index.iter().map(|(_, d)| d)
	}

	/// Warning diagnostics recorded while building.
	pub fn warnings(&self) -> &[Diagnostic] {
		&self.warnings
	}

	/// Re-runs every check over the frozen data and returns the error diagnostics.
	///
	/// Empty for any space produced by a successful build.
	pub fn validate(&self) -> Vec<Diagnostic> {
		ModelValidator::new(&self.registry, &self.index).validate(&BuildOptions::collect().with_warnings(false))
	}

	/// Number of declarations, each with one effective classifier.
	pub fn len(&self) -> usize {
		self.effective.len()
	}

	pub fn is_empty(&self) -> bool {
		self.effective.is_empty()
	}

	fn effective_of(&self, id: DeclId) -> Arc<EffectiveClassifier> {
		self.effective[id.index()].clone()
	}

	fn coordinates_of(&self, ids: &[DeclId]) -> Vec<Coordinate> {
		ids.iter().map(|&id| self.index[id].coordinate.clone()).collect()
	}

	fn check_query_coordinate(&self, coordinate: &Coordinate) -> Result<(), QueryError> {
		for (dimension, element) in coordinate.iter() {
			let known = self.dimension(dimension)?;
			if !known.contains(element) {
				return Err(QueryError::NotFound {
					subject: QuerySubject::Element {
						dimension: Arc::from(dimension),
						element: Arc::from(element),
					},
				});
			}
		}
		Ok(())
	}
}
