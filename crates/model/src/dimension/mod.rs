//! Dimension registry.
//!
//! # Role
//!
//! Holds every declared dimension and, per dimension, the elements contributed
//! by modules. Write-once: there is no removal, and the registry is frozen by
//! moving it into a [`crate::ModelSpace`].
//!
//! # Invariants
//!
//! - Element names are unique within a dimension; the first contributing module
//!   owns the element.
//!   - Enforced in: [`DimensionRegistry::register_element`].
//!   - Tested by: [`crate::invariants::test_element_uniqueness`]
//!   - Failure symptom: two modules both claim ownership of `Scope=User`.
//! - Dimensions and elements iterate in first-seen order.
//!
//! # Element Order
//!
//! An element may name a parent element of the same dimension, making the
//! dimension partially ordered (`User` refines `Global`). The registry is the
//! [`ElementOrder`] used for coordinate refinement during a build. Parents are
//! checked by the validator, not at registration, so registration order across
//! modules never matters.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::coordinate::ElementOrder;
use crate::declaration::ModuleId;
use crate::error::ModelError;

/// One named value of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionElement {
	name: Arc<str>,
	parent: Option<Arc<str>>,
	owner: ModuleId,
}

impl DimensionElement {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Element this one refines, if any.
	pub fn parent(&self) -> Option<&str> {
		self.parent.as_deref()
	}

	/// Module that first contributed this element.
	pub fn owner(&self) -> &ModuleId {
		&self.owner
	}
}

/// A named classification axis and its elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
	name: Arc<str>,
	elements: IndexMap<Arc<str>, DimensionElement>,
}

impl Dimension {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Elements in first-seen order.
	pub fn elements(&self) -> impl ExactSizeIterator<Item = &DimensionElement> + Clone + '_ {
		self.elements.values()
	}

	pub fn element(&self, name: &str) -> Option<&DimensionElement> {
		self.elements.get(name)
	}

	pub fn contains(&self, element: &str) -> bool {
		self.elements.contains_key(element)
	}

	/// Parents of `element`, nearest first.
	///
	/// Stops after visiting every element once, so a parent cycle terminates.
	pub fn ancestors<'a>(&'a self, element: &str) -> impl Iterator<Item = &'a str> + use<'a> {
		let mut cursor = self.elements.get(element).and_then(|e| e.parent.as_deref());
		std::iter::from_fn(move || {
			let current = cursor?;
			cursor = self.elements.get(current).and_then(|e| e.parent.as_deref());
			Some(current)
		})
		.take(self.elements.len())
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}
}

/// Result of a successful element registration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegisterOutcome {
	/// Element was new.
	InsertedNew,
	/// The same module registered the element again; nothing changed.
	AlreadyPresent,
}

#[derive(Debug, Default)]
pub struct DimensionRegistry {
	dimensions: IndexMap<Arc<str>, Dimension>,
	collisions: Vec<ModelError>,
}

impl DimensionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records that `module` contributes `element` to `dimension`.
	///
	/// Fails with [`ModelError::DuplicateElement`] if another module already owns
	/// the element. The rejected registration is also kept for validation.
	pub fn register_element(
		&mut self,
		dimension: impl Into<Arc<str>>,
		element: impl Into<Arc<str>>,
		module: &ModuleId,
	) -> Result<RegisterOutcome, ModelError> {
		self.register_element_under(dimension, element, None::<Arc<str>>, module)
	}

	/// Like [`Self::register_element`], with `element` refining `parent`.
	///
	/// The parent of an element is fixed by its first registration.
	pub fn register_element_under(
		&mut self,
		dimension: impl Into<Arc<str>>,
		element: impl Into<Arc<str>>,
		parent: Option<impl Into<Arc<str>>>,
		module: &ModuleId,
	) -> Result<RegisterOutcome, ModelError> {
		let dimension = dimension.into();
		let element = element.into();

		let slot = self.dimensions.entry(dimension.clone()).or_insert_with(|| {
			tracing::trace!(dimension = %dimension, "new dimension");
			Dimension {
				name: dimension.clone(),
				elements: IndexMap::new(),
			}
		});

		match slot.elements.entry(element.clone()) {
			Entry::Vacant(v) => {
				v.insert(DimensionElement {
					name: element,
					parent: parent.map(Into::into),
					owner: module.clone(),
				});
				Ok(RegisterOutcome::InsertedNew)
			}
			Entry::Occupied(o) if o.get().owner == *module => Ok(RegisterOutcome::AlreadyPresent),
			Entry::Occupied(o) => {
				let err = ModelError::DuplicateElement {
					dimension,
					element,
					owner: o.get().owner.clone(),
					module: module.clone(),
				};
				tracing::trace!(error = %err, "rejected element");
				self.collisions.push(err.clone());
				Err(err)
			}
		}
	}

	/// Dimensions in first-seen order. The iterator is lazy and can be cloned to restart.
	pub fn dimensions(&self) -> impl ExactSizeIterator<Item = &Dimension> + Clone + '_ {
		self.dimensions.values()
	}

	pub fn dimension(&self, name: &str) -> Option<&Dimension> {
		self.dimensions.get(name)
	}

	pub fn contains(&self, dimension: &str, element: &str) -> bool {
		self.dimensions.get(dimension).is_some_and(|d| d.contains(element))
	}

	/// Registrations rejected as duplicates, in the order they were attempted.
	pub fn collisions(&self) -> &[ModelError] {
		&self.collisions
	}

	pub fn len(&self) -> usize {
		self.dimensions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dimensions.is_empty()
	}
}

impl ElementOrder for DimensionRegistry {
	fn descends(&self, dimension: &str, element: &str, ancestor: &str) -> bool {
		element == ancestor
			|| self
				.dimensions
				.get(dimension)
				.is_some_and(|d| d.ancestors(element).any(|a| a == ancestor))
	}
}

#[cfg(test)]
mod tests;
