//! Coordinates: one selected element per dimension.
//!
//! A coordinate qualifies a declaration or a query. Coordinates form a partial
//! order by refinement: `{Scope: User, Layer: Domain}` refines `{Scope: User}`,
//! which refines the empty (default) coordinate.
//!
//! Elements of a dimension may themselves be partially ordered (`User` refining
//! `Global`). Refinement is then taken per axis under that [`ElementOrder`], so
//! `{Scope: User}` also refines `{Scope: Global}`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Partial order on the elements of each dimension.
pub trait ElementOrder {
	/// Returns true if `element` is `ancestor` or descends from it within `dimension`.
	fn descends(&self, dimension: &str, element: &str, ancestor: &str) -> bool;
}

/// Order in which every element refines only itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unordered;

impl ElementOrder for Unordered {
	fn descends(&self, _dimension: &str, element: &str, ancestor: &str) -> bool {
		element == ancestor
	}
}

/// Selection of one element per dimension.
///
/// Axes are kept sorted by dimension name, so coordinates assembled in different
/// orders compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate {
	axes: BTreeMap<Arc<str>, Arc<str>>,
}

impl Coordinate {
	/// The empty (default) coordinate.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns this coordinate with `dimension` set to `element`.
	pub fn with(mut self, dimension: impl Into<Arc<str>>, element: impl Into<Arc<str>>) -> Self {
		self.insert(dimension, element);
		self
	}

	/// Selects `element` for `dimension`, returning the previous selection.
	pub fn insert(&mut self, dimension: impl Into<Arc<str>>, element: impl Into<Arc<str>>) -> Option<Arc<str>> {
		self.axes.insert(dimension.into(), element.into())
	}

	/// Returns the element selected for `dimension`.
	pub fn get(&self, dimension: &str) -> Option<&str> {
		self.axes.get(dimension).map(|e| &**e)
	}

	pub fn len(&self) -> usize {
		self.axes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.axes.is_empty()
	}

	/// Iterates `(dimension, element)` pairs sorted by dimension name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
		self.axes.iter().map(|(d, e)| (&**d, &**e))
	}

	/// Returns true if, for every dimension `other` constrains, `self` selects the
	/// same element or a descendant of it under `order`.
	///
	/// Every coordinate refines itself and the empty coordinate. Under
	/// [`Unordered`] this is plain subset inclusion of `(dimension, element)` pairs.
	pub fn refines_in(&self, other: &Coordinate, order: &impl ElementOrder) -> bool {
		other.len() <= self.len()
			&& other
				.axes
				.iter()
				.all(|(d, e)| self.axes.get(d).is_some_and(|mine| order.descends(d, mine, e)))
	}

	/// Returns true if `self` is the same as, or an ancestor of, `other` under `order`.
	pub fn is_ancestor_of(&self, other: &Coordinate, order: &impl ElementOrder) -> bool {
		other.refines_in(self, order)
	}
}

impl<D, E> FromIterator<(D, E)> for Coordinate
where
	D: Into<Arc<str>>,
	E: Into<Arc<str>>,
{
	fn from_iter<I: IntoIterator<Item = (D, E)>>(iter: I) -> Self {
		Self {
			axes: iter.into_iter().map(|(d, e)| (d.into(), e.into())).collect(),
		}
	}
}

impl fmt::Display for Coordinate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (i, (dimension, element)) in self.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{dimension}: {element}")?;
		}
		f.write_str("}")
	}
}
