//! Coordinate precedence for base selection and coordinate-qualified queries.

use crate::coordinate::{Coordinate, ElementOrder};

/// Outcome of picking the most specific coordinate among candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specificity<T> {
	None,
	Unique(T),
	/// Several maximal candidates, none refining the others. In candidate order.
	Ambiguous(Vec<T>),
}

/// Picks the candidate whose coordinate refines every other candidate's under `order`.
///
/// Candidates are reduced to their maxima under refinement. In a finite partial
/// order a single maximum is the greatest element, so it wins outright; two or
/// more maxima are mutually incomparable and yield [`Specificity::Ambiguous`].
pub fn most_specific<'c, T: Copy>(candidates: impl IntoIterator<Item = (&'c Coordinate, T)>, order: &impl ElementOrder) -> Specificity<T> {
	let candidates: Vec<_> = candidates.into_iter().collect();
	let maxima: Vec<T> = candidates
		.iter()
		.filter(|(coord, _)| !candidates.iter().any(|(other, _)| other != coord && coord.is_ancestor_of(other, order)))
		.map(|&(_, item)| item)
		.collect();

	match maxima.as_slice() {
		[] => Specificity::None,
		[only] => Specificity::Unique(*only),
		_ => Specificity::Ambiguous(maxima),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::coordinate::Unordered;

	fn at(pairs: &[(&str, &str)]) -> Coordinate {
		pairs.iter().copied().collect()
	}

	#[test]
	fn test_chain_picks_most_refined() {
		let root = Coordinate::new();
		let user = at(&[("Scope", "User")]);
		let user_domain = at(&[("Scope", "User"), ("Layer", "Domain")]);
		let picked = most_specific([(&root, 0), (&user_domain, 2), (&user, 1)], &Unordered);
		assert_eq!(picked, Specificity::Unique(2));
	}

	#[test]
	fn test_incomparable_maxima() {
		let root = Coordinate::new();
		let user = at(&[("Scope", "User")]);
		let domain = at(&[("Layer", "Domain")]);
		let picked = most_specific([(&root, 0), (&user, 1), (&domain, 2)], &Unordered);
		assert_eq!(picked, Specificity::Ambiguous(vec![1, 2]));
	}

	#[test]
	fn test_empty() {
		assert_eq!(most_specific::<u8>([], &Unordered), Specificity::None);
	}
}
