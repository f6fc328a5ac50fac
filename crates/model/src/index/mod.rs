//! Declaration index.
//!
//! # Role
//!
//! Indexes raw classifier declarations by `(qualified name, coordinate)` and by
//! qualified name, and resolves each declaration's base reference to a concrete
//! declaration.
//!
//! # Invariants
//!
//! - `(qualified name, coordinate)` pairs are unique.
//!   - Enforced in: [`DeclarationIndex::add`].
//!   - Tested by: [`crate::invariants::test_declaration_uniqueness`]
//!   - Failure symptom: two modules silently fight over the same classifier slot.
//! - Base resolution depends only on the set of declarations, never on the order
//!   they were added.
//!   - Enforced in: [`DeclarationIndex::base_of`] (candidate selection by refinement).
//!   - Tested by: [`crate::invariants::test_contribution_order_independence`]
//!   - Failure symptom: the effective model changes with module load order.

use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::coordinate::{Coordinate, ElementOrder};
use crate::declaration::{ClassifierDeclaration, DeclarationKey};
use crate::error::{ModelError, UnresolvedReason};
use crate::resolve::precedence::{Specificity, most_specific};

/// Dense handle to an indexed declaration, assigned in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u32);

impl DeclId {
	pub(crate) fn from_index(index: usize) -> Self {
		debug_assert!(u32::try_from(index).is_ok(), "declaration index {index} exceeds the DeclId range");
		Self(u32::try_from(index).unwrap_or(u32::MAX))
	}

	pub fn index(self) -> usize {
		self.0 as usize
	}
}

#[derive(Debug, Default)]
pub struct DeclarationIndex {
	decls: Vec<ClassifierDeclaration>,
	by_key: FxHashMap<DeclarationKey, DeclId>,
	by_name: IndexMap<Arc<str>, Vec<DeclId>>,
	collisions: Vec<ModelError>,
}

impl DeclarationIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a declaration keyed by `(qualified name, coordinate)`.
	///
	/// Fails with [`ModelError::DuplicateDeclaration`] on collision; the existing
	/// declaration is kept and the rejection is recorded for validation.
	pub fn add(&mut self, declaration: ClassifierDeclaration) -> Result<DeclId, ModelError> {
		let key = declaration.key();
		if let Some(&existing) = self.by_key.get(&key) {
			let err = ModelError::DuplicateDeclaration {
				key,
				existing: self.decls[existing.index()].module.clone(),
				module: declaration.module,
			};
			tracing::trace!(error = %err, "rejected declaration");
			self.collisions.push(err.clone());
			return Err(err);
		}

		let id = DeclId::from_index(self.decls.len());
		self.by_name.entry(declaration.name.clone()).or_default().push(id);
		self.by_key.insert(key, id);
		self.decls.push(declaration);
		Ok(id)
	}

	pub fn get(&self, id: DeclId) -> Option<&ClassifierDeclaration> {
		self.decls.get(id.index())
	}

	/// Looks up the declaration of `name` at exactly `coordinate`.
	pub fn find(&self, name: &str, coordinate: &Coordinate) -> Option<DeclId> {
		// Probe by name first to avoid building an owned key.
		self.by_name
			.get(name)?
			.iter()
			.copied()
			.find(|&id| self.decls[id.index()].coordinate == *coordinate)
	}

	/// Declarations of `name` across all coordinates, in insertion order.
	pub fn by_name<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassifierDeclaration> + use<'a> {
		self.ids_by_name(name).iter().map(|id| &self.decls[id.index()])
	}

	pub fn ids_by_name(&self, name: &str) -> &[DeclId] {
		self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Qualified names in first-seen order.
	pub fn names(&self) -> impl ExactSizeIterator<Item = &Arc<str>> + '_ {
		self.by_name.keys()
	}

	pub fn iter(&self) -> impl ExactSizeIterator<Item = (DeclId, &ClassifierDeclaration)> + '_ {
		self.decls.iter().enumerate().map(|(i, d)| (DeclId::from_index(i), d))
	}

	/// Insertions rejected as duplicates, in the order they were attempted.
	pub fn collisions(&self) -> &[ModelError] {
		&self.collisions
	}

	pub fn len(&self) -> usize {
		self.decls.len()
	}

	pub fn is_empty(&self) -> bool {
		self.decls.is_empty()
	}

	/// The declaration a pinned base reference names, whether or not it is a
	/// legal base. `None` for unpinned references and missing pins.
	pub fn pinned_base(&self, id: DeclId) -> Option<DeclId> {
		let (target, pinned) = self[id].base_target()?;
		self.find(target, pinned?)
	}

	/// Resolves the base reference of `id` to a concrete declaration, with
	/// ancestry taken under `order`.
	///
	/// A pinned base must exist at exactly its coordinate, and that coordinate must
	/// be the same as or an ancestor of the declaration's own. An unpinned base
	/// picks, among declarations of the base name at the same or an ancestor
	/// coordinate (excluding the declaration itself), the one whose coordinate
	/// refines all the others.
	///
	/// Returns `Ok(None)` for declarations without a base.
	pub fn base_of(&self, id: DeclId, order: &impl ElementOrder) -> Result<Option<DeclId>, ModelError> {
		let decl = &self[id];
		let Some((target, pinned)) = decl.base_target() else {
			return Ok(None);
		};

		let unresolved = |reason| ModelError::UnresolvedBaseReference {
			key: decl.key(),
			base: target.clone(),
			reason,
			module: decl.module.clone(),
		};

		if let Some(pinned) = pinned {
			let base = self
				.pinned_base(id)
				.ok_or_else(|| unresolved(UnresolvedReason::MissingPinned(pinned.clone())))?;
			if !pinned.is_ancestor_of(&decl.coordinate, order) {
				return Err(unresolved(UnresolvedReason::NotAncestor(pinned.clone())));
			}
			return Ok(Some(base));
		}

		let candidates = self
			.ids_by_name(target)
			.iter()
			.copied()
			.filter(|&c| c != id && self[c].coordinate.is_ancestor_of(&decl.coordinate, order))
			.map(|c| (&self[c].coordinate, c));

		match most_specific(candidates, order) {
			Specificity::Unique(base) => Ok(Some(base)),
			Specificity::None => Err(unresolved(UnresolvedReason::NoCandidate)),
			Specificity::Ambiguous(tied) => Err(ModelError::AmbiguousBase {
				key: decl.key(),
				base: target.clone(),
				candidates: tied.into_iter().map(|c| self[c].coordinate.clone()).collect(),
				module: decl.module.clone(),
			}),
		}
	}
}

impl Index<DeclId> for DeclarationIndex {
	type Output = ClassifierDeclaration;

	fn index(&self, id: DeclId) -> &ClassifierDeclaration {
		&self.decls[id.index()]
	}
}
