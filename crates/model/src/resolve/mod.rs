//! Override resolution.
//!
//! # Role
//!
//! Computes the effective classifier of every declaration by merging the
//! declaration over its base's already-computed effective classifier, walking
//! declarations in dependency order (bases before overrides).
//!
//! # Merge Contract
//!
//! Starting from the base's members (or none), each own member is applied in
//! declaration order:
//! 1. **New name:** appended.
//! 2. **Same name, compatible type:** replaces the inherited member in place.
//! 3. **Same name, incompatible type:** replaces it only when the declaration is
//!    an override; otherwise [`ModelError::ConflictingMember`].
//!
//! - Enforced in: [`OverrideResolver::merge`]
//! - Tested by: [`crate::invariants::test_merge_correctness`], [`crate::invariants::test_override_shadowing`]
//! - Failure symptom: effective classifiers with duplicated or stale members.
//!
//! # Failure Scope
//!
//! Failures are scoped to a qualified name: once a name has failed, none of its
//! declarations resolve, and neither does anything whose base chain passes
//! through them. Skipped dependents produce no diagnostics of their own.

pub mod graph;
pub mod precedence;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::build::BuildOptions;
use crate::coordinate::Coordinate;
use crate::declaration::{ClassifierDeclaration, DeclarationKey, ModuleId, SemanticType};
use crate::diagnostic::{Collector, Diagnostic, DiagnosticKind};
use crate::error::ModelError;
use crate::index::{DeclId, DeclarationIndex};
use self::graph::{OverrideGraph, TopoOrder};

/// A member of an effective classifier and the declaration that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveMember {
	pub name: Arc<str>,
	#[serde(rename = "type")]
	pub ty: SemanticType,
	pub declared_by: DeclarationKey,
}

/// Fully merged view of a classifier at one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveClassifier {
	key: DeclarationKey,
	module: ModuleId,
	is_override: bool,
	members: Vec<EffectiveMember>,
	chain: Vec<DeclarationKey>,
}

impl EffectiveClassifier {
	pub fn name(&self) -> &str {
		&self.key.name
	}

	pub fn coordinate(&self) -> &Coordinate {
		&self.key.coordinate
	}

	pub fn key(&self) -> &DeclarationKey {
		&self.key
	}

	/// Module that contributed the declaration this classifier resolves.
	pub fn module(&self) -> &ModuleId {
		&self.module
	}

	pub fn is_override(&self) -> bool {
		self.is_override
	}

	pub fn members(&self) -> &[EffectiveMember] {
		&self.members
	}

	pub fn member(&self, name: &str) -> Option<&EffectiveMember> {
		self.members.iter().find(|m| &*m.name == name)
	}

	/// Declaration keys from this classifier down to its root base.
	pub fn chain(&self) -> &[DeclarationKey] {
		&self.chain
	}

	/// The declaration this classifier was merged over, if any.
	pub fn base(&self) -> Option<&DeclarationKey> {
		self.chain.get(1)
	}
}

/// Effective classifiers indexed by [`DeclId`]; `None` where resolution was skipped or failed.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
	effective: Vec<Option<Arc<EffectiveClassifier>>>,
}

impl Resolution {
	pub fn get(&self, id: DeclId) -> Option<&Arc<EffectiveClassifier>> {
		self.effective.get(id.index())?.as_ref()
	}

	/// Number of declarations that resolved.
	pub fn resolved(&self) -> usize {
		self.effective.iter().filter(|e| e.is_some()).count()
	}

	pub fn len(&self) -> usize {
		self.effective.len()
	}

	pub fn is_empty(&self) -> bool {
		self.effective.is_empty()
	}

	/// Returns every effective classifier, or `None` if any declaration is unresolved.
	pub(crate) fn into_complete(self) -> Option<Vec<Arc<EffectiveClassifier>>> {
		self.effective.into_iter().collect()
	}
}

pub struct OverrideResolver<'a> {
	index: &'a DeclarationIndex,
	graph: &'a OverrideGraph,
}

impl<'a> OverrideResolver<'a> {
	pub fn new(index: &'a DeclarationIndex, graph: &'a OverrideGraph) -> Self {
		Self { index, graph }
	}

	/// Resolves declarations in `order`, returning the resolution and any merge diagnostics.
	pub fn resolve(&self, order: &TopoOrder) -> (Resolution, Vec<Diagnostic>) {
		let mut out = Collector::new(&BuildOptions::default());
		let resolution = self.resolve_into(order, &mut out);
		let (errors, mut warnings) = out.into_parts();
		let mut diagnostics = errors;
		diagnostics.append(&mut warnings);
		(resolution, diagnostics)
	}

	pub(crate) fn resolve_into(&self, order: &TopoOrder, out: &mut Collector) -> Resolution {
		let mut effective: Vec<Option<Arc<EffectiveClassifier>>> = vec![None; self.index.len()];

		for &id in &order.order {
			if out.halted() {
				break;
			}
			let decl = &self.index[id];
			if out.has_failed(&decl.name) {
				tracing::trace!(name = %decl.name, "skipping declaration of failed name");
				continue;
			}
			let base = match self.graph.base(id) {
				Some(base) => match &effective[base.index()] {
					Some(resolved) => Some(resolved.clone()),
					None => {
						tracing::trace!(key = %decl.key(), "skipping declaration over unresolved base");
						continue;
					}
				},
				None => None,
			};
			if let Some(resolved) = self.merge(decl, base.as_deref(), out) {
				effective[id.index()] = Some(Arc::new(resolved));
			}
		}

		let resolution = Resolution { effective };
		tracing::debug!(resolved = resolution.resolved(), total = resolution.len(), "override resolution finished");
		resolution
	}

	fn merge(&self, decl: &ClassifierDeclaration, base: Option<&EffectiveClassifier>, out: &mut Collector) -> Option<EffectiveClassifier> {
		let key = decl.key();
		let (mut members, mut chain) = match base {
			Some(base) => (base.members.clone(), base.chain.clone()),
			None => (Vec::new(), Vec::new()),
		};
		chain.insert(0, key.clone());

		let mut positions: FxHashMap<Arc<str>, usize> = members.iter().enumerate().map(|(i, m)| (m.name.clone(), i)).collect();
		let mut failed = false;

		for member in &decl.members {
			let incoming = EffectiveMember {
				name: member.name.clone(),
				ty: member.ty.clone(),
				declared_by: key.clone(),
			};
			let Some(&pos) = positions.get(&member.name) else {
				positions.insert(member.name.clone(), members.len());
				members.push(incoming);
				continue;
			};

			let existing = &members[pos];
			// A name repeated within one declaration never counts as an override.
			let repeated = existing.declared_by == key;
			if existing.ty == member.ty {
				out.push(
					Diagnostic::new(
						DiagnosticKind::RedundantMember,
						format!("classifier {key}: member {:?} redeclares {} unchanged from {}", member.name, member.ty, existing.declared_by),
					)
					.with_key(key.clone())
					.with_module(decl.module.clone()),
				);
			} else if !existing.ty.is_compatible_with(&member.ty) && (repeated || !decl.is_override) {
				out.error(ModelError::ConflictingMember {
					key: key.clone(),
					member: member.name.clone(),
					existing: existing.ty.clone(),
					incoming: member.ty.clone(),
					existing_owner: existing.declared_by.clone(),
					module: decl.module.clone(),
				});
				failed = true;
				continue;
			}
			members[pos] = incoming;
		}

		if failed {
			return None;
		}
		Some(EffectiveClassifier {
			key,
			module: decl.module.clone(),
			is_override: decl.is_override,
			members,
			chain,
		})
	}
}
