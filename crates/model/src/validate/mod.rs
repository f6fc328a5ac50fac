//! Model validation.
//!
//! # Role
//!
//! Checks a registry and index without mutating either. Checks are grouped the
//! way a build runs them:
//! - **Structure:** element uniqueness and parents, declaration uniqueness,
//!   coordinates naming registered elements, and member consistency across
//!   non-override declarations of one name.
//! - **Overrides:** base links and cycles in the override graph.
//! - **Resolution:** every declaration that is not excused by an earlier failure
//!   has an effective classifier.
//! - **Usage:** warnings for elements nothing uses.
//!
//! Each check writes to a diagnostic collector; in strict mode the collector
//! stops accepting errors after the first one and callers stop at the next
//! check boundary.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::build::BuildOptions;
use crate::coordinate::Coordinate;
use crate::declaration::{ClassifierDeclaration, DeclarationKey, SemanticType};
use crate::diagnostic::{Collector, Diagnostic, DiagnosticKind};
use crate::dimension::DimensionRegistry;
use crate::error::{ModelError, ParentProblem, UndeclaredPart};
use crate::index::{DeclId, DeclarationIndex};
use crate::resolve::graph::{OverrideGraph, TopoOrder};
use crate::resolve::{OverrideResolver, Resolution};

pub struct ModelValidator<'a> {
	registry: &'a DimensionRegistry,
	index: &'a DeclarationIndex,
}

impl<'a> ModelValidator<'a> {
	pub fn new(registry: &'a DimensionRegistry, index: &'a DeclarationIndex) -> Self {
		Self { registry, index }
	}

	/// Runs every check, resolving overrides along the way, and returns the
	/// diagnostics: errors in discovery order, then warnings.
	pub fn validate(&self, options: &BuildOptions) -> Vec<Diagnostic> {
		let mut out = Collector::new(options);
		self.check_structure(&mut out);
		if !out.halted() {
			let (graph, order) = self.check_overrides(&mut out);
			if !out.halted() {
				let resolution = OverrideResolver::new(self.index, &graph).resolve_into(&order, &mut out);
				if !out.halted() {
					self.check_resolution(&graph, &resolution, &mut out);
				}
			}
		}
		self.check_usage(&mut out);

		let (mut diagnostics, mut warnings) = out.into_parts();
		diagnostics.append(&mut warnings);
		diagnostics
	}

	pub(crate) fn check_structure(&self, out: &mut Collector) {
		for err in self.registry.collisions() {
			out.error(err.clone());
		}
		self.check_element_parents(out);
		for err in self.index.collisions() {
			out.error(err.clone());
		}
		if out.halted() {
			return;
		}

		for (_, decl) in self.index.iter() {
			self.check_coordinate(decl, &decl.coordinate, out);
			if let Some(pinned) = decl.base.as_ref().and_then(|b| b.coordinate.as_ref()) {
				self.check_coordinate(decl, pinned, out);
			}
		}
		if out.halted() {
			return;
		}

		self.check_member_consistency(out);
	}

	fn check_element_parents(&self, out: &mut Collector) {
		for dimension in self.registry.dimensions() {
			for element in dimension.elements() {
				let Some(parent) = element.parent() else {
					continue;
				};
				let problem = if !dimension.contains(parent) {
					ParentProblem::Unregistered
				} else if dimension.ancestors(element.name()).any(|a| a == element.name()) {
					ParentProblem::Cycle
				} else {
					continue;
				};
				out.error(ModelError::InvalidElementParent {
					dimension: Arc::from(dimension.name()),
					element: Arc::from(element.name()),
					parent: Arc::from(parent),
					problem,
					module: element.owner().clone(),
				});
			}
		}
	}

	fn check_coordinate(&self, decl: &ClassifierDeclaration, coordinate: &Coordinate, out: &mut Collector) {
		for (dimension, element) in coordinate.iter() {
			let part = match self.registry.dimension(dimension) {
				None => UndeclaredPart::Dimension,
				Some(d) if !d.contains(element) => UndeclaredPart::Element,
				Some(_) => continue,
			};
			out.error(ModelError::UndeclaredCoordinate {
				key: decl.key(),
				dimension: Arc::from(dimension),
				element: Arc::from(element),
				part,
				module: decl.module.clone(),
			});
		}
	}

	/// Non-override declarations of one name must agree on the kind of every
	/// member they share. Each member is compared with its first declaration.
	fn check_member_consistency(&self, out: &mut Collector) {
		for name in self.index.names() {
			let mut first: FxHashMap<&str, (&SemanticType, DeclId)> = FxHashMap::default();
			for &id in self.index.ids_by_name(name) {
				let decl = &self.index[id];
				if decl.is_override {
					continue;
				}
				for member in &decl.members {
					match first.get(&*member.name) {
						None => {
							first.insert(&*member.name, (&member.ty, id));
						}
						Some(&(existing, owner)) if owner != id && !existing.is_compatible_with(&member.ty) => {
							out.error(ModelError::ConflictingMember {
								key: decl.key(),
								member: member.name.clone(),
								existing: existing.clone(),
								incoming: member.ty.clone(),
								existing_owner: self.index[owner].key(),
								module: decl.module.clone(),
							});
						}
						Some(_) => {}
					}
				}
			}
		}
	}

	/// Links every declaration to its base and orders the override graph.
	///
	/// Each cycle is reported once, against its first-inserted declaration, and
	/// every name on it is marked failed. A link error on a declaration that sits
	/// on a cycle is folded into the cycle's diagnostic.
	pub(crate) fn check_overrides(&self, out: &mut Collector) -> (OverrideGraph, TopoOrder) {
		let (graph, link_errors) = OverrideGraph::link(self.index, self.registry);
		let order = graph.order();

		let on_cycle: FxHashSet<DeclId> = order.cycles.iter().flatten().copied().collect();
		for (id, err) in link_errors {
			if !on_cycle.contains(&id) {
				out.error(err);
			}
		}

		for cycle in &order.cycles {
			let Some(&head) = cycle.first() else {
				continue;
			};
			let first = &self.index[head];
			let mut path: Vec<DeclarationKey> = cycle.iter().map(|&id| self.index[id].key()).collect();
			path.push(first.key());
			out.error(ModelError::CyclicOverride {
				key: first.key(),
				path,
				module: first.module.clone(),
			});
			for &id in cycle {
				out.poison(&self.index[id].name);
			}
		}
		(graph, order)
	}

	/// Every declaration must have an effective classifier unless its name, or a
	/// name along its base chain, already failed.
	pub(crate) fn check_resolution(&self, graph: &OverrideGraph, resolution: &Resolution, out: &mut Collector) {
		for (id, decl) in self.index.iter() {
			if resolution.get(id).is_some() || self.excused(id, graph, out) {
				continue;
			}
			out.push(
				Diagnostic::new(
					DiagnosticKind::IncompleteResolution,
					format!("classifier {} has no effective classifier", decl.key()),
				)
				.with_key(decl.key())
				.with_module(decl.module.clone()),
			);
		}
	}

	fn excused(&self, id: DeclId, graph: &OverrideGraph, out: &Collector) -> bool {
		let mut cursor = Some(id);
		for _ in 0..=graph.len() {
			let Some(current) = cursor else {
				return false;
			};
			if out.has_failed(&self.index[current].name) {
				return true;
			}
			cursor = graph.base(current);
		}
		// Only a cycle walks this far, and cycle names are always marked failed.
		true
	}

	/// Warns about registered elements that no declaration coordinate selects,
	/// directly or through a descendant element.
	pub(crate) fn check_usage(&self, out: &mut Collector) {
		let mut used: FxHashSet<(&str, &str)> = FxHashSet::default();
		for (dimension, element) in self.index.iter().flat_map(|(_, d)| d.coordinate.iter()) {
			used.insert((dimension, element));
			if let Some(d) = self.registry.dimension(dimension) {
				used.extend(d.ancestors(element).map(|a| (dimension, a)));
			}
		}
		for dimension in self.registry.dimensions() {
			for element in dimension.elements() {
				if used.contains(&(dimension.name(), element.name())) {
					continue;
				}
				out.push(
					Diagnostic::new(
						DiagnosticKind::UnusedElement,
						format!("element {:?} of dimension {:?} is not used by any declaration", element.name(), dimension.name()),
					)
					.with_dimension(Arc::from(dimension.name()))
					.with_module(element.owner().clone()),
				);
			}
		}
	}
}

#[cfg(test)]
mod tests;
