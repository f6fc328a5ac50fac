//! Override graph: declaration → base declaration edges.
//!
//! Every declaration has at most one base, so the graph is functional: each
//! weakly connected component holds at most one cycle, and every node off a
//! cycle either reaches a root or reaches that cycle.

use std::collections::VecDeque;

use crate::coordinate::ElementOrder;
use crate::error::ModelError;
use crate::index::{DeclId, DeclarationIndex};

/// Resolved base links for every declaration of an index.
#[derive(Debug, Clone, Default)]
pub struct OverrideGraph {
	bases: Vec<Option<DeclId>>,
}

/// Dependency order over an [`OverrideGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoOrder {
	/// Declarations with bases before their dependents. Excludes cycles and
	/// everything downstream of them.
	pub order: Vec<DeclId>,
	/// Each cycle in base order, rotated to start at its first-inserted declaration.
	pub cycles: Vec<Vec<DeclId>>,
}

impl OverrideGraph {
	/// Resolves every declaration's base under `order`.
	///
	/// Errors are returned alongside the graph. A declaration whose base fails to
	/// resolve gets no edge, except when it pins a base that exists: that edge is
	/// kept even if the pinned coordinate is not an ancestor, so a cycle through
	/// it is still found by [`Self::order`].
	pub fn link(index: &DeclarationIndex, order: &impl ElementOrder) -> (Self, Vec<(DeclId, ModelError)>) {
		let mut bases = Vec::with_capacity(index.len());
		let mut errors = Vec::new();
		for (id, _) in index.iter() {
			match index.base_of(id, order) {
				Ok(base) => bases.push(base),
				Err(err) => {
					errors.push((id, err));
					bases.push(index.pinned_base(id));
				}
			}
		}
		(Self { bases }, errors)
	}

	pub fn base(&self, id: DeclId) -> Option<DeclId> {
		self.bases.get(id.index()).copied().flatten()
	}

	pub fn len(&self) -> usize {
		self.bases.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bases.is_empty()
	}

	/// Kahn's algorithm over base edges, seeded in insertion order.
	pub fn order(&self) -> TopoOrder {
		let n = self.bases.len();
		let mut dependents: Vec<Vec<DeclId>> = vec![Vec::new(); n];
		let mut waiting = vec![false; n];
		for (i, base) in self.bases.iter().enumerate() {
			if let Some(base) = base {
				dependents[base.index()].push(DeclId::from_index(i));
				waiting[i] = true;
			}
		}

		let mut queue: VecDeque<DeclId> = (0..n).filter(|&i| !waiting[i]).map(DeclId::from_index).collect();
		let mut order = Vec::with_capacity(n);
		while let Some(id) = queue.pop_front() {
			order.push(id);
			for &dependent in &dependents[id.index()] {
				waiting[dependent.index()] = false;
				queue.push_back(dependent);
			}
		}

		let cycles = if order.len() == n { Vec::new() } else { self.find_cycles(&order) };
		TopoOrder { order, cycles }
	}

	fn find_cycles(&self, ordered: &[DeclId]) -> Vec<Vec<DeclId>> {
		#[derive(Clone, Copy, PartialEq, Eq)]
		enum Mark {
			Unvisited,
			OnPath,
			Done,
		}

		let mut marks = vec![Mark::Unvisited; self.bases.len()];
		for id in ordered {
			marks[id.index()] = Mark::Done;
		}

		let mut cycles = Vec::new();
		for start in 0..self.bases.len() {
			if marks[start] != Mark::Unvisited {
				continue;
			}
			let mut path = Vec::new();
			let mut cursor = Some(DeclId::from_index(start));
			while let Some(id) = cursor {
				match marks[id.index()] {
					Mark::Done => break,
					Mark::OnPath => {
						if let Some(pos) = path.iter().position(|&p| p == id) {
							let mut cycle: Vec<DeclId> = path[pos..].to_vec();
							let first = cycle.iter().enumerate().min_by_key(|&(_, id)| *id).map(|(i, _)| i);
							cycle.rotate_left(first.unwrap_or(0));
							cycles.push(cycle);
						}
						break;
					}
					Mark::Unvisited => {
						marks[id.index()] = Mark::OnPath;
						path.push(id);
						cursor = self.base(id);
					}
				}
			}
			for id in path {
				marks[id.index()] = Mark::Done;
			}
		}
		cycles.sort();
		cycles
	}
}
