#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::build::{BuildOptions, build_model_space};
use crate::coordinate::Coordinate;
use crate::declaration::{BaseRef, ClassifierDeclaration, DeclarationKey, ModuleContribution, SemanticType};
use crate::diagnostic::DiagnosticKind;
use crate::space::{ModelHost, ModelSpace};

fn at(pairs: &[(&str, &str)]) -> Coordinate {
	pairs.iter().copied().collect()
}

fn ty(s: &str) -> SemanticType {
	s.parse().unwrap()
}

fn scopes() -> ModuleContribution {
	ModuleContribution::new("core")
		.element("Scope", "Global")
		.element_under("Scope", "User", "Global")
}

fn member_types(space: &ModelSpace, name: &str, coordinate: &Coordinate) -> Vec<(String, String)> {
	space
		.classifier(name, Some(coordinate))
		.unwrap()
		.members()
		.iter()
		.map(|m| (m.name.to_string(), m.ty.to_string()))
		.collect()
}

/// Contributions spread over four modules, with bases crossing module lines.
fn scattered_contributions() -> Vec<ModuleContribution> {
	vec![
		ModuleContribution::new("core")
			.element("Scope", "Global")
			.element("Layer", "Domain")
			.declare(ClassifierDeclaration::new("Entity", Coordinate::new()).member("Id", ty("int"))),
		ModuleContribution::new("users")
			.element_under("Scope", "User", "Global")
			.declare(
				ClassifierDeclaration::new("Profile", at(&[("Scope", "Global")]))
					.based_on(BaseRef::named("Entity"))
					.member("Name", ty("string")),
			)
			.declare(
				ClassifierDeclaration::new("Profile", at(&[("Scope", "User")]))
					.overriding()
					.member("Nickname", ty("string")),
			),
		ModuleContribution::new("domain")
			.declare(
				ClassifierDeclaration::new("Profile", at(&[("Scope", "User"), ("Layer", "Domain")]))
					.overriding()
					.member("Name", ty("string(ascii)")),
			)
			.declare(
				ClassifierDeclaration::new("Audit", at(&[("Layer", "Domain")]))
					.based_on(BaseRef::pinned("Entity", Coordinate::new()))
					.member("At", ty("timestamp")),
			),
		ModuleContribution::new("billing")
			.declare(ClassifierDeclaration::new("Order", Coordinate::new()).member("Total", ty("decimal(18,2)")))
			.declare(
				ClassifierDeclaration::new("Order", at(&[("Scope", "Global")]))
					.overriding()
					.member("Total", ty("int")),
			),
	]
}

type Fingerprint = BTreeMap<DeclarationKey, (Vec<(String, String, DeclarationKey)>, Vec<DeclarationKey>)>;

/// Everything about a space's classifiers that must not depend on contribution order.
fn fingerprint(space: &ModelSpace) -> Fingerprint {
	space
		.names()
		.flat_map(|name| space.classifiers(name))
		.map(|c| {
			let members = c
				.members()
				.iter()
				.map(|m| (m.name.to_string(), m.ty.to_string(), m.declared_by.clone()))
				.collect();
			(c.key().clone(), (members, c.chain().to_vec()))
		})
		.collect()
}

/// Must keep element names unique within a dimension; the first module keeps ownership.
///
/// - Enforced in: `DimensionRegistry::register_element`
/// - Failure symptom: two modules both own `Scope=User` and coordinates become ambiguous.
#[cfg_attr(test, test)]
pub(crate) fn test_element_uniqueness() {
	let space = build_model_space([scopes()], &BuildOptions::default()).unwrap();
	for dimension in space.dimensions() {
		let mut names: Vec<_> = dimension.elements().map(|e| e.name()).collect();
		let total = names.len();
		names.sort_unstable();
		names.dedup();
		assert_eq!(names.len(), total, "duplicate element in {}", dimension.name());
	}

	let failure = build_model_space([scopes(), ModuleContribution::new("rogue").element("Scope", "User")], &BuildOptions::default())
		.unwrap_err();
	assert_eq!(failure.len(), 1);
	let diagnostic = &failure.as_slice()[0];
	assert_eq!(diagnostic.kind, DiagnosticKind::DuplicateElement);
	assert_eq!(diagnostic.dimension.as_deref(), Some("Scope"));
	assert_eq!(diagnostic.module.as_ref().map(|m| m.as_str()), Some("rogue"));
}

/// Must keep `(qualified name, coordinate)` unique across all modules.
///
/// - Enforced in: `DeclarationIndex::add`
/// - Failure symptom: the model silently depends on which module loaded last.
#[cfg_attr(test, test)]
pub(crate) fn test_declaration_uniqueness() {
	let space = build_model_space(scattered_contributions(), &BuildOptions::default()).unwrap();
	let keys: Vec<_> = space.declarations().map(|d| d.key()).collect();
	let mut unique = keys.clone();
	unique.sort();
	unique.dedup();
	assert_eq!(unique.len(), keys.len());

	let failure = build_model_space(
		[
			scopes().declare(ClassifierDeclaration::new("Profile", Coordinate::new())),
			ModuleContribution::new("other").declare(ClassifierDeclaration::new("Profile", Coordinate::new()).member("X", ty("int"))),
		],
		&BuildOptions::default(),
	)
	.unwrap_err();
	assert_eq!(failure.len(), 1);
	assert!(failure.contains(DiagnosticKind::DuplicateDeclaration));
}

/// Must produce the same effective classifiers whatever order modules contribute in.
///
/// - Enforced in: `DeclarationIndex::base_of`, `OverrideGraph::order`
/// - Failure symptom: the effective model changes with module load order.
#[cfg_attr(test, test)]
pub(crate) fn test_contribution_order_independence() {
	let contributions = scattered_contributions();
	let reference = fingerprint(&build_model_space(contributions.clone(), &BuildOptions::default()).unwrap());

	for reversed in [false, true] {
		for shift in 0..contributions.len() {
			let mut reordered = contributions.clone();
			if reversed {
				reordered.reverse();
			}
			reordered.rotate_left(shift);
			let space = build_model_space(reordered, &BuildOptions::default()).unwrap();
			assert_eq!(fingerprint(&space), reference, "reversed={reversed} shift={shift}");
		}
	}
}

/// Must reject override cycles, one diagnostic per cycle, whether the cycle
/// crosses names or stays within one name.
///
/// - Enforced in: `OverrideGraph::link`, `OverrideGraph::order`, `ModelValidator::check_overrides`
/// - Failure symptom: resolution loops forever or merges a classifier into itself.
#[cfg_attr(test, test)]
pub(crate) fn test_acyclicity() {
	let failure = build_model_space(
		[ModuleContribution::new("loop")
			.declare(ClassifierDeclaration::new("A", Coordinate::new()).based_on(BaseRef::named("B")))
			.declare(ClassifierDeclaration::new("B", Coordinate::new()).based_on(BaseRef::named("A")))],
		&BuildOptions::default(),
	)
	.unwrap_err();

	assert_eq!(failure.len(), 1);
	let diagnostic = &failure.as_slice()[0];
	assert_eq!(diagnostic.kind, DiagnosticKind::CyclicOverride);
	assert_eq!(diagnostic.qualified_name.as_deref(), Some("A"));
	assert!(diagnostic.message.contains("A@{} -> B@{} -> A@{}"), "{}", diagnostic.message);

	// Two overrides of one name pinned to each other. The pin from `Global` to
	// `User` points at a descendant, but the cycle is what gets reported.
	let global = at(&[("Scope", "Global")]);
	let user = at(&[("Scope", "User")]);
	let failure = build_model_space(
		[scopes()
			.declare(
				ClassifierDeclaration::new("Foo", global.clone())
					.overriding()
					.based_on(BaseRef::pinned("Foo", user.clone())),
			)
			.declare(
				ClassifierDeclaration::new("Foo", user)
					.overriding()
					.based_on(BaseRef::pinned("Foo", global.clone())),
			)],
		&BuildOptions::default(),
	)
	.unwrap_err();

	assert_eq!(failure.len(), 1, "{failure}");
	let diagnostic = &failure.as_slice()[0];
	assert_eq!(diagnostic.kind, DiagnosticKind::CyclicOverride);
	assert_eq!(diagnostic.qualified_name.as_deref(), Some("Foo"));
	assert_eq!(diagnostic.coordinate, Some(global));
	assert!(
		diagnostic
			.message
			.contains("Foo@{Scope: Global} -> Foo@{Scope: User} -> Foo@{Scope: Global}"),
		"{}",
		diagnostic.message
	);
}

/// Must merge an override's members over its base: inherited members first, new ones appended.
/// Only elements registered under a parent nest; flat elements do not.
///
/// - Enforced in: `OverrideResolver::merge`, `DeclarationIndex::base_of`
/// - Failure symptom: members go missing or appear twice in the effective classifier.
#[cfg_attr(test, test)]
pub(crate) fn test_merge_correctness() {
	let space = build_model_space(
		[scopes()
			.declare(ClassifierDeclaration::new("Foo", at(&[("Scope", "Global")])).member("A", ty("int")))
			.declare(
				ClassifierDeclaration::new("Foo", at(&[("Scope", "User")]))
					.overriding()
					.member("B", ty("string")),
			)],
		&BuildOptions::default(),
	)
	.unwrap();

	let pair = |n: &str, t: &str| (n.to_string(), t.to_string());
	assert_eq!(member_types(&space, "Foo", &at(&[("Scope", "User")])), [pair("A", "int"), pair("B", "string")]);
	assert_eq!(member_types(&space, "Foo", &at(&[("Scope", "Global")])), [pair("A", "int")]);

	// Registered as bare `(dimension, element)` pairs, `User` does not refine
	// `Global`, so the override has nothing to inherit from.
	let flat = ModuleContribution::new("core")
		.element("Scope", "Global")
		.element("Scope", "User")
		.declare(ClassifierDeclaration::new("Foo", at(&[("Scope", "Global")])).member("A", ty("int")))
		.declare(
			ClassifierDeclaration::new("Foo", at(&[("Scope", "User")]))
				.overriding()
				.member("B", ty("string")),
		);
	let failure = build_model_space([flat], &BuildOptions::default()).unwrap_err();
	assert_eq!(failure.len(), 1);
	let diagnostic = &failure.as_slice()[0];
	assert_eq!(diagnostic.kind, DiagnosticKind::UnresolvedBaseReference);
	assert_eq!(diagnostic.coordinate, Some(at(&[("Scope", "User")])));
	assert!(
		diagnostic.message.contains("no declaration at the same or an ancestor coordinate"),
		"{}",
		diagnostic.message
	);
}

/// Must let an override's member definition shadow the inherited one.
///
/// - Enforced in: `OverrideResolver::merge`
/// - Failure symptom: the override's representation is ignored at its coordinate.
#[cfg_attr(test, test)]
pub(crate) fn test_override_shadowing() {
	let space = build_model_space(
		[scopes()
			.declare(ClassifierDeclaration::new("Foo", at(&[("Scope", "Global")])).member("A", ty("int(32)")))
			.declare(
				ClassifierDeclaration::new("Foo", at(&[("Scope", "User")]))
					.overriding()
					.member("A", ty("int(64)")),
			)],
		&BuildOptions::default(),
	)
	.unwrap();

	let user = space.classifier("Foo", Some(&at(&[("Scope", "User")]))).unwrap();
	let a = user.member("A").unwrap();
	assert_eq!(a.ty, ty("int(64)"));
	assert_eq!(a.declared_by.coordinate, at(&[("Scope", "User")]));
	assert_eq!(member_types(&space, "Foo", &at(&[("Scope", "Global")]))[0].1, "int(32)");
}

/// Must reject incompatible members shared by non-override declarations of one name.
///
/// - Enforced in: `ModelValidator::check_member_consistency`
/// - Failure symptom: the same member has different kinds depending on coordinate.
#[cfg_attr(test, test)]
pub(crate) fn test_member_consistency() {
	let failure = build_model_space(
		[scopes()
			.declare(ClassifierDeclaration::new("Foo", at(&[("Scope", "Global")])).member("A", ty("int")))
			.declare(ClassifierDeclaration::new("Foo", at(&[("Scope", "User")])).member("A", ty("string")))],
		&BuildOptions::default(),
	)
	.unwrap_err();
	assert_eq!(failure.len(), 1);
	assert!(failure.contains(DiagnosticKind::ConflictingMember));
}

/// Must answer repeated and concurrent queries identically without mutating the space.
///
/// - Enforced in: `ModelSpace::classifier` (takes `&self`, no interior mutability)
/// - Failure symptom: a lookup result depends on earlier lookups or on another thread.
#[cfg_attr(test, test)]
pub(crate) fn test_idempotent_queries() {
	let space = build_model_space(scattered_contributions(), &BuildOptions::default()).unwrap();
	let query = at(&[("Scope", "User"), ("Layer", "Domain")]);
	let first = space.classifier("Profile", Some(&query)).unwrap();

	std::thread::scope(|s| {
		let handles: Vec<_> = (0..4)
			.map(|_| s.spawn(|| (0..16).map(|_| space.classifier("Profile", Some(&query)).unwrap()).collect::<Vec<_>>()))
			.collect();
		for handle in handles {
			for result in handle.join().unwrap() {
				assert_eq!(result, first);
			}
		}
	});
	assert_eq!(space.classifier("Missing", None), space.classifier("Missing", None));
	assert!(space.validate().is_empty());
}

fn ten_names_one_ambiguous() -> Vec<ModuleContribution> {
	let mut valid = ModuleContribution::new("valid").element("Layer", "Domain");
	for i in 0..9 {
		valid = valid.declare(ClassifierDeclaration::new(format!("Valid{i}"), Coordinate::new()).member("Id", ty("int")));
	}
	let broken = ModuleContribution::new("broken")
		.declare(ClassifierDeclaration::new("Broken", at(&[("Scope", "User")])))
		.declare(ClassifierDeclaration::new("Broken", at(&[("Layer", "Domain")])))
		.declare(ClassifierDeclaration::new("Broken", at(&[("Scope", "User"), ("Layer", "Domain")])).overriding());
	vec![scopes(), valid, broken]
}

/// Must fail the whole build when any one name is invalid, reporting exactly
/// the root cause in both strict and collect mode.
///
/// - Enforced in: `ModelSpaceBuilder::build`, `OverrideResolver::resolve_into` (failed names are skipped silently)
/// - Failure symptom: a partially valid model is handed to consumers, or one
///   broken name buries the real error under follow-on diagnostics.
#[cfg_attr(test, test)]
pub(crate) fn test_failure_atomicity() {
	for options in [BuildOptions::strict(), BuildOptions::collect()] {
		let failure = build_model_space(ten_names_one_ambiguous(), &options).unwrap_err();
		assert_eq!(failure.len(), 1, "{:?}", options.strictness);
		let diagnostic = &failure.as_slice()[0];
		assert_eq!(diagnostic.kind, DiagnosticKind::AmbiguousBase);
		assert_eq!(diagnostic.qualified_name.as_deref(), Some("Broken"));
		assert_eq!(diagnostic.coordinate, Some(at(&[("Scope", "User"), ("Layer", "Domain")])));
	}
}

/// Must leave spaces held by readers untouched by later rebuilds.
///
/// - Enforced in: `ModelHost::rebuild`
/// - Failure symptom: a reader observes members that did not exist when it loaded the space.
#[cfg_attr(test, test)]
pub(crate) fn test_rebuild_isolation() {
	let host = ModelHost::default();
	let profile = |members: &[&str]| {
		let mut decl = ClassifierDeclaration::new("Profile", Coordinate::new());
		for m in members {
			decl = decl.member(*m, ty("string"));
		}
		scopes().declare(decl)
	};

	let before = host.rebuild([profile(&["Id"])]).unwrap();
	let held: Arc<ModelSpace> = host.current().unwrap();
	let after = host.rebuild([profile(&["Id", "Email"])]).unwrap();

	assert!(Arc::ptr_eq(&before, &held));
	assert!(!Arc::ptr_eq(&before, &after));
	assert_eq!(held.classifier("Profile", None).unwrap().members().len(), 1);
	assert_eq!(after.classifier("Profile", None).unwrap().members().len(), 2);
	assert_eq!(host.generation(), 2);
}

#[cfg(test)]
mod properties {
	use proptest::prelude::*;

	use super::*;

	proptest! {
		/// Any permutation of module contributions yields the same effective classifiers.
		#[test]
		fn prop_contribution_order_independence(
			order in Just((0..scattered_contributions().len()).collect::<Vec<_>>()).prop_shuffle()
		) {
			let contributions = scattered_contributions();
			let reference = fingerprint(&build_model_space(contributions.clone(), &BuildOptions::default()).unwrap());
			let shuffled: Vec<_> = order.iter().map(|&i| contributions[i].clone()).collect();
			let space = build_model_space(shuffled, &BuildOptions::default()).unwrap();
			prop_assert_eq!(fingerprint(&space), reference);
		}
	}
}
