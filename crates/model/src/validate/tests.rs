use super::ModelValidator;
use crate::build::BuildOptions;
use crate::coordinate::Coordinate;
use crate::declaration::{BaseRef, ClassifierDeclaration, ModuleId, SemanticType};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::dimension::DimensionRegistry;
use crate::index::DeclarationIndex;

fn at(pairs: &[(&str, &str)]) -> Coordinate {
	pairs.iter().copied().collect()
}

fn ty(s: &str) -> SemanticType {
	s.parse().unwrap()
}

fn registry() -> DimensionRegistry {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "Global", &core).unwrap();
	registry.register_element_under("Scope", "User", Some("Global"), &core).unwrap();
	registry
}

fn decl(name: &str, coordinate: Coordinate) -> ClassifierDeclaration {
	ClassifierDeclaration::new(name, coordinate).from_module(ModuleId::new("test"))
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
	diagnostics.iter().map(|d| d.kind).collect()
}

fn errors_only() -> BuildOptions {
	BuildOptions::default().with_warnings(false)
}

#[test]
fn test_clean_model_has_no_errors() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", at(&[("Scope", "Global")])).member("A", ty("int"))).unwrap();
	index
		.add(decl("Foo", at(&[("Scope", "User")])).overriding().member("B", ty("string")))
		.unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&BuildOptions::default());
	assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_undeclared_coordinate_parts() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", at(&[("Layer", "Domain")]))).unwrap();
	index.add(decl("Bar", at(&[("Scope", "Admin")]))).unwrap();
	index
		.add(decl("Baz", Coordinate::new()).based_on(BaseRef::pinned("Foo", at(&[("Tenant", "Acme")]))))
		.unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	let undeclared: Vec<_> = diagnostics
		.iter()
		.filter(|d| d.kind == DiagnosticKind::UndeclaredCoordinate)
		.map(|d| (d.qualified_name.as_deref().unwrap_or_default().to_string(), d.dimension.as_deref().unwrap_or_default().to_string()))
		.collect();
	assert_eq!(
		undeclared,
		[
			("Foo".to_string(), "Layer".to_string()),
			("Bar".to_string(), "Scope".to_string()),
			("Baz".to_string(), "Tenant".to_string()),
		]
	);
	assert!(diagnostics[1].message.contains("element \"Scope=Admin\""), "{}", diagnostics[1].message);
}

#[test]
fn test_invalid_element_parents() {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	registry.register_element_under("Scope", "User", Some("Nowhere"), &core).unwrap();
	registry.register_element_under("Layer", "A", Some("B"), &core).unwrap();
	registry.register_element_under("Layer", "B", Some("A"), &core).unwrap();
	let index = DeclarationIndex::new();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::InvalidElementParent; 3]);
	assert!(diagnostics[0].message.contains("not an element"));
	assert!(diagnostics[1].message.contains("leads back"));
}

#[test]
fn test_strict_validation_reports_one_error() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", at(&[("Layer", "Domain")]))).unwrap();
	index.add(decl("Bar", at(&[("Layer", "Data")]))).unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&BuildOptions::strict().with_warnings(false));
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::UndeclaredCoordinate]);
}

#[test]
fn test_one_diagnostic_per_cycle() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("A", Coordinate::new()).based_on(BaseRef::named("C"))).unwrap();
	index.add(decl("B", Coordinate::new()).based_on(BaseRef::named("A"))).unwrap();
	index.add(decl("C", Coordinate::new()).based_on(BaseRef::named("B"))).unwrap();
	// Downstream of the cycle: skipped without a diagnostic of its own.
	index.add(decl("D", Coordinate::new()).based_on(BaseRef::named("C"))).unwrap();
	index.add(decl("E", Coordinate::new())).unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::CyclicOverride]);
	assert_eq!(diagnostics[0].qualified_name.as_deref(), Some("A"));
	assert!(diagnostics[0].message.contains("A@{} -> C@{} -> B@{} -> A@{}"), "{}", diagnostics[0].message);
}

#[test]
fn test_non_ancestor_pin_outside_a_cycle_is_reported() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", at(&[("Scope", "User")]))).unwrap();
	index
		.add(decl("Bar", at(&[("Scope", "Global")])).based_on(BaseRef::pinned("Foo", at(&[("Scope", "User")]))))
		.unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::UnresolvedBaseReference]);
	assert_eq!(diagnostics[0].qualified_name.as_deref(), Some("Bar"));
}

#[test]
fn test_member_kind_conflict_between_plain_declarations() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", at(&[("Scope", "Global")])).member("A", ty("int"))).unwrap();
	index.add(decl("Foo", at(&[("Scope", "User")])).member("A", ty("string"))).unwrap();
	// Representation differences are compatible.
	index.add(decl("Bar", at(&[("Scope", "Global")])).member("A", ty("int(32)"))).unwrap();
	index.add(decl("Bar", at(&[("Scope", "User")])).member("A", ty("int(64)"))).unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::ConflictingMember]);
	assert_eq!(diagnostics[0].qualified_name.as_deref(), Some("Foo"));
	assert_eq!(diagnostics[0].coordinate, Some(at(&[("Scope", "User")])));
}

#[test]
fn test_unused_elements_warn() {
	let registry = registry();
	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", Coordinate::new())).unwrap();

	let diagnostics = ModelValidator::new(&registry, &index).validate(&BuildOptions::default());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::UnusedElement; 2]);
	assert!(diagnostics.iter().all(|d| !d.is_error()));

	// Selecting `User` also uses its parent `Global`.
	index.add(decl("Bar", at(&[("Scope", "User")]))).unwrap();
	let diagnostics = ModelValidator::new(&registry, &index).validate(&BuildOptions::default());
	assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_duplicates_recorded_at_registration_surface() {
	let core = ModuleId::new("core");
	let mut registry = registry();
	assert!(registry.register_element("Scope", "User", &ModuleId::new("other")).is_err());
	assert!(registry.register_element("Scope", "User", &core).is_ok());

	let mut index = DeclarationIndex::new();
	index.add(decl("Foo", Coordinate::new())).unwrap();
	assert!(index.add(decl("Foo", Coordinate::new())).is_err());

	let diagnostics = ModelValidator::new(&registry, &index).validate(&errors_only());
	assert_eq!(kinds(&diagnostics), [DiagnosticKind::DuplicateElement, DiagnosticKind::DuplicateDeclaration]);
}
