use super::{DimensionRegistry, RegisterOutcome};
use crate::coordinate::{Coordinate, ElementOrder};
use crate::declaration::ModuleId;
use crate::error::ModelError;

#[test]
fn test_first_seen_order() {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "Global", &core).unwrap();
	registry.register_element("Layer", "Domain", &core).unwrap();
	registry.register_element("Scope", "User", &core).unwrap();

	let names: Vec<_> = registry.dimensions().map(|d| d.name()).collect();
	assert_eq!(names, ["Scope", "Layer"]);

	let scope = registry.dimension("Scope").unwrap();
	let elements: Vec<_> = scope.elements().map(|e| e.name()).collect();
	assert_eq!(elements, ["Global", "User"]);
}

#[test]
fn test_dimensions_iterator_restarts() {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "Global", &core).unwrap();
	registry.register_element("Layer", "Domain", &core).unwrap();

	let iter = registry.dimensions();
	let first: Vec<_> = iter.clone().map(|d| d.name().to_string()).collect();
	let second: Vec<_> = iter.map(|d| d.name().to_string()).collect();
	assert_eq!(first, second);
}

#[test]
fn test_same_module_reregistration_is_idempotent() {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	assert_eq!(registry.register_element("Scope", "User", &core), Ok(RegisterOutcome::InsertedNew));
	assert_eq!(registry.register_element("Scope", "User", &core), Ok(RegisterOutcome::AlreadyPresent));
	assert!(registry.collisions().is_empty());
	assert_eq!(registry.dimension("Scope").unwrap().len(), 1);
}

#[test]
fn test_duplicate_element_from_other_module_is_rejected() {
	let core = ModuleId::new("core");
	let accounts = ModuleId::new("accounts");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "User", &core).unwrap();

	let err = registry.register_element("Scope", "User", &accounts).unwrap_err();
	match &err {
		ModelError::DuplicateElement { dimension, element, owner, module } => {
			assert_eq!(&**dimension, "Scope");
			assert_eq!(&**element, "User");
			assert_eq!(owner, &core);
			assert_eq!(module, &accounts);
		}
		other => panic!("unexpected error: {other:?}"),
	}

	// First occurrence keeps ownership.
	let user = registry.dimension("Scope").unwrap().element("User").unwrap();
	assert_eq!(user.owner(), &core);
	assert_eq!(registry.collisions(), &[err]);
}

#[test]
fn test_same_element_name_in_different_dimensions() {
	let core = ModuleId::new("core");
	let accounts = ModuleId::new("accounts");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "Default", &core).unwrap();
	registry.register_element("Layer", "Default", &accounts).unwrap();
	assert!(registry.contains("Scope", "Default"));
	assert!(registry.contains("Layer", "Default"));
	assert!(!registry.contains("Layer", "Global"));
}

#[test]
fn test_element_parents_order_the_dimension() {
	let core = ModuleId::new("core");
	let mut registry = DimensionRegistry::new();
	registry.register_element("Scope", "Global", &core).unwrap();
	registry.register_element_under("Scope", "User", Some("Global"), &core).unwrap();
	registry.register_element_under("Scope", "Admin", Some("User"), &core).unwrap();

	let scope = registry.dimension("Scope").unwrap();
	assert_eq!(scope.element("Admin").unwrap().parent(), Some("User"));
	assert_eq!(scope.ancestors("Admin").collect::<Vec<_>>(), ["User", "Global"]);

	assert!(registry.descends("Scope", "Admin", "Global"));
	assert!(!registry.descends("Scope", "Global", "User"));

	let admin = Coordinate::new().with("Scope", "Admin");
	assert!(admin.refines_in(&Coordinate::new().with("Scope", "Global"), &registry));
}

#[test]
fn test_parent_cycle_terminates() {
	let core = ModuleId::new("core");
	let other = ModuleId::new("other");
	let mut registry = DimensionRegistry::new();
	registry.register_element_under("Scope", "A", Some("B"), &core).unwrap();
	registry.register_element_under("Scope", "B", Some("A"), &other).unwrap();

	let scope = registry.dimension("Scope").unwrap();
	assert_eq!(scope.ancestors("A").count(), 2);
	assert!(!registry.descends("Scope", "A", "C"));
}
