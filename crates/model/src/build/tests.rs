use super::*;
use crate::coordinate::Coordinate;
use crate::declaration::{BaseRef, SemanticType};

fn ty(s: &str) -> SemanticType {
	s.parse().unwrap()
}

fn scopes(module: &str) -> ModuleContribution {
	ModuleContribution::new(module)
		.element("Scope", "Global")
		.element_under("Scope", "User", "Global")
}

#[test]
fn test_phase_transitions_only_move_forward() {
	use BuildPhase::*;
	use ValidationStage::*;

	let happy = [Scanning, Indexing, Validating(Structure), Resolving, Validating(Resolution), Frozen];
	for pair in happy.windows(2) {
		assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
		assert!(!pair[1].can_advance_to(pair[0]), "{} -> {}", pair[1], pair[0]);
	}
	for phase in &happy[..5] {
		assert!(phase.can_advance_to(Failed));
	}
	assert!(!Frozen.can_advance_to(Failed));
	assert!(!Failed.can_advance_to(Scanning));
	assert!(!Scanning.can_advance_to(Resolving));
}

#[test]
fn test_options_from_toml() {
	let options = BuildOptions::from_toml_str(
		r#"
		[build]
		strictness = "strict"
		report-warnings = false

		[other]
		ignored = true
		"#,
	)
	.unwrap();
	assert_eq!(options, BuildOptions::strict().with_warnings(false));

	assert_eq!(BuildOptions::from_toml_str("").unwrap(), BuildOptions::default());
	assert_eq!(
		BuildOptions::from_toml_str("[build]\nstrictness = \"collect\"").unwrap(),
		BuildOptions::collect()
	);
	assert!(BuildOptions::from_toml_str("[build]\nstrictness = \"lenient\"").is_err());
	assert!(BuildOptions::from_toml_str("[build]\nunknown-key = 1").is_err());
}

#[test]
fn test_build_empty_space() {
	let space = ModelSpaceBuilder::default().build().unwrap();
	assert!(space.is_empty());
	assert_eq!(space.dimensions().len(), 0);
}

#[test]
fn test_contribute_reports_rejections_and_keeps_the_rest() {
	let builder = ModelSpaceBuilder::default();
	builder.contribute(scopes("core")).unwrap();

	let rejected = builder
		.contribute(
			ModuleContribution::new("accounts")
				.element("Scope", "User")
				.element("Scope", "Admin")
				.declare(ClassifierDeclaration::new("Profile", Coordinate::new())),
		)
		.unwrap_err();
	assert_eq!(rejected.module.as_str(), "accounts");
	assert_eq!(rejected.errors.len(), 1);

	let failure = builder.build().unwrap_err();
	assert_eq!(failure.phase(), BuildPhase::Validating(ValidationStage::Structure));
	assert_eq!(failure.len(), 1);
	assert!(failure.contains(DiagnosticKind::DuplicateElement));
}

#[test]
fn test_contribution_stamps_declarations_with_module() {
	let builder = ModelSpaceBuilder::default();
	let mut contribution = scopes("core");
	contribution
		.declarations
		.push(ClassifierDeclaration::new("Profile", Coordinate::new().with("Scope", "User")));
	builder.contribute(contribution).unwrap();

	let space = builder.build().unwrap();
	let profile = space.classifier("Profile", None).unwrap();
	assert_eq!(profile.module().as_str(), "core");
}

#[test]
fn test_concurrent_contributions() {
	let builder = ModelSpaceBuilder::default();
	builder.contribute(scopes("core")).unwrap();

	std::thread::scope(|s| {
		for i in 0..8 {
			let builder = &builder;
			s.spawn(move || {
				let module = format!("module{i}");
				let contribution = ModuleContribution::new(module.as_str())
					.element("Tenant", format!("T{i}"))
					.declare(
						ClassifierDeclaration::new(format!("Entity{i}"), Coordinate::new().with("Tenant", format!("T{i}")))
							.member("Id", ty("int")),
					);
				builder.contribute(contribution).unwrap();
			});
		}
	});

	let space = builder.build().unwrap();
	assert_eq!(space.len(), 8);
	assert_eq!(space.dimension("Tenant").unwrap().len(), 8);
}

#[test]
fn test_strict_stops_at_first_error() {
	let contributions = [
		scopes("core"),
		ModuleContribution::new("a")
			.declare(ClassifierDeclaration::new("A", Coordinate::new().with("Layer", "Domain")))
			.declare(ClassifierDeclaration::new("B", Coordinate::new()).based_on(BaseRef::named("Missing"))),
	];

	let strict = build_model_space(contributions.clone(), &BuildOptions::strict()).unwrap_err();
	assert_eq!(strict.len(), 1);
	assert!(strict.contains(DiagnosticKind::UndeclaredCoordinate));

	let collected = build_model_space(contributions, &BuildOptions::collect()).unwrap_err();
	assert_eq!(collected.len(), 2);
	assert!(collected.contains(DiagnosticKind::UndeclaredCoordinate));
	assert!(collected.contains(DiagnosticKind::UnresolvedBaseReference));
	// The first error was structural even though resolution ran too.
	assert_eq!(collected.phase(), BuildPhase::Validating(ValidationStage::Structure));
}

#[test]
fn test_resolution_failure_phase() {
	let failure = build_model_space(
		[scopes("core").declare(
			ClassifierDeclaration::new("Profile", Coordinate::new().with("Scope", "User")).overriding(),
		)],
		&BuildOptions::default(),
	)
	.unwrap_err();
	assert_eq!(failure.phase(), BuildPhase::Resolving);
	assert!(failure.contains(DiagnosticKind::UnresolvedBaseReference));
	assert!(failure.to_string().starts_with("model build failed while resolving"));
}

#[test]
fn test_warnings_can_be_disabled() {
	let contributions = [scopes("core").declare(ClassifierDeclaration::new("Profile", Coordinate::new()))];

	let space = build_model_space(contributions.clone(), &BuildOptions::default()).unwrap();
	let kinds: Vec<_> = space.warnings().iter().map(|w| w.kind).collect();
	assert_eq!(kinds, [DiagnosticKind::UnusedElement, DiagnosticKind::UnusedElement]);

	let quiet = build_model_space(contributions, &BuildOptions::default().with_warnings(false)).unwrap();
	assert!(quiet.warnings().is_empty());
}
