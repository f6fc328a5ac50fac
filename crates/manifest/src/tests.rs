use std::path::Path;

use lattice_model::{BaseRef, BuildOptions, Coordinate, ElementContribution, SemanticType, Strictness, build_model_space};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::{Manifest, ManifestError, OPTIONS_FILE, load_dir, load_file, load_options, manifest_paths};

const ACCOUNTS: &str = r#"
module = "accounts"

[dimensions]
Scope = ["Global", { name = "User", parent = "Global" }]

[[classifier]]
name = "Accounts.Profile"
at = { Scope = "Global" }
members = [{ name = "Email", type = "string" }]

[[classifier]]
name = "Accounts.Profile"
at = { Scope = "User" }
override = true
members = [{ name = "Nickname", type = "string" }, { name = "Email", type = "string(320)" }]
"#;

fn write(dir: &Path, name: &str, content: &str) {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap();
	}
	std::fs::write(path, content).unwrap();
}

#[test]
fn test_parse_manifest() {
	let contribution = Manifest::parse(ACCOUNTS, Path::new("accounts.toml"))
		.unwrap()
		.into_contribution(Path::new("accounts.toml"))
		.unwrap();

	assert_eq!(contribution.module.as_str(), "accounts");
	assert_eq!(
		contribution.elements,
		[
			ElementContribution {
				dimension: "Scope".into(),
				element: "Global".into(),
				parent: None,
			},
			ElementContribution {
				dimension: "Scope".into(),
				element: "User".into(),
				parent: Some("Global".into()),
			},
		]
	);
	assert_eq!(contribution.declarations.len(), 2);

	let user = &contribution.declarations[1];
	assert!(user.is_override);
	assert_eq!(user.coordinate, Coordinate::new().with("Scope", "User"));
	assert_eq!(user.module.as_str(), "accounts");
	assert_eq!(user.members[1].ty, SemanticType::new("string").with_representation("320"));
}

#[test]
fn test_dimensions_keep_written_order() {
	let input = r#"
module = "m"

[dimensions]
Scope = ["Global"]
Layer = ["Domain", "Api"]
"#;
	let contribution = Manifest::parse(input, Path::new("m.toml")).unwrap().into_contribution(Path::new("m.toml")).unwrap();
	let elements: Vec<_> = contribution
		.elements
		.iter()
		.map(|e| format!("{}:{}", e.dimension, e.element))
		.collect();
	assert_eq!(elements, ["Scope:Global", "Layer:Domain", "Layer:Api"]);
}

#[test]
fn test_base_at_without_base_targets_own_name() {
	let input = r#"
module = "m"

[[classifier]]
name = "Foo"
at = { Scope = "User" }
override = true
base-at = { Scope = "Global" }
"#;
	let contribution = Manifest::parse(input, Path::new("m.toml")).unwrap().into_contribution(Path::new("m.toml")).unwrap();
	assert_eq!(
		contribution.declarations[0].base,
		Some(BaseRef::pinned("Foo", Coordinate::new().with("Scope", "Global")))
	);
}

#[test]
fn test_invalid_manifests() {
	let origin = Path::new("bad.toml");

	let unknown_field = "module = \"m\"\nflavour = 1\n";
	assert!(matches!(Manifest::parse(unknown_field, origin), Err(ManifestError::Parse { .. })));

	let bad_type = "module = \"m\"\n[[classifier]]\nname = \"Foo\"\nmembers = [{ name = \"A\", type = \"int(\" }]\n";
	let err = Manifest::parse(bad_type, origin).unwrap().into_contribution(origin).unwrap_err();
	assert!(matches!(&err, ManifestError::Invalid { classifier, .. } if classifier == "Foo"), "{err}");

	let orphan_base_at = "module = \"m\"\n[[classifier]]\nname = \"Foo\"\nbase-at = { Scope = \"Global\" }\n";
	let err = Manifest::parse(orphan_base_at, origin).unwrap().into_contribution(origin).unwrap_err();
	assert!(err.to_string().contains("base-at"), "{err}");
}

#[test]
fn test_load_dir_in_path_order() {
	let dir = TempDir::new().unwrap();
	write(dir.path(), "b.toml", "module = \"b\"\n");
	write(dir.path(), "a/nested.toml", "module = \"nested\"\n");
	write(dir.path(), "a.toml", "module = \"a\"\n");
	write(dir.path(), "notes.md", "not a manifest");
	write(dir.path(), OPTIONS_FILE, "[build]\nstrictness = \"strict\"\n");

	let modules: Vec<_> = load_dir(dir.path())
		.unwrap()
		.into_iter()
		.map(|c| c.module.as_str().to_string())
		.collect();
	assert_eq!(modules, ["nested", "a", "b"]);
	assert_eq!(manifest_paths(dir.path()).len(), 3);
}

#[test]
fn test_load_errors_name_the_file() {
	let dir = TempDir::new().unwrap();
	write(dir.path(), "broken.toml", "module = ");

	let err = load_dir(dir.path()).unwrap_err();
	assert!(matches!(&err, ManifestError::Parse { path, .. } if path.ends_with("broken.toml")), "{err}");

	let missing = dir.path().join("missing");
	assert!(matches!(load_dir(&missing), Err(ManifestError::Io { .. })));
	assert!(matches!(load_file(&missing.join("x.toml")), Err(ManifestError::Io { .. })));
}

#[test]
fn test_load_options() {
	let dir = TempDir::new().unwrap();
	assert_eq!(load_options(dir.path()).unwrap(), BuildOptions::default());

	write(dir.path(), OPTIONS_FILE, "[build]\nstrictness = \"strict\"\nreport-warnings = false\n");
	let options = load_options(dir.path()).unwrap();
	assert_eq!(options.strictness, Strictness::Strict);
	assert!(!options.report_warnings);

	write(dir.path(), OPTIONS_FILE, "[build]\nstrictness = \"lenient\"\n");
	assert!(matches!(load_options(dir.path()), Err(ManifestError::Options { .. })));
}

#[test]
fn test_loaded_manifests_build() {
	let dir = TempDir::new().unwrap();
	write(dir.path(), "accounts.toml", ACCOUNTS);

	let space = build_model_space(load_dir(dir.path()).unwrap(), &BuildOptions::default()).unwrap();
	let user = space
		.classifier("Accounts.Profile", Some(&Coordinate::new().with("Scope", "User")))
		.unwrap();
	let names: Vec<_> = user.members().iter().map(|m| m.name.to_string()).collect();
	assert_eq!(names, ["Email", "Nickname"]);
}
