//! Loading manifests and build options from disk.

use std::path::{Path, PathBuf};

use lattice_model::{BuildOptions, ModuleContribution};
use walkdir::WalkDir;

use crate::{Manifest, ManifestError};

/// Build options file read from a manifest directory. Never loaded as a manifest.
pub const OPTIONS_FILE: &str = "lattice.toml";

/// Every `*.toml` manifest under `dir`, sorted by path.
pub fn manifest_paths(dir: &Path) -> Vec<PathBuf> {
	let mut paths: Vec<PathBuf> = WalkDir::new(dir)
		.into_iter()
		.filter_map(|entry| match entry {
			Ok(entry) => Some(entry),
			Err(err) => {
				tracing::warn!(error = %err, "skipping unreadable manifest path");
				None
			}
		})
		.filter(|e| e.file_type().is_file())
		.filter(|e| e.path().extension().is_some_and(|x| x == "toml"))
		.filter(|e| e.file_name() != OPTIONS_FILE)
		.map(|e| e.into_path())
		.collect();
	paths.sort();
	paths
}

pub fn load_file(path: &Path) -> Result<ModuleContribution, ManifestError> {
	let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let contribution = Manifest::parse(&content, path)?.into_contribution(path)?;
	tracing::debug!(
		path = %path.display(),
		module = %contribution.module,
		elements = contribution.elements.len(),
		declarations = contribution.declarations.len(),
		"loaded manifest"
	);
	Ok(contribution)
}

/// Loads every manifest under `dir` in path order.
///
/// Stops at the first manifest that fails to load.
pub fn load_dir(dir: &Path) -> Result<Vec<ModuleContribution>, ManifestError> {
	std::fs::read_dir(dir).map_err(|source| ManifestError::Io {
		path: dir.to_path_buf(),
		source,
	})?;
	manifest_paths(dir).iter().map(|path| load_file(path)).collect()
}

/// Reads [`OPTIONS_FILE`] from `dir`, falling back to defaults when it is absent.
pub fn load_options(dir: &Path) -> Result<BuildOptions, ManifestError> {
	let path = dir.join(OPTIONS_FILE);
	let content = match std::fs::read_to_string(&path) {
		Ok(content) => content,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BuildOptions::default()),
		Err(source) => return Err(ManifestError::Io { path, source }),
	};
	BuildOptions::from_toml_str(&content).map_err(|source| ManifestError::Options { path, source })
}
