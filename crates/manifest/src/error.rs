use std::path::PathBuf;

/// Manifest loading errors. Every variant names the file it came from.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// The manifest parsed but describes something the engine cannot accept.
	#[error("{}: classifier {classifier:?}: {reason}", path.display())]
	Invalid {
		path: PathBuf,
		classifier: String,
		reason: String,
	},

	#[error("invalid build options in {}: {source}", path.display())]
	Options {
		path: PathBuf,
		#[source]
		source: lattice_model::build::OptionsError,
	},
}
