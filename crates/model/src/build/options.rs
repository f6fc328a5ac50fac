//! Build configuration.

use serde::{Deserialize, Serialize};

/// How a build reacts to the first error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strictness {
	/// Stop at the first error and report only that one.
	Strict,
	/// Keep going and report every independent error.
	#[default]
	Collect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildOptions {
	pub strictness: Strictness,
	/// Keep warning diagnostics on the built space.
	pub report_warnings: bool,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			strictness: Strictness::Collect,
			report_warnings: true,
		}
	}
}

/// Error parsing [`BuildOptions`] from TOML.
#[derive(Debug, thiserror::Error)]
#[error("invalid build options: {0}")]
pub struct OptionsError(#[from] toml::de::Error);

#[derive(Deserialize, Default)]
#[serde(default)]
struct OptionsFile {
	build: BuildOptions,
}

impl BuildOptions {
	pub fn strict() -> Self {
		Self {
			strictness: Strictness::Strict,
			..Self::default()
		}
	}

	pub fn collect() -> Self {
		Self::default()
	}

	pub fn with_strictness(mut self, strictness: Strictness) -> Self {
		self.strictness = strictness;
		self
	}

	pub fn with_warnings(mut self, report: bool) -> Self {
		self.report_warnings = report;
		self
	}

	/// Parses options from the `[build]` table of a TOML document.
	///
	/// A missing table, or missing keys within it, fall back to defaults. Other
	/// top-level tables are ignored.
	pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
		let file: OptionsFile = toml::from_str(input)?;
		Ok(file.build)
	}
}
