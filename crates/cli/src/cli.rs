use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lattice_model::{BuildOptions, Coordinate, Strictness};

#[derive(Parser, Debug)]
#[command(name = "lattice")]
#[command(about = "Check and query multi-dimensional classifier models")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	#[command(flatten)]
	pub build: BuildArgs,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// Overrides for the options read from `lattice.toml`.
#[derive(Args, Debug)]
pub struct BuildArgs {
	/// Stop at the first error
	#[arg(long, global = true, conflicts_with = "collect")]
	pub strict: bool,

	/// Report every independent error
	#[arg(long, global = true)]
	pub collect: bool,
}

impl BuildArgs {
	pub fn apply(&self, options: BuildOptions) -> BuildOptions {
		match (self.strict, self.collect) {
			(true, _) => options.with_strictness(Strictness::Strict),
			(_, true) => options.with_strictness(Strictness::Collect),
			_ => options,
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Build the model and report diagnostics
	Check {
		/// Manifest directory
		dir: PathBuf,

		/// Print diagnostics as JSON
		#[arg(long)]
		json: bool,
	},
	/// Print the effective classifier for a name and coordinate
	Show {
		/// Manifest directory
		dir: PathBuf,

		/// Qualified classifier name
		name: String,

		/// Coordinate axis, repeatable (e.g. `--at Scope=User`)
		#[arg(long = "at", value_name = "DIM=ELEMENT", value_parser = parse_axis)]
		at: Vec<(String, String)>,
	},
	/// List dimensions and their elements
	Dims {
		/// Manifest directory
		dir: PathBuf,
	},
}

impl Command {
	pub fn dir(&self) -> &Path {
		match self {
			Command::Check { dir, .. } | Command::Show { dir, .. } | Command::Dims { dir } => dir.as_path(),
		}
	}
}

/// Builds the query coordinate; `None` when no axis was given.
pub fn coordinate(at: &[(String, String)]) -> Option<Coordinate> {
	(!at.is_empty()).then(|| at.iter().map(|(d, e)| (d.as_str(), e.as_str())).collect())
}

fn parse_axis(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((dim, elem)) if !dim.trim().is_empty() && !elem.trim().is_empty() => Ok((dim.trim().to_string(), elem.trim().to_string())),
		_ => Err(format!("expected DIM=ELEMENT, got {s:?}")),
	}
}

#[cfg(test)]
mod tests {
	use clap::Parser;

	use super::*;

	#[test]
	fn test_parse_show() {
		let cli = Cli::try_parse_from(["lattice", "show", "models", "Accounts.Profile", "--at", "Scope=User", "--at", "Tenant = Acme"]).unwrap();
		let Command::Show { dir, name, at } = &cli.command else {
			panic!("expected show, got {:?}", cli.command);
		};
		assert_eq!(dir, &PathBuf::from("models"));
		assert_eq!(name, "Accounts.Profile");
		assert_eq!(
			coordinate(at),
			Some(Coordinate::new().with("Scope", "User").with("Tenant", "Acme"))
		);
		assert_eq!(coordinate(&[]), None);
	}

	#[test]
	fn test_bad_axis_rejected() {
		assert!(Cli::try_parse_from(["lattice", "show", "models", "Foo", "--at", "Scope"]).is_err());
		assert!(Cli::try_parse_from(["lattice", "show", "models", "Foo", "--at", "=User"]).is_err());
	}

	#[test]
	fn test_strictness_overrides() {
		let cli = Cli::try_parse_from(["lattice", "check", "models", "--strict"]).unwrap();
		assert_eq!(cli.build.apply(BuildOptions::default()).strictness, Strictness::Strict);

		let cli = Cli::try_parse_from(["lattice", "--collect", "check", "models", "--json"]).unwrap();
		assert_eq!(cli.build.apply(BuildOptions::strict()).strictness, Strictness::Collect);
		assert!(matches!(cli.command, Command::Check { json: true, .. }));

		let cli = Cli::try_parse_from(["lattice", "dims", "models"]).unwrap();
		assert_eq!(cli.build.apply(BuildOptions::strict()), BuildOptions::strict());

		assert!(Cli::try_parse_from(["lattice", "check", "models", "--strict", "--collect"]).is_err());
	}
}
