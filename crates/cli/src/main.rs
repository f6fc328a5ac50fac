//! `lattice` binary.
//!
//! Loads a directory of module manifests, builds the model space and either
//! reports diagnostics (`check`), prints one effective classifier (`show`) or
//! lists the registered dimensions (`dims`).

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use lattice_model::{DiagnosticSet, ModelSpace, build_model_space};

fn main() -> anyhow::Result<ExitCode> {
	let args = Cli::parse();
	setup_tracing(args.verbose);

	let dir = args.command.dir();
	let options = args.build.apply(lattice_manifest::load_options(dir)?);
	let contributions = lattice_manifest::load_dir(dir)?;
	tracing::info!(dir = %dir.display(), modules = contributions.len(), strictness = ?options.strictness, "building model");

	let space = match build_model_space(contributions, &options) {
		Ok(space) => space,
		Err(failure) => {
			let json = matches!(args.command, Command::Check { json: true, .. });
			report_failure(&failure, json)?;
			return Ok(ExitCode::FAILURE);
		}
	};

	match &args.command {
		Command::Check { json, .. } => check(&space, *json)?,
		Command::Show { name, at, .. } => {
			let classifier = space
				.classifier(name, cli::coordinate(at).as_ref())
				.with_context(|| format!("cannot show {name:?}"))?;
			println!("{}", serde_json::to_string_pretty(&*classifier)?);
		}
		Command::Dims { .. } => dims(&space),
	}
	Ok(ExitCode::SUCCESS)
}

fn check(space: &ModelSpace, json: bool) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(space.warnings())?);
		return Ok(());
	}
	for warning in space.warnings() {
		println!("{warning}");
	}
	println!(
		"ok: {} effective classifier(s) across {} dimension(s)",
		space.len(),
		space.dimensions().len()
	);
	Ok(())
}

fn report_failure(failure: &DiagnosticSet, json: bool) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(failure.as_slice())?);
		return Ok(());
	}
	eprintln!("{failure}");
	Ok(())
}

fn dims(space: &ModelSpace) {
	for dimension in space.dimensions() {
		println!("{}", dimension.name());
		for element in dimension.elements() {
			match element.parent() {
				Some(parent) => println!("  {} < {parent} ({})", element.name(), element.owner()),
				None => println!("  {} ({})", element.name(), element.owner()),
			}
		}
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("LATTICE_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("lattice_model=debug,lattice_manifest=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
