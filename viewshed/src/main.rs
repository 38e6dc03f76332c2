mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Compute a visibility layer from an elevation layer and a list of observers
	Compute(tools::compute::Subcommand),

	/// Print an elevation layer's metadata without running the engine
	Describe(tools::describe::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Compute(arguments) => tools::compute::run(arguments),
		Commands::Describe(arguments) => tools::describe::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{run, Cli};
	use anyhow::Result;
	use clap::Parser;

	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{:?}", cli);
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["viewshed"]).unwrap_err().to_string();
		assert!(err.contains("\nUsage: viewshed [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["viewshed", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("viewshed "));
	}

	#[test]
	fn compute_subcommand_requires_arguments() {
		let output = run_command(vec!["viewshed", "compute"]).unwrap_err().to_string();
		assert!(output.starts_with("Compute a visibility layer"));
	}

	#[test]
	fn describe_subcommand_requires_arguments() {
		let output = run_command(vec!["viewshed", "describe"]).unwrap_err().to_string();
		assert!(output.starts_with("Print an elevation layer's metadata"));
	}
}
