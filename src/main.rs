//! covervote - consensus album artwork resolver
//!
//! Queries several independent image sources, groups the results by visual
//! similarity and keeps the cover most of them agree on.

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use covervote::cli::{Cli, Command};
use covervote::commands;
use covervote::config;
use covervote::ui::{self, Log};

/// Exit status when no artwork was found
const EXIT_NOT_FOUND: u8 = 2;

fn main() -> ExitCode {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);
	if let Some(path) = cli.config {
		config::set_config_path(path);
	}

	match run(cli.command) {
		Ok(code) => code,
		Err(e) => {
			ui::error(&format!("{:#}", e));
			ExitCode::FAILURE
		}
	}
}

fn run(command: Command) -> Result<ExitCode> {
	match command {
		Command::Resolve(args) => {
			Log::set_quiet(args.json);
			if !args.json {
				ui::print_logo();
			}
			let found = commands::resolve::run(&args)?;
			Ok(if found { ExitCode::SUCCESS } else { ExitCode::from(EXIT_NOT_FOUND) })
		}
		Command::Compare { images, threshold } => {
			ui::print_logo();
			commands::compare::run(&images, threshold)?;
			Ok(ExitCode::SUCCESS)
		}
		Command::Validate { images } => {
			commands::validate::run(&images)?;
			Ok(ExitCode::SUCCESS)
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help()?;
				} else {
					ui::warn(&format!("Unknown subcommand: {}", sub));
					cmd.print_help()?;
				}
			} else {
				cmd.print_help()?;
			}
			Ok(ExitCode::SUCCESS)
		}
	}
}
