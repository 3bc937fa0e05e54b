//! Extension install planner CLI
//!
//! Loads a catalog of core, installed and available extensions, computes the
//! install plan for a request and prints it.

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod render;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::PlanArgs;
use config::ConfigResolver;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialize logging: {}", "warning".yellow().bold(), e);
    }
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config),
        None => {
            println!("{} extension install planner", "extplan".green().bold());
            println!();
            println!("Run {} for available commands.", "extplan --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, config: Option<std::path::PathBuf>) -> Result<()> {
    match cmd {
        Commands::Plan {
            catalog,
            request,
            extensions,
            namespaces,
            reinstall,
            ignore_local,
            json,
        } => {
            let config = ConfigResolver::new(config).resolve()?;
            let args = PlanArgs {
                catalog,
                request,
                extensions,
                namespaces,
                reinstall,
                ignore_local,
                json,
            };
            commands::run_plan(&args, &config)
        }
        Commands::CheckConstraint { left, right } => {
            commands::run_check_constraint(&left, &right)
        }
    }
}
