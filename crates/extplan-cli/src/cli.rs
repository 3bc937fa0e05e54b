//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extension install planner - compute what installing extensions would do
#[derive(Parser, Debug)]
#[command(name = "extplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file, applied over the global one
    #[arg(long, global = true, env = "EXTPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compute an install plan
    ///
    /// Extensions come from the request file and from --extension, in
    /// that order.
    ///
    /// Examples:
    ///   extplan plan --catalog world.toml -e blog@2.0
    ///   extplan plan --catalog world.toml --request install.toml --json
    ///   extplan plan --catalog world.toml -e blog -n wiki1 -n wiki2
    Plan {
        /// Catalog describing core, installed and available extensions
        #[arg(short, long)]
        catalog: PathBuf,

        /// Install request file
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Extension to install, as `id` or `id@version`
        #[arg(short, long = "extension", value_name = "ID[@VERSION]")]
        extensions: Vec<String>,

        /// Namespace to install on (default: all namespaces)
        #[arg(short, long = "namespace", value_name = "NAMESPACE")]
        namespaces: Vec<String>,

        /// Plan again extensions that are already installed
        #[arg(long)]
        reinstall: bool,

        /// Skip the local repository when resolving requested extensions
        #[arg(long)]
        ignore_local: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Merge two version constraints
    ///
    /// Examples:
    ///   extplan check-constraint ">=1.0,<2.0" ">=1.5"
    ///   extplan check-constraint "[1.0,2.0)" "^1.4"
    CheckConstraint {
        /// First constraint
        left: String,

        /// Second constraint
        right: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let cli = Cli::parse_from([
            "extplan",
            "plan",
            "--catalog",
            "world.toml",
            "-e",
            "a@1.0",
            "-e",
            "b",
            "-n",
            "wiki1",
            "--reinstall",
        ]);

        assert!(!cli.verbose);
        assert_eq!(
            cli.command,
            Some(Commands::Plan {
                catalog: PathBuf::from("world.toml"),
                request: None,
                extensions: vec!["a@1.0".to_string(), "b".to_string()],
                namespaces: vec!["wiki1".to_string()],
                reinstall: true,
                ignore_local: false,
                json: false,
            })
        );
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::parse_from(["extplan", "check-constraint", "1.0", "2.0", "--verbose"]);
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Some(Commands::CheckConstraint {
                left: "1.0".to_string(),
                right: "2.0".to_string(),
            })
        );
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::parse_from(["extplan"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_plan_requires_catalog() {
        assert!(Cli::try_parse_from(["extplan", "plan", "-e", "a"]).is_err());
    }
}
