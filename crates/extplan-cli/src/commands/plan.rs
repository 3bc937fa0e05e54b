//! Plan command implementation

use std::path::PathBuf;

use colored::Colorize;
use extplan_model::{Catalog, InstallRequest, RequestedExtension};
use extplan_planner::{Plan, Planner, ProgressTracker};

use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::render;

/// Arguments of the plan command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanArgs {
    pub catalog: PathBuf,
    pub request: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub namespaces: Vec<String>,
    pub reinstall: bool,
    pub ignore_local: bool,
    pub json: bool,
}

/// Merge the request file with the command line flags.
pub fn build_request(args: &PlanArgs) -> Result<InstallRequest> {
    let mut request = match &args.request {
        Some(path) => InstallRequest::from_path(path)?,
        None => InstallRequest::new(),
    };

    for spec in &args.extensions {
        request = request.with_extension(RequestedExtension::parse(spec)?);
    }
    for namespace in &args.namespaces {
        request = request.with_namespace(namespace.clone());
    }
    if args.reinstall {
        request = request.reinstall(true);
    }
    if args.ignore_local {
        request = request.ignore_local(true);
    }

    if request.extensions.is_empty() {
        return Err(CliError::user(
            "No extensions requested (use --extension or --request)",
        ));
    }
    Ok(request)
}

/// Load the catalog and compute the plan.
pub fn compute_plan(args: &PlanArgs, config: &Config) -> Result<Plan> {
    let request = build_request(args)?;
    let mut world = Catalog::from_path(&args.catalog)?.into_collaborators()?;
    for kind in &config.handlers {
        world.handlers.register(kind.clone());
    }

    let progress = ProgressTracker::new();
    let plan = Planner::new(world.collaborators())
        .with_progress(&progress)
        .plan(&request)?;
    tracing::debug!(progress = progress.offset(), "Planning finished");

    Ok(plan)
}

/// Run the plan command
pub fn run_plan(args: &PlanArgs, config: &Config) -> Result<()> {
    let plan = compute_plan(args, config)?;

    if args.json || config.output == OutputFormat::Json {
        println!("{}", render::json(&plan)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("{}", "Nothing to do".dimmed());
        return Ok(());
    }
    print!("{}", render::tree(&plan));
    println!();
    print!("{}", render::actions(&plan));
    Ok(())
}
