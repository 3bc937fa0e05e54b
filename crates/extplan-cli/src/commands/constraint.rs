//! Check-constraint command implementation

use colored::Colorize;
use extplan_model::VersionConstraint;

use crate::error::Result;

/// Merge two constraints and return the canonical result.
pub fn merge_constraints(left: &str, right: &str) -> Result<VersionConstraint> {
    let left = VersionConstraint::parse(left)?;
    let right = VersionConstraint::parse(right)?;
    Ok(left.merge(&right)?)
}

/// Run the check-constraint command
pub fn run_check_constraint(left: &str, right: &str) -> Result<()> {
    let merged = merge_constraints(left, right)?;
    println!("{} {}", "Compatible:".green().bold(), merged.canonical());
    Ok(())
}
