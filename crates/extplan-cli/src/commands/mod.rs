//! Command implementations for extplan-cli

pub mod constraint;
pub mod plan;

pub use constraint::run_check_constraint;
pub use plan::{PlanArgs, run_plan};
