//! Install plan resolver.
//!
//! Given requested extensions and the host's core, installed and available
//! extensions, [`Planner`] computes a deduplicated dependency tree of
//! install, upgrade, downgrade and no-op actions, or fails without producing
//! any partial plan.

mod cache;
pub mod error;
mod node;
pub mod plan;
pub mod planner;
pub mod progress;

pub use error::{Error, Result};
pub use plan::{ActionKind, Plan, PlanAction, PlanNode, PlanTree};
pub use planner::Planner;
pub use progress::{ProgressLevel, ProgressTracker};
