//! Shared test fixtures for the extension planner workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`builders`]: terse constructors for extensions and dependencies
//! - [`files`]: [`TempInputs`], temporary catalog and request files
//! - [`world`]: [`TestWorld`], a set of in-memory collaborators that records
//!   repository calls
//! - [`progress`]: [`RecordingProgress`], a progress sink that keeps every event

pub mod builders;
pub mod files;
pub mod progress;
pub mod world;

pub use builders::{ExtensionBuilder, dep, extension, version};
pub use files::TempInputs;
pub use progress::{ProgressEvent, RecordingProgress};
pub use world::{CountingRepository, TestWorld};
