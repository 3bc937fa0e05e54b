//! Extension model for the install planner.
//!
//! This crate provides version constraint arithmetic, extension descriptors,
//! the collaborator contracts the planner resolves through, in-memory
//! collaborators, and the request/catalog configuration formats.

pub mod error;
pub mod extension;
pub mod manifest;
pub mod progress;
pub mod registry;
pub mod repository;
pub mod request;
pub mod version;

pub use error::{Error, IncompatibleVersionConstraint, ResolveError, Result};
pub use extension::{
    CoreExtension, Extension, ExtensionDependency, ExtensionId, InstalledExtension,
    RequestedExtension,
};
pub use manifest::{Catalog, DependencyManifest, ExtensionManifest};
pub use progress::{NoProgress, ProgressSink};
pub use registry::{
    MemoryCollaborators, MemoryCoreRegistry, MemoryInstalledStore, MemoryRepository,
    TypeHandlers, VersionSelection,
};
pub use repository::{
    BackwardDependencies, Collaborators, CoreExtensionRegistry, ExtensionRepository,
    HandlerRegistry, InstalledExtensionStore,
};
pub use request::{ExtensionsByNamespace, InstallRequest};
pub use semver::Version;
pub use version::{VersionConstraint, parse_version};
