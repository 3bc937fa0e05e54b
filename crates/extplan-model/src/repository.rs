//! Collaborator contracts consumed by the install planner.
//!
//! The planner never talks to disks or networks directly. Everything it
//! knows about bundled, installed and available extensions comes through
//! these traits, bundled together in [`Collaborators`].

use std::collections::BTreeMap;

use crate::error::ResolveError;
use crate::extension::{
    CoreExtension, Extension, ExtensionDependency, InstalledExtension, RequestedExtension,
};

/// Installed extensions depending on some id, keyed by namespace
/// (`None` for extensions installed on all namespaces).
pub type BackwardDependencies = BTreeMap<Option<String>, Vec<InstalledExtension>>;

/// Extensions bundled with the host.
pub trait CoreExtensionRegistry: Send + Sync {
    fn get(&self, id: &str) -> Option<CoreExtension>;

    fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// The host's installed-extension state.
pub trait InstalledExtensionStore: Send + Sync {
    /// The extension installed as `id` on `namespace`.
    ///
    /// `None` asks for an installation covering all namespaces.
    fn get(&self, id: &str, namespace: Option<&str>) -> Option<InstalledExtension>;

    /// Every installed extension declaring a dependency on `id`, grouped by
    /// the namespace it is installed on.
    fn backward_dependencies(&self, id: &str) -> Result<BackwardDependencies, ResolveError>;

    /// Installed extensions on exactly `namespace` declaring a dependency on `id`.
    fn backward_dependencies_in(
        &self,
        id: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<InstalledExtension>, ResolveError>;
}

/// A source of extension descriptors (local cache or remote repositories).
pub trait ExtensionRepository: Send + Sync {
    /// Resolve an extension by id, at its requested version or the newest one.
    fn resolve(&self, extension: &RequestedExtension) -> Result<Extension, ResolveError>;

    /// Resolve a version of the dependency target satisfying its constraint.
    fn resolve_dependency(
        &self,
        dependency: &ExtensionDependency,
    ) -> Result<Extension, ResolveError>;
}

/// Installed handlers, one per supported extension type.
pub trait HandlerRegistry: Send + Sync {
    fn supports(&self, kind: &str) -> bool;
}

/// The set of collaborators one planning run works against.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub core: &'a dyn CoreExtensionRegistry,
    pub installed: &'a dyn InstalledExtensionStore,
    pub local: &'a dyn ExtensionRepository,
    pub remote: &'a dyn ExtensionRepository,
    pub handlers: &'a dyn HandlerRegistry,
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
