//! [`TestWorld`]: in-memory collaborators for planner scenarios.

use std::sync::Mutex;

use extplan_model::{
    Collaborators, Extension, ExtensionDependency, ExtensionRepository, InstalledExtension,
    MemoryCoreRegistry, MemoryInstalledStore, MemoryRepository, RequestedExtension,
    ResolveError, TypeHandlers, VersionSelection,
};

/// Wraps a repository and records the id of every lookup.
#[derive(Debug, Default)]
pub struct CountingRepository<R> {
    inner: R,
    calls: Mutex<Vec<String>>,
}

impl<R> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Ids looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn was_called_for(&self, id: &str) -> bool {
        self.calls().iter().any(|c| c == id)
    }

    fn record(&self, id: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id.to_string());
    }
}

impl<R: ExtensionRepository> ExtensionRepository for CountingRepository<R> {
    fn resolve(&self, extension: &RequestedExtension) -> Result<Extension, ResolveError> {
        self.record(extension.id());
        self.inner.resolve(extension)
    }

    fn resolve_dependency(
        &self,
        dependency: &ExtensionDependency,
    ) -> Result<Extension, ResolveError> {
        self.record(dependency.id());
        self.inner.resolve_dependency(dependency)
    }
}

/// Core, installed, local and remote state for one scenario.
///
/// ```rust
/// use extplan_test_utils::{TestWorld, extension};
///
/// let world = TestWorld::new()
///     .remote(extension("a", "1.0").depends_on("b", "*").build())
///     .remote(extension("b", "1.5").build());
/// let _collaborators = world.collaborators();
/// ```
#[derive(Debug, Default)]
pub struct TestWorld {
    pub core: MemoryCoreRegistry,
    pub installed: MemoryInstalledStore,
    pub local: CountingRepository<MemoryRepository>,
    pub remote: CountingRepository<MemoryRepository>,
    pub handlers: TypeHandlers,
}

impl TestWorld {
    /// An empty world that supports `plugin` extensions.
    pub fn new() -> Self {
        Self {
            handlers: TypeHandlers::new(["plugin"]),
            ..Self::default()
        }
    }

    pub fn core(mut self, extension: Extension) -> Self {
        self.core.register(extension);
        self
    }

    pub fn installed(mut self, installed: InstalledExtension) -> Self {
        self.installed.add(installed);
        self
    }

    pub fn local(mut self, extension: Extension) -> Self {
        self.local.inner_mut().add(extension);
        self
    }

    pub fn remote(mut self, extension: Extension) -> Self {
        self.remote.inner_mut().add(extension);
        self
    }

    pub fn handler(mut self, kind: &str) -> Self {
        self.handlers.register(kind);
        self
    }

    /// Switch both repositories to the given version selection.
    pub fn selection(mut self, selection: VersionSelection) -> Self {
        let local = std::mem::take(self.local.inner_mut());
        let remote = std::mem::take(self.remote.inner_mut());
        *self.local.inner_mut() = local.with_selection(selection);
        *self.remote.inner_mut() = remote.with_selection(selection);
        self
    }

    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            core: &self.core,
            installed: &self.installed,
            local: &self.local,
            remote: &self.remote,
            handlers: &self.handlers,
        }
    }

    /// Ids looked up in either repository, local first.
    pub fn repository_calls(&self) -> Vec<String> {
        let mut calls = self.local.calls();
        calls.extend(self.remote.calls());
        calls
    }
}
