//! In-memory collaborator implementations.
//!
//! These back the CLI (loaded from a [`Catalog`](crate::Catalog)) and the
//! test suites. Lookups are deterministic: extensions are kept in the order
//! they were added and version selection is explicit.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ResolveError;
use crate::extension::{
    CoreExtension, Extension, ExtensionDependency, InstalledExtension, RequestedExtension,
};
use crate::repository::{
    BackwardDependencies, Collaborators, CoreExtensionRegistry, ExtensionRepository,
    HandlerRegistry, InstalledExtensionStore,
};

/// Bundled extensions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCoreRegistry {
    entries: HashMap<String, CoreExtension>,
}

impl MemoryCoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a core extension, replacing any previous one with the same id.
    pub fn register(&mut self, extension: Extension) {
        self.entries.insert(
            extension.id().id().to_string(),
            CoreExtension::new(extension),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CoreExtensionRegistry for MemoryCoreRegistry {
    fn get(&self, id: &str) -> Option<CoreExtension> {
        self.entries.get(id).cloned()
    }
}

/// Installed extensions in registration order.
#[derive(Debug, Clone, Default)]
pub struct MemoryInstalledStore {
    entries: Vec<InstalledExtension>,
}

impl MemoryInstalledStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, installed: InstalledExtension) {
        self.entries.push(installed);
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledExtension> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn dependents<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'s InstalledExtension> {
        self.entries
            .iter()
            .filter(move |installed| installed.extension().dependency(id).is_some())
    }
}

impl InstalledExtensionStore for MemoryInstalledStore {
    fn get(&self, id: &str, namespace: Option<&str>) -> Option<InstalledExtension> {
        self.entries
            .iter()
            .find(|installed| installed.id().id() == id && installed.is_installed(namespace))
            .cloned()
    }

    fn backward_dependencies(&self, id: &str) -> Result<BackwardDependencies, ResolveError> {
        let mut result = BackwardDependencies::new();
        for dependent in self.dependents(id) {
            match dependent.namespaces() {
                None => result.entry(None).or_default().push(dependent.clone()),
                Some(namespaces) => {
                    for namespace in namespaces {
                        result
                            .entry(Some(namespace.clone()))
                            .or_default()
                            .push(dependent.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    fn backward_dependencies_in(
        &self,
        id: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<InstalledExtension>, ResolveError> {
        Ok(self
            .dependents(id)
            .filter(|dependent| match (dependent.namespaces(), namespace) {
                (None, None) => true,
                (Some(namespaces), Some(namespace)) => namespaces.contains(namespace),
                _ => false,
            })
            .cloned()
            .collect())
    }
}

/// Which candidate a repository returns when several versions match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionSelection {
    #[default]
    Highest,
    Lowest,
}

/// Available extensions, with every known version of each id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    versions: HashMap<String, Vec<Extension>>,
    selection: VersionSelection,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: VersionSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Add an available version. Re-adding an existing version replaces it.
    pub fn add(&mut self, extension: Extension) {
        let versions = self
            .versions
            .entry(extension.id().id().to_string())
            .or_default();
        versions.retain(|existing| existing.version() != extension.version());
        versions.push(extension);
        versions.sort_by(|a, b| a.version().cmp(b.version()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.versions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn pick<'s>(
        &self,
        mut candidates: impl DoubleEndedIterator<Item = &'s Extension>,
    ) -> Option<&'s Extension> {
        match self.selection {
            VersionSelection::Highest => candidates.next_back(),
            VersionSelection::Lowest => candidates.next(),
        }
    }

    fn known(&self, id: &str) -> Result<&[Extension], ResolveError> {
        self.versions
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| ResolveError::NotFound { id: id.to_string() })
    }
}

impl ExtensionRepository for MemoryRepository {
    fn resolve(&self, extension: &RequestedExtension) -> Result<Extension, ResolveError> {
        let versions = self.known(extension.id())?;
        match extension.version() {
            Some(version) => versions
                .iter()
                .find(|candidate| candidate.version() == version)
                .cloned()
                .ok_or_else(|| ResolveError::VersionNotFound {
                    id: extension.id().to_string(),
                    version: version.to_string(),
                }),
            // Requests without a version always take the newest release.
            None => versions.last().cloned().ok_or_else(|| ResolveError::NotFound {
                id: extension.id().to_string(),
            }),
        }
    }

    fn resolve_dependency(
        &self,
        dependency: &ExtensionDependency,
    ) -> Result<Extension, ResolveError> {
        let versions = self.known(dependency.id())?;
        let constraint = dependency.version_constraint();
        self.pick(
            versions
                .iter()
                .filter(|candidate| constraint.is_compatible(candidate.version())),
        )
        .cloned()
        .ok_or_else(|| ResolveError::NoMatchingVersion {
            id: dependency.id().to_string(),
            constraint: constraint.to_string(),
        })
    }
}

/// Supported extension types.
#[derive(Debug, Clone, Default)]
pub struct TypeHandlers {
    kinds: BTreeSet<String>,
}

impl TypeHandlers {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>) {
        self.kinds.insert(kind.into());
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }
}

impl HandlerRegistry for TypeHandlers {
    fn supports(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }
}

/// Owned in-memory versions of every collaborator.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollaborators {
    pub core: MemoryCoreRegistry,
    pub installed: MemoryInstalledStore,
    pub local: MemoryRepository,
    pub remote: MemoryRepository,
    pub handlers: TypeHandlers,
}

impl MemoryCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow everything as the planner's collaborator bundle.
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            core: &self.core,
            installed: &self.installed,
            local: &self.local,
            remote: &self.remote,
            handlers: &self.handlers,
        }
    }

    /// Summary counts, as reported by `extplan` in verbose mode.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("core", self.core.len()),
            ("installed", self.installed.len()),
            ("local", self.local.len()),
            ("remote", self.remote.len()),
        ])
    }
}
