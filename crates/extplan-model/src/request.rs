//! Install request configuration.
//!
//! # Example TOML
//!
//! ```toml
//! extensions = ["org.acme:widgets@2.0", "org.acme:themes"]
//! namespaces = ["wiki:main"]
//! ignore_local = false
//! reinstall = false
//! clean_local = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extension::RequestedExtension;

/// What the caller wants installed, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallRequest {
    /// Extensions to install, in request order.
    #[serde(default)]
    pub extensions: Vec<RequestedExtension>,
    /// Target namespaces; empty means all namespaces.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Skip the local repository for directly requested extensions.
    #[serde(default)]
    pub ignore_local: bool,
    /// Allow reinstalling an already-installed version.
    #[serde(default)]
    pub reinstall: bool,
    /// Remove unused local extensions once the plan is applied.
    ///
    /// Carried through for the executor; planning ignores it.
    #[serde(default)]
    pub clean_local: bool,
}

impl InstallRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a request from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ManifestSerialize(e.to_string()))
    }

    pub fn with_extension(mut self, extension: RequestedExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    pub fn ignore_local(mut self, ignore_local: bool) -> Self {
        self.ignore_local = ignore_local;
        self
    }

    pub fn reinstall(mut self, reinstall: bool) -> Self {
        self.reinstall = reinstall;
        self
    }

    pub fn clean_local(mut self, clean_local: bool) -> Self {
        self.clean_local = clean_local;
        self
    }

    pub fn has_namespaces(&self) -> bool {
        !self.namespaces.is_empty()
    }

    /// Expand the request into the per-extension namespace targets the
    /// planner iterates.
    pub fn extensions_by_namespace(&self) -> ExtensionsByNamespace {
        let mut result = ExtensionsByNamespace::default();
        for extension in &self.extensions {
            if self.has_namespaces() {
                for namespace in &self.namespaces {
                    result.add(extension.clone(), Some(namespace.as_str()));
                }
            } else {
                result.add(extension.clone(), None);
            }
        }
        result
    }
}

/// Requested extensions with their target namespaces, in first-seen order.
///
/// A `None` target means "all namespaces".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionsByNamespace {
    entries: Vec<(RequestedExtension, Option<Vec<String>>)>,
}

impl ExtensionsByNamespace {
    /// Record that `extension` should be installed on `namespace`.
    ///
    /// Adding with `None` widens the entry to all namespaces. Adding a
    /// namespace to an entry that already covers all namespaces does nothing.
    pub fn add(&mut self, extension: RequestedExtension, namespace: Option<&str>) {
        let Some(index) = self.entries.iter().position(|(e, _)| *e == extension) else {
            self.entries
                .push((extension, namespace.map(|n| vec![n.to_string()])));
            return;
        };
        let targets = &mut self.entries[index].1;
        let Some(namespace) = namespace else {
            *targets = None;
            return;
        };
        if let Some(namespaces) = targets {
            if !namespaces.iter().any(|n| n == namespace) {
                namespaces.push(namespace.to_string());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RequestedExtension, Option<&[String]>)> {
        self.entries
            .iter()
            .map(|(extension, namespaces)| (extension, namespaces.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
