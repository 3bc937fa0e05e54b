//! Catalog and extension manifest parsing.
//!
//! A catalog describes the whole world a plan is computed against: the
//! supported extension types, the bundled (core) extensions, what is
//! installed, and what the local and remote repositories offer.
//!
//! # Example TOML
//!
//! ```toml
//! handlers = ["plugin", "theme"]
//!
//! [[core]]
//! id = "platform"
//! version = "3.0"
//!
//! [[installed]]
//! id = "widgets"
//! version = "1.0"
//! namespaces = ["wiki:main"]
//! dependencies = [{ id = "platform", constraint = "^3.0" }]
//!
//! [[remote]]
//! id = "widgets"
//! version = "2.0"
//! dependencies = [{ id = "platform", constraint = "^3.0" }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extension::{
    Extension, ExtensionDependency, ExtensionId, InstalledExtension, validate_id,
};
use crate::registry::{MemoryCollaborators, MemoryRepository, TypeHandlers, VersionSelection};
use crate::version::{VersionConstraint, parse_version};

fn default_kind() -> String {
    "plugin".to_string()
}

fn default_true() -> bool {
    true
}

/// A dependency entry inside a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyManifest {
    pub id: String,
    /// Version constraint string (e.g. `"[1.0,2.0)"`, `"^3.0"`).
    #[serde(default = "any_constraint")]
    pub constraint: String,
}

fn any_constraint() -> String {
    "*".to_string()
}

/// One extension as described in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionManifest {
    pub id: String,
    pub version: String,
    /// Handler type needed to install the extension.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyManifest>,

    /// Installed entries only: namespaces the extension is installed on.
    /// Absent means all namespaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    /// Installed entries only: pulled in as a dependency.
    #[serde(default)]
    pub dependency: bool,
    /// Installed entries only: `false` marks the installation as broken.
    #[serde(default = "default_true")]
    pub valid: bool,
    /// Installed entries only: namespaces on which the installation is broken.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_namespaces: Vec<String>,
}

impl ExtensionManifest {
    /// Parse a single extension manifest from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ManifestSerialize(e.to_string()))
    }

    /// Validate the manifest fields.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;
        parse_version(&self.version)?;
        if self.kind.is_empty() {
            return Err(Error::InvalidName {
                name: self.id.clone(),
                reason: "extension type must not be empty".to_string(),
            });
        }
        for dependency in &self.dependencies {
            validate_id(&dependency.id)?;
            VersionConstraint::parse(&dependency.constraint)?;
        }
        Ok(())
    }

    /// Build the extension descriptor this manifest describes.
    pub fn to_extension(&self) -> Result<Extension> {
        let id = ExtensionId::parse(&self.id, &self.version)?;
        self.dependencies
            .iter()
            .try_fold(Extension::new(id, self.kind.clone()), |extension, dependency| {
                Ok(extension.with_dependency(ExtensionDependency::parse(
                    &dependency.id,
                    &dependency.constraint,
                )?))
            })
    }

    /// Build the installed-extension record this manifest describes.
    pub fn to_installed(&self) -> Result<InstalledExtension> {
        let mut installed =
            InstalledExtension::new(self.to_extension()?).as_dependency(self.dependency);
        if let Some(namespaces) = &self.namespaces {
            for namespace in namespaces {
                installed = installed.on_namespace(namespace.clone());
            }
        }
        if !self.valid {
            installed = installed.invalid();
        }
        for namespace in &self.invalid_namespaces {
            installed = installed.invalid_on(namespace.clone());
        }
        Ok(installed)
    }
}

/// Version picked by repositories when several match a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionConfig {
    #[default]
    Highest,
    Lowest,
}

impl From<SelectionConfig> for VersionSelection {
    fn from(value: SelectionConfig) -> Self {
        match value {
            SelectionConfig::Highest => VersionSelection::Highest,
            SelectionConfig::Lowest => VersionSelection::Lowest,
        }
    }
}

/// The full world a plan is computed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Supported extension types. Empty means only `plugin`.
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub core: Vec<ExtensionManifest>,
    #[serde(default)]
    pub installed: Vec<ExtensionManifest>,
    #[serde(default)]
    pub local: Vec<ExtensionManifest>,
    #[serde(default)]
    pub remote: Vec<ExtensionManifest>,
}

impl Catalog {
    /// Parse a catalog from a TOML string, validating every entry.
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read and parse a catalog from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(?path, "Loading catalog");
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ManifestSerialize(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        for handler in &self.handlers {
            validate_id(handler)?;
        }
        self.core
            .iter()
            .chain(&self.installed)
            .chain(&self.local)
            .chain(&self.remote)
            .try_for_each(ExtensionManifest::validate)
    }

    /// Build the in-memory collaborators described by this catalog.
    pub fn into_collaborators(self) -> Result<MemoryCollaborators> {
        let selection = VersionSelection::from(self.selection);
        let mut world = MemoryCollaborators {
            handlers: if self.handlers.is_empty() {
                TypeHandlers::new([default_kind()])
            } else {
                TypeHandlers::new(self.handlers)
            },
            local: MemoryRepository::new().with_selection(selection),
            remote: MemoryRepository::new().with_selection(selection),
            ..MemoryCollaborators::default()
        };
        for manifest in &self.core {
            world.core.register(manifest.to_extension()?);
        }
        for manifest in &self.installed {
            world.installed.add(manifest.to_installed()?);
        }
        for manifest in &self.local {
            world.local.add(manifest.to_extension()?);
        }
        for manifest in &self.remote {
            world.remote.add(manifest.to_extension()?);
        }
        Ok(world)
    }
}
