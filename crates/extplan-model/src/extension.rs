//! Extension identities, dependencies and installed-state records.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::{VersionConstraint, parse_version};

/// Check that an extension id is non-empty and uses valid characters.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidName {
            name: id.to_string(),
            reason: "extension id must not be empty".to_string(),
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err(Error::InvalidName {
            name: id.to_string(),
            reason: "extension id must contain only alphanumeric characters, '-', '_', '.' or ':'"
                .to_string(),
        });
    }
    Ok(())
}

/// An extension identifier at a concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtensionId {
    id: String,
    version: Version,
}

impl ExtensionId {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Build an id from its string parts, validating both.
    pub fn parse(id: &str, version: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Self::new(id, parse_version(version)?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// An extension as named by a caller: the version is optional.
///
/// Written as `id` or `id@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestedExtension {
    id: String,
    version: Option<Version>,
}

impl RequestedExtension {
    /// Request the newest available version of `id`.
    pub fn latest(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    /// Request `id` at exactly `version`.
    pub fn exact(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version: Some(version),
        }
    }

    /// Parse `id` or `id@version`.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (id, version) = match spec.split_once('@') {
            Some((id, version)) => (id, Some(parse_version(version)?)),
            None => (spec, None),
        };
        validate_id(id)?;
        Ok(Self {
            id: id.to_string(),
            version,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

impl From<ExtensionId> for RequestedExtension {
    fn from(id: ExtensionId) -> Self {
        Self {
            id: id.id,
            version: Some(id.version),
        }
    }
}

impl fmt::Display for RequestedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.id, version),
            None => f.write_str(&self.id),
        }
    }
}

impl FromStr for RequestedExtension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RequestedExtension {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RequestedExtension> for String {
    fn from(value: RequestedExtension) -> Self {
        value.to_string()
    }
}

/// A dependency declared by an extension on another extension id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDependency {
    id: String,
    #[serde(rename = "constraint")]
    version_constraint: VersionConstraint,
}

impl ExtensionDependency {
    pub fn new(id: impl Into<String>, version_constraint: VersionConstraint) -> Self {
        Self {
            id: id.into(),
            version_constraint,
        }
    }

    /// Build a dependency from its string parts, validating both.
    pub fn parse(id: &str, constraint: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Self::new(id, VersionConstraint::parse(constraint)?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version_constraint(&self) -> &VersionConstraint {
        &self.version_constraint
    }

    /// The same dependency re-targeted at another constraint.
    pub fn with_constraint(&self, version_constraint: VersionConstraint) -> Self {
        Self {
            id: self.id.clone(),
            version_constraint,
        }
    }
}

impl fmt::Display for ExtensionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version_constraint)
    }
}

/// An extension descriptor: identity, handler type and declared dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    id: ExtensionId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    dependencies: Vec<ExtensionDependency>,
}

impl Extension {
    pub fn new(id: ExtensionId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            dependencies: Vec::new(),
        }
    }

    /// Append a dependency, keeping declaration order.
    pub fn with_dependency(mut self, dependency: ExtensionDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    pub fn version(&self) -> &Version {
        self.id.version()
    }

    /// The handler type this extension needs (e.g. `plugin`, `theme`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn dependencies(&self) -> &[ExtensionDependency] {
        &self.dependencies
    }

    /// The dependency declared on `target`, if any.
    pub fn dependency(&self, target: &str) -> Option<&ExtensionDependency> {
        self.dependencies.iter().find(|d| d.id() == target)
    }
}

/// An extension currently installed on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    extension: Extension,
    /// `None` when installed on all namespaces.
    namespaces: Option<BTreeSet<String>>,
    /// Pulled in transitively rather than requested directly.
    dependency: bool,
    valid: bool,
    invalid_namespaces: BTreeSet<String>,
}

impl InstalledExtension {
    /// Record `extension` as installed on all namespaces.
    pub fn new(extension: Extension) -> Self {
        Self {
            extension,
            namespaces: None,
            dependency: false,
            valid: true,
            invalid_namespaces: BTreeSet::new(),
        }
    }

    /// Restrict the installation to `namespace` (cumulative).
    pub fn on_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces
            .get_or_insert_with(BTreeSet::new)
            .insert(namespace.into());
        self
    }

    pub fn as_dependency(mut self, dependency: bool) -> Self {
        self.dependency = dependency;
        self
    }

    /// Mark the installation as broken everywhere.
    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Mark the installation as broken on one namespace.
    pub fn invalid_on(mut self, namespace: impl Into<String>) -> Self {
        self.invalid_namespaces.insert(namespace.into());
        self
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn id(&self) -> &ExtensionId {
        self.extension.id()
    }

    pub fn version(&self) -> &Version {
        self.extension.version()
    }

    pub fn namespaces(&self) -> Option<&BTreeSet<String>> {
        self.namespaces.as_ref()
    }

    pub fn is_dependency(&self) -> bool {
        self.dependency
    }

    /// Whether the extension is installed on `namespace`.
    ///
    /// `None` asks about the all-namespaces scope, which only a global
    /// installation satisfies.
    pub fn is_installed(&self, namespace: Option<&str>) -> bool {
        match (&self.namespaces, namespace) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(namespaces), Some(namespace)) => namespaces.contains(namespace),
        }
    }

    /// Whether the installation is usable on `namespace`.
    pub fn is_valid(&self, namespace: Option<&str>) -> bool {
        self.valid && namespace.is_none_or(|ns| !self.invalid_namespaces.contains(ns))
    }
}

/// An extension bundled with the host; never installed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreExtension {
    extension: Extension,
}

impl CoreExtension {
    pub fn new(extension: Extension) -> Self {
        Self { extension }
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn id(&self) -> &ExtensionId {
        self.extension.id()
    }

    pub fn version(&self) -> &Version {
        self.extension.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ext(id: &str, version: &str) -> Extension {
        Extension::new(ExtensionId::parse(id, version).unwrap(), "plugin")
    }

    #[test]
    fn test_requested_extension_parse() {
        let latest = RequestedExtension::parse("org.acme:widgets").unwrap();
        assert_eq!(latest.id(), "org.acme:widgets");
        assert!(latest.version().is_none());

        let pinned = RequestedExtension::parse("widgets@1.2").unwrap();
        assert_eq!(pinned.version(), Some(&Version::new(1, 2, 0)));
        assert_eq!(pinned.to_string(), "widgets@1.2.0");
    }

    #[test]
    fn test_requested_extension_rejects_bad_input() {
        assert!(RequestedExtension::parse("").is_err());
        assert!(RequestedExtension::parse("@1.0").is_err());
        assert!(RequestedExtension::parse("bad id").is_err());
        assert!(RequestedExtension::parse("ok@not-a-version").is_err());
    }

    #[test]
    fn test_dependency_lookup_by_target() {
        let extension = ext("a", "1.0")
            .with_dependency(ExtensionDependency::parse("b", "[1.0,2.0)").unwrap())
            .with_dependency(ExtensionDependency::parse("c", ">=3").unwrap());

        assert_eq!(
            extension.dependency("c").map(|d| d.version_constraint().to_string()),
            Some(">=3".to_string())
        );
        assert!(extension.dependency("d").is_none());
        let order: Vec<&str> = extension.dependencies().iter().map(|d| d.id()).collect();
        assert_eq!(order, vec!["b", "c"]);
    }

    #[test]
    fn test_installed_on_all_namespaces() {
        let installed = InstalledExtension::new(ext("a", "1.0"));
        assert!(installed.is_installed(None));
        assert!(installed.is_installed(Some("wiki1")));
    }

    #[test]
    fn test_installed_on_one_namespace() {
        let installed = InstalledExtension::new(ext("a", "1.0")).on_namespace("wiki1");
        assert!(!installed.is_installed(None));
        assert!(installed.is_installed(Some("wiki1")));
        assert!(!installed.is_installed(Some("wiki2")));
    }

    #[test]
    fn test_validity_per_namespace() {
        let installed = InstalledExtension::new(ext("a", "1.0")).invalid_on("wiki2");
        assert!(installed.is_valid(None));
        assert!(installed.is_valid(Some("wiki1")));
        assert!(!installed.is_valid(Some("wiki2")));

        let broken = InstalledExtension::new(ext("a", "1.0")).invalid();
        assert!(!broken.is_valid(None));
        assert!(!broken.is_valid(Some("wiki1")));
    }

    #[test]
    fn test_dependency_display() {
        let dep = ExtensionDependency::parse("b", "[1.0,2.0)").unwrap();
        assert_eq!(dep.to_string(), "b [1.0,2.0)");
        let retargeted = dep.with_constraint(VersionConstraint::parse(">=1.5").unwrap());
        assert_eq!(retargeted.id(), "b");
        assert_eq!(retargeted.to_string(), "b >=1.5");
    }
}
