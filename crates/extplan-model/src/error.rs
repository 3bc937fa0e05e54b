use std::path::PathBuf;

use crate::version::VersionConstraint;

/// Errors raised while building the extension model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid semver version string.
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    /// A version constraint string could not be parsed.
    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraintParse { constraint: String, reason: String },

    /// Invalid extension identifier.
    #[error("invalid extension id '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Failed to parse a catalog or request TOML document.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    /// Manifest file not found at the expected path.
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to serialize a manifest.
    #[error("failed to serialize manifest: {0}")]
    ManifestSerialize(String),

    /// I/O error reading manifest files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A collaborator lookup failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Two version constraints have an empty intersection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("version constraints '{left}' and '{right}' have no version in common")]
pub struct IncompatibleVersionConstraint {
    pub left: VersionConstraint,
    pub right: VersionConstraint,
}

/// Failure reported by an extension repository or the installed store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No extension with this id is known.
    #[error("extension '{id}' not found")]
    NotFound { id: String },

    /// The id is known but not at the requested version.
    #[error("extension '{id}' has no version {version}")]
    VersionNotFound { id: String, version: String },

    /// No known version satisfies the dependency constraint.
    #[error("no version of '{id}' matches '{constraint}'")]
    NoMatchingVersion { id: String, constraint: String },

    /// The backing store failed.
    #[error("repository error: {message}")]
    Backend { message: String },
}
