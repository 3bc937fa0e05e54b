use extplan_model::{
    ExtensionDependency, ExtensionId, IncompatibleVersionConstraint, ResolveError, Version,
    VersionConstraint,
};

/// Why an install plan could not be computed.
///
/// Every variant is terminal: planning stops at the first one and no
/// partial plan is returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested extension is bundled with the host.
    #[error("there is already a core extension with the id '{id}'")]
    ExtensionConflict { id: String },

    /// The requested version is already installed and reinstall was not asked for.
    #[error("extension '{id}' is already installed at version {version}")]
    AlreadyInstalled { id: String, version: Version },

    /// Changing the version would break an installed extension depending on it.
    #[error(
        "changing '{id}' to version {version} breaks installed extension '{dependent}', which requires '{constraint}'"
    )]
    IncompatibleBackwardDependency {
        id: String,
        version: Version,
        dependent: ExtensionId,
        constraint: VersionConstraint,
    },

    /// Two constraints on the same dependency have no version in common.
    #[error("dependency '{dependency}' is incompatible with {context}")]
    IncompatibleVersionConstraint {
        dependency: ExtensionDependency,
        context: String,
        #[source]
        source: Option<IncompatibleVersionConstraint>,
    },

    /// A bundled extension cannot satisfy a declared dependency.
    #[error("dependency '{dependency}' is not compatible with core extension '{core}'")]
    IncompatibleCoreExtension {
        dependency: ExtensionDependency,
        core: ExtensionId,
    },

    /// Neither the local nor the remote repository could provide the extension.
    #[error("failed to resolve '{target}'")]
    ResolutionFailed {
        target: String,
        #[source]
        source: ResolveError,
    },

    /// No handler is installed for the extension's type.
    #[error("extension '{extension}' has type '{kind}', which no installed handler supports")]
    UnsupportedType { extension: ExtensionId, kind: String },

    /// The dependency graph loops back on itself.
    #[error("cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// Planning was interrupted through the cancellation flag.
    #[error("planning was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
