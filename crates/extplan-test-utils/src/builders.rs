//! Terse constructors for model values.
//!
//! ```rust
//! use extplan_test_utils::extension;
//!
//! let a = extension("a", "1.0").depends_on("b", "[1.0,2.0)").build();
//! assert_eq!(a.dependencies().len(), 1);
//! ```

use extplan_model::{
    Extension, ExtensionDependency, ExtensionId, InstalledExtension, Version, VersionConstraint,
    parse_version,
};

/// Parse a version, panicking on malformed test input.
pub fn version(text: &str) -> Version {
    parse_version(text).unwrap_or_else(|e| panic!("bad test version {text:?}: {e}"))
}

/// Build a dependency, panicking on malformed test input.
pub fn dep(id: &str, constraint: &str) -> ExtensionDependency {
    let constraint = VersionConstraint::parse(constraint)
        .unwrap_or_else(|e| panic!("bad test constraint {constraint:?}: {e}"));
    ExtensionDependency::new(id, constraint)
}

/// Start building a `plugin` extension.
pub fn extension(id: &str, version_text: &str) -> ExtensionBuilder {
    ExtensionBuilder {
        id: ExtensionId::new(id, version(version_text)),
        kind: "plugin".to_string(),
        dependencies: Vec::new(),
    }
}

pub struct ExtensionBuilder {
    id: ExtensionId,
    kind: String,
    dependencies: Vec<ExtensionDependency>,
}

impl ExtensionBuilder {
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn depends_on(mut self, id: &str, constraint: &str) -> Self {
        self.dependencies.push(dep(id, constraint));
        self
    }

    pub fn build(self) -> Extension {
        self.dependencies
            .into_iter()
            .fold(Extension::new(self.id, self.kind), Extension::with_dependency)
    }

    /// Build an installed record covering all namespaces.
    pub fn installed(self) -> InstalledExtension {
        InstalledExtension::new(self.build())
    }
}
