//! The frozen install plan.
//!
//! A [`Plan`] is produced once planning succeeds and never changes
//! afterwards. Tree positions that share a resolution share the same
//! [`PlanAction`] allocation, so identity comparisons (`std::ptr::eq`)
//! between two nodes' actions tell whether they are the same resolution.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use extplan_model::{
    Extension, ExtensionDependency, ExtensionId, InstallRequest, InstalledExtension, Version,
    VersionConstraint,
};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// What executing a plan entry does to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Install,
    Upgrade,
    Downgrade,
    /// Already satisfied by a core or installed extension.
    None,
}

impl ActionKind {
    /// Classify the change from `previous` (the installed version, if any)
    /// to `resolved`.
    ///
    /// Reinstalling the same version counts as an upgrade.
    pub fn classify(previous: Option<&Version>, resolved: &Version) -> Self {
        match previous {
            None => ActionKind::Install,
            Some(previous) if previous > resolved => ActionKind::Downgrade,
            Some(_) => ActionKind::Upgrade,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Install => "install",
            ActionKind::Upgrade => "upgrade",
            ActionKind::Downgrade => "downgrade",
            ActionKind::None => "none",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned change (or confirmed no-op) for an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanAction {
    extension: Extension,
    previous: Option<InstalledExtension>,
    kind: ActionKind,
    namespace: Option<String>,
    dependency: bool,
}

impl PlanAction {
    pub fn new(
        extension: Extension,
        previous: Option<InstalledExtension>,
        kind: ActionKind,
        namespace: Option<String>,
        dependency: bool,
    ) -> Self {
        Self {
            extension,
            previous,
            kind,
            namespace,
            dependency,
        }
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn extension_id(&self) -> &ExtensionId {
        self.extension.id()
    }

    /// The installed extension this action replaces.
    pub fn previous(&self) -> Option<&InstalledExtension> {
        self.previous.as_ref()
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Target namespace; `None` means all namespaces.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the extension is pulled in by another one.
    pub fn is_dependency(&self) -> bool {
        self.dependency
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.extension.id())?;
        if let Some(previous) = &self.previous {
            if self.kind != ActionKind::None {
                write!(f, " (from {})", previous.version())?;
            }
        }
        if let Some(namespace) = &self.namespace {
            write!(f, " on {namespace}")?;
        }
        Ok(())
    }
}

/// A resolution as seen from every tree position that references it.
#[derive(Debug)]
struct SharedResolution {
    action: Arc<PlanAction>,
    children: Vec<PlanNode>,
    version_constraint: Option<VersionConstraint>,
}

/// A position in the frozen plan tree.
#[derive(Debug, Clone)]
pub struct PlanNode {
    resolution: Arc<SharedResolution>,
    initial_dependency: Option<ExtensionDependency>,
}

impl PlanNode {
    pub(crate) fn new(
        action: Arc<PlanAction>,
        children: Vec<PlanNode>,
        version_constraint: Option<VersionConstraint>,
        initial_dependency: Option<ExtensionDependency>,
    ) -> Self {
        Self {
            resolution: Arc::new(SharedResolution {
                action,
                children,
                version_constraint,
            }),
            initial_dependency,
        }
    }

    /// Another position onto the same resolution.
    pub(crate) fn alias(&self, initial_dependency: Option<ExtensionDependency>) -> Self {
        Self {
            resolution: Arc::clone(&self.resolution),
            initial_dependency,
        }
    }

    pub fn action(&self) -> &PlanAction {
        &self.resolution.action
    }

    pub fn children(&self) -> &[PlanNode] {
        &self.resolution.children
    }

    /// The merged constraint that justified this resolution.
    ///
    /// `None` for root requests and core extensions.
    pub fn version_constraint(&self) -> Option<&VersionConstraint> {
        self.resolution.version_constraint.as_ref()
    }

    /// The dependency edge that led to this position; `None` for roots.
    pub fn initial_dependency(&self) -> Option<&ExtensionDependency> {
        self.initial_dependency.as_ref()
    }

    /// Whether both positions reference the same resolution.
    pub fn same_resolution(&self, other: &PlanNode) -> bool {
        Arc::ptr_eq(&self.resolution, &other.resolution)
    }
}

impl Serialize for PlanNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("PlanNode", 4)?;
        node.serialize_field("action", self.action())?;
        node.serialize_field("version_constraint", &self.version_constraint())?;
        node.serialize_field("initial_dependency", &self.initial_dependency)?;
        node.serialize_field("children", self.children())?;
        node.end()
    }
}

/// Root nodes, in the order extensions were requested.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PlanTree {
    roots: Vec<PlanNode>,
}

impl PlanTree {
    pub(crate) fn new(roots: Vec<PlanNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PlanNode] {
        &self.roots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanNode> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every action, dependencies first, each shared resolution once.
    pub fn flatten_actions(&self) -> Vec<Arc<PlanAction>> {
        let mut seen = HashSet::new();
        let mut actions = Vec::new();
        for root in &self.roots {
            collect_actions(root, &mut seen, &mut actions);
        }
        actions
    }
}

impl<'a> IntoIterator for &'a PlanTree {
    type Item = &'a PlanNode;
    type IntoIter = std::slice::Iter<'a, PlanNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.iter()
    }
}

fn collect_actions(
    node: &PlanNode,
    seen: &mut HashSet<*const PlanAction>,
    actions: &mut Vec<Arc<PlanAction>>,
) {
    let action = &node.resolution.action;
    // A resolution already listed had its whole subtree listed before it.
    if seen.contains(&Arc::as_ptr(action)) {
        return;
    }
    for child in node.children() {
        collect_actions(child, seen, actions);
    }
    seen.insert(Arc::as_ptr(action));
    actions.push(Arc::clone(action));
}

/// A successfully computed install plan.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    request: InstallRequest,
    tree: PlanTree,
    actions: Vec<Arc<PlanAction>>,
}

impl Plan {
    pub(crate) fn new(request: InstallRequest, tree: PlanTree) -> Self {
        let actions = tree.flatten_actions();
        Self {
            request,
            tree,
            actions,
        }
    }

    /// The request this plan answers.
    pub fn request(&self) -> &InstallRequest {
        &self.request
    }

    pub fn tree(&self) -> &PlanTree {
        &self.tree
    }

    /// Flattened actions in execution order: dependencies before dependents.
    pub fn actions(&self) -> impl Iterator<Item = &PlanAction> {
        self.actions.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The action planned for `id` on exactly `namespace`.
    pub fn action_for(&self, id: &str, namespace: Option<&str>) -> Option<&PlanAction> {
        self.actions()
            .find(|action| action.extension_id().id() == id && action.namespace() == namespace)
    }
}
