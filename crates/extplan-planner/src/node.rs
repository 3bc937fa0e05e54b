//! Working storage for a plan under construction.
//!
//! Every distinct resolution of an (extension, namespace) pair lives once in
//! the arena. Tree positions store only the index of the resolution they
//! show, so replacing a resolution in place is immediately visible from every
//! position referencing it.

use std::collections::HashMap;
use std::sync::Arc;

use extplan_model::{ExtensionDependency, VersionConstraint};

use crate::error::{Error, Result};
use crate::plan::{PlanAction, PlanNode, PlanTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ResolutionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PositionId(usize);

/// The shared, mutable part of a node.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub(crate) action: PlanAction,
    pub(crate) children: Vec<PositionId>,
    pub(crate) version_constraint: Option<VersionConstraint>,
}

impl Resolution {
    pub(crate) fn leaf(action: PlanAction, version_constraint: Option<VersionConstraint>) -> Self {
        Self {
            action,
            children: Vec::new(),
            version_constraint,
        }
    }
}

/// One occurrence of a resolution in the tree.
#[derive(Debug, Clone)]
struct Position {
    resolution: ResolutionId,
    initial_dependency: Option<ExtensionDependency>,
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    resolutions: Vec<Resolution>,
    positions: Vec<Position>,
}

impl NodeArena {
    pub(crate) fn add_resolution(&mut self, resolution: Resolution) -> ResolutionId {
        self.resolutions.push(resolution);
        ResolutionId(self.resolutions.len() - 1)
    }

    /// Overwrite a resolution; every position pointing at it sees the new one.
    pub(crate) fn replace(&mut self, id: ResolutionId, resolution: Resolution) {
        self.resolutions[id.0] = resolution;
    }

    pub(crate) fn add_position(
        &mut self,
        resolution: ResolutionId,
        initial_dependency: Option<ExtensionDependency>,
    ) -> PositionId {
        self.positions.push(Position {
            resolution,
            initial_dependency,
        });
        PositionId(self.positions.len() - 1)
    }

    pub(crate) fn resolution(&self, id: ResolutionId) -> &Resolution {
        &self.resolutions[id.0]
    }

    pub(crate) fn resolution_mut(&mut self, id: ResolutionId) -> &mut Resolution {
        &mut self.resolutions[id.0]
    }

    pub(crate) fn resolution_at(&self, position: PositionId) -> ResolutionId {
        self.positions[position.0].resolution
    }

    /// Copy the working tree under `roots` into an immutable [`PlanTree`].
    ///
    /// Fails if a resolution is reachable from itself, which can happen when
    /// a resolution replaced late in planning reuses an earlier node that
    /// depends on it.
    pub(crate) fn freeze(&self, roots: &[PositionId]) -> Result<PlanTree> {
        let mut frozen = Freezer {
            arena: self,
            done: HashMap::new(),
            visiting: Vec::new(),
        };
        let roots = roots
            .iter()
            .map(|root| frozen.position(*root))
            .collect::<Result<Vec<_>>>()?;
        Ok(PlanTree::new(roots))
    }
}

struct Freezer<'a> {
    arena: &'a NodeArena,
    done: HashMap<ResolutionId, PlanNode>,
    visiting: Vec<ResolutionId>,
}

impl Freezer<'_> {
    fn position(&mut self, id: PositionId) -> Result<PlanNode> {
        let arena = self.arena;
        let position = &arena.positions[id.0];
        let initial_dependency = position.initial_dependency.clone();

        if let Some(node) = self.done.get(&position.resolution) {
            return Ok(node.alias(initial_dependency));
        }

        if let Some(start) = self.visiting.iter().position(|r| *r == position.resolution) {
            let chain = self.visiting[start..]
                .iter()
                .chain(std::iter::once(&position.resolution))
                .map(|r| arena.resolution(*r).action.extension_id().to_string())
                .collect();
            return Err(Error::CyclicDependency { chain });
        }

        self.visiting.push(position.resolution);
        let resolution = arena.resolution(position.resolution);
        let children = resolution
            .children
            .iter()
            .map(|child| self.position(*child))
            .collect::<Result<Vec<_>>>()?;
        self.visiting.pop();

        let node = PlanNode::new(
            Arc::new(resolution.action.clone()),
            children,
            resolution.version_constraint.clone(),
            None,
        );
        self.done.insert(position.resolution, node.clone());
        Ok(node.alias(initial_dependency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ActionKind;
    use extplan_model::{Extension, ExtensionId, parse_version};
    use pretty_assertions::assert_eq;

    fn action(id: &str, version: &str) -> PlanAction {
        PlanAction::new(
            Extension::new(ExtensionId::new(id, parse_version(version).unwrap()), "plugin"),
            None,
            ActionKind::Install,
            None,
            true,
        )
    }

    #[test]
    fn test_replace_is_seen_by_every_position() {
        let mut arena = NodeArena::default();
        let c = arena.add_resolution(Resolution::leaf(action("c", "1.0"), None));
        let under_a = arena.add_position(c, None);
        let under_d = arena.add_position(c, None);

        arena.replace(c, Resolution::leaf(action("c", "1.5"), None));

        let tree = arena.freeze(&[under_a, under_d]).unwrap();
        let versions: Vec<String> = tree
            .iter()
            .map(|n| n.action().extension_id().version().to_string())
            .collect();
        assert_eq!(versions, vec!["1.5.0", "1.5.0"]);
        assert!(tree.roots()[0].same_resolution(&tree.roots()[1]));
    }

    #[test]
    fn test_freeze_detects_cycles() {
        let mut arena = NodeArena::default();
        let a = arena.add_resolution(Resolution::leaf(action("a", "1.0"), None));
        let b = arena.add_resolution(Resolution::leaf(action("b", "1.0"), None));
        let a_pos = arena.add_position(a, None);
        let b_pos = arena.add_position(b, None);
        arena.resolution_mut(a).children.push(b_pos);
        arena.resolution_mut(b).children.push(a_pos);

        match arena.freeze(&[a_pos]) {
            Err(Error::CyclicDependency { chain }) => {
                assert_eq!(chain, vec!["a@1.0.0", "b@1.0.0", "a@1.0.0"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }
}
