//! Canonical resolution per (extension id, namespace).

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use extplan_model::ExtensionDependency;

use crate::node::{NodeArena, PositionId, Resolution, ResolutionId};

#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    nodes: HashMap<String, HashMap<Option<String>, ResolutionId>>,
}

impl NodeCache {
    /// The canonical resolution for `id` on `namespace`.
    ///
    /// A namespace-specific lookup falls back to the all-namespaces entry;
    /// an all-namespaces lookup never matches a namespace-specific one.
    pub(crate) fn lookup(&self, id: &str, namespace: Option<&str>) -> Option<ResolutionId> {
        let by_namespace = self.nodes.get(id)?;
        by_namespace
            .get(&namespace.map(str::to_string))
            .or_else(|| namespace.and_then(|_| by_namespace.get(&None)))
            .copied()
    }

    /// Record `resolution` as canonical for its (id, namespace) and return a
    /// new tree position showing it.
    ///
    /// When a canonical resolution already exists it is overwritten, so
    /// every earlier position now shows the latest resolution.
    pub(crate) fn register(
        &mut self,
        arena: &mut NodeArena,
        resolution: Resolution,
        initial_dependency: Option<ExtensionDependency>,
    ) -> PositionId {
        let id = resolution.action.extension_id().id().to_string();
        let namespace = resolution.action.namespace().map(str::to_string);

        let canonical = match self.nodes.entry(id).or_default().entry(namespace) {
            Entry::Occupied(existing) => {
                let canonical = *existing.get();
                tracing::debug!(
                    extension = %resolution.action.extension_id(),
                    "Replacing planned resolution"
                );
                arena.replace(canonical, resolution);
                canonical
            }
            Entry::Vacant(slot) => *slot.insert(arena.add_resolution(resolution)),
        };

        arena.add_position(canonical, initial_dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ActionKind, PlanAction};
    use extplan_model::{Extension, ExtensionId, parse_version};

    fn resolution(id: &str, version: &str, namespace: Option<&str>) -> Resolution {
        Resolution::leaf(
            PlanAction::new(
                Extension::new(ExtensionId::new(id, parse_version(version).unwrap()), "plugin"),
                None,
                ActionKind::Install,
                namespace.map(str::to_string),
                true,
            ),
            None,
        )
    }

    #[test]
    fn test_lookup_exact_then_global_fallback() {
        let mut arena = NodeArena::default();
        let mut cache = NodeCache::default();
        let global = cache.register(&mut arena, resolution("c", "1.0", None), None);
        let global = arena.resolution_at(global);

        assert_eq!(cache.lookup("c", None), Some(global));
        assert_eq!(cache.lookup("c", Some("wiki1")), Some(global));

        let scoped = cache.register(&mut arena, resolution("c", "2.0", Some("wiki1")), None);
        let scoped = arena.resolution_at(scoped);
        assert_eq!(cache.lookup("c", Some("wiki1")), Some(scoped));
        assert_eq!(cache.lookup("c", Some("wiki2")), Some(global));
        assert_eq!(cache.lookup("c", None), Some(global));
        assert_eq!(cache.lookup("d", None), None);
    }

    #[test]
    fn test_namespace_entry_never_answers_global_lookup() {
        let mut arena = NodeArena::default();
        let mut cache = NodeCache::default();
        cache.register(&mut arena, resolution("c", "1.0", Some("wiki1")), None);

        assert!(cache.lookup("c", None).is_none());
        assert!(cache.lookup("c", Some("wiki2")).is_none());
    }

    #[test]
    fn test_register_again_overwrites_canonical() {
        let mut arena = NodeArena::default();
        let mut cache = NodeCache::default();
        let first = cache.register(&mut arena, resolution("c", "1.0", None), None);
        let second = cache.register(&mut arena, resolution("c", "1.5", None), None);

        assert_eq!(arena.resolution_at(first), arena.resolution_at(second));
        let canonical = arena.resolution(arena.resolution_at(first));
        assert_eq!(canonical.action.extension_id().version().to_string(), "1.5.0");
    }
}
