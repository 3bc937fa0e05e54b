//! The install planner.
//!
//! Planning walks the requested extensions depth first. Every dependency edge
//! is settled by the first of these that applies:
//!
//! 1. a core extension provides it (no-op leaf, never resolved remotely);
//! 2. the plan already holds a compatible resolution (shared, constraint
//!    narrowed), or an incompatible one whose constraint can be merged;
//! 3. a valid installed extension satisfies it (no-op leaf), otherwise the
//!    constraints of the installed extension's dependents are folded in;
//! 4. a fresh resolution through the local then remote repository.
//!
//! Children are always resolved before their parent's action is built.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool};

use extplan_model::{
    Collaborators, CoreExtension, Extension, ExtensionDependency, InstallRequest,
    InstalledExtension, NoProgress, ProgressSink, RequestedExtension, ResolveError, Version,
    VersionConstraint,
};

use crate::cache::NodeCache;
use crate::error::{Error, Result};
use crate::node::{NodeArena, PositionId, Resolution};
use crate::plan::{ActionKind, Plan, PlanAction};
use crate::progress::ProgressLevel;

/// Computes install plans against a set of collaborators.
///
/// A planner runs once: [`Planner::plan`] consumes it, and all working
/// state is dropped with it whether planning succeeds or not.
///
/// ```
/// use extplan_model::{
///     Extension, ExtensionId, InstallRequest, MemoryCollaborators, RequestedExtension,
///     TypeHandlers, parse_version,
/// };
/// use extplan_planner::{ActionKind, Planner};
///
/// let mut world = MemoryCollaborators::new();
/// world.handlers = TypeHandlers::new(["plugin"]);
/// world.remote.add(Extension::new(
///     ExtensionId::new("a", parse_version("1.0").unwrap()),
///     "plugin",
/// ));
///
/// let request = InstallRequest::new().with_extension(RequestedExtension::parse("a@1.0").unwrap());
/// let plan = Planner::new(world.collaborators()).plan(&request).unwrap();
///
/// assert_eq!(plan.len(), 1);
/// assert_eq!(plan.action_for("a", None).unwrap().kind(), ActionKind::Install);
/// ```
pub struct Planner<'a> {
    collaborators: Collaborators<'a>,
    progress: &'a dyn ProgressSink,
    cancelled: Option<Arc<AtomicBool>>,
}

impl<'a> Planner<'a> {
    pub fn new(collaborators: Collaborators<'a>) -> Self {
        Self {
            collaborators,
            progress: &NoProgress,
            cancelled: None,
        }
    }

    /// Report progress to `progress` while planning.
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set.
    ///
    /// The flag is checked before each extension or dependency is resolved.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// Compute the plan for `request`.
    pub fn plan(self, request: &InstallRequest) -> Result<Plan> {
        tracing::debug!(
            extensions = request.extensions.len(),
            namespaces = request.namespaces.len(),
            "Computing install plan"
        );

        let mut run = PlanRun {
            collaborators: self.collaborators,
            progress: self.progress,
            cancelled: self.cancelled,
            request,
            arena: NodeArena::default(),
            cache: NodeCache::default(),
            resolving: Vec::new(),
        };
        let roots = run.install_requested()?;
        let tree = run.arena.freeze(&roots)?;
        let plan = Plan::new(request.clone(), tree);

        tracing::debug!(actions = plan.len(), "Install plan ready");
        Ok(plan)
    }
}

/// Working state of one planning run.
struct PlanRun<'a, 'r> {
    collaborators: Collaborators<'a>,
    progress: &'a dyn ProgressSink,
    cancelled: Option<Arc<AtomicBool>>,
    request: &'r InstallRequest,
    arena: NodeArena,
    cache: NodeCache,
    /// (id, namespace) pairs whose resolution is in progress, outermost first.
    resolving: Vec<(String, Option<String>)>,
}

impl PlanRun<'_, '_> {
    fn install_requested(&mut self) -> Result<Vec<PositionId>> {
        let targets = self.request.extensions_by_namespace();
        let mut roots = Vec::new();

        let level = ProgressLevel::push(self.progress, targets.len());
        for (extension, namespaces) in targets.iter() {
            match namespaces {
                Some(namespaces) => {
                    let per_namespace = ProgressLevel::push(self.progress, namespaces.len());
                    for namespace in namespaces {
                        roots.push(self.install_extension(extension, Some(namespace.as_str()))?);
                        per_namespace.step();
                    }
                }
                None => roots.push(self.install_extension(extension, None)?),
            }
            level.step();
        }

        Ok(roots)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancelled {
            Some(flag) if flag.load(atomic::Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Mark (id, namespace) as being resolved, failing if it already is.
    fn enter(&mut self, id: &str, namespace: Option<&str>) -> Result<()> {
        let key = (id.to_string(), namespace.map(str::to_string));
        if let Some(start) = self.resolving.iter().position(|entry| *entry == key) {
            let chain = self.resolving[start..]
                .iter()
                .map(|(id, _)| id.clone())
                .chain(std::iter::once(key.0))
                .collect();
            return Err(Error::CyclicDependency { chain });
        }
        self.resolving.push(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.resolving.pop();
    }

    /// Plan a directly requested extension.
    fn install_extension(
        &mut self,
        requested: &RequestedExtension,
        namespace: Option<&str>,
    ) -> Result<PositionId> {
        self.check_cancelled()?;
        match namespace {
            Some(namespace) => {
                tracing::info!(extension = %requested, namespace, "Resolving extension")
            }
            None => tracing::info!(extension = %requested, "Resolving extension"),
        }

        if self.collaborators.core.exists(requested.id()) {
            return Err(Error::ExtensionConflict {
                id: requested.id().to_string(),
            });
        }

        self.enter(requested.id(), namespace)?;
        let result = self.install_root(requested, namespace);
        self.leave();
        result
    }

    fn install_root(
        &mut self,
        requested: &RequestedExtension,
        namespace: Option<&str>,
    ) -> Result<PositionId> {
        let previous = self.collaborators.installed.get(requested.id(), namespace);

        if let Some(installed) = &previous {
            tracing::info!(
                installed = %installed.id(),
                "Found already installed extension, checking compatibility"
            );
            let ordering = requested.version().map(|v| v.cmp(installed.version()));
            match (ordering, requested.version()) {
                (None | Some(Ordering::Equal), _) if !self.request.reinstall => {
                    return Err(Error::AlreadyInstalled {
                        id: requested.id().to_string(),
                        version: installed.version().clone(),
                    });
                }
                (Some(Ordering::Less | Ordering::Greater), Some(target)) => {
                    self.check_backward_dependencies(installed, target, namespace)?;
                }
                _ => {}
            }
        }

        let level = ProgressLevel::push(self.progress, 2);
        let extension = self.resolve_extension(requested)?;
        level.step();

        // Reinstalling without a version may still land on another release.
        if let Some(installed) = &previous {
            if requested.version().is_none() && extension.version() != installed.version() {
                self.check_backward_dependencies(installed, extension.version(), namespace)?;
            }
        }

        let constraint = self.planned_constraint(requested, extension.version(), namespace)?;
        let mut resolution = self.build_resolution(extension, previous, false, namespace)?;
        drop(level);

        resolution.version_constraint = constraint;
        Ok(self.cache.register(&mut self.arena, resolution, None))
    }

    /// Constraint recorded by dependencies that already planned the requested
    /// extension on this exact namespace. Registering the root replaces that
    /// resolution, so its version must still satisfy them.
    fn planned_constraint(
        &self,
        requested: &RequestedExtension,
        version: &Version,
        namespace: Option<&str>,
    ) -> Result<Option<VersionConstraint>> {
        let Some(existing) = self.cache.lookup(requested.id(), namespace) else {
            return Ok(None);
        };
        let resolution = self.arena.resolution(existing);
        if resolution.action.namespace() != namespace {
            return Ok(None);
        }
        let Some(constraint) = &resolution.version_constraint else {
            return Ok(None);
        };

        if !constraint.is_compatible(version) {
            return Err(Error::IncompatibleVersionConstraint {
                dependency: ExtensionDependency::new(requested.id(), constraint.clone()),
                context: format!("requested extension '{}@{version}'", requested.id()),
                source: None,
            });
        }
        Ok(Some(constraint.clone()))
    }

    /// Plan one dependency edge of an extension being installed.
    fn install_dependency(
        &mut self,
        dependency: &ExtensionDependency,
        namespace: Option<&str>,
    ) -> Result<PositionId> {
        self.check_cancelled()?;
        match namespace {
            Some(namespace) => tracing::info!(
                dependency = %dependency,
                namespace,
                "Resolving extension dependency"
            ),
            None => tracing::info!(dependency = %dependency, "Resolving extension dependency"),
        }

        if let Some(core) = self.collaborators.core.get(dependency.id()) {
            return self.use_core_extension(dependency, core);
        }

        let constraint = match self.use_planned(dependency, namespace)? {
            Planned::Reused(position) => return Ok(position),
            Planned::Continue(constraint) => constraint,
        };

        let installed = self.collaborators.installed.get(dependency.id(), namespace);
        let mut target = dependency.with_constraint(constraint.clone());
        if let Some(installed) = &installed {
            if constraint.is_compatible(installed.version()) && installed.is_valid(namespace) {
                tracing::info!(
                    installed = %installed.id(),
                    dependency = %dependency,
                    "There is already an installed extension covering the dependency"
                );
                let action = PlanAction::new(
                    installed.extension().clone(),
                    None,
                    ActionKind::None,
                    namespace.map(str::to_string),
                    installed.is_dependency(),
                );
                let resolution = Resolution::leaf(action, Some(constraint));
                return Ok(self
                    .cache
                    .register(&mut self.arena, resolution, Some(dependency.clone())));
            }

            let folded =
                self.fold_dependent_constraints(installed, dependency, &constraint, namespace)?;
            target = dependency.with_constraint(folded);
        }

        self.enter(dependency.id(), namespace)?;
        let result = self.install_fresh(dependency, &target, installed, constraint, namespace);
        self.leave();
        result
    }

    fn use_core_extension(
        &mut self,
        dependency: &ExtensionDependency,
        core: CoreExtension,
    ) -> Result<PositionId> {
        if !dependency.version_constraint().is_compatible(core.version()) {
            return Err(Error::IncompatibleCoreExtension {
                dependency: dependency.clone(),
                core: core.id().clone(),
            });
        }
        tracing::info!(
            core = %core.id(),
            dependency = %dependency,
            "There is already a core extension covering the dependency"
        );

        let action = PlanAction::new(
            core.extension().clone(),
            None,
            ActionKind::None,
            None,
            true,
        );
        Ok(self.cache.register(
            &mut self.arena,
            Resolution::leaf(action, None),
            Some(dependency.clone()),
        ))
    }

    /// Look for a resolution of the dependency already in the plan.
    fn use_planned(
        &mut self,
        dependency: &ExtensionDependency,
        namespace: Option<&str>,
    ) -> Result<Planned> {
        let constraint = dependency.version_constraint();
        let Some(existing) = self.cache.lookup(dependency.id(), namespace) else {
            return Ok(Planned::Continue(constraint.clone()));
        };

        let resolution = self.arena.resolution(existing);
        let planned_id = resolution.action.extension_id().clone();
        let planned_constraint = resolution.version_constraint.clone();

        if constraint.is_compatible(planned_id.version()) {
            tracing::debug!(
                planned = %planned_id,
                dependency = %dependency,
                "Reusing planned extension"
            );
            if let Some(current) = &planned_constraint {
                let narrowed = current.merge(constraint).map_err(|source| {
                    Error::IncompatibleVersionConstraint {
                        dependency: dependency.clone(),
                        context: format!("planned constraint '{current}'"),
                        source: Some(source),
                    }
                })?;
                self.arena.resolution_mut(existing).version_constraint = Some(narrowed);
            }
            return Ok(Planned::Reused(
                self.arena.add_position(existing, Some(dependency.clone())),
            ));
        }

        match &planned_constraint {
            Some(current) => {
                let merged = constraint.merge(current).map_err(|source| {
                    Error::IncompatibleVersionConstraint {
                        dependency: dependency.clone(),
                        context: format!("planned constraint '{current}'"),
                        source: Some(source),
                    }
                })?;
                tracing::debug!(
                    planned = %planned_id,
                    constraint = %merged,
                    "Planned extension is incompatible, resolving with merged constraint"
                );
                Ok(Planned::Continue(merged))
            }
            None => Err(Error::IncompatibleVersionConstraint {
                dependency: dependency.clone(),
                context: format!("planned extension '{planned_id}'"),
                source: None,
            }),
        }
    }

    /// Resolve a dependency through the repositories and plan its subtree.
    fn install_fresh(
        &mut self,
        dependency: &ExtensionDependency,
        target: &ExtensionDependency,
        previous: Option<InstalledExtension>,
        constraint: VersionConstraint,
        namespace: Option<&str>,
    ) -> Result<PositionId> {
        let level = ProgressLevel::push(self.progress, 2);
        let extension = self.resolve_dependency(target)?;
        level.step();

        if !target.version_constraint().is_compatible(extension.version()) {
            return Err(Error::ResolutionFailed {
                target: target.to_string(),
                source: ResolveError::NoMatchingVersion {
                    id: target.id().to_string(),
                    constraint: target.version_constraint().to_string(),
                },
            });
        }

        let mut resolution = self.build_resolution(extension, previous, true, namespace)?;
        drop(level);

        resolution.version_constraint = Some(constraint);
        Ok(self
            .cache
            .register(&mut self.arena, resolution, Some(dependency.clone())))
    }

    /// Plan every dependency of `extension`, then build its action.
    fn build_resolution(
        &mut self,
        extension: Extension,
        previous: Option<InstalledExtension>,
        dependency: bool,
        namespace: Option<&str>,
    ) -> Result<Resolution> {
        let level = ProgressLevel::push(self.progress, extension.dependencies().len() + 1);
        let mut children = Vec::with_capacity(extension.dependencies().len());
        for child in extension.dependencies() {
            children.push(self.install_dependency(child, namespace)?);
            level.step();
        }

        let kind = ActionKind::classify(
            previous.as_ref().map(InstalledExtension::version),
            extension.version(),
        );
        Ok(Resolution {
            action: PlanAction::new(
                extension,
                previous,
                kind,
                namespace.map(str::to_string),
                dependency,
            ),
            children,
            version_constraint: None,
        })
    }

    /// Resolve a requested extension: local repository first unless
    /// `ignore_local` is set, then remote.
    fn resolve_extension(&self, requested: &RequestedExtension) -> Result<Extension> {
        let mut local = None;
        if !self.request.ignore_local {
            match self.collaborators.local.resolve(requested) {
                Ok(extension) => local = Some(extension),
                Err(err) => tracing::debug!(
                    extension = %requested,
                    error = %err,
                    "Can't find extension in local repository, trying to download it"
                ),
            }
        }

        let extension = match local {
            Some(extension) => extension,
            None => self
                .collaborators
                .remote
                .resolve(requested)
                .map_err(|source| Error::ResolutionFailed {
                    target: requested.to_string(),
                    source,
                })?,
        };

        if let Some(version) = requested.version() {
            if extension.version() != version {
                return Err(Error::ResolutionFailed {
                    target: requested.to_string(),
                    source: ResolveError::VersionNotFound {
                        id: requested.id().to_string(),
                        version: version.to_string(),
                    },
                });
            }
        }

        self.check_handler(&extension)?;
        Ok(extension)
    }

    /// Resolve a dependency: local repository first, then remote.
    fn resolve_dependency(&self, dependency: &ExtensionDependency) -> Result<Extension> {
        let extension = match self.collaborators.local.resolve_dependency(dependency) {
            Ok(extension) => extension,
            Err(err) => {
                tracing::debug!(
                    dependency = %dependency,
                    error = %err,
                    "Can't find extension dependency in local repository, trying to download it"
                );
                self.collaborators
                    .remote
                    .resolve_dependency(dependency)
                    .map_err(|source| Error::ResolutionFailed {
                        target: dependency.to_string(),
                        source,
                    })?
            }
        };

        self.check_handler(&extension)?;
        Ok(extension)
    }

    fn check_handler(&self, extension: &Extension) -> Result<()> {
        if self.collaborators.handlers.supports(extension.kind()) {
            Ok(())
        } else {
            Err(Error::UnsupportedType {
                extension: extension.id().clone(),
                kind: extension.kind().to_string(),
            })
        }
    }

    /// Installed extensions depending on `installed` that matter on `namespace`.
    fn dependents(
        &self,
        installed: &InstalledExtension,
        namespace: Option<&str>,
    ) -> Result<Vec<InstalledExtension>> {
        let store = self.collaborators.installed;
        let id = installed.id().id();
        let failed = |source| Error::ResolutionFailed {
            target: format!("backward dependencies of {}", installed.id()),
            source,
        };

        let dependents: Vec<InstalledExtension> = match namespace {
            None => store
                .backward_dependencies(id)
                .map_err(failed)?
                .into_values()
                .flatten()
                .collect(),
            Some(namespace) => {
                let mut dependents = store
                    .backward_dependencies_in(id, Some(namespace))
                    .map_err(failed)?;
                if installed.is_installed(None) {
                    dependents.extend(store.backward_dependencies_in(id, None).map_err(failed)?);
                }
                dependents
            }
        };

        Ok(dependents
            .into_iter()
            .filter(|dependent| !self.is_replaced(dependent, namespace))
            .collect())
    }

    /// Whether this plan already changes `dependent` to another version, so
    /// its installed constraints no longer apply.
    fn is_replaced(&self, dependent: &InstalledExtension, namespace: Option<&str>) -> bool {
        let id = dependent.id().id();
        if self.resolving.iter().any(|(resolving, _)| resolving == id) {
            return true;
        }
        self.cache.lookup(id, namespace).is_some_and(|planned| {
            let action = &self.arena.resolution(planned).action;
            action.kind() != ActionKind::None && action.extension().version() != dependent.version()
        })
    }

    /// Fail if moving `installed` to `version` breaks one of its dependents.
    fn check_backward_dependencies(
        &self,
        installed: &InstalledExtension,
        version: &Version,
        namespace: Option<&str>,
    ) -> Result<()> {
        for dependent in self.dependents(installed, namespace)? {
            let Some(declared) = dependent.extension().dependency(installed.id().id()) else {
                continue;
            };
            if !declared.version_constraint().is_compatible(version) {
                return Err(Error::IncompatibleBackwardDependency {
                    id: installed.id().id().to_string(),
                    version: version.clone(),
                    dependent: dependent.id().clone(),
                    constraint: declared.version_constraint().clone(),
                });
            }
        }
        Ok(())
    }

    /// Narrow `constraint` by what every dependent of `installed` declares.
    fn fold_dependent_constraints(
        &self,
        installed: &InstalledExtension,
        dependency: &ExtensionDependency,
        constraint: &VersionConstraint,
        namespace: Option<&str>,
    ) -> Result<VersionConstraint> {
        let mut folded = constraint.clone();
        for dependent in self.dependents(installed, namespace)? {
            let Some(declared) = dependent.extension().dependency(dependency.id()) else {
                continue;
            };
            folded = folded.merge(declared.version_constraint()).map_err(|source| {
                Error::IncompatibleVersionConstraint {
                    dependency: dependency.clone(),
                    context: format!("installed extension '{}'", dependent.id()),
                    source: Some(source),
                }
            })?;
        }
        Ok(folded)
    }
}

/// Outcome of looking a dependency up among planned resolutions.
enum Planned {
    Reused(PositionId),
    Continue(VersionConstraint),
}
