//! Install scenarios planned against catalogs loaded from TOML.

use extplan_model::{Catalog, InstallRequest, MemoryCollaborators, RequestedExtension, VersionConstraint};
use extplan_planner::{ActionKind, Error, Plan, Planner};
use pretty_assertions::assert_eq;

fn world(catalog: &str) -> MemoryCollaborators {
    Catalog::from_toml(catalog)
        .unwrap()
        .into_collaborators()
        .unwrap()
}

fn request(specs: &[&str]) -> InstallRequest {
    specs.iter().fold(InstallRequest::new(), |request, spec| {
        request.with_extension(RequestedExtension::parse(spec).unwrap())
    })
}

fn plan(catalog: &str, request: &InstallRequest) -> Result<Plan, Error> {
    let world = world(catalog);
    Planner::new(world.collaborators()).plan(request)
}

#[test]
fn scenario_a_single_install() {
    let catalog = r#"
[[remote]]
id = "a"
version = "1.0"
"#;

    let plan = plan(catalog, &request(&["a@1.0"])).unwrap();

    assert_eq!(plan.tree().len(), 1);
    let root = &plan.tree().roots()[0];
    assert_eq!(root.action().kind(), ActionKind::Install);
    assert!(root.children().is_empty());
}

#[test]
fn scenario_b_dependency_in_range() {
    let catalog = r#"
[[remote]]
id = "a"
version = "1.0"
dependencies = [{ id = "b", constraint = "[1.0,2.0)" }]

[[remote]]
id = "b"
version = "1.5"

[[remote]]
id = "b"
version = "2.0"
"#;

    let plan = plan(catalog, &request(&["a@1.0"])).unwrap();

    let root = &plan.tree().roots()[0];
    assert_eq!(root.action().kind(), ActionKind::Install);
    assert_eq!(root.children().len(), 1);
    let child = &root.children()[0];
    assert_eq!(child.action().kind(), ActionKind::Install);
    assert_eq!(child.action().extension_id().to_string(), "b@1.5.0");
}

#[test]
fn scenario_c_shared_dependency() {
    let catalog = r#"
[[remote]]
id = "a"
version = "1.0"
dependencies = [{ id = "c", constraint = ">=1.0,<2.0" }]

[[remote]]
id = "d"
version = "1.0"
dependencies = [{ id = "c", constraint = ">=1.5" }]

[[remote]]
id = "c"
version = "1.6"
"#;

    let plan = plan(catalog, &request(&["a", "d"])).unwrap();

    let under_a = &plan.tree().roots()[0].children()[0];
    let under_d = &plan.tree().roots()[1].children()[0];
    assert!(under_a.same_resolution(under_d));
    assert_eq!(
        under_d.version_constraint(),
        Some(&VersionConstraint::parse("[1.5,2.0)").unwrap())
    );
    assert_eq!(plan.actions().filter(|a| a.extension_id().id() == "c").count(), 1);
}

#[test]
fn scenario_d_backward_dependency_conflict() {
    let catalog = r#"
[[installed]]
id = "c"
version = "1.0"

[[installed]]
id = "e"
version = "1.0"
dependencies = [{ id = "c", constraint = "<1.5" }]

[[remote]]
id = "c"
version = "2.0"
"#;

    let err = plan(catalog, &request(&["c@2.0"])).unwrap_err();

    assert!(matches!(err, Error::IncompatibleBackwardDependency { .. }), "{err:?}");
}

#[test]
fn scenario_e_core_dependency() {
    let catalog = r#"
[[core]]
id = "x"
version = "3.0"

[[remote]]
id = "a"
version = "1.0"
dependencies = [{ id = "x", constraint = "^3.0" }]
"#;

    let plan = plan(catalog, &request(&["a@1.0"])).unwrap();

    let core = plan.action_for("x", None).unwrap();
    assert_eq!(core.kind(), ActionKind::None);
    assert_eq!(core.extension_id().to_string(), "x@3.0.0");
}

#[test]
fn reinstall_same_version() {
    let catalog = r#"
[[installed]]
id = "a"
version = "1.0"

[[remote]]
id = "a"
version = "1.0"
"#;

    let err = plan(catalog, &request(&["a@1.0"])).unwrap_err();
    assert!(matches!(err, Error::AlreadyInstalled { .. }));

    let plan = plan(catalog, &request(&["a@1.0"]).reinstall(true)).unwrap();
    let action = plan.action_for("a", None).unwrap();
    assert_eq!(action.kind(), ActionKind::Upgrade);
    assert_eq!(
        action.previous().map(|p| p.id().to_string()),
        Some("a@1.0.0".to_string())
    );
}

#[test]
fn namespaced_install_reuses_globally_installed_dependency() {
    let catalog = r#"
[[installed]]
id = "lib"
version = "1.2"

[[installed]]
id = "blog"
version = "1.0"
namespaces = ["wiki1"]
dependencies = [{ id = "lib", constraint = "[1.0,2.0)" }]

[[remote]]
id = "blog"
version = "2.0"
dependencies = [{ id = "lib", constraint = ">=1.1" }]
"#;
    let request = request(&["blog@2.0"]).with_namespace("wiki1").with_namespace("wiki2");

    let plan = plan(catalog, &request).unwrap();

    assert_eq!(plan.action_for("blog", Some("wiki1")).unwrap().kind(), ActionKind::Upgrade);
    assert_eq!(plan.action_for("blog", Some("wiki2")).unwrap().kind(), ActionKind::Install);
    assert_eq!(plan.action_for("lib", Some("wiki1")).unwrap().kind(), ActionKind::None);
    assert_eq!(plan.action_for("lib", Some("wiki2")).unwrap().kind(), ActionKind::None);
}

#[test]
fn failed_plan_leaves_collaborators_untouched() {
    let catalog = r#"
[[remote]]
id = "a"
version = "1.0"
dependencies = [{ id = "missing", constraint = "*" }]
"#;
    let world = world(catalog);
    let before = world.counts();

    let result = Planner::new(world.collaborators()).plan(&request(&["a"]));

    assert!(matches!(result, Err(Error::ResolutionFailed { .. })));
    assert_eq!(world.counts(), before);
}
