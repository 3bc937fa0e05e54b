//! Catalog and request files driving the planner end to end.

use extplan_model::{Catalog, InstallRequest};
use extplan_planner::{ActionKind, Planner, ProgressTracker};
use extplan_test_utils::{RecordingProgress, TempInputs};
use pretty_assertions::assert_eq;
use rstest::rstest;

const CATALOG: &str = r#"
handlers = ["plugin", "theme"]
selection = "highest"

[[core]]
id = "platform"
version = "16.4"

[[installed]]
id = "macros"
version = "1.0"
dependency = true

[[installed]]
id = "blog"
version = "1.0"
dependencies = [{ id = "macros", constraint = "[1.0,3.0)" }]

[[remote]]
id = "skin"
version = "1.1"
type = "theme"
dependencies = [
    { id = "platform", constraint = ">=16.0" },
    { id = "macros", constraint = ">=2.0" },
]

[[remote]]
id = "macros"
version = "2.0"

[[remote]]
id = "macros"
version = "2.5"

[[remote]]
id = "macros"
version = "3.0"
"#;

fn load(inputs: &TempInputs, catalog: &str) -> Catalog {
    Catalog::from_path(&inputs.write("catalog.toml", catalog)).unwrap()
}

#[test]
fn plan_from_files() {
    let inputs = TempInputs::new();
    let world = load(&inputs, CATALOG).into_collaborators().unwrap();
    let request =
        InstallRequest::from_path(&inputs.write("request.toml", "extensions = [\"skin@1.1\"]\n"))
            .unwrap();

    let plan = Planner::new(world.collaborators()).plan(&request).unwrap();

    let actions: Vec<String> = plan.actions().map(ToString::to_string).collect();
    assert_eq!(
        actions,
        vec![
            "none platform@16.4.0",
            "upgrade macros@2.5.0 (from 1.0.0)",
            "install skin@1.1.0",
        ]
    );
    assert!(plan.action_for("macros", None).unwrap().is_dependency());
}

#[rstest]
#[case::highest("highest", "2.5.0")]
#[case::lowest("lowest", "2.0.0")]
fn catalog_selection(#[case] selection: &str, #[case] expected: &str) {
    let inputs = TempInputs::new();
    let catalog = CATALOG.replace(
        "selection = \"highest\"",
        &format!("selection = \"{selection}\""),
    );
    let world = load(&inputs, &catalog).into_collaborators().unwrap();
    let request = InstallRequest::from_toml("extensions = [\"skin\"]").unwrap();

    let plan = Planner::new(world.collaborators()).plan(&request).unwrap();

    let macros = plan.action_for("macros", None).unwrap();
    assert_eq!(macros.kind(), ActionKind::Upgrade);
    assert_eq!(macros.extension().version().to_string(), expected);
}

#[test]
fn progress_completes() {
    let inputs = TempInputs::new();
    let world = load(&inputs, CATALOG).into_collaborators().unwrap();
    let request = InstallRequest::from_toml("extensions = [\"skin\"]\nnamespaces = [\"a\", \"b\"]")
        .unwrap();
    let tracker = ProgressTracker::new();

    Planner::new(world.collaborators())
        .with_progress(&tracker)
        .plan(&request)
        .unwrap();

    assert!((tracker.offset() - 1.0).abs() < 1e-9, "{}", tracker.offset());
}

#[test]
fn progress_is_balanced_when_planning_fails() {
    let inputs = TempInputs::new();
    let catalog = CATALOG.replace("handlers = [\"plugin\", \"theme\"]", "handlers = [\"plugin\"]");
    let world = load(&inputs, &catalog).into_collaborators().unwrap();
    let request = InstallRequest::from_toml("extensions = [\"skin\"]").unwrap();
    let progress = RecordingProgress::new();

    let result = Planner::new(world.collaborators())
        .with_progress(&progress)
        .plan(&request);

    assert!(result.is_err());
    assert!(progress.is_balanced());
}

#[test]
fn plan_serializes_to_json() {
    let inputs = TempInputs::new();
    let world = load(&inputs, CATALOG).into_collaborators().unwrap();
    let request = InstallRequest::from_toml("extensions = [\"skin\"]\nreinstall = true").unwrap();

    let plan = Planner::new(world.collaborators()).plan(&request).unwrap();
    let value = serde_json::to_value(&plan).unwrap();

    assert_eq!(value["request"]["reinstall"], true);
    assert_eq!(value["actions"].as_array().unwrap().len(), 3);
    let skin = &value["tree"][0];
    assert_eq!(skin["action"]["kind"], "install");
    assert_eq!(skin["children"][1]["initial_dependency"]["constraint"], ">=2.0");
    assert_eq!(skin["children"][1]["version_constraint"], ">=2.0");
}
