//! Plan rendering

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use extplan_planner::{ActionKind, Plan, PlanAction, PlanNode};

fn paint(action: &PlanAction) -> ColoredString {
    let text = action.to_string();
    match action.kind() {
        ActionKind::Install => text.green(),
        ActionKind::Upgrade => text.cyan(),
        ActionKind::Downgrade => text.yellow(),
        ActionKind::None => text.dimmed(),
    }
}

fn render_node(out: &mut String, node: &PlanNode, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let _ = write!(out, "{indent}{}", paint(node.action()));
    if let Some(dependency) = node.initial_dependency() {
        let _ = write!(
            out,
            " {}",
            format!("(requires {})", dependency.version_constraint()).dimmed()
        );
    }
    out.push('\n');
    for child in node.children() {
        render_node(out, child, depth + 1);
    }
}

/// The plan tree, one action per line, children indented under parents.
pub fn tree(plan: &Plan) -> String {
    let mut out = format!("{}\n", "Plan".bold());
    for root in plan.tree() {
        render_node(&mut out, root, 0);
    }
    out
}

/// The flattened actions in execution order.
pub fn actions(plan: &Plan) -> String {
    let mut out = format!("{} ({}):\n", "Actions".bold(), plan.len());
    for (index, action) in plan.actions().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, paint(action));
    }
    out
}

pub fn json(plan: &Plan) -> serde_json::Result<String> {
    serde_json::to_string_pretty(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extplan_model::{InstallRequest, RequestedExtension};
    use extplan_planner::Planner;
    use extplan_test_utils::{TestWorld, extension};

    fn plan() -> Plan {
        let world = TestWorld::new()
            .remote(extension("a", "1.0").depends_on("b", "[1.0,2.0)").build())
            .remote(extension("b", "1.5").build());
        let request = InstallRequest::new()
            .with_extension(RequestedExtension::parse("a@1.0").unwrap());
        Planner::new(world.collaborators()).plan(&request).unwrap()
    }

    #[test]
    fn test_tree_indents_children() {
        colored::control::set_override(false);

        let text = tree(&plan());

        assert_eq!(
            text,
            "Plan\n  install a@1.0.0\n    install b@1.5.0 (requires [1.0,2.0))\n"
        );
    }

    #[test]
    fn test_actions_in_execution_order() {
        colored::control::set_override(false);

        let text = actions(&plan());

        assert_eq!(
            text,
            "Actions (2):\n  1. install b@1.5.0\n  2. install a@1.0.0\n"
        );
    }

    #[test]
    fn test_json_lists_actions() {
        let value: serde_json::Value = serde_json::from_str(&json(&plan()).unwrap()).unwrap();

        let actions = value["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0]["kind"], "install");
    }
}
