//! ASCII tree rendering for figure trees and the task hierarchy.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{FigureId, FigureStatus, FigureTree, TaskState, Worklog};

const DRAFT: char = '◇';
const READY: char = '○';
const SUBMITTED: char = '◐';
const PUBLISHED: char = '●';

/// Get the status symbol for a figure status.
fn figure_symbol(status: FigureStatus) -> char {
    match status {
        FigureStatus::Draft => DRAFT,
        FigureStatus::Ready => READY,
        FigureStatus::Submitted => SUBMITTED,
        FigureStatus::Published => PUBLISHED,
    }
}

/// Render a figure tree as ASCII art with status symbols.
///
/// Example output:
/// ```text
/// fig1
/// ├── ● 1a — Sample preparation
/// ├── ○ 1b — Microscopy setup
/// │   ├── ◇ schematic
/// │   └── ◇ photo
/// └── ◐ 1c
/// ```
pub fn render_figure_tree(tree: &FigureTree) -> String {
    let mut output = String::new();
    let roots = tree.children_of(None);
    for (i, root) in roots.iter().enumerate() {
        render_figure_node(&mut output, tree, *root, "", i == roots.len() - 1, true);
    }
    output
}

fn render_figure_node(
    output: &mut String,
    tree: &FigureTree,
    node: FigureId,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    let Some(element) = tree.get(node) else {
        return;
    };
    let label = if element.title.is_empty() {
        element.id.clone()
    } else {
        format!("{} — {}", element.id, element.title)
    };

    if is_root {
        output.push_str(&label);
        output.push('\n');
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(figure_symbol(element.status));
        output.push(' ');
        output.push_str(&label);
        output.push('\n');
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{prefix}{continuation}")
    };

    let children = tree.children_of(Some(node));
    for (i, child) in children.iter().enumerate() {
        render_figure_node(
            output,
            tree,
            *child,
            &child_prefix,
            i == children.len() - 1,
            false,
        );
    }
}

/// Render the task hierarchy with punch state and tracked time.
pub fn render_task_tree(worklog: &Worklog, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    let roots: Vec<Uuid> = worklog
        .tasks
        .iter()
        .filter(|t| t.parent.is_none())
        .map(|t| t.id)
        .collect();
    for (i, root) in roots.iter().enumerate() {
        render_task(&mut output, worklog, *root, "", i == roots.len() - 1, true, now);
    }
    output
}

#[allow(clippy::too_many_arguments)]
fn render_task(
    output: &mut String,
    worklog: &Worklog,
    id: Uuid,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    now: DateTime<Utc>,
) {
    let Some(task) = worklog.task(id) else {
        return;
    };
    let marker = if task.completed {
        '✓'
    } else {
        match task.state() {
            TaskState::Active => '▶',
            TaskState::Paused => '‖',
            TaskState::Idle => '·',
        }
    };

    let minutes = task.elapsed_at(now).num_minutes();
    if !is_root {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
    }
    output.push(marker);
    output.push(' ');
    output.push_str(&task.name);
    if minutes > 0 {
        output.push_str(&format!(" ({})", format_minutes(minutes)));
    }
    output.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{prefix}{continuation}")
    };

    let children = worklog.children_of(id);
    for (i, child) in children.iter().enumerate() {
        render_task(
            output,
            worklog,
            child.id,
            &child_prefix,
            i == children.len() - 1,
            false,
            now,
        );
    }
}

fn format_minutes(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h{:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FigureElement, TaskCategory};

    fn element(id: &str, status: FigureStatus) -> FigureElement {
        FigureElement {
            id: id.to_string(),
            title: String::new(),
            source: None,
            status,
        }
    }

    #[test]
    fn test_single_root() {
        let mut tree = FigureTree::new();
        tree.insert(None, element("fig1", FigureStatus::Draft)).unwrap();
        assert_eq!(render_figure_tree(&tree), "fig1\n");
    }

    #[test]
    fn test_with_children() {
        let mut tree = FigureTree::new();
        let fig = tree.insert(None, element("fig1", FigureStatus::Draft)).unwrap();
        tree.insert(Some(fig), element("1a", FigureStatus::Published))
            .unwrap();
        tree.insert(Some(fig), element("1b", FigureStatus::Ready))
            .unwrap();

        assert_eq!(render_figure_tree(&tree), "fig1\n├── ● 1a\n└── ○ 1b\n");
    }

    #[test]
    fn test_nested_children() {
        let mut tree = FigureTree::new();
        let fig = tree.insert(None, element("fig1", FigureStatus::Draft)).unwrap();
        tree.insert(Some(fig), element("1a", FigureStatus::Published))
            .unwrap();
        let panel = tree
            .insert(Some(fig), element("1b", FigureStatus::Ready))
            .unwrap();
        tree.insert(Some(panel), element("schematic", FigureStatus::Draft))
            .unwrap();
        tree.insert(Some(panel), element("photo", FigureStatus::Draft))
            .unwrap();
        tree.insert(Some(fig), element("1c", FigureStatus::Submitted))
            .unwrap();

        let expected = "fig1\n├── ● 1a\n├── ○ 1b\n│   ├── ◇ schematic\n│   └── ◇ photo\n└── ◐ 1c\n";
        assert_eq!(render_figure_tree(&tree), expected);
    }

    #[test]
    fn test_task_tree_markers() {
        let mut worklog = Worklog::default();
        let analysis = worklog
            .add_task("Segmentation", TaskCategory::Development, None)
            .unwrap();
        worklog
            .add_task("Tune thresholds", TaskCategory::Execution, Some(analysis))
            .unwrap();

        let now = Utc::now();
        let rendered = render_task_tree(&worklog, now);
        assert_eq!(rendered, "· Segmentation\n└── · Tune thresholds\n");
    }
}
