//! Pretty printing for parsed plans.
//! Flattens the tree into depth-annotated rows and frames them in a box.

use super::node::{PlanNode, PlannedStatement};
use crate::config::{FRAME_PADDING, FRAME_TITLE};

const SET_OP_NODE: &str = "SETOP";

/// One rendered row: display depth (root is 1) and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub depth: usize,
    pub content: String,
}

fn strategy_label(strategy: Option<i64>) -> &'static str {
    match strategy {
        Some(1) => "Hash",
        _ => "",
    }
}

fn command_label(command: Option<i64>) -> &'static str {
    match command {
        Some(0) => "Intersect",
        Some(2) => "Except",
        _ => "",
    }
}

impl PlanNode {
    /// Node type with set-operation labels, without the table name.
    pub fn label(&self) -> String {
        if self.node_type != SET_OP_NODE {
            return self.node_type.clone();
        }
        [
            strategy_label(self.set_op_strategy),
            self.node_type.as_str(),
            command_label(self.set_op_command),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn collect_lines(node: &PlanNode, depth: usize, lines: &mut Vec<Line>) {
    let table = node.table_name.as_deref().unwrap_or_default();
    lines.push(Line {
        depth,
        content: format!("{} {}", node.label(), table),
    });
    for child in node.children() {
        collect_lines(child, depth + 1, lines);
    }
}

/// Pre-order rows of the plan tree.
pub fn plan_lines(stmt: &PlannedStatement) -> Vec<Line> {
    let mut lines = Vec::new();
    collect_lines(&stmt.plan_tree, 1, &mut lines);
    lines
}

fn width_of(s: &str) -> usize {
    s.chars().count()
}

/// Frames rows in a box `FRAME_PADDING` columns wider than the longest row.
pub fn frame(lines: &[Line]) -> String {
    let max = lines.iter().map(|l| width_of(&l.content)).max().unwrap_or(0);
    let width = max + FRAME_PADDING;
    let rule = "─".repeat(width);

    let title_len = width_of(FRAME_TITLE);
    let left = (width - title_len) / 2;
    let right = width - title_len - left;

    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", rule));
    out.push_str(&format!("│{}{}{}│\n", " ".repeat(left), FRAME_TITLE, " ".repeat(right)));
    out.push_str(&format!("├{}┤\n", rule));
    for line in lines {
        let row = format!(" {} {}", line.depth, line.content);
        let pad = width.saturating_sub(width_of(&row));
        out.push_str(&format!("│{}{}│\n", row, " ".repeat(pad)));
    }
    out.push_str(&format!("└{}┘\n", rule));
    out
}

/// Renders the plan tree as a boxed, indented diagram.
pub fn render(stmt: &PlannedStatement) -> String {
    frame(&plan_lines(stmt))
}
