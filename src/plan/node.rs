//! Definitions for parsed query plans.
//! This module defines the plan tree, the range table and the statement that owns both.

use std::fmt;

use serde::Serialize;

/// One `{...}` operation of the plan tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanNode {
    pub node_type: String,
    /// Position in the range table (1-based), not a catalog oid.
    pub relation_id: Option<i64>,
    pub left_child: Option<Box<PlanNode>>,
    pub right_child: Option<Box<PlanNode>>,
    pub set_op_command: Option<i64>,
    pub set_op_strategy: Option<i64>,
    /// Filled in by [`crate::catalog::enrich`].
    pub table_name: Option<String>,
}

impl PlanNode {
    pub fn new(node_type: &str) -> Self {
        PlanNode {
            node_type: node_type.to_string(),
            ..Default::default()
        }
    }

    pub fn children(&self) -> Vec<&PlanNode> {
        self.left_child
            .iter()
            .chain(self.right_child.iter())
            .map(|child| child.as_ref())
            .collect()
    }

    /// Number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// One element of the statement's range table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeTableEntry {
    pub index: usize,
    /// Catalog oid of the relation.
    pub relation_id: i64,
}

impl RangeTableEntry {
    pub fn new(index: usize, relation_id: i64) -> Self {
        RangeTableEntry { index, relation_id }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlannedStatement {
    pub plan_tree: PlanNode,
    pub range_table: Vec<RangeTableEntry>,
}

impl PlannedStatement {
    /// Distinct catalog oids referenced by the range table, in range-table order.
    pub fn relation_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.range_table.len());
        for entry in &self.range_table {
            if !ids.contains(&entry.relation_id) {
                ids.push(entry.relation_id);
            }
        }
        ids
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.node_type.is_empty() {
            return Ok(());
        }
        write!(f, "{{ {}", self.node_type)?;
        if let Some(name) = &self.table_name {
            write!(f, " name: {}", name)?;
        }
        for child in self.children() {
            write!(f, " {}", child)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for PlannedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .range_table
            .iter()
            .map(|e| format!("{}:{}", e.index, e.relation_id))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "plantree: {} rtable: [{}]", self.plan_tree, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_tree() -> PlanNode {
        let mut root = PlanNode::new("HASHJOIN");
        root.left_child = Some(Box::new(PlanNode::new("SEQSCAN")));
        let mut hash = PlanNode::new("HASH");
        hash.left_child = Some(Box::new(PlanNode::new("SEQSCAN")));
        root.right_child = Some(Box::new(hash));
        root
    }

    #[test]
    fn test_children_and_node_count() {
        let root = join_tree();
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].node_type, "SEQSCAN");
        assert_eq!(children[1].node_type, "HASH");
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_relation_ids_dedup_in_order() {
        let stmt = PlannedStatement {
            plan_tree: PlanNode::default(),
            range_table: vec![
                RangeTableEntry::new(1, 16424),
                RangeTableEntry::new(2, 16390),
                RangeTableEntry::new(3, 16424),
            ],
        };
        assert_eq!(stmt.relation_ids(), vec![16424, 16390]);
    }

    #[test]
    fn test_display() {
        let mut root = join_tree();
        root.table_name = Some("flight".to_string());
        assert_eq!(
            root.to_string(),
            "{ HASHJOIN name: flight { SEQSCAN } { HASH { SEQSCAN } } }"
        );
        assert_eq!(PlanNode::default().to_string(), "");
    }

    #[test]
    fn test_statement_display() {
        let stmt = PlannedStatement {
            plan_tree: join_tree(),
            range_table: vec![
                RangeTableEntry::new(1, 16424),
                RangeTableEntry::new(2, 16390),
            ],
        };
        assert_eq!(
            stmt.to_string(),
            "plantree: { HASHJOIN { SEQSCAN } { HASH { SEQSCAN } } } rtable: [1:16424, 2:16390]"
        );
        assert_eq!(PlannedStatement::default().to_string(), "plantree:  rtable: []");
    }
}
