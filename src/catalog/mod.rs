//! Relation names for plan nodes.
//!
//! A node's relation id is a position in the statement's range table; the
//! range-table entry at that position holds the catalog oid, and the catalog
//! maps the oid to a table name.

use serde::Serialize;
use tracing::debug;

use crate::common::PlanResult;
use crate::plan::{PlanNode, PlannedStatement, RangeTableEntry};

pub mod pg_catalog;
pub use pg_catalog::PgCatalog;

/// A catalog oid with its relation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationName {
    pub relation_id: i64,
    pub name: String,
}

impl RelationName {
    pub fn new(relation_id: i64, name: &str) -> Self {
        RelationName {
            relation_id,
            name: name.to_string(),
        }
    }
}

/// Source of relation names for a set of catalog oids.
pub trait RelationCatalog {
    fn relation_names(&self, relation_ids: &[i64]) -> PlanResult<Vec<RelationName>>;
}

impl RelationCatalog for [RelationName] {
    fn relation_names(&self, relation_ids: &[i64]) -> PlanResult<Vec<RelationName>> {
        Ok(self
            .iter()
            .filter(|r| relation_ids.contains(&r.relation_id))
            .cloned()
            .collect())
    }
}

impl RelationCatalog for Vec<RelationName> {
    fn relation_names(&self, relation_ids: &[i64]) -> PlanResult<Vec<RelationName>> {
        self.as_slice().relation_names(relation_ids)
    }
}

fn resolve<'a>(
    relation_id: i64,
    range_table: &[RangeTableEntry],
    lookup: &'a [RelationName],
) -> Option<&'a str> {
    let entry = range_table.iter().find(|e| e.index as i64 == relation_id)?;
    lookup
        .iter()
        .find(|r| r.relation_id == entry.relation_id)
        .map(|r| r.name.as_str())
}

fn enrich_node(node: &mut PlanNode, range_table: &[RangeTableEntry], lookup: &[RelationName]) {
    if let Some(name) = node.relation_id.and_then(|id| resolve(id, range_table, lookup)) {
        debug!("{} resolves to table {}", node.node_type, name);
        node.table_name = Some(name.to_string());
    }
    if let Some(left) = node.left_child.as_deref_mut() {
        enrich_node(left, range_table, lookup);
    }
    if let Some(right) = node.right_child.as_deref_mut() {
        enrich_node(right, range_table, lookup);
    }
}

/// Sets `table_name` on every node whose relation resolves through the
/// range table and `lookup`. The first matching lookup entry wins.
pub fn enrich(stmt: &mut PlannedStatement, lookup: &[RelationName]) {
    enrich_node(&mut stmt.plan_tree, &stmt.range_table, lookup);
}

/// Queries `catalog` for the statement's relations, then enriches it.
pub fn enrich_from<C: RelationCatalog + ?Sized>(
    stmt: &mut PlannedStatement,
    catalog: &C,
) -> PlanResult<()> {
    let ids = stmt.relation_ids();
    if ids.is_empty() {
        return Ok(());
    }
    let lookup = catalog.relation_names(&ids)?;
    debug!("catalog resolved {} of {} relations", lookup.len(), ids.len());
    enrich(stmt, &lookup);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PlanError;
    use crate::plan::{parse, tokenize};

    const HASH_JOIN: &str = include_str!("../../tests/fixtures/hash_join.plan");
    const SELECT_FROM_TABLE: &str = include_str!("../../tests/fixtures/select_from_table.plan");

    fn parse_str(input: &str) -> PlannedStatement {
        parse(&tokenize(input))
    }

    struct FailingCatalog;

    impl RelationCatalog for FailingCatalog {
        fn relation_names(&self, _relation_ids: &[i64]) -> PlanResult<Vec<RelationName>> {
            Err(PlanError::Catalog("connection refused".to_string()))
        }
    }

    #[test]
    fn test_enrich_through_range_table_index() {
        let mut stmt = parse_str(
            "{PLANNEDSTMT :planTree {SEQSCAN relid 1} :rtables ({RTABLEENTRY relid 16424})}",
        );
        enrich(&mut stmt, &[RelationName::new(16424, "flight")]);
        assert_eq!(stmt.plan_tree.table_name.as_deref(), Some("flight"));
    }

    #[test]
    fn test_enrich_does_not_match_oid_directly() {
        // relid 16424 is not a range-table position
        let mut stmt = parse_str(
            "{PLANNEDSTMT :planTree {SEQSCAN relid 16424} :rtables ({RTABLEENTRY relid 16424})}",
        );
        enrich(&mut stmt, &[RelationName::new(16424, "flight")]);
        assert_eq!(stmt.plan_tree.table_name, None);

        let mut stmt = parse_str(
            "{PLANNEDSTMT :planTree {SEQSCAN relid 1} :rtables ({RTABLEENTRY relid 16424})}",
        );
        enrich(&mut stmt, &[RelationName::new(1, "wrong")]);
        assert_eq!(stmt.plan_tree.table_name, None);
    }

    #[test]
    fn test_enrich_walks_both_children() {
        let mut stmt = parse_str(HASH_JOIN);
        let lookup = vec![
            RelationName::new(16390, "aircraft"),
            RelationName::new(16424, "flight"),
        ];
        enrich(&mut stmt, &lookup);
        let root = &stmt.plan_tree;
        assert_eq!(root.table_name, None);
        assert_eq!(root.left_child.as_ref().unwrap().table_name.as_deref(), Some("flight"));
        let hash = root.right_child.as_ref().unwrap();
        assert_eq!(hash.table_name, None);
        assert_eq!(hash.left_child.as_ref().unwrap().table_name.as_deref(), Some("aircraft"));
    }

    #[test]
    fn test_enrich_first_match_wins() {
        let mut stmt = parse_str(SELECT_FROM_TABLE);
        let lookup = vec![
            RelationName::new(16424, "flight"),
            RelationName::new(16424, "flight_old"),
        ];
        enrich(&mut stmt, &lookup);
        assert_eq!(stmt.plan_tree.table_name.as_deref(), Some("flight"));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let lookup = vec![RelationName::new(16424, "flight"), RelationName::new(16390, "aircraft")];
        let mut once = parse_str(HASH_JOIN);
        enrich(&mut once, &lookup);
        let mut twice = once.clone();
        enrich(&mut twice, &lookup);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_enrich_from_catalog() {
        let catalog = vec![
            RelationName::new(16424, "flight"),
            RelationName::new(99, "unrelated"),
        ];
        assert_eq!(
            catalog.relation_names(&[16424]).unwrap(),
            vec![RelationName::new(16424, "flight")]
        );

        let mut stmt = parse_str(SELECT_FROM_TABLE);
        enrich_from(&mut stmt, &catalog).unwrap();
        assert_eq!(stmt.plan_tree.table_name.as_deref(), Some("flight"));
    }

    #[test]
    fn test_enrich_from_skips_catalog_without_relations() {
        let mut stmt = parse_str("{PLANNEDSTMT :planTree {RESULT}}");
        assert!(enrich_from(&mut stmt, &FailingCatalog).is_ok());

        let mut stmt = parse_str(SELECT_FROM_TABLE);
        let err = enrich_from(&mut stmt, &FailingCatalog).unwrap_err();
        assert!(matches!(err, PlanError::Catalog(_)));
        assert_eq!(stmt.plan_tree.table_name, None);
    }
}
