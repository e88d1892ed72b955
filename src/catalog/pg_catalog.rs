use std::time::Duration;

use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use super::{RelationCatalog, RelationName};
use crate::common::PlanResult;
use crate::config::CONNECT_TIMEOUT_SECS;

const RELATION_NAMES_SQL: &str =
    "SELECT oid::int8 AS relid, relname::text AS relname FROM pg_class WHERE oid::int8 = ANY($1)";

/// Relation names read from `pg_class` of a live PostgreSQL server.
///
/// Owns a single-threaded runtime so callers stay synchronous.
pub struct PgCatalog {
    runtime: Runtime,
    pool: PgPool,
}

impl PgCatalog {
    pub fn connect(url: &str) -> PlanResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let pool = runtime.block_on(
            PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .connect(url),
        )?;
        info!("connected to catalog database");
        Ok(PgCatalog { runtime, pool })
    }
}

impl RelationCatalog for PgCatalog {
    fn relation_names(&self, relation_ids: &[i64]) -> PlanResult<Vec<RelationName>> {
        let rows = self.runtime.block_on(
            sqlx::query(RELATION_NAMES_SQL)
                .bind(relation_ids.to_vec())
                .fetch_all(&self.pool),
        )?;
        rows.iter()
            .map(|row| -> PlanResult<RelationName> {
                Ok(RelationName {
                    relation_id: row.try_get("relid")?,
                    name: row.try_get("relname")?,
                })
            })
            .collect()
    }
}
