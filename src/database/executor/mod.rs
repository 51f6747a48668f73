
use fancy_regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use super::models::Activity;
use super::{BackendPool, ConnectionManager};
use crate::{Result, RetrievalError};

static DISALLOWED_STATEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(update|delete|drop|insert|create|alter|truncate|merge)\b")
        .expect("hard-coded regex is valid")
});

/// Reject statements containing mutating DML/DDL keywords (case-insensitive,
/// whole-word match). A heuristic denylist, not a proof of read-only safety.
#[inline]
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let found = DISALLOWED_STATEMENTS
        .find(sql)
        .map_err(|e| RetrievalError::Other(anyhow::anyhow!("Statement scan failed: {e}")))?;

    if let Some(keyword) = found {
        return Err(RetrievalError::DisallowedStatement(format!(
            "contains disallowed DML/DDL keyword '{}'",
            keyword.as_str()
        )));
    }

    Ok(())
}

/// Execute a retrieval statement and map every returned row into an
/// `Activity` by column name.
///
/// The safety gate runs before any connection is acquired. Row mapping is
/// all-or-nothing: a single unmappable row discards the entire result with a
/// mapping failure. No backend error type escapes this boundary.
#[inline]
pub async fn fetch_activities(manager: &ConnectionManager, sql: &str) -> Result<Vec<Activity>> {
    ensure_read_only(sql)?;

    let handle = manager.acquire().await?;

    let activities = match handle.pool() {
        BackendPool::Sqlite(pool) => {
            let rows = sqlx::query(sql)
                .fetch_all(pool)
                .await
                .map_err(query_failure)?;
            rows.iter()
                .map(Activity::from_sqlite_row)
                .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
                .map_err(mapping_failure)?
        }
        BackendPool::Postgres(pool) => {
            let rows = sqlx::query(sql)
                .fetch_all(pool)
                .await
                .map_err(query_failure)?;
            rows.iter()
                .map(Activity::from_pg_row)
                .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
                .map_err(mapping_failure)?
        }
    };

    info!("Query returned {} activities", activities.len());
    Ok(activities)
}

fn query_failure(e: sqlx::Error) -> RetrievalError {
    RetrievalError::Query(format!("Database error: {e}"))
}

fn mapping_failure(e: sqlx::Error) -> RetrievalError {
    RetrievalError::Mapping(format!("Failed to format row into activity record: {e}"))
}
