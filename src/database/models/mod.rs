
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

/// A bookable activity. Immutable once stored; created by the bootstrap
/// script and read-only at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: String,
    pub name: String,
    pub description: String,
    pub cost: f64,
    pub duration_min: i64,
    pub duration_max: i64,
    pub kid_friendliness_score: i64,
}

impl Activity {
    /// Map a SQLite result row by column name. Costs are stored with INT
    /// affinity (whole euros) in the seed schema.
    #[inline]
    pub fn from_sqlite_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            activity_id: row.try_get("activity_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            cost: row.try_get::<i64, _>("cost")? as f64,
            duration_min: row.try_get("duration_min")?,
            duration_max: row.try_get("duration_max")?,
            kid_friendliness_score: row.try_get("kid_friendliness_score")?,
        })
    }

    /// Map a Postgres result row by column name. The INT columns decode as
    /// `i32` and widen into the shared record type.
    #[inline]
    pub fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            activity_id: row.try_get("activity_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            cost: f64::from(row.try_get::<i32, _>("cost")?),
            duration_min: i64::from(row.try_get::<i32, _>("duration_min")?),
            duration_max: i64::from(row.try_get::<i32, _>("duration_max")?),
            kid_friendliness_score: i64::from(row.try_get::<i32, _>("kid_friendliness_score")?),
        })
    }
}
