//! Composes the single SELECT statement for activity retrieval.
//!
//! The logical query shape is identical for both backends; the dialects
//! differ only in the vector-distance expression and the literal vector
//! encoding, both isolated here.


use crate::config::BackendKind;
use crate::schema::PROJECTED_COLUMNS;

/// SQL dialect of the active backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl From<BackendKind> for Dialect {
    #[inline]
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Sqlite => Dialect::Sqlite,
            BackendKind::Postgres => Dialect::Postgres,
        }
    }
}

impl Dialect {
    /// Cosine-distance expression between the stored embedding column and a
    /// literal query vector. Smaller is closer.
    fn distance_expression(self, embedding: &[f32]) -> String {
        let literal = vector_literal(embedding);
        match self {
            Dialect::Sqlite => {
                format!("vec_distance_cosine(embedding, vec_f32('{literal}'))")
            }
            Dialect::Postgres => format!("(embedding <=> '{literal}')"),
        }
    }

    /// Constant score used when there is no semantic ranking signal. Typed
    /// so both drivers decode the column as a double.
    fn constant_score(self) -> &'static str {
        match self {
            Dialect::Sqlite => "0.0",
            Dialect::Postgres => "0.0::float8",
        }
    }
}

fn vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(", "))
}

/// Build the activity retrieval query: fixed projection plus a computed
/// `score` column, optional verbatim WHERE predicate, ascending score order,
/// bounded row count.
///
/// Without an embedding the score is a constant and the ordering degenerates
/// to the backend's default scan order (insertion order for these
/// bootstrap-only tables); there is no ranking signal in that case.
#[inline]
pub fn build_activities_query(
    dialect: Dialect,
    embedding: Option<&[f32]>,
    predicate: Option<&str>,
    max_rows: u32,
) -> String {
    let score = match embedding {
        Some(vector) => dialect.distance_expression(vector),
        None => dialect.constant_score().to_string(),
    };

    let mut sql = format!(
        "SELECT {}, {} AS score FROM activities",
        PROJECTED_COLUMNS.join(", "),
        score
    );

    if let Some(clause) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }

    sql.push_str(&format!(" ORDER BY score ASC LIMIT {max_rows}"));
    sql
}
