//! Static schema description for the activities table.
//!
//! The DDL text grounds LLM predicate generation and is identical for both
//! backends; the filterable column list is the allowlist compiled predicates
//! are checked against.

/// DDL description handed to the filter compiler as grounding context.
pub const ACTIVITIES_DDL: &str = "\
TABLE activities (
    activity_id VARCHAR(50) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    duration_min INT,
    duration_max INT,
    kid_friendliness_score INT,
    cost INT,
    sight_id VARCHAR(50) REFERENCES locations(sight_id), -- Foreign key to locations table
    description TEXT,
    embedding VECTOR(768)
);
";

/// Columns a compiled predicate is allowed to reference.
pub const FILTERABLE_COLUMNS: &[&str] = &["duration_max", "cost", "kid_friendliness_score"];

/// Columns projected by every activities query, in projection order.
pub const PROJECTED_COLUMNS: &[&str] = &[
    "activity_id",
    "name",
    "description",
    "cost",
    "duration_min",
    "duration_max",
    "kid_friendliness_score",
];

/// Schema text for grounding the filter compiler.
#[inline]
pub fn activities_schema() -> &'static str {
    ACTIVITIES_DDL
}
