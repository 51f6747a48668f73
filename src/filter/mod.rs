
use async_trait::async_trait;
use fancy_regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::database::executor::ensure_read_only;
use crate::genai::GenerativeClient;
use crate::schema::FILTERABLE_COLUMNS;
use crate::{Result, RetrievalError};

const COMPILATION_TEMPERATURE: f32 = 0.1;

/// Translates keyword range constraints into a SQL boolean predicate.
///
/// Inherently non-deterministic when backed by a language model; the trait
/// seam exists so tests can substitute a deterministic implementation.
/// `Ok(None)` means "no filter".
#[async_trait]
pub trait FilterCompiler: Send + Sync {
    async fn compile(&self, constraints: &[String], schema: &str) -> Result<Option<String>>;
}

/// Filter compiler backed by one generation call to the model endpoint.
///
/// A single attempt per compilation: the pipeline degrades a failed
/// compilation to "no filter" instead of retrying.
pub struct LlmFilterCompiler {
    client: GenerativeClient,
}

impl LlmFilterCompiler {
    #[inline]
    pub fn new(client: GenerativeClient) -> Self {
        Self {
            client: client.with_retry_attempts(1),
        }
    }
}

#[async_trait]
impl FilterCompiler for LlmFilterCompiler {
    #[inline]
    async fn compile(&self, constraints: &[String], schema: &str) -> Result<Option<String>> {
        let prompt = build_prompt(constraints, schema)?;

        let client = self.client.clone();
        let response = tokio::task::spawn_blocking(move || {
            client.generate_content(&prompt, COMPILATION_TEMPERATURE)
        })
        .await
        .map_err(|e| RetrievalError::Compilation(format!("Compilation task panicked: {e}")))?
        .map_err(|e| {
            warn!("Predicate compilation request failed: {:#}", e);
            RetrievalError::Compilation(format!("{e:#}"))
        })?;

        let predicate = parse_compiler_response(&response)?;

        if let Some(ref clause) = predicate {
            validate_predicate(clause)?;
            debug!("Compiled predicate: {}", clause);
        } else {
            debug!("Compiler produced no predicate");
        }

        Ok(predicate)
    }
}

#[derive(Debug, serde::Deserialize)]
struct CompilerResponse {
    #[serde(default)]
    justification: String,
    #[serde(rename = "where")]
    where_clause: String,
}

/// Parse the model response: strip code fences, parse strict JSON, extract
/// the `where` field. An empty clause means "no filter".
fn parse_compiler_response(raw: &str) -> Result<Option<String>> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let response: CompilerResponse = serde_json::from_str(cleaned).map_err(|e| {
        warn!("Compiler response was not valid JSON: {}", e);
        RetrievalError::Compilation(format!("Malformed compiler response: {e}"))
    })?;

    debug!("Compiler justification: {}", response.justification);

    let clause = response.where_clause.trim();
    if clause.is_empty() {
        Ok(None)
    } else {
        Ok(Some(clause.to_string()))
    }
}

static STRING_LITERALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'[^']*'").expect("hard-coded regex is valid"));

static IDENTIFIERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").expect("hard-coded regex is valid"));

static SQL_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "and", "or", "not", "between", "in", "like", "is", "null", "true", "false",
    ]
    .into_iter()
    .collect()
});

/// Check that a compiled predicate references only known filterable columns
/// and contains no DML/DDL tokens.
#[inline]
pub fn validate_predicate(predicate: &str) -> Result<()> {
    ensure_read_only(predicate)?;

    let without_literals = STRING_LITERALS.replace_all(predicate, "''");

    for found in IDENTIFIERS.find_iter(&without_literals) {
        let identifier = found
            .map_err(|e| RetrievalError::Compilation(format!("Predicate scan failed: {e}")))?
            .as_str();
        let lowered = identifier.to_lowercase();

        if SQL_KEYWORDS.contains(lowered.as_str()) {
            continue;
        }
        if !FILTERABLE_COLUMNS.contains(&lowered.as_str()) {
            return Err(RetrievalError::Compilation(format!(
                "Predicate references unknown column: {identifier}"
            )));
        }
    }

    Ok(())
}

fn build_prompt(constraints: &[String], schema: &str) -> Result<String> {
    let constraint_list = serde_json::to_string(constraints)
        .map_err(|e| RetrievalError::Compilation(format!("Failed to render constraints: {e}")))?;

    Ok(format!(
        "You are an expert at translating travel keyword constraints (for example \
\"duration <= 3 days\") into the WHERE clause of a SQL query over the schema below.

Respond with a JSON object containing exactly two keys:
- \"justification\": step-by-step reasoning explaining how the clause follows from the \
schema and the constraints
- \"where\": the body of the WHERE clause (without the WHERE keyword); an empty string \
if no filtering applies

Strictly adhere to the provided schema: reference only its column names.

Schema:
```
{schema}
```
duration_min and duration_max are expressed in minutes.
cost is expressed in euros.

Constraints to translate:
```
{constraint_list}
```
"
    ))
}
