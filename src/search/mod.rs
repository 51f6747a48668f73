#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::models::Activity;
use crate::database::{ConnectionManager, executor};
use crate::embeddings::{Embedder, GenAiEmbedder};
use crate::filter::{FilterCompiler, LlmFilterCompiler};
use crate::genai::GenerativeClient;
use crate::query::{Dialect, build_activities_query};
use crate::schema::activities_schema;
use crate::{Result, RetrievalError};

/// The hybrid retrieval pipeline: semantic intent and keyword constraints
/// in, ranked activity records out.
///
/// The two enrichment steps (embedding, predicate compilation) run
/// concurrently and each fails soft: a failed embedding degrades ranking to
/// a constant score, a failed compilation degrades to an unfiltered query.
/// Gate, connection, execution, and mapping failures are terminal for the
/// request and surface as structured errors.
pub struct SearchPipeline {
    embedder: Arc<dyn Embedder>,
    compiler: Arc<dyn FilterCompiler>,
    connections: Arc<ConnectionManager>,
    dialect: Dialect,
    max_rows: u32,
    debug: bool,
}

impl SearchPipeline {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        compiler: Arc<dyn FilterCompiler>,
        connections: Arc<ConnectionManager>,
        config: &Config,
    ) -> Self {
        Self {
            embedder,
            compiler,
            connections,
            dialect: Dialect::from(config.backend),
            max_rows: config.search.max_rows,
            debug: config.search.debug,
        }
    }

    /// Wire the production pipeline: model-backed embedder and compiler over
    /// a fresh connection manager.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GenerativeClient::new(&config.genai)
            .map_err(|e| RetrievalError::Config(format!("{e:#}")))?;
        let embedder = Arc::new(GenAiEmbedder::new(client.clone()));
        let compiler = Arc::new(LlmFilterCompiler::new(client));
        let connections = Arc::new(ConnectionManager::new(config));
        Ok(Self::new(embedder, compiler, connections, config))
    }

    #[inline]
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Run one retrieval request.
    ///
    /// An empty `vector_query` skips embedding entirely (the client is never
    /// called with empty input); an empty constraint set skips compilation.
    #[inline]
    pub async fn find_activities(
        &self,
        vector_query: &str,
        keyword_queries: &[String],
    ) -> Result<Vec<Activity>> {
        let embedding_step = async {
            if vector_query.trim().is_empty() {
                return None;
            }
            match self.embedder.embed(vector_query).await {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!("Proceeding without semantic ranking: {}", e);
                    None
                }
            }
        };

        let predicate_step = async {
            if keyword_queries.is_empty() {
                return None;
            }
            match self.compiler.compile(keyword_queries, activities_schema()).await {
                Ok(predicate) => predicate,
                Err(e) => {
                    warn!("Proceeding without keyword filter: {}", e);
                    None
                }
            }
        };

        // Independent enrichment steps; both must resolve (value or
        // fail-soft) before the query is built.
        let (embedding, predicate) = tokio::join!(embedding_step, predicate_step);

        let sql = build_activities_query(
            self.dialect,
            embedding.as_deref(),
            predicate.as_deref(),
            self.max_rows,
        );

        if self.debug {
            info!(
                "Executing activities query (embedding: {:?} dims, predicate: {:?}): {}",
                embedding.as_ref().map(Vec::len),
                predicate,
                sql
            );
        } else {
            debug!("Executing activities query: {}", sql);
        }

        executor::fetch_activities(&self.connections, &sql).await
    }
}

/// Wire shape for service callers: at most one of `activities` and
/// `error_message` is set. An empty list is a valid zero-match result,
/// distinct from a failed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub activities: Option<Vec<Activity>>,
    pub error_message: Option<String>,
}

impl From<Result<Vec<Activity>>> for SearchResponse {
    #[inline]
    fn from(result: Result<Vec<Activity>>) -> Self {
        match result {
            Ok(activities) => Self {
                activities: Some(activities),
                error_message: None,
            },
            Err(e) => Self {
                activities: None,
                error_message: Some(e.to_string()),
            },
        }
    }
}
