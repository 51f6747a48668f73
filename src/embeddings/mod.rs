
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::genai::GenerativeClient;
use crate::{Result, RetrievalError};

/// Converts free-text semantic intent into a fixed-dimension vector.
///
/// Implementations must never be handed an empty query; the pipeline skips
/// embedding entirely when there is no semantic term.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, query: &str) -> Result<Vec<f32>>;
}

/// Embedder backed by the generative model endpoint.
pub struct GenAiEmbedder {
    client: GenerativeClient,
}

impl GenAiEmbedder {
    #[inline]
    pub fn new(client: GenerativeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Embedder for GenAiEmbedder {
    #[inline]
    async fn embed(&self, query: &str) -> Result<Vec<f32>> {
        debug!("Requesting embedding for semantic query: {:?}", query);

        let client = self.client.clone();
        let text = query.to_string();
        let result = tokio::task::spawn_blocking(move || client.embed_content(&text))
            .await
            .map_err(|e| RetrievalError::Embedding(format!("Embedding task panicked: {e}")))?;

        match result {
            Ok(vector) => {
                debug!("Embedded semantic query into {} dimensions", vector.len());
                Ok(vector)
            }
            Err(e) => {
                warn!("Embedding request failed for {:?}: {:#}", query, e);
                Err(RetrievalError::Embedding(format!("{e:#}")))
            }
        }
    }
}
