use crate::embedding::EmbeddingProvider;
use crate::shared::error::Result;
use crate::shared::models::{SearchFilter, SearchResult};
use crate::vectordb::VectorIndex;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Semantic search: embeds the query, then runs a top-K nearest-neighbor
/// query against the stored embeddings. Hits come back ordered by
/// descending similarity score. No highlighting on this path.
pub struct NeuralSearchEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
}

impl NeuralSearchEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: &str,
    ) -> Self {
        Self {
            index,
            embedder,
            collection: collection.to_string(),
        }
    }

    pub async fn search(
        &self,
        query: &str,
        top: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let vector = self.embedder.embed(query).await?;
        let hits = self
            .index
            .search_vector(&self.collection, vector, top, filter)
            .await?;

        debug!(
            "neural search for {:?} took {:?}, {} hits",
            query,
            started.elapsed(),
            hits.len()
        );
        Ok(hits)
    }
}
