use crate::config::AppConfig;
use crate::embedding::{EmbeddingProvider, HttpEmbedder};
use crate::ingest::IngestionPipeline;
use crate::rerank::global_reranker;
use crate::search::{HybridSearchEngine, NeuralSearchEngine, TextSearchEngine};
use crate::shared::error::Result;
use crate::vectordb::VectorIndex;
use std::sync::Arc;

/// Shared application state: one pooled store connection and the engines
/// built on top of it. Everything here is safe for concurrent requests.
pub struct AppState {
    pub config: AppConfig,
    pub text: TextSearchEngine,
    pub neural: NeuralSearchEngine,
    pub hybrid: HybridSearchEngine,
    pub ingestion: IngestionPipeline,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let index = Arc::new(VectorIndex::connect(
            &config.qdrant.url,
            config.qdrant.api_key.as_deref(),
            config.search_timeout,
        )?);
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbedder::new(
            &config.embedding.url,
            &config.embedding.model,
            config.search_timeout,
        )?);

        let reranker = match &config.reranker_url {
            Some(url) => Some(global_reranker(url, config.search_timeout)?),
            None => None,
        };

        let text =
            TextSearchEngine::new(index.clone(), &config.collection_name, &config.text_field);
        let neural =
            NeuralSearchEngine::new(index.clone(), embedder.clone(), &config.collection_name);
        let hybrid = HybridSearchEngine::new(
            TextSearchEngine::new(index.clone(), &config.collection_name, &config.text_field),
            NeuralSearchEngine::new(index.clone(), embedder.clone(), &config.collection_name),
            reranker,
            config.hybrid_policy,
            &config.text_field,
        );
        let ingestion = IngestionPipeline::new(
            index,
            embedder,
            &config.collection_name,
            &config.text_field,
            config.embedding.dim,
        );

        Ok(Self {
            config,
            text,
            neural,
            hybrid,
            ingestion,
        })
    }
}
