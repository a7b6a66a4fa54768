use crate::search::hybrid::HybridPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub qdrant: QdrantConfig,
    pub collection_name: String,
    pub text_field: String,
    pub embedding: EmbeddingConfig,
    pub reranker_url: Option<String>,
    pub hybrid_policy: HybridPolicy,
    pub server: ServerConfig,
    pub static_dir: String,
    pub search_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    pub dim: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to local-dev
    /// defaults. `.env` is loaded by `main` before this runs.
    pub fn from_env() -> Self {
        let get_str =
            |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());

        let hybrid_policy = std::env::var("HYBRID_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            qdrant: QdrantConfig {
                url: get_str("QDRANT_URL", "http://localhost:6334"),
                api_key: std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
            },
            collection_name: get_str("COLLECTION_NAME", "startups"),
            text_field: get_str("TEXT_FIELD_NAME", "description"),
            embedding: EmbeddingConfig {
                url: get_str("EMBEDDING_URL", "http://localhost:8082"),
                model: get_str("EMBEDDING_MODEL", "sentence-transformers/all-MiniLM-L6-v2"),
                dim: std::env::var("EMBEDDING_DIM")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(384),
            },
            reranker_url: std::env::var("RERANKER_URL").ok().filter(|u| !u.is_empty()),
            hybrid_policy,
            server: ServerConfig {
                host: get_str("SERVER_HOST", "0.0.0.0"),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8000),
            },
            static_dir: get_str("STATIC_DIR", "static"),
            search_timeout: Duration::from_secs(
                std::env::var("SEARCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}
