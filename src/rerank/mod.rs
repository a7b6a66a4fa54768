use crate::shared::error::{Error, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Cross-encoder relevance model: jointly scores (query, passage) pairs.
/// Returns one score per passage, higher is more relevant.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;
}

/// HTTP cross-encoder service client. Posts `{query, passages}` and expects
/// `{"scores": [..]}` back, one entry per passage.
pub struct HttpReranker {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReranker {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::unknown)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let body = json!({
            "query": query,
            "passages": passages,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(Error::retrieval)?;

        if !response.status().is_success() {
            return Err(Error::Retrieval(format!(
                "reranker service returned {}",
                response.status()
            )));
        }

        let result: serde_json::Value = response.json().await.map_err(Error::retrieval)?;
        let scores: Vec<f32> = result["scores"]
            .as_array()
            .ok_or_else(|| Error::Retrieval("invalid reranker response format".to_string()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if scores.len() != passages.len() {
            return Err(Error::Retrieval(format!(
                "reranker returned {} scores for {} passages",
                scores.len(),
                passages.len()
            )));
        }

        Ok(scores)
    }
}

static GLOBAL_RERANKER: OnceCell<Arc<HttpReranker>> = OnceCell::new();

/// Process-wide reranker instance, lazily constructed on first use. The cell
/// guarantees a single acquisition even under concurrent first requests.
pub fn global_reranker(endpoint: &str, timeout: Duration) -> Result<Arc<dyn Reranker>> {
    let reranker = GLOBAL_RERANKER
        .get_or_try_init(|| HttpReranker::new(endpoint, timeout).map(Arc::new))?;
    Ok(reranker.clone() as Arc<dyn Reranker>)
}
