use crate::shared::error::{Error, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Converts text into a fixed-length embedding vector. Deterministic per
/// model version; the model identity is configuration, not logic.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// HTTP embedding service client. Posts `{text, model}` and expects
/// `{"embedding": [..]}` back.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::unknown)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "text": text,
            "model": self.model,
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
                "embedding service returned {}",
                response.status()
            )));
        }

        let result: serde_json::Value = response.json().await.map_err(Error::retrieval)?;
        let embedding = result["embedding"]
            .as_array()
            .ok_or_else(|| Error::Retrieval("invalid embedding response format".to_string()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(url: &str) -> HttpEmbedder {
        HttpEmbedder::new(url, "test-model", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_embed_parses_vector() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"text": "rocket", "model": "test-model"}),
            ))
            .with_status(200)
            .with_body(r#"{"embedding": [0.1, -0.5, 0.25]}"#)
            .create_async()
            .await;

        let vector = embedder(&server.url()).embed("rocket").await.unwrap();
        assert_eq!(vector, vec![0.1, -0.5, 0.25]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_maps_http_failure_to_retrieval_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let err = embedder(&server.url()).embed("rocket").await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_embed_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let err = embedder(&server.url()).embed("rocket").await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }
}
