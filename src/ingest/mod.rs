use crate::embedding::EmbeddingProvider;
use crate::shared::error::{Error, Result};
use crate::shared::models::PayloadValue;
use crate::vectordb::VectorIndex;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod preprocess;

use preprocess::preprocess;

/// Documents embedded and upserted per store round-trip.
const UPLOAD_BATCH_SIZE: usize = 64;

/// Coarse outcome reported to the upload boundary. Detailed causes go to the
/// log; callers only see which stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { documents: usize },
    PreprocessingError,
    StoreError,
    UnknownError,
}

impl UploadOutcome {
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Preprocessing(_) => Self::PreprocessingError,
            Error::Store(_) => Self::StoreError,
            Error::Retrieval(_) | Error::Unknown(_) => Self::UnknownError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Success { documents } => {
                format!("Uploaded and indexed {} documents", documents)
            }
            Self::PreprocessingError => "File could not be processed".to_string(),
            Self::StoreError => "Failed to store documents".to_string(),
            Self::UnknownError => "Upload failed".to_string(),
        }
    }
}

/// Preprocesses a source file, destructively (re)provisions the collection
/// and bulk-loads embeddings plus metadata with sequential integer ids.
///
/// Provisioning replaces any existing collection of the same name, so
/// ingestion is non-additive. The internal mutex keeps two ingestions from
/// interleaving against the same collection.
pub struct IngestionPipeline {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    text_field: String,
    embedding_dim: u64,
    upload_lock: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: &str,
        text_field: &str,
        embedding_dim: u64,
    ) -> Self {
        Self {
            index,
            embedder,
            collection: collection.to_string(),
            text_field: text_field.to_string(),
            embedding_dim,
            upload_lock: Mutex::new(()),
        }
    }

    /// Ingest a source file, collapsing every failure into the coarse
    /// outcome enum. Never leaves a partial ingestion observable as success.
    pub async fn ingest(&self, path: &Path) -> UploadOutcome {
        match self.run(path).await {
            Ok(Some(documents)) => UploadOutcome::Success { documents },
            Ok(None) => {
                info!("Unsupported source file: {}", path.display());
                UploadOutcome::PreprocessingError
            }
            Err(err) => {
                error!("Ingestion of {} failed: {}", path.display(), err);
                UploadOutcome::from_error(&err)
            }
        }
    }

    async fn run(&self, path: &Path) -> Result<Option<usize>> {
        let _guard = self.upload_lock.lock().await;

        let Some(prepared) = preprocess(path)? else {
            return Ok(None);
        };
        let total = prepared.documents.len();
        info!(
            "Ingesting {} documents from {} into {}",
            total,
            path.display(),
            self.collection
        );

        self.index
            .recreate_collection(&self.collection, self.embedding_dim)
            .await?;
        self.index
            .create_text_index(&self.collection, &self.text_field)
            .await?;

        let documents = prepared.documents.into_iter();
        let metadata = prepared.metadata.into_iter();
        let mut batch = Vec::with_capacity(UPLOAD_BATCH_SIZE);
        let mut uploaded = 0u64;

        for (id, (text, mut payload)) in documents.zip(metadata).enumerate() {
            // Embedding failures during bulk load are store failures from
            // the caller's point of view: the collection is left incomplete.
            let vector = self
                .embedder
                .embed(&text)
                .await
                .map_err(|e| Error::Store(format!("embedding document {}: {}", id, e)))?;
            payload.insert(self.text_field.clone(), PayloadValue::String(text));
            batch.push((id as u64, vector, payload));

            if batch.len() >= UPLOAD_BATCH_SIZE {
                uploaded += batch.len() as u64;
                self.index
                    .upsert(&self.collection, std::mem::take(&mut batch))
                    .await?;
                info!("Uploaded {}/{} documents", uploaded, total);
            }
        }
        if !batch.is_empty() {
            uploaded += batch.len() as u64;
            self.index.upsert(&self.collection, batch).await?;
            info!("Uploaded {}/{} documents", uploaded, total);
        }

        // The upserts were waited on, so the stored count should equal the
        // preprocessed total; a mismatch is worth a log line, not a failure.
        match self.index.count(&self.collection).await {
            Ok(stored) if stored == total as u64 => {
                info!("Collection {} holds {} documents", self.collection, stored)
            }
            Ok(stored) => warn!(
                "Collection {} holds {} documents, expected {}",
                self.collection, stored, total
            ),
            Err(err) => warn!("Could not verify stored count: {}", err),
        }

        Ok(Some(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_mapping_follows_the_error_taxonomy() {
        assert_eq!(
            UploadOutcome::from_error(&Error::Preprocessing("bad line".into())),
            UploadOutcome::PreprocessingError
        );
        assert_eq!(
            UploadOutcome::from_error(&Error::Store("upsert rejected".into())),
            UploadOutcome::StoreError
        );
        assert_eq!(
            UploadOutcome::from_error(&Error::Retrieval("timeout".into())),
            UploadOutcome::UnknownError
        );
        assert_eq!(
            UploadOutcome::from_error(&Error::Unknown("panic-adjacent".into())),
            UploadOutcome::UnknownError
        );
    }

    #[test]
    fn test_outcome_messages_stay_generic() {
        let success = UploadOutcome::Success { documents: 3 };
        assert_eq!(success.message(), "Uploaded and indexed 3 documents");

        // Failure messages never leak internal diagnostics.
        assert!(!UploadOutcome::StoreError.message().contains("qdrant"));
        assert!(!UploadOutcome::PreprocessingError
            .message()
            .contains("line"));
    }
}
