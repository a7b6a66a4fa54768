use crate::search::highlight::highlight;
use crate::shared::error::Result;
use crate::shared::models::{PayloadValue, SearchFilter, SearchResult};
use crate::vectordb::VectorIndex;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Keyword search over the collection's full-text index. Hits come back in
/// index order (no relevance score on this path) with every query word
/// highlighted in the primary text field.
pub struct TextSearchEngine {
    index: Arc<VectorIndex>,
    collection: String,
    text_field: String,
}

impl TextSearchEngine {
    pub fn new(index: Arc<VectorIndex>, collection: &str, text_field: &str) -> Self {
        Self {
            index,
            collection: collection.to_string(),
            text_field: text_field.to_string(),
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
        let mut hits = self
            .index
            .search_text(&self.collection, &self.text_field, query, top, filter)
            .await?;

        for hit in &mut hits {
            if let Some(PayloadValue::String(text)) = hit.payload.get(&self.text_field) {
                hit.highlighted = Some(highlight(text, query));
            }
        }

        debug!(
            "text search for {:?} took {:?}, {} hits",
            query,
            started.elapsed(),
            hits.len()
        );
        Ok(hits)
    }
}
