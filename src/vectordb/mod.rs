use crate::shared::error::{Error, Result};
use crate::shared::models::{DocumentPayload, PayloadValue, SearchFilter, SearchResult};
use log::{debug, warn};
use qdrant_client::qdrant::{
    condition::ConditionOneOf, payload_index_params::IndexParams,
    quantization_config::Quantization, r#match::MatchValue, vectors_config::Config,
    CollectionExistsRequest, Condition, CountPoints, CreateCollection,
    CreateFieldIndexCollection, DeleteCollection, Distance, FieldCondition, FieldType, Filter,
    Match, PayloadIndexParams, PointStruct, QuantizationConfig, QuantizationType,
    ScalarQuantization, ScrollPoints, SearchPoints, TextIndexParams, TokenizerType, UpsertPoints,
    VectorParams, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use std::time::Duration;

/// Connection to the external vector store. Wraps the pooled Qdrant client;
/// safe for concurrent use by multiple in-flight queries. Every remote call
/// is bounded by the configured timeout, surfaced as a retrieval or store
/// error depending on the operation.
pub struct VectorIndex {
    client: Qdrant,
}

impl VectorIndex {
    pub fn connect(url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut builder = Qdrant::from_url(url).timeout(timeout);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder.build().map_err(Error::store)?;
        Ok(Self { client })
    }

    /// Destructively (re)provision a collection: delete any existing one,
    /// then create it with cosine distance, on-disk vectors and INT8 scalar
    /// quantization calibrated at the 0.99 quantile, kept resident.
    pub async fn recreate_collection(&self, name: &str, dim: u64) -> Result<()> {
        let exists = self
            .client
            .collection_exists(CollectionExistsRequest {
                collection_name: name.to_string(),
            })
            .await
            .map_err(Error::store)?;

        if exists {
            self.client
                .delete_collection(DeleteCollection {
                    collection_name: name.to_string(),
                    ..Default::default()
                })
                .await
                .map_err(Error::store)?;
        }

        self.client
            .create_collection(CreateCollection {
                collection_name: name.to_string(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: dim,
                        distance: Distance::Cosine.into(),
                        on_disk: Some(true),
                        ..Default::default()
                    })),
                }),
                quantization_config: Some(QuantizationConfig {
                    quantization: Some(Quantization::Scalar(ScalarQuantization {
                        r#type: QuantizationType::Int8.into(),
                        quantile: Some(0.99),
                        always_ram: Some(true),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(Error::store)?;

        log::info!("Provisioned collection: {}", name);
        Ok(())
    }

    /// Create the full-text index over the primary text field: word
    /// tokenizer, token length 2..20, lowercased.
    pub async fn create_text_index(&self, name: &str, field: &str) -> Result<()> {
        self.client
            .create_field_index(CreateFieldIndexCollection {
                collection_name: name.to_string(),
                field_name: field.to_string(),
                field_type: Some(FieldType::Text.into()),
                field_index_params: Some(PayloadIndexParams {
                    index_params: Some(IndexParams::TextIndexParams(TextIndexParams {
                        tokenizer: TokenizerType::Word.into(),
                        lowercase: Some(true),
                        min_token_len: Some(2),
                        max_token_len: Some(20),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    /// Bulk upsert of (id, embedding, payload) triples.
    pub async fn upsert(
        &self,
        name: &str,
        batch: Vec<(u64, Vec<f32>, DocumentPayload)>,
    ) -> Result<()> {
        let mut points = Vec::with_capacity(batch.len());
        for (id, vector, payload) in batch {
            points.push(PointStruct::new(id, vector, to_qdrant_payload(&payload)?));
        }
        self.client
            .upsert_points(UpsertPoints {
                collection_name: name.to_string(),
                points,
                wait: Some(true),
                ..Default::default()
            })
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    /// Nearest-neighbor query over the stored embeddings, ordered by
    /// descending similarity score.
    pub async fn search_vector(
        &self,
        name: &str,
        vector: Vec<f32>,
        top: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let conditions = filter_conditions(filter);
        let response = self
            .client
            .search_points(SearchPoints {
                collection_name: name.to_string(),
                vector,
                limit: top as u64,
                filter: if conditions.is_empty() {
                    None
                } else {
                    Some(Filter::must(conditions))
                },
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(Error::retrieval)?;

        debug!(
            "vector search on {} returned {} hits in {}s",
            name,
            response.result.len(),
            response.time
        );

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            let mut result = SearchResult::new(from_qdrant_payload(&point.payload)?);
            result.score = Some(point.score);
            results.push(result);
        }
        Ok(results)
    }

    /// Full-text match over `field`, order as returned by the index. The
    /// store assigns no relevance score on this path.
    pub async fn search_text(
        &self,
        name: &str,
        field: &str,
        query: &str,
        top: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let mut conditions = vec![text_match_condition(field, query)];
        conditions.extend(filter_conditions(filter));

        let response = self
            .client
            .scroll(ScrollPoints {
                collection_name: name.to_string(),
                filter: Some(Filter::must(conditions)),
                limit: Some(top as u32),
                with_payload: Some(true.into()),
                with_vectors: Some(false.into()),
                ..Default::default()
            })
            .await
            .map_err(Error::retrieval)?;

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            results.push(SearchResult::new(from_qdrant_payload(&point.payload)?));
        }
        Ok(results)
    }

    /// Exact number of stored points.
    pub async fn count(&self, name: &str) -> Result<u64> {
        let response = self
            .client
            .count(CountPoints {
                collection_name: name.to_string(),
                exact: Some(true),
                ..Default::default()
            })
            .await
            .map_err(Error::retrieval)?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

/// Full-text condition over a payload field.
fn text_match_condition(field: &str, query: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Text(query.to_string())),
            }),
            ..Default::default()
        })),
    }
}

fn filter_conditions(filter: Option<&SearchFilter>) -> Vec<Condition> {
    let Some(filter) = filter else {
        return Vec::new();
    };
    let mut conditions = Vec::with_capacity(filter.must.len());
    for clause in &filter.must {
        let condition = match &clause.value {
            PayloadValue::String(s) => Condition::matches(clause.key.clone(), s.clone()),
            PayloadValue::Bool(b) => Condition::matches(clause.key.clone(), *b),
            // Store-side matches are integer-keyed; a fractional value can
            // never match exactly, so truncating it would be wrong.
            PayloadValue::Number(n) if n.fract() == 0.0 => {
                Condition::matches(clause.key.clone(), *n as i64)
            }
            PayloadValue::Number(n) => {
                warn!(
                    "Skipping non-integral match clause for field {}: {}",
                    clause.key, n
                );
                continue;
            }
            PayloadValue::Null => {
                warn!("Skipping null match clause for field {}", clause.key);
                continue;
            }
        };
        conditions.push(condition);
    }
    conditions
}

fn to_qdrant_payload(payload: &DocumentPayload) -> Result<Payload> {
    let value = serde_json::to_value(payload).map_err(Error::store)?;
    Payload::try_from(value).map_err(Error::store)
}

fn from_qdrant_payload(
    payload: &HashMap<String, qdrant_client::qdrant::Value>,
) -> Result<DocumentPayload> {
    let value = serde_json::to_value(payload).map_err(Error::retrieval)?;
    serde_json::from_value(value).map_err(Error::retrieval)
}
