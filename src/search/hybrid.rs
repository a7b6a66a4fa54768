use crate::rerank::Reranker;
use crate::search::neural::NeuralSearchEngine;
use crate::search::text::TextSearchEngine;
use crate::shared::error::Result;
use crate::shared::models::{SearchFilter, SearchResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

/// Keyword hit count above which the short-circuit policy skips the neural
/// branch entirely.
pub const SHORT_CIRCUIT_THRESHOLD: usize = 3;

/// How the two retrieval paths are combined.
///
/// `ShortCircuit` trades semantic coverage for latency: when keyword search
/// alone already returns more than `SHORT_CIRCUIT_THRESHOLD` hits, the
/// neural branch never runs. `Merge` always runs both branches and
/// concatenates. `MergeRerank` additionally reorders the merged set with the
/// configured cross-encoder. The policies are NOT equivalent; the active one
/// is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridPolicy {
    ShortCircuit,
    Merge,
    MergeRerank,
}

impl Default for HybridPolicy {
    fn default() -> Self {
        Self::MergeRerank
    }
}

impl FromStr for HybridPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short_circuit" => Ok(Self::ShortCircuit),
            "merge" => Ok(Self::Merge),
            "merge_rerank" => Ok(Self::MergeRerank),
            other => Err(format!("unknown hybrid policy: {}", other)),
        }
    }
}

/// Orchestrates the keyword and semantic engines. Per-call state only: both
/// branches are dispatched concurrently where the policy needs both, and
/// merging waits for both to finish. Either branch failing fails the call;
/// no silent partial degradation.
pub struct HybridSearchEngine {
    text: TextSearchEngine,
    neural: NeuralSearchEngine,
    reranker: Option<Arc<dyn Reranker>>,
    policy: HybridPolicy,
    text_field: String,
}

impl HybridSearchEngine {
    pub fn new(
        text: TextSearchEngine,
        neural: NeuralSearchEngine,
        reranker: Option<Arc<dyn Reranker>>,
        policy: HybridPolicy,
        text_field: &str,
    ) -> Self {
        Self {
            text,
            neural,
            reranker,
            policy,
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

        match self.policy {
            HybridPolicy::ShortCircuit => {
                let keyword = self.text.search(query, top, filter).await?;
                if short_circuits(keyword.len()) {
                    debug!("keyword search satisfied {:?}, skipping neural", query);
                    return Ok(keyword);
                }
                self.neural.search(query, top, filter).await
            }
            HybridPolicy::Merge => self.merged(query, top, filter).await,
            HybridPolicy::MergeRerank => {
                let merged = self.merged(query, top, filter).await?;
                match &self.reranker {
                    Some(reranker) => {
                        apply_rerank(reranker.as_ref(), query, merged, &self.text_field).await
                    }
                    None => Ok(merged),
                }
            }
        }
    }

    /// Both branches concurrently; the merge waits for both.
    async fn merged(
        &self,
        query: &str,
        top: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let (keyword, semantic) = tokio::try_join!(
            self.text.search(query, top, filter),
            self.neural.search(query, top, filter),
        )?;
        Ok(merge(keyword, semantic))
    }
}

/// Short-circuit decision: strictly more than the threshold.
pub fn short_circuits(keyword_hits: usize) -> bool {
    keyword_hits > SHORT_CIRCUIT_THRESHOLD
}

/// Concatenate the two result sets, keyword hits first, preserving each
/// source's internal order. No deduplication across sources: a document that
/// both paths retrieve legitimately appears twice. See DESIGN.md for why
/// this is kept.
pub fn merge(keyword: Vec<SearchResult>, semantic: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut merged = keyword;
    merged.extend(semantic);
    merged
}

/// Score every (query, passage) pair with the cross-encoder and reorder by
/// descending relevance.
pub async fn apply_rerank(
    reranker: &dyn Reranker,
    query: &str,
    mut results: Vec<SearchResult>,
    text_field: &str,
) -> Result<Vec<SearchResult>> {
    if results.is_empty() {
        return Ok(results);
    }

    let passages: Vec<String> = results
        .iter()
        .map(|r| r.passage_text(text_field))
        .collect();
    let scores = reranker.rank(query, &passages).await?;

    for (result, score) in results.iter_mut().zip(scores) {
        result.score = Some(score);
    }
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
    });
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HttpEmbedder;
    use crate::shared::error::Error;
    use crate::shared::models::DocumentPayload;
    use crate::vectordb::VectorIndex;
    use async_trait::async_trait;
    use std::time::Duration;

    fn result(text: &str) -> SearchResult {
        let mut payload = DocumentPayload::new();
        payload.insert("description".to_string(), text.into());
        SearchResult::new(payload)
    }

    struct FixedReranker {
        scores: Vec<f32>,
    }

    #[async_trait]
    impl Reranker for FixedReranker {
        async fn rank(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>> {
            assert_eq!(passages.len(), self.scores.len());
            Ok(self.scores.clone())
        }
    }

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        async fn rank(&self, _query: &str, _passages: &[String]) -> Result<Vec<f32>> {
            Err(Error::Retrieval("cross-encoder offline".to_string()))
        }
    }

    #[test]
    fn test_merge_law_length_is_sum_of_sources() {
        let keyword = vec![result("a"), result("b")];
        let semantic = vec![result("b"), result("c"), result("d")];

        let merged = merge(keyword, semantic);
        assert_eq!(merged.len(), 5);
    }

    #[test]
    fn test_merge_keeps_keyword_hits_first_in_order() {
        let merged = merge(
            vec![result("k1"), result("k2")],
            vec![result("n1"), result("n2")],
        );
        let texts: Vec<String> = merged
            .iter()
            .map(|r| r.passage_text("description"))
            .collect();
        assert_eq!(texts, vec!["k1", "k2", "n1", "n2"]);
    }

    #[test]
    fn test_merge_does_not_deduplicate() {
        let merged = merge(vec![result("same")], vec![result("same")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_short_circuit_requires_more_than_threshold() {
        assert!(!short_circuits(0));
        assert!(!short_circuits(3));
        assert!(short_circuits(4));
    }

    #[tokio::test]
    async fn test_rerank_orders_by_descending_score() {
        let results = vec![result("low"), result("high"), result("mid")];
        let reranker = FixedReranker {
            scores: vec![0.1, 0.9, 0.5],
        };

        let ranked = apply_rerank(&reranker, "query", results, "description")
            .await
            .unwrap();
        let texts: Vec<String> = ranked
            .iter()
            .map(|r| r.passage_text("description"))
            .collect();
        assert_eq!(texts, vec!["high", "mid", "low"]);
        assert_eq!(ranked[0].score, Some(0.9));
    }

    #[tokio::test]
    async fn test_rerank_empty_set_skips_the_model() {
        let ranked = apply_rerank(&FailingReranker, "query", Vec::new(), "description")
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_rerank_failure_propagates() {
        let err = apply_rerank(&FailingReranker, "query", vec![result("a")], "description")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_blank_queries_return_empty_without_remote_calls() {
        // Both clients connect lazily, so an unroutable endpoint only fails
        // if a branch actually issues a request.
        let timeout = Duration::from_millis(200);
        let index = Arc::new(VectorIndex::connect("http://127.0.0.1:1", None, timeout).unwrap());
        let embedder: Arc<dyn crate::embedding::EmbeddingProvider> = Arc::new(
            HttpEmbedder::new("http://127.0.0.1:1", "test-model", timeout).unwrap(),
        );

        let text = TextSearchEngine::new(index.clone(), "startups", "description");
        let neural = NeuralSearchEngine::new(index.clone(), embedder.clone(), "startups");
        let hybrid = HybridSearchEngine::new(
            TextSearchEngine::new(index.clone(), "startups", "description"),
            NeuralSearchEngine::new(index, embedder, "startups"),
            None,
            HybridPolicy::default(),
            "description",
        );

        for query in ["", "   ", "\t"] {
            assert!(text.search(query, 5, None).await.unwrap().is_empty());
            assert!(neural.search(query, 5, None).await.unwrap().is_empty());
            assert!(hybrid.search(query, 5, None).await.unwrap().is_empty());
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "short_circuit".parse::<HybridPolicy>().unwrap(),
            HybridPolicy::ShortCircuit
        );
        assert_eq!("merge".parse::<HybridPolicy>().unwrap(), HybridPolicy::Merge);
        assert_eq!(
            "MERGE_RERANK".parse::<HybridPolicy>().unwrap(),
            HybridPolicy::MergeRerank
        );
        assert!("fuse".parse::<HybridPolicy>().is_err());
        assert_eq!(HybridPolicy::default(), HybridPolicy::MergeRerank);
    }
}
