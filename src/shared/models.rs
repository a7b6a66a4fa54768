use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scalar payload value stored alongside a document.
///
/// Metadata maps are open-ended in shape but closed over this set of
/// variants so serialization to and from the vector store stays
/// well-defined. Nested arrays and objects are rejected at preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Number(f64),
    String(String),
    Null,
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Document payload as stored in the collection: the primary text field plus
/// arbitrary metadata attributes.
pub type DocumentPayload = HashMap<String, PayloadValue>;

/// Search mode requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Text,
    Neural,
    Hybrid,
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Hybrid
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Neural => write!(f, "neural"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Attribute-based predicate applied to both retrieval paths. Every entry
/// must match the stored payload value exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    pub must: Vec<FieldMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMatch {
    pub key: String,
    pub value: PayloadValue,
}

/// Transient per-query hit. Holds the stored payload, the relevance score
/// where the retrieval path produces one, and the highlighted variant of the
/// text field for keyword hits.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub payload: DocumentPayload,
    pub score: Option<f32>,
    pub highlighted: Option<String>,
}

impl SearchResult {
    pub fn new(payload: DocumentPayload) -> Self {
        Self {
            payload,
            score: None,
            highlighted: None,
        }
    }

    /// Text passed to the reranker for this hit.
    pub fn passage_text(&self, text_field: &str) -> String {
        self.payload
            .get(text_field)
            .and_then(PayloadValue::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Wire representation: the payload map with the text field replaced by
    /// its highlighted variant where present, plus a `score` key when the
    /// retrieval path scored the hit.
    pub fn into_wire(self, text_field: &str) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, value) in self.payload {
            map.insert(key, payload_value_to_json(value));
        }
        if let Some(highlighted) = self.highlighted {
            map.insert(
                text_field.to_string(),
                serde_json::Value::String(highlighted),
            );
        }
        if let Some(score) = self.score {
            map.insert("score".to_string(), serde_json::json!(score));
        }
        serde_json::Value::Object(map)
    }
}

fn payload_value_to_json(value: PayloadValue) -> serde_json::Value {
    match value {
        PayloadValue::Bool(b) => serde_json::Value::Bool(b),
        PayloadValue::Number(n) => serde_json::json!(n),
        PayloadValue::String(s) => serde_json::Value::String(s),
        PayloadValue::Null => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_value_untagged_roundtrip() {
        let payload: DocumentPayload =
            serde_json::from_str(r#"{"name":"Acme","employees":42,"active":true,"ceo":null}"#)
                .unwrap();

        assert_eq!(payload["name"], PayloadValue::String("Acme".to_string()));
        assert_eq!(payload["employees"], PayloadValue::Number(42.0));
        assert_eq!(payload["active"], PayloadValue::Bool(true));
        assert_eq!(payload["ceo"], PayloadValue::Null);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["employees"], serde_json::json!(42.0));
        assert_eq!(json["ceo"], serde_json::Value::Null);
    }

    #[test]
    fn test_search_mode_default_is_hybrid() {
        #[derive(Deserialize)]
        struct Params {
            #[serde(default)]
            search_type: SearchMode,
        }
        let params: Params = serde_json::from_str("{}").unwrap();
        assert_eq!(params.search_type, SearchMode::Hybrid);

        let params: Params = serde_json::from_str(r#"{"search_type":"neural"}"#).unwrap();
        assert_eq!(params.search_type, SearchMode::Neural);
    }

    #[test]
    fn test_into_wire_substitutes_highlight_and_score() {
        let mut payload = DocumentPayload::new();
        payload.insert("description".to_string(), "a fast rocket".into());
        payload.insert("city".to_string(), "Berlin".into());

        let mut result = SearchResult::new(payload);
        result.highlighted = Some("a <b>fast</b> rocket".to_string());
        result.score = Some(0.9);

        let wire = result.into_wire("description");
        assert_eq!(wire["description"], "a <b>fast</b> rocket");
        assert_eq!(wire["city"], "Berlin");
        assert!((wire["score"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_into_wire_without_highlight_keeps_original_text() {
        let mut payload = DocumentPayload::new();
        payload.insert("description".to_string(), "plain text".into());

        let wire = SearchResult::new(payload).into_wire("description");
        assert_eq!(wire["description"], "plain text");
        assert!(wire.get("score").is_none());
    }
}
