use std::fmt::Display;

/// Failure taxonomy for the search core.
///
/// Retrieval covers every remote failure on the query path (vector store,
/// embedding provider, reranker); Store covers provisioning and upsert
/// failures during ingestion; Preprocessing covers malformed or unreadable
/// source data. Anything unanticipated collapses into Unknown at the
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("store operation failed: {0}")]
    Store(String),
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl Error {
    pub fn preprocessing(err: impl Display) -> Self {
        Self::Preprocessing(err.to_string())
    }

    pub fn retrieval(err: impl Display) -> Self {
        Self::Retrieval(err.to_string())
    }

    pub fn store(err: impl Display) -> Self {
        Self::Store(err.to_string())
    }

    pub fn unknown(err: impl Display) -> Self {
        Self::Unknown(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_stage() {
        let err = Error::preprocessing("bad line 3");
        assert_eq!(err.to_string(), "preprocessing failed: bad line 3");

        let err = Error::retrieval("qdrant unreachable");
        assert!(err.to_string().starts_with("retrieval failed"));

        let err = Error::store("upsert rejected");
        assert!(err.to_string().starts_with("store operation failed"));
    }
}
