use crate::ingest::UploadOutcome;
use crate::search::DEFAULT_TOP;
use crate::shared::error::Error;
use crate::shared::models::SearchMode;
use crate::shared::state::AppState;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// REST surface consumed by the frontend.
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/upload", post(upload))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub search_type: SearchMode,
}

/// Search failures are reported generically; the cause only goes to the log.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        error!("Search request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "search failed"})),
        )
            .into_response()
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let results = match params.search_type {
        SearchMode::Text => state.text.search(&params.q, DEFAULT_TOP, None).await?,
        SearchMode::Neural => state.neural.search(&params.q, DEFAULT_TOP, None).await?,
        SearchMode::Hybrid => state.hybrid.search(&params.q, DEFAULT_TOP, None).await?,
    };
    info!(
        "{} search for {:?} returned {} results",
        params.search_type,
        params.q,
        results.len()
    );

    let result: Vec<serde_json::Value> = results
        .into_iter()
        .map(|r| r.into_wire(&state.config.text_field))
        .collect();
    Ok(Json(json!({ "result": result })))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    let staged = match stage_upload(&mut multipart).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "No file supplied"})),
            )
        }
        Err(err) => {
            error!("Upload staging failed: {}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Invalid upload"})),
            );
        }
    };

    let outcome = state.ingestion.ingest(staged.path()).await;
    (
        outcome_status(&outcome),
        Json(json!({"message": outcome.message()})),
    )
}

/// Write the first named multipart field to a temp file, keeping the source
/// extension so ingestion can dispatch on it.
async fn stage_upload(multipart: &mut Multipart) -> anyhow::Result<Option<tempfile::NamedTempFile>> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let suffix = Path::new(&file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let data = field.bytes().await?;

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&data)?;
        return Ok(Some(file));
    }
    Ok(None)
}

fn outcome_status(outcome: &UploadOutcome) -> StatusCode {
    match outcome {
        UploadOutcome::Success { .. } => StatusCode::OK,
        UploadOutcome::PreprocessingError => StatusCode::BAD_REQUEST,
        UploadOutcome::StoreError | UploadOutcome::UnknownError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
