use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use tagtrail_domain::DomainError;
use tracing::debug;

use crate::dto::{IngestRequest, IngestResponse, LineString, TagListResponse};
use crate::error::ApiError;
use crate::state::ApiState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/ingest", post(ingest))
        .route("/api/tags", get(list_tags))
        .route("/api/tags/:tag_id/trail", get(get_trail))
        .with_state(state)
}

/// The pre-shared-key check runs before the body is looked at; a bad key wins
/// over a bad body.
fn authenticate(state: &ApiState, headers: &HeaderMap) -> Result<(), DomainError> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            DomainError::AuthenticationFailed(format!("missing {API_KEY_HEADER} header"))
        })?;
    if presented != state.api_key.as_ref() {
        return Err(DomainError::AuthenticationFailed(
            "incorrect API key".to_string(),
        ));
    }
    Ok(())
}

async fn ingest(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    authenticate(&state, &headers)?;

    let Json(request) =
        body.map_err(|rejection| DomainError::InvalidPayload(rejection.body_text()))?;
    debug!("accepted ingest batch");

    let report = state.ingestion.ingest(request.into()).await?;
    Ok(Json(IngestResponse::from(report)))
}

async fn list_tags(State(state): State<ApiState>) -> Result<Json<TagListResponse>, ApiError> {
    let tags = state.query.list_active_tags().await?;
    Ok(Json(TagListResponse {
        tags: tags.into_iter().map(Into::into).collect(),
    }))
}

async fn get_trail(
    State(state): State<ApiState>,
    Path(tag_id): Path<String>,
) -> Result<Json<LineString>, ApiError> {
    match state.query.get_trail(&tag_id).await? {
        Some(trail) => Ok(Json(LineString::from_trail(trail))),
        None => Err(ApiError::TrailNotFound(tag_id)),
    }
}
