//! Request handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppState;
use crate::error::{Error, Result};
use crate::search::{DeleteAck, IndexAck, VillaDocument};

/// Query string for `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

/// Body of `GET /search`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub ids: Vec<String>,
}

/// Body of `POST /delete-villa`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub mongo_id: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Seconds since the server started
    pub uptime: u64,
}

// Extractors are taken as `Result` so rejections render through `Error`
// with the same JSON body as every other failure.

pub async fn index_villa(
    State(state): State<AppState>,
    body: std::result::Result<Json<VillaDocument>, JsonRejection>,
) -> Result<Json<IndexAck>> {
    let Json(villa) = body?;
    let ack = state.indexer.index(&villa).await?;
    Ok(Json(ack))
}

pub async fn search_villas(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>> {
    let Query(params) = params?;
    let ids = state.indexer.search(&params.query).await?;
    Ok(Json(SearchResponse { ids }))
}

pub async fn delete_villa(
    State(state): State<AppState>,
    body: std::result::Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteAck>> {
    let Json(request) = body?;
    let ack = state.indexer.delete(&request.mongo_id).await?;
    Ok(Json(ack))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        // Well-formed JSON of the wrong shape is a 422, anything else a 400.
        if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
            Error::Validation(rejection.body_text())
        } else {
            Error::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Embedding(_) | Error::VectorStore(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (Error::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::Embedding("x".into()), StatusCode::BAD_GATEWAY),
            (Error::VectorStore("x".into()), StatusCode::BAD_GATEWAY),
            (Error::Api("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
