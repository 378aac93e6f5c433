//! Local HTTP view of the link's node tree.

use axum::{
    Router,
    extract::{RawPathParams, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use weatherlink_store::{Node, StoreError};
use weatherlink_types::{NodePath, Value};

use crate::link::{Link, LinkStatus, SetTextParams, SetTextResult};

/// Error body returned by the API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::TypeMismatch { .. } => StatusCode::BAD_REQUEST,
            StoreError::AlreadyExists(_) | StoreError::Reserved(_) | StoreError::NotWritable(_) => {
                StatusCode::CONFLICT
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Maps the still percent-encoded wildcard onto a tree path, so every path
/// the listing reports can be fetched as-is.
fn node_path(params: &RawPathParams) -> Result<NodePath, ApiError> {
    let raw = params.iter().next().map_or("", |(_, value)| value);
    NodePath::from_url_path(raw).map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: e.to_string(),
    })
}

async fn list_nodes(State(link): State<Arc<Link>>) -> Json<Vec<Node>> {
    Json(link.tree().list().await)
}

async fn get_node(
    State(link): State<Arc<Link>>,
    params: RawPathParams,
) -> Result<Json<Node>, ApiError> {
    let path = node_path(&params)?;
    link.tree()
        .get(&path)
        .await
        .map(Json)
        .ok_or_else(|| StoreError::NotFound(path.to_string()).into())
}

async fn put_node(
    State(link): State<Arc<Link>>,
    params: RawPathParams,
    Json(value): Json<Value>,
) -> Result<Json<Node>, ApiError> {
    let path = node_path(&params)?;
    Ok(Json(link.write_node(&path, value).await?))
}

async fn set_text(
    State(link): State<Arc<Link>>,
    Json(params): Json<SetTextParams>,
) -> Json<SetTextResult> {
    Json(link.set_text(&params).await)
}

async fn status(State(link): State<Arc<Link>>) -> Json<LinkStatus> {
    Json(link.status().await)
}

/// Build the HTTP API router over the given link.
pub fn build_router(link: Arc<Link>) -> Router {
    Router::new()
        .route("/api/v1/nodes", get(list_nodes))
        .route("/api/v1/nodes/{*path}", get(get_node).put(put_node))
        .route("/api/v1/actions/set_text", post(set_text))
        .route("/api/v1/status", get(status))
        .with_state(link)
}
