use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::linking::{LinkError, LinkingEngine};
use crate::model::{CardIssueLink, TimeLogEntry};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub engine: LinkingEngine,
    pub board_id: String,
    pub doing_list_name: String,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub board: Option<String>,
    pub list: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    Upstream(String),
    PartialSave { message: String, submitted: usize },
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        let submitted = match &err {
            LinkError::Submit { submitted, .. } => Some(*submitted),
            _ => None,
        };
        let message = format!("{:#}", anyhow::Error::new(err));
        match submitted {
            Some(submitted) => ApiError::PartialSave { message, submitted },
            None => ApiError::Upstream(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Upstream(msg) => serde_json::json!({ "error": msg }),
            ApiError::PartialSave { message, submitted } => {
                serde_json::json!({ "error": message, "submitted": submitted })
            }
        };
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

/// Build the router: the two time endpoints plus the static UI.
pub fn build_router(state: SharedState, static_dir: &Path) -> Router {
    Router::new()
        .route("/get-time", get(get_time))
        .route("/save-time", post(save_time))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn get_time(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CardIssueLink>>, ApiError> {
    let board = query.board.as_deref().unwrap_or(&state.board_id);
    let list = query.list.as_deref().unwrap_or(&state.doing_list_name);
    let links = state.engine.get_linked_cards(board, list).await.map_err(|err| {
        warn!(?err, "listing linked cards failed");
        ApiError::from(err)
    })?;
    Ok(Json(links))
}

async fn save_time(
    State(state): State<SharedState>,
    Json(entries): Json<Vec<TimeLogEntry>>,
) -> Result<Response, ApiError> {
    let report = state.engine.save_worklogs(entries).await.map_err(|err| {
        warn!(?err, "saving work logs failed");
        ApiError::from(err)
    })?;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        info!(unresolved = report.unresolved.len(), "entries without issue reference");
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(report)).into_response())
}
