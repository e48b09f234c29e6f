// src/api.rs
//! HTTP surface for the dashboard: source picker, selection, report requests and status.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::pipeline::{PipelineStatus, ReportPipeline};
use crate::selection::{ReplaceOutcome, Selection};
use crate::sources::{self, RegistryView, SourceCategory};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReportPipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sources", get(list_sources))
        .route("/selection", get(get_selection).put(replace_selection))
        .route("/selection/toggle", post(toggle_source))
        .route("/selection/all", post(select_all))
        .route("/selection/none", post(deselect_all))
        .route("/reports", post(request_report))
        .route("/reports/status", get(report_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Alias kept for callers that expect `api::router`.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

async fn list_sources() -> Json<RegistryView> {
    Json(sources::registry_view())
}

#[derive(Serialize)]
struct SelectionOut {
    sources: Vec<String>,
    count: usize,
    domestic: usize,
    international: usize,
    social: usize,
}

impl From<&Selection> for SelectionOut {
    fn from(sel: &Selection) -> Self {
        Self {
            sources: sel.ordered(),
            count: sel.len(),
            domestic: sel.count_in(SourceCategory::Domestic),
            international: sel.count_in(SourceCategory::International),
            social: sel.count_in(SourceCategory::Social),
        }
    }
}

async fn get_selection(State(state): State<AppState>) -> Json<SelectionOut> {
    Json(SelectionOut::from(&state.pipeline.selection()))
}

#[derive(Deserialize)]
struct ToggleReq {
    source: String,
}

async fn toggle_source(
    State(state): State<AppState>,
    Json(body): Json<ToggleReq>,
) -> Response {
    if !sources::is_registered(&body.source) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorOut {
                error: format!("unknown source: {}", body.source),
            }),
        )
            .into_response();
    }
    let sel = state.pipeline.update_selection(|s| {
        s.toggle(&body.source);
        s.clone()
    });
    Json(SelectionOut::from(&sel)).into_response()
}

async fn select_all(State(state): State<AppState>) -> Json<SelectionOut> {
    let sel = state.pipeline.update_selection(|s| {
        s.select_all();
        s.clone()
    });
    Json(SelectionOut::from(&sel))
}

async fn deselect_all(State(state): State<AppState>) -> Json<SelectionOut> {
    let sel = state.pipeline.update_selection(|s| {
        s.deselect_all();
        s.clone()
    });
    Json(SelectionOut::from(&sel))
}

#[derive(Deserialize)]
struct ReplaceReq {
    sources: Vec<String>,
}

#[derive(Serialize)]
struct ReplaceOut {
    selection: SelectionOut,
    #[serde(flatten)]
    outcome: ReplaceOutcome,
}

async fn replace_selection(
    State(state): State<AppState>,
    Json(body): Json<ReplaceReq>,
) -> Json<ReplaceOut> {
    let (outcome, sel) = state.pipeline.update_selection(|s| {
        let outcome = s.replace(body.sources);
        (outcome, s.clone())
    });
    Json(ReplaceOut {
        selection: SelectionOut::from(&sel),
        outcome,
    })
}

#[derive(Deserialize)]
struct ReportReq {
    #[serde(default)]
    topic: Option<String>,
    /// `YYYY-MM-DD`; today (UTC) when absent.
    #[serde(default)]
    date: Option<String>,
}

#[derive(Serialize)]
struct Accepted {
    epoch: u64,
}

#[derive(Serialize)]
struct ErrorOut {
    error: String,
}

async fn request_report(State(state): State<AppState>, Json(body): Json<ReportReq>) -> Response {
    let date = body
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());
    match state.pipeline.submit(body.topic.as_deref(), &date) {
        Ok(epoch) => (StatusCode::ACCEPTED, Json(Accepted { epoch })).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorOut {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

#[derive(Serialize)]
struct StatusOut {
    epoch: u64,
    status: PipelineStatus,
}

async fn report_status(State(state): State<AppState>) -> Json<StatusOut> {
    let (epoch, status) = state.pipeline.status();
    Json(StatusOut { epoch, status })
}
