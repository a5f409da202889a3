//! JSON API over the session store and the analysis controller.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::CorsLayer;

use analytix_core::session::slugify;
use analytix_core::{
    AnalysisController, AnalysisMeta, InputFile, KeyValueStore, Overview, RunSnapshot, Session,
    StageBadge, stage_badges,
};
use analytix_reporting::{ExportFormat, ReportMeta, render};

use crate::error::ApiError;

/// Uploads are only measured, but the body still has to fit.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared server state.
pub struct AppState {
    pub controller: AnalysisController,
    pub session: Session<Arc<dyn KeyValueStore>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnalysisRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub name: Option<String>,
}

/// Snapshot plus the derived display fields of the analysis screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    #[serde(flatten)]
    pub snapshot: RunSnapshot,
    pub status_label: &'static str,
    pub stages: [StageBadge; 5],
}

impl From<RunSnapshot> for AnalysisState {
    fn from(snapshot: RunSnapshot) -> Self {
        Self {
            status_label: snapshot.status.label(),
            stages: stage_badges(snapshot.status),
            snapshot,
        }
    }
}

#[derive(Debug, Serialize)]
struct StartResponse {
    generation: u64,
}

/// Create the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/login", post(login))
        .route("/api/login/{provider}", post(provider_login))
        .route("/api/overview", get(overview))
        .route("/api/analyses", get(list_analyses).post(create_analysis))
        .route("/api/analyses/{id}", get(find_analysis))
        .route("/api/analysis", get(analysis_state))
        .route("/api/analysis/input", post(select_input))
        .route("/api/analysis/start", post(start_run))
        .route("/api/analysis/reset", post(reset_run))
        .route("/api/analysis/events", get(events))
        .route("/api/analysis/export", get(export))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Overview>, ApiError> {
    state.session.login(&request.username, &request.password)?;
    Ok(Json(state.session.overview()?))
}

async fn provider_login(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<Overview>, ApiError> {
    if !matches!(provider.as_str(), "google" | "github") {
        return Err(ApiError::BadRequest(format!("unknown provider: {provider}")));
    }
    state.session.login_with_provider(&provider)?;
    Ok(Json(state.session.overview()?))
}

async fn overview(State(state): State<Arc<AppState>>) -> Result<Json<Overview>, ApiError> {
    Ok(Json(state.session.overview()?))
}

async fn list_analyses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnalysisMeta>>, ApiError> {
    Ok(Json(state.session.recent_analyses()?))
}

async fn create_analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAnalysisRequest>,
) -> Result<(StatusCode, Json<AnalysisMeta>), ApiError> {
    let meta = state.session.create_analysis(&request.name)?;
    Ok((StatusCode::CREATED, Json(meta)))
}

async fn find_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisMeta>, ApiError> {
    state
        .session
        .find_analysis(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("analysis {id}")))
}

async fn analysis_state(State(state): State<Arc<AppState>>) -> Json<AnalysisState> {
    Json(state.controller.snapshot().into())
}

/// Take the first file field, count its bytes and drop the content.
async fn select_input(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisState>, ApiError> {
    let bad_request = |e: axum::extract::multipart::MultipartError| ApiError::BadRequest(e.body_text());

    while let Some(mut field) = multipart.next_field().await.map_err(bad_request)? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(bad_request)? {
            size += chunk.len() as u64;
        }
        state.controller.select_input(InputFile::new(name, size));
        return Ok(Json(state.controller.snapshot().into()));
    }
    Err(ApiError::BadRequest("no file in upload".to_string()))
}

async fn start_run(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let handle = state.controller.start()?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            generation: handle.generation(),
        }),
    ))
}

async fn reset_run(State(state): State<Arc<AppState>>) -> Json<AnalysisState> {
    state.controller.reset();
    Json(state.controller.snapshot().into())
}

/// Stream every published snapshot, starting with the current one.
async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.controller.subscribe()).map(|snapshot| {
        let event = Event::default()
            .event("snapshot")
            .json_data(AnalysisState::from(snapshot))
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>().map_err(ApiError::BadRequest)?,
        None => ExportFormat::default(),
    };
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Analysis".to_string());
    let results = state.controller.snapshot().results;
    let body = render(format, &ReportMeta::new(&name), &results)?;

    let stem = match slugify(&name) {
        s if s.is_empty() => "analysis".to_string(),
        s => s,
    };
    let disposition = format!("attachment; filename=\"{stem}.{}\"", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

const INDEX_HTML: &str = "<!doctype html>
<html><head><meta charset=\"utf-8\"/><title>AnalytiX Hub</title></head>
<body>
<h1>AnalytiX Hub</h1>
<p>JSON API under <code>/api</code>. Live run state: <code>/api/analysis/events</code>.</p>
</body></html>
";
