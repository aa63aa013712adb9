//! HTTP server for the popstat API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/upload`     | Upload a CSV (multipart) and get a view  |
//! | POST   | `/api/fetch`      | Fetch a CSV from a URL and get a view    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, DashboardResponse, FetchRequest, ViewRequest};
use crate::cache::IngestCache;
use crate::config::Config;
use crate::error::{CsvError, PipelineError, ServerError, ServerResult};
use crate::transform::pipeline::{build_view, ingest_bytes, ingest_url};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<IngestCache>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cache = IngestCache::new(config.cache_capacity);
        Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            ServerError::Pipeline(PipelineError::Csv(CsvError::IoError(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Pipeline(_) => StatusCode::BAD_REQUEST,
        };

        log_error(self.to_string());
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/fetch", post(fetch_csv))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let app = router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 popstat server running on http://localhost:{}", port);
    eprintln!("   POST /api/upload - Upload CSV file");
    eprintln!("   POST /api/fetch  - Fetch CSV from URL");
    eprintln!("   GET  /api/logs   - SSE log stream");
    eprintln!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "popstat",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "fetch": "POST /api/fetch",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload CSV endpoint.
///
/// Fields: `file` (required), `column`, `region` (repeatable), `compare`
/// (repeatable).
async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<DashboardResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut request = ViewRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "column" | "region" | "compare" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                match name.as_str() {
                    "column" => request.column = Some(text),
                    "region" => request.regions.get_or_insert_with(Vec::new).push(text),
                    _ => request.compare.push(text),
                }
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    eprintln!(
        "\n📄 NEW UPLOAD: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );

    let ingested = ingest_bytes(&bytes, Some(&state.cache))?;
    let view = build_view(&ingested, &request.into_options(state.config.default_regions))?;

    Ok(Json(DashboardResponse::from(view)))
}

/// Fetch CSV endpoint.
async fn fetch_csv(
    State(state): State<AppState>,
    Json(request): Json<FetchRequest>,
) -> ServerResult<Json<DashboardResponse>> {
    let ingested = ingest_url(&request.url, state.config.fetch_timeout, Some(&state.cache)).await?;
    let view = build_view(&ingested, &request.view.into_options(state.config.default_regions))?;

    Ok(Json(DashboardResponse::from(view)))
}
