//! HTTP front end.
//!
//! `GET /` answers with a fixed short text so external probes can tell the
//! process is up. `POST /pipeline/{command}` runs one request against the
//! uploaded body on the blocking pool. `/health` and `/metrics` add JSON
//! detail for operators.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gifsmith_core::config::{ConfigSchema, ServerConfig};
use gifsmith_core::health::HealthChecker;
use gifsmith_core::{Error, Result};
use gifsmith_image::{Attachment, Command, ErrorCategory, OutputFormat, Pipeline, PipelineRequest};
use gifsmith_telemetry::metrics;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared, read-only server state.
pub struct AppState {
    liveness_text: String,
    schema: ConfigSchema,
    pipeline: Pipeline,
}

pub type SharedState = Arc<AppState>;

/// Query string of a pipeline upload.
#[derive(Debug, Deserialize)]
struct PipelineParams {
    /// Name of the uploaded file, its extension is validated
    filename: String,
    /// Overlay text or speed factor
    #[serde(default)]
    argument: Option<String>,
    /// Output format override
    #[serde(default)]
    format: Option<OutputFormat>,
}

/// Build the router.
pub fn create_router(liveness_text: String, schema: ConfigSchema) -> Router {
    let pipeline = Pipeline::new(schema.pipeline.clone(), schema.overlay.clone());
    let state = Arc::new(AppState {
        liveness_text,
        schema,
        pipeline,
    });
    Router::new()
        .route("/", get(liveness))
        .route("/pipeline/:command", post(run_pipeline))
        .route("/health", get(health))
        .route("/metrics", get(metrics_json))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Listen on `server.bind` until ctrl-c.
pub async fn serve(server: ServerConfig, schema: ConfigSchema) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&server.bind)
        .await
        .map_err(|e| Error::bind_failed(&server.bind, e))?;
    let local = listener
        .local_addr()
        .map_err(|e| Error::server("Listener has no local address").with_source(e))?;

    info!(addr = %local, "Server listening");
    let app = create_router(server.liveness_text, schema);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::server("Server stopped unexpectedly").with_source(e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn liveness(State(state): State<SharedState>) -> String {
    state.liveness_text.clone()
}

async fn run_pipeline(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(params): Query<PipelineParams>,
    body: Bytes,
) -> Response {
    let command = match name.parse::<Command>() {
        Ok(command) => command,
        Err(message) => return (StatusCode::NOT_FOUND, message).into_response(),
    };

    let mut request = PipelineRequest::new(command, vec![Attachment::new(params.filename, body.to_vec())]);
    request.argument = params.argument;
    request.output = params.format;

    let record = state.schema.telemetry.metrics_enabled;
    if record {
        metrics().increment(&format!("requests.{command}"));
    }

    let worker = Arc::clone(&state);
    let handled = tokio::task::spawn_blocking(move || worker.pipeline.handle(&request)).await;

    match handled {
        Ok(Ok(output)) => {
            if record {
                metrics().gauge("output.bytes", output.bytes.len() as u64);
            }
            let disposition = format!("attachment; filename=\"{}\"", output.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, output.format.mime_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                output.bytes,
            )
                .into_response()
        }
        Ok(Err(err)) => {
            let category = err.category();
            if record {
                metrics().increment(&format!("failures.{}", category.as_str()));
            }
            let body = json!({
                "category": category.as_str(),
                "code": category.to_string(),
                "message": err.user_message(),
            });
            (status_for(category), Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Pipeline task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Decode => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorCategory::Transform => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::Encode => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    // The codec self-test is CPU-bound.
    let checked = tokio::task::spawn_blocking(move || {
        HealthChecker::new().with_standard_checks(&state.schema).run()
    })
    .await;

    match checked {
        Ok(report) => {
            let status = if report.status.is_operational() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(report)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Health check task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn metrics_json() -> Json<serde_json::Value> {
    Json(metrics().export_json())
}
