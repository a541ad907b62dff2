//! Health and trigger endpoints.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use leadsync_engine::{LeadSource, SyncService, TaskBoard};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Shared state behind the router.
///
/// The gate serializes trigger requests; the engine is not safe for
/// concurrent cycle invocations.
struct AppState<S: LeadSource, B: TaskBoard> {
    service: Arc<SyncService<S, B>>,
    gate: Mutex<()>,
}

/// Health probe body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Trigger response body.
#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_errors: Option<usize>,
}

/// Builds the router exposing `/health` and `/sync`.
pub fn router<S, B>(service: Arc<SyncService<S, B>>) -> Router
where
    S: LeadSource + 'static,
    B: TaskBoard + 'static,
{
    let state = Arc::new(AppState {
        service,
        gate: Mutex::new(()),
    });
    Router::new()
        .route("/health", get(health))
        .route("/sync", post(trigger_sync::<S, B>))
        .with_state(state)
}

/// Binds and serves until the process exits.
pub async fn serve<S, B>(service: Arc<SyncService<S, B>>, addr: SocketAddr) -> std::io::Result<()>
where
    S: LeadSource + 'static,
    B: TaskBoard + 'static,
{
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "leadsync server listening");
    axum::serve(listener, app).await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn trigger_sync<S, B>(State(state): State<Arc<AppState<S, B>>>) -> Json<SyncResponse>
where
    S: LeadSource + 'static,
    B: TaskBoard + 'static,
{
    let _serialized = state.gate.lock().await;

    let service = Arc::clone(&state.service);
    let report = tokio::task::spawn_blocking(move || service.run_full_sync_cycle()).await;

    match report {
        Ok(report) if report.succeeded() => Json(SyncResponse {
            status: "synced",
            message: None,
            record_errors: Some(report.record_errors()),
        }),
        Ok(report) => {
            let message = report
                .first_failure()
                .map(ToString::to_string)
                .unwrap_or_else(|| "sync cycle failed".to_string());
            error!(%message, "triggered sync failed");
            Json(SyncResponse {
                status: "error",
                message: Some(message),
                record_errors: Some(report.record_errors()),
            })
        }
        Err(join_error) => {
            error!(error = %join_error, "sync worker panicked");
            Json(SyncResponse {
                status: "error",
                message: Some(join_error.to_string()),
                record_errors: None,
            })
        }
    }
}
