//! HTTP route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::metrics;
use crate::ops;
use crate::scheduler::{self, StepOutcome};
use crate::state::AppState;
use crate::types::{ErrorResponse, KillRequest, MessageResponse};

pub async fn index() -> &'static str {
    "System Monitor Backend is Live!"
}

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    Json(metrics::collect_snapshot(&state).await).into_response()
}

/// Run one round-robin step. Always 200; the message says whether a
/// process was rotated, dropped, or none was runnable.
pub async fn schedule(State(state): State<AppState>) -> Response {
    let message = match scheduler::schedule_step(&state).await {
        StepOutcome::Scheduled { pid, name } => {
            info!(pid, name = %name, "scheduled on cpu 0");
            format!("scheduled {name} (pid {pid}) on cpu 0")
        }
        StepOutcome::Dropped { pid } => {
            format!("pid {pid} no longer schedulable, dropped from queue")
        }
        StepOutcome::Idle => "no runnable processes observed".to_string(),
    };
    Json(MessageResponse { message }).into_response()
}

pub async fn kill_process(body: Option<Json<KillRequest>>) -> Response {
    // A missing or malformed body and a body without a pid are the same
    // caller error.
    let pid = match body.and_then(|Json(req)| req.pid) {
        Some(pid) => pid,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "missing pid".into(),
                }),
            )
                .into_response();
        }
    };

    match ops::terminate(pid) {
        Ok(()) => {
            info!(pid, "sent SIGTERM");
            Json(MessageResponse {
                message: format!("process {pid} terminated"),
            })
            .into_response()
        }
        Err(e) if e.is_client_error() => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(pid, error = %e, "kill_process failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
