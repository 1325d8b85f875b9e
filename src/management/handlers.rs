use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::ConsoleMode;
use crate::lifecycle::shutdown::Phase;
use crate::management::model::{ManagementOperation, OperationResult};
use crate::management::ManagementState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub active_requests: usize,
}

pub async fn get_health(State(state): State<ManagementState>) -> Json<HealthStatus> {
    let status = match state.gate.phase() {
        Phase::Active => "running",
        Phase::Draining => "draining",
        Phase::Terminated => "stopped",
    };
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        active_requests: state.gate.active_requests(),
    })
}

pub async fn read_root(State(state): State<ManagementState>) -> Json<OperationResult> {
    Json(state.controller.execute(ManagementOperation::read_resource()).await)
}

pub async fn execute_operation(
    State(state): State<ManagementState>,
    Json(operation): Json<ManagementOperation>,
) -> Json<OperationResult> {
    tracing::debug!(operation = %operation.operation, address = ?operation.address, "Executing management operation");
    Json(state.controller.execute(operation).await)
}

pub async fn get_console(State(state): State<ManagementState>) -> Response {
    let slot = state.console.slot.as_deref().unwrap_or("main");
    match state.console.mode {
        ConsoleMode::NoConsole => (StatusCode::NOT_FOUND, "Console is not enabled").into_response(),
        ConsoleMode::Console => Html(format!(
            "<!DOCTYPE html><html><head><title>Management Console</title></head>\
             <body><h1>Management Console</h1><p>Console slot: {slot}</p></body></html>"
        ))
        .into_response(),
        ConsoleMode::AdminOnly => Html(
            "<!DOCTYPE html><html><head><title>Management Console</title></head>\
             <body><h1>Admin Only Mode</h1><p>The process is running in admin-only mode; \
             the console is limited to configuration changes.</p></body></html>"
                .to_string(),
        )
        .into_response(),
    }
}
