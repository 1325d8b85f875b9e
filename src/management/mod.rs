//! Management HTTP surface.
//!
//! ```text
//! GET  /health            liveness, reports drain phase
//! GET  /management        read-resource of the root      (authenticated)
//! POST /management        execute a JSON operation        (authenticated)
//! GET  /console[/...]     console landing page per console mode
//! ```

pub mod auth;
pub mod handlers;
pub mod model;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::config::ConsoleMode;
use crate::lifecycle::shutdown::ShutdownGate;

use self::auth::{bearer_auth_middleware, AuthPolicy};
use self::handlers::*;
use self::model::ModelController;

pub use model::{ManagementOperation, OperationResult, Outcome, StandaloneController};

#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub mode: ConsoleMode,
    pub slot: Option<String>,
}

/// State shared by the management handlers.
#[derive(Clone)]
pub struct ManagementState {
    pub controller: Arc<dyn ModelController>,
    pub gate: ShutdownGate,
    pub console: ConsoleSettings,
}

pub fn setup_management_router(state: ManagementState, auth: Arc<AuthPolicy>) -> Router {
    let operations = Router::new()
        .route("/management", get(read_root).post(execute_operation))
        .route_layer(middleware::from_fn_with_state(auth, bearer_auth_middleware));

    Router::new()
        .merge(operations)
        .route("/health", get(get_health))
        .route("/console", get(get_console))
        .route("/console/{*path}", get(get_console))
        .with_state(state)
}
