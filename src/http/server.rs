//! HTTP server for the management endpoint.
//!
//! # Responsibilities
//! - Build the Axum router with the management routes
//! - Wire up middleware (tracing, request ID, admission gate, timeout, CORS)
//! - Serve the plain and/or TLS listener
//! - On the termination signal: begin the drain, wait for it, then stop listening

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::request::MakeManagementRequestId;
use crate::lifecycle::shutdown::{Admission, DrainOutcome, ShutdownGate};
use crate::lifecycle::startup::EndpointRuntime;
use crate::management::{setup_management_router, ManagementState};
use crate::observability::metrics;

/// Grace period for TLS connections once the drain has completed.
const TLS_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// The management endpoint service.
///
/// The gate is created with the server and lives as long as it does.
pub struct ManagementHttpServer {
    runtime: EndpointRuntime,
    gate: ShutdownGate,
}

impl ManagementHttpServer {
    pub fn new(runtime: EndpointRuntime) -> Self {
        Self {
            runtime,
            gate: ShutdownGate::new(),
        }
    }

    pub fn gate(&self) -> ShutdownGate {
        self.gate.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let state = ManagementState {
            controller: Arc::clone(&self.runtime.controller),
            gate: self.gate.clone(),
            console: self.runtime.console.clone(),
        };

        let mut router = setup_management_router(state, Arc::new(self.runtime.auth.clone()));
        if let Some(cors) = cors_layer(&self.runtime.allowed_origins) {
            router = router.layer(cors);
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::x_request_id(MakeManagementRequestId))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn_with_state(self.gate.clone(), admission_middleware))
                .layer(TimeoutLayer::new(self.runtime.request_timeout)),
        )
    }

    /// Bind the plain listener (if any) and serve until `signal` completes
    /// and the drain is over.
    pub async fn run<F>(self, signal: F, drain_timeout: Option<Duration>) -> io::Result<DrainOutcome>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let plain = match self.runtime.plain_addr {
            Some(addr) => Some(TcpListener::bind(addr).await?),
            None => None,
        };
        self.serve(plain, signal, drain_timeout).await
    }

    /// Serve on an already bound plain listener plus the configured TLS one.
    pub async fn serve<F>(
        self,
        plain: Option<TcpListener>,
        signal: F,
        drain_timeout: Option<Duration>,
    ) -> io::Result<DrainOutcome>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let app = self.router();
        let (stop_tx, _) = broadcast::channel::<()>(1);
        let tls_handle = axum_server::Handle::new();
        let mut listeners: JoinSet<io::Result<()>> = JoinSet::new();

        if let Some(listener) = plain {
            let addr = listener.local_addr()?;
            tracing::info!(address = %addr, "HTTP management interface listening");
            let mut stop = stop_tx.subscribe();
            let app = app.clone();
            listeners.spawn(async move {
                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(async move {
                        let _ = stop.recv().await;
                    })
                    .await
            });
        }

        if let Some(secure) = self.runtime.secure.clone() {
            tracing::info!(address = %secure.addr, "HTTPS management interface listening");
            let handle = tls_handle.clone();
            let app = app.clone();
            listeners.spawn(async move {
                axum_server::bind_rustls(secure.addr, secure.tls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
            });
        }

        tokio::select! {
            _ = signal => {}
            Some(exited) = listeners.join_next() => {
                listeners.abort_all();
                return Err(listener_exit_error(exited));
            }
        }

        let handle = self.gate.begin_shutdown();
        let outcome = match drain_timeout {
            Some(timeout) => handle.wait_timeout(timeout).await,
            None => {
                handle.wait().await;
                DrainOutcome::Drained
            }
        };

        let _ = stop_tx.send(());
        match outcome {
            DrainOutcome::Drained => {
                tls_handle.graceful_shutdown(Some(TLS_CLOSE_GRACE));
                while let Some(exited) = listeners.join_next().await {
                    match exited {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => tracing::warn!(error = %e, "Listener stopped with error"),
                        Err(e) => tracing::warn!(error = %e, "Listener task failed"),
                    }
                }
            }
            DrainOutcome::Forced { outstanding } => {
                tracing::warn!(outstanding, "Closing listeners with management requests in flight");
                tls_handle.shutdown();
                listeners.abort_all();
                while listeners.join_next().await.is_some() {}
            }
        }

        tracing::info!(outcome = ?outcome, "HTTP management interface stopped");
        Ok(outcome)
    }

    pub fn plain_addr(&self) -> Option<SocketAddr> {
        self.runtime.plain_addr
    }
}

fn listener_exit_error(exited: Result<io::Result<()>, tokio::task::JoinError>) -> io::Error {
    match exited {
        Ok(Err(e)) => e,
        Ok(Ok(())) => io::Error::other("management listener exited unexpectedly"),
        Err(e) => io::Error::other(e),
    }
}

/// Admit the request through the shutdown gate or answer 503.
async fn admission_middleware(State(gate): State<ShutdownGate>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();

    let permit = match gate.enter_request() {
        Admission::Permitted(permit) => permit,
        Admission::Rejected => {
            tracing::debug!(method = %method, path = %request.uri().path(), "Rejected, management interface shutting down");
            metrics::record_rejected(&method);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::CONNECTION, "close")],
                "Management interface is shutting down",
            )
                .into_response();
        }
    };

    metrics::set_active_requests(gate.active_requests());
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);

    permit.release();
    metrics::set_active_requests(gate.active_requests());
    response
}

fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    if allowed_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Allowed origin is not a valid header value, ignoring");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
