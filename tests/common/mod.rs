//! Shared utilities for the management endpoint integration tests.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use http_management::http::ManagementHttpServer;
use http_management::lifecycle::startup::{EndpointRuntime, SecureListener};
use http_management::net::tls::load_tls_config;
use http_management::lifecycle::{DrainOutcome, ShutdownGate};
use http_management::management::model::ModelController;
use http_management::management::{ManagementOperation, OperationResult};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

/// Controller whose operations park until the test releases them.
#[derive(Clone, Default)]
pub struct BlockingController {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ModelController for BlockingController {
    fn execute(&self, operation: ManagementOperation) -> BoxFuture<'static, OperationResult> {
        let entered = self.entered.clone();
        let release = self.release.clone();
        Box::pin(async move {
            entered.notify_one();
            release.notified().await;
            OperationResult::success(json!({ "operation": operation.operation }))
        })
    }
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub gate: ShutdownGate,
    pub stop: oneshot::Sender<()>,
    pub task: JoinHandle<io::Result<DrainOutcome>>,
}

/// Serve `runtime` on an ephemeral port; sending on `stop` plays the
/// termination signal.
#[allow(dead_code)]
pub async fn start_server(runtime: EndpointRuntime, drain_timeout: Option<Duration>) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    spawn_server(ManagementHttpServer::new(runtime), Some(listener), addr, drain_timeout)
}

/// Serve `runtime` over TLS only, with the fixture certificate, on a free port.
#[allow(dead_code)]
pub async fn start_tls_server(mut runtime: EndpointRuntime, drain_timeout: Option<Duration>) -> RunningServer {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let tls = load_tls_config(&dir.join("cert.pem"), &dir.join("key.pem"))
        .await
        .unwrap();

    runtime.plain_addr = None;
    runtime.secure = Some(SecureListener { addr, tls });
    spawn_server(ManagementHttpServer::new(runtime), None, addr, drain_timeout)
}

fn spawn_server(
    server: ManagementHttpServer,
    listener: Option<TcpListener>,
    addr: SocketAddr,
    drain_timeout: Option<Duration>,
) -> RunningServer {
    let gate = server.gate();
    let (stop, stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        server
            .serve(
                listener,
                async move {
                    let _ = stopped.await;
                },
                drain_timeout,
            )
            .await
    });

    RunningServer { addr, gate, stop, task }
}

#[allow(dead_code)]
pub fn runtime(controller: Arc<dyn ModelController>) -> EndpointRuntime {
    EndpointRuntime::plain("127.0.0.1:0".parse().unwrap(), controller)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Client that trusts the self-signed fixture certificate.
#[allow(dead_code)]
pub fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

/// Poll until `f` holds or a second passes.
#[allow(dead_code)]
pub async fn eventually(mut f: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}
