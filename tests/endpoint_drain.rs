//! End-to-end tests of the management endpoint over real TCP.

use std::sync::Arc;
use std::time::Duration;

use http_management::config::{ConsoleMode, RunningMode};
use http_management::lifecycle::{DrainOutcome, Phase};
use http_management::management::auth::AuthPolicy;
use http_management::management::{ConsoleSettings, StandaloneController};
use serde_json::{json, Value};

mod common;

use common::{client, eventually, runtime, start_server, start_tls_server, tls_client, BlockingController};

#[tokio::test]
async fn test_drain_completes_in_flight_and_rejects_new() {
    let controller = BlockingController::default();
    let server = start_server(runtime(Arc::new(controller.clone())), None).await;
    let base = format!("http://{}", server.addr);

    let in_flight = tokio::spawn({
        let url = format!("{}/management", base);
        async move {
            client()
                .post(url)
                .json(&json!({ "operation": "read-resource" }))
                .send()
                .await
        }
    });

    controller.entered.notified().await;
    assert_eq!(server.gate.active_requests(), 1);

    server.stop.send(()).unwrap();
    let gate = server.gate.clone();
    assert!(eventually(|| gate.phase() == Phase::Draining).await);

    let rejected = client().get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(rejected.status(), 503);
    assert_eq!(rejected.headers()["connection"], "close");

    controller.release.notify_one();
    let res = in_flight.await.unwrap().expect("in-flight request should complete");
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["outcome"], "success");

    let outcome = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("server should stop after the drain")
        .unwrap()
        .unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
    assert_eq!(server.gate.phase(), Phase::Terminated);
}

#[tokio::test]
async fn test_idle_server_stops_immediately() {
    let controller = Arc::new(StandaloneController::new("node-1", RunningMode::Normal));
    let server = start_server(runtime(controller), None).await;

    let res = client()
        .get(format!("http://{}/health", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "running");

    server.stop.send(()).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
}

#[tokio::test]
async fn test_drain_deadline_forces_shutdown() {
    let controller = BlockingController::default();
    let server = start_server(
        runtime(Arc::new(controller.clone())),
        Some(Duration::from_millis(200)),
    )
    .await;

    let url = format!("http://{}/management", server.addr);
    let _stuck = tokio::spawn(async move { client().get(url).send().await });
    controller.entered.notified().await;

    server.stop.send(()).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, DrainOutcome::Forced { outstanding: 1 });
}

#[tokio::test]
async fn test_bearer_auth_guards_operations_only() {
    let controller = Arc::new(StandaloneController::new("node-1", RunningMode::Normal));
    let mut rt = runtime(controller);
    rt.auth = AuthPolicy::bearer("management-http-authentication", ["secret".to_string()]);
    let server = start_server(rt, None).await;
    let base = format!("http://{}", server.addr);

    let res = client().get(format!("{}/management", base)).send().await.unwrap();
    assert_eq!(res.status(), 401);
    assert!(res.headers().contains_key("www-authenticate"));

    let res = client()
        .get(format!("{}/management", base))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .post(format!("{}/management", base))
        .bearer_auth("secret")
        .json(&json!({ "operation": "read-attribute", "name": "name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"], "node-1");

    let res = client().get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client().get(format!("{}/no-such-path", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_console_modes() {
    let controller = Arc::new(StandaloneController::new("node-1", RunningMode::Normal));

    let server = start_server(runtime(controller.clone()), None).await;
    let res = client()
        .get(format!("http://{}/console", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    server.stop.send(()).unwrap();

    let mut rt = runtime(controller.clone());
    rt.console = ConsoleSettings {
        mode: ConsoleMode::Console,
        slot: Some("preview".into()),
    };
    let server = start_server(rt, None).await;
    let res = client()
        .get(format!("http://{}/console/index.html", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("preview"));
    server.stop.send(()).unwrap();

    let mut rt = runtime(controller);
    rt.console = ConsoleSettings {
        mode: ConsoleMode::AdminOnly,
        slot: None,
    };
    let server = start_server(rt, None).await;
    let res = client()
        .get(format!("http://{}/console", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Admin Only"));
    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_cors_and_request_id_headers() {
    let controller = Arc::new(StandaloneController::new("node-1", RunningMode::Normal));
    let mut rt = runtime(controller);
    rt.allowed_origins = vec!["http://console.example".into()];
    let server = start_server(rt, None).await;

    let res = client()
        .get(format!("http://{}/health", server.addr))
        .header("origin", "http://console.example")
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "http://console.example");
    assert_eq!(res.headers()["x-request-id"], "req-42");

    let res = client()
        .get(format!("http://{}/health", server.addr))
        .header("origin", "http://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert!(!res.headers().contains_key("access-control-allow-origin"));
    assert!(res.headers().contains_key("x-request-id"));

    server.stop.send(()).unwrap();
}

#[tokio::test]
async fn test_tls_listener_drains() {
    let controller = BlockingController::default();
    let server = start_tls_server(runtime(Arc::new(controller.clone())), None).await;
    let base = format!("https://{}", server.addr);

    // The TLS listener binds inside the spawned server task.
    let mut health = None;
    for _ in 0..100 {
        if let Ok(res) = tls_client().get(format!("{}/health", base)).send().await {
            health = Some(res);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let health = health.expect("TLS listener should come up");
    assert_eq!(health.status(), 200);

    let in_flight = tokio::spawn({
        let url = format!("{}/management", base);
        async move { tls_client().get(url).send().await }
    });
    controller.entered.notified().await;

    server.stop.send(()).unwrap();
    let gate = server.gate.clone();
    assert!(eventually(|| gate.phase() == Phase::Draining).await);

    controller.release.notify_one();
    let res = in_flight.await.unwrap().expect("in-flight TLS request should complete");
    assert_eq!(res.status(), 200);

    let outcome = tokio::time::timeout(Duration::from_secs(10), server.task)
        .await
        .expect("TLS server should stop after the drain")
        .unwrap()
        .unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
}
