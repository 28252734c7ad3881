//! HTTP surface served on an ephemeral port

mod common;

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use common::{harness, store_with, ScriptedLlm, STANDINGS};
use paddock_rag::config::IndexMode;
use paddock_rag::server::{state::AppState, RagServer};
use paddock_rag::QueryResponse;

#[tokio::test]
async fn query_health_and_info_endpoints() {
    let dir = TempDir::new().unwrap();
    let h = harness(store_with(STANDINGS), dir.path(), IndexMode::Cached, ScriptedLlm::championship());
    let state = AppState::new(h.config.clone(), h.pipeline.clone());
    let server = RagServer::new(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::new();

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "OK");

    let response: QueryResponse = client
        .post(format!("{}/api/query", base))
        .json(&serde_json::json!({"question": "Who leads the championship?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response.answer, "Team A leads with 310 points.");
    assert_eq!(response.chunks_retrieved, 2);

    let ready = client.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(ready.status(), 200);

    let info: Value = client
        .get(format!("{}/api/info", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["name"], "paddock-rag");
    assert_eq!(info["index"]["mode"], "cached");
    assert!(info["index"]["chunks"].as_u64().unwrap() >= 2);

    let bad = client
        .post(format!("{}/api/query", base))
        .json(&serde_json::json!({"question": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
    let body: Value = bad.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_argument");

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
    assert!(!state.is_ready());
}
