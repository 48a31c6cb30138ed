mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voice_call::{create_router, AppState, LoopbackConnector, VirtualDevices};

fn app(h: common::Harness) -> (Router, Arc<LoopbackConnector>, Arc<voice_call::CallController>) {
    let connector = Arc::clone(&h.connector);
    let controller = Arc::new(h.controller);
    (create_router(AppState::new(Arc::clone(&controller))), connector, controller)
}

async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };

    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let (router, _, _) = app(common::harness());

    let (status, body) = call(&router, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_get_call_before_connect() {
    let (router, _, _) = app(common::harness());

    let (status, body) = call(&router, Method::GET, "/call").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["connection"], "disconnected");
    assert_eq!(body["devices"]["audio_ready"], false);
    assert_eq!(body["tool_cards"], json!([]));
}

#[tokio::test]
async fn test_connect_and_disconnect() {
    let (router, connector, controller) = app(common::harness());

    let (status, body) = call(&router, Method::POST, "/call/connect").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["connection"], "connected");
    assert!(body["state"]["identity"]["room_name"].as_str().unwrap().starts_with("room-"));

    common::wait_for(&controller, |s| s.devices.audio_ready).await;
    connector
        .last_room()
        .unwrap()
        .send_data(
            json!({
                "type": "toolCall",
                "toolCall": {"name": "book_appointment", "arguments": {"slot": 2}, "result": {"success": true}}
            })
            .to_string(),
        )
        .await;
    common::wait_for(&controller, |s| !s.state.tool_calls().is_empty()).await;

    let (_, body) = call(&router, Method::GET, "/call").await;
    assert_eq!(body["tool_cards"][0]["title"], "Book Appointment");
    assert_eq!(body["tool_cards"][0]["status"], "success");

    let (status, body) = call(&router, Method::POST, "/call/disconnect").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["connection"], "disconnected");
    assert_eq!(body["state"]["tool_calls"], json!([]));
    assert!(connector.last_room().unwrap().is_closed());
}

#[tokio::test]
async fn test_connect_failure_is_bad_gateway() {
    let (router, _, _) = app(common::harness_with(
        LoopbackConnector::new().failing("media server unreachable"),
        VirtualDevices::new(),
    ));

    let (status, body) = call(&router, Method::POST, "/call/connect").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("media server unreachable"));

    let (_, body) = call(&router, Method::GET, "/call").await;
    assert!(body["state"]["error"].as_str().is_some());

    let (status, _) = call(&router, Method::DELETE, "/call/error").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = call(&router, Method::GET, "/call").await;
    assert_eq!(body["state"]["error"], Value::Null);
}

#[tokio::test]
async fn test_device_toggles() {
    let (router, _, controller) = app(common::harness());

    let (_, body) = call(&router, Method::POST, "/call/mute").await;
    assert_eq!(body, json!({"muted": false}));

    call(&router, Method::POST, "/call/connect").await;
    common::wait_for(&controller, |s| s.devices.audio_ready).await;

    let (_, body) = call(&router, Method::POST, "/call/mute").await;
    assert_eq!(body, json!({"muted": true}));

    let (_, body) = call(&router, Method::POST, "/call/video").await;
    assert_eq!(body, json!({"video_enabled": true}));

    let (_, body) = call(&router, Method::GET, "/call").await;
    assert_eq!(body["stage"][0]["region"], "local_preview");

    let (_, body) = call(&router, Method::POST, "/call/video").await;
    assert_eq!(body, json!({"video_enabled": false}));

    controller.disconnect().await;
}
