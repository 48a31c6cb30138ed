#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use voice_call::{
    CallController, CallSnapshot, LoopbackConnector, SessionConfig, StaticToken, TokenSource,
    VirtualDevices,
};

pub struct Harness {
    pub controller: CallController,
    pub connector: Arc<LoopbackConnector>,
    pub devices: Arc<VirtualDevices>,
}

pub fn harness() -> Harness {
    harness_with(LoopbackConnector::new(), VirtualDevices::new())
}

pub fn harness_with(connector: LoopbackConnector, devices: VirtualDevices) -> Harness {
    harness_full(
        SessionConfig::default(),
        Arc::new(StaticToken::new("test-token", "loopback://test")),
        connector,
        devices,
    )
}

pub fn harness_full(
    config: SessionConfig,
    tokens: Arc<dyn TokenSource>,
    connector: LoopbackConnector,
    devices: VirtualDevices,
) -> Harness {
    let connector = Arc::new(connector);
    let devices = Arc::new(devices);
    let controller = CallController::new(config, tokens, connector.clone(), devices.clone());

    Harness {
        controller,
        connector,
        devices,
    }
}

/// Poll the controller until `check` holds or two seconds pass
pub async fn wait_for<F>(controller: &CallController, check: F) -> CallSnapshot
where
    F: Fn(&CallSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);

    loop {
        let snapshot = controller.snapshot().await;
        if check(&snapshot) {
            return snapshot;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met, last snapshot: {:?}", snapshot);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll an arbitrary condition until it holds or two seconds pass
pub async fn wait_until<F, Fut>(check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);

    while !check().await {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within two seconds");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn transcript(role: &str, content: &str) -> String {
    serde_json::json!({"type": "transcript", "role": role, "content": content}).to_string()
}
