//! In-process media room
//!
//! `LoopbackConnector` joins rooms that live entirely inside this process.
//! Each joined room gets a [`LoopbackHandle`] that plays the remote side:
//! it injects room events (agent tracks, side-channel data, hang-up) and
//! exposes which local tracks are currently published. An optional script
//! of side-channel payloads is played into every room after it connects.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::room::{MediaRoom, RoomConnector, RoomEvent, RoomOptions, TrackInfo};

const EVENT_BUFFER: usize = 256;

/// Participant identity the scripted agent speaks as
pub const AGENT_IDENTITY: &str = "agent";

#[derive(Default)]
pub struct LoopbackConnector {
    script: Vec<Vec<u8>>,
    pacing: Duration,
    hang_up_after_script: bool,
    failure: Option<String>,
    /// Open rooms plus the most recently closed ones; pruned on every connect
    rooms: Mutex<Vec<LoopbackHandle>>,
    joined: AtomicUsize,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side-channel payloads delivered to every room after it connects
    pub fn with_script(mut self, payloads: Vec<Vec<u8>>) -> Self {
        self.script = payloads;
        self
    }

    /// Delay before each scripted payload
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Disconnect the room from the remote side once the script is played
    pub fn hang_up_after_script(mut self) -> Self {
        self.hang_up_after_script = true;
        self
    }

    /// Make every connect attempt fail with the given message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Handles of rooms still open, plus any closed since the last connect, oldest first
    pub fn rooms(&self) -> Vec<LoopbackHandle> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rooms ever joined through this connector
    pub fn joined_count(&self) -> usize {
        self.joined.load(Ordering::SeqCst)
    }

    pub fn last_room(&self) -> Option<LoopbackHandle> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    fn play_script(&self, handle: LoopbackHandle) {
        if self.script.is_empty() && !self.hang_up_after_script {
            return;
        }

        let script = self.script.clone();
        let pacing = self.pacing;
        let hang_up = self.hang_up_after_script;

        tokio::spawn(async move {
            debug!("Playing {} scripted payloads", script.len());

            for payload in script {
                if !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
                if !handle.send_data(payload).await {
                    return;
                }
            }

            if hang_up {
                handle.hang_up("script finished").await;
            }
        });
    }
}

#[async_trait::async_trait]
impl RoomConnector for LoopbackConnector {
    async fn connect(
        &self,
        url: &str,
        token: &str,
        options: &RoomOptions,
    ) -> Result<(Arc<dyn MediaRoom>, mpsc::Receiver<RoomEvent>)> {
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = LoopbackHandle {
            inner: Arc::new(LoopbackInner {
                url: url.to_string(),
                token: token.to_string(),
                options: options.clone(),
                events: tx,
                published: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        };

        {
            let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
            rooms.retain(|room| !room.is_closed());
            rooms.push(handle.clone());
        }
        self.joined.fetch_add(1, Ordering::SeqCst);

        info!("Loopback room joined (url={})", url);
        handle.emit(RoomEvent::Connected).await;
        self.play_script(handle.clone());

        Ok((Arc::new(LoopbackRoom { handle }), rx))
    }
}

struct LoopbackInner {
    url: String,
    token: String,
    options: RoomOptions,
    events: mpsc::Sender<RoomEvent>,
    published: Mutex<Vec<TrackInfo>>,
    closed: AtomicBool,
}

/// Remote side of a loopback room
#[derive(Clone)]
pub struct LoopbackHandle {
    inner: Arc<LoopbackInner>,
}

impl LoopbackHandle {
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn token(&self) -> &str {
        &self.inner.token
    }

    pub fn options(&self) -> &RoomOptions {
        &self.inner.options
    }

    /// Deliver an event to the local side. Returns false once the room is closed.
    pub async fn emit(&self, event: RoomEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.inner.events.send(event).await.is_ok()
    }

    pub async fn send_data(&self, payload: impl Into<Vec<u8>>) -> bool {
        self.emit(RoomEvent::DataReceived {
            payload: payload.into(),
            participant: Some(AGENT_IDENTITY.to_string()),
        })
        .await
    }

    pub async fn subscribe_track(&self, participant: &str, track: TrackInfo) -> bool {
        self.emit(RoomEvent::TrackSubscribed {
            track,
            participant: participant.to_string(),
        })
        .await
    }

    pub async fn unsubscribe_track(&self, participant: &str, track: TrackInfo) -> bool {
        self.emit(RoomEvent::TrackUnsubscribed {
            track,
            participant: participant.to_string(),
        })
        .await
    }

    /// Disconnect from the remote side
    pub async fn hang_up(&self, reason: &str) -> bool {
        self.emit(RoomEvent::Disconnected {
            reason: reason.to_string(),
        })
        .await
    }

    /// Local tracks currently published into this room
    pub fn published(&self) -> Vec<TrackInfo> {
        self.inner
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

struct LoopbackRoom {
    handle: LoopbackHandle,
}

#[async_trait::async_trait]
impl MediaRoom for LoopbackRoom {
    async fn publish_track(&self, track: &TrackInfo) -> Result<()> {
        if self.handle.is_closed() {
            bail!("Room is closed");
        }

        let mut published = self
            .handle
            .inner
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if published.iter().any(|t| t.sid == track.sid) {
            bail!("Track {} is already published", track.sid);
        }
        published.push(track.clone());

        debug!("Published {} track {}", track.kind, track.sid);
        Ok(())
    }

    async fn unpublish_track(&self, sid: &str) -> Result<()> {
        self.handle
            .inner
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|t| t.sid != sid);

        debug!("Unpublished track {}", sid);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.handle.inner.closed.swap(true, Ordering::SeqCst) {
            info!("Loopback room closed (url={})", self.handle.url());
        }
        Ok(())
    }
}

/// Split a JSON-lines capture into one side-channel payload per non-empty line
pub fn script_from_jsonl(text: &str) -> Vec<Vec<u8>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.as_bytes().to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackKind;

    #[test]
    fn test_script_from_jsonl_skips_blank_lines() {
        let script = script_from_jsonl("{\"type\":\"a\"}\n\n  \n{\"type\":\"b\"}\n");
        assert_eq!(script.len(), 2);
        assert_eq!(script[1], b"{\"type\":\"b\"}".to_vec());
    }

    #[tokio::test]
    async fn test_connect_emits_connected_then_script() {
        let connector = LoopbackConnector::new()
            .with_script(vec![b"one".to_vec()])
            .hang_up_after_script();
        let (_room, mut events) = connector
            .connect("loopback://test", "tok", &RoomOptions::default())
            .await
            .unwrap();

        assert_eq!(events.recv().await, Some(RoomEvent::Connected));
        assert_eq!(
            events.recv().await,
            Some(RoomEvent::DataReceived {
                payload: b"one".to_vec(),
                participant: Some(AGENT_IDENTITY.to_string()),
            })
        );
        assert!(matches!(events.recv().await, Some(RoomEvent::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_failing_connector() {
        let connector = LoopbackConnector::new().failing("signal unreachable");
        let err = connector
            .connect("loopback://test", "tok", &RoomOptions::default())
            .await
            .err()
            .unwrap();

        assert!(err.to_string().contains("signal unreachable"));
        assert!(connector.last_room().is_none());
    }

    #[tokio::test]
    async fn test_publish_and_close() {
        let connector = LoopbackConnector::new();
        let (room, _events) = connector
            .connect("loopback://test", "tok", &RoomOptions::default())
            .await
            .unwrap();
        let handle = connector.last_room().unwrap();

        let track = TrackInfo {
            sid: "TR_1".to_string(),
            kind: TrackKind::Audio,
        };
        room.publish_track(&track).await.unwrap();
        assert_eq!(handle.published(), vec![track.clone()]);
        assert!(room.publish_track(&track).await.is_err());

        room.unpublish_track("TR_1").await.unwrap();
        assert!(handle.published().is_empty());

        room.close().await.unwrap();
        room.close().await.unwrap();
        assert!(handle.is_closed());
        assert!(room.publish_track(&track).await.is_err());
        assert!(!handle.send_data(b"late".to_vec()).await);
    }

    #[tokio::test]
    async fn test_closed_rooms_are_pruned_on_connect() {
        let connector = LoopbackConnector::new();
        for _ in 0..3 {
            let (room, _events) = connector
                .connect("loopback://test", "tok", &RoomOptions::default())
                .await
                .unwrap();
            room.close().await.unwrap();
        }
        let (_open, _events) = connector
            .connect("loopback://test", "tok", &RoomOptions::default())
            .await
            .unwrap();

        assert_eq!(connector.joined_count(), 4);
        assert_eq!(connector.rooms().len(), 1);
        assert!(!connector.last_room().unwrap().is_closed());
    }
}
