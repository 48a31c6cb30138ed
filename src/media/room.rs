use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Media track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

/// Identity of a track inside a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub sid: String,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoResolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Options applied when joining a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOptions {
    /// Let the transport pause or downscale remote video nobody is watching
    pub adaptive_stream: bool,
    /// Only publish simulcast layers a subscriber actually consumes
    pub dynacast: bool,
    /// Resolution requested from the camera
    pub capture_resolution: VideoResolution,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            adaptive_stream: true,
            dynacast: true,
            capture_resolution: VideoResolution::default(),
        }
    }
}

/// Room-level events consumed by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Connected,
    Disconnected {
        reason: String,
    },
    TrackSubscribed {
        track: TrackInfo,
        participant: String,
    },
    TrackUnsubscribed {
        track: TrackInfo,
        participant: String,
    },
    /// Opaque side-channel message from a remote participant
    DataReceived {
        payload: Vec<u8>,
        participant: Option<String>,
    },
}

/// A joined media room
#[async_trait::async_trait]
pub trait MediaRoom: Send + Sync {
    /// Publish a local capture track
    async fn publish_track(&self, track: &TrackInfo) -> Result<()>;

    /// Stop publishing a local track
    async fn unpublish_track(&self, sid: &str) -> Result<()>;

    /// Leave the room. Must be safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Transport entry point
///
/// Returns the joined room and the receiver its events are delivered on, in
/// arrival order.
#[async_trait::async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        token: &str,
        options: &RoomOptions,
    ) -> Result<(Arc<dyn MediaRoom>, mpsc::Receiver<RoomEvent>)>;
}
