//! Synthetic capture devices
//!
//! Every acquired handle counts as a live device until it is stopped or
//! dropped, so callers can check that nothing outlives a session.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::capture::{CaptureDevices, LocalCapture};
use crate::media::{TrackInfo, TrackKind, VideoResolution};

#[derive(Default)]
pub struct VirtualDevices {
    delay: Duration,
    deny_audio: AtomicBool,
    deny_video: AtomicBool,
    live: Arc<AtomicUsize>,
    acquired: AtomicUsize,
}

impl VirtualDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate slow device start-up (permission prompts, driver warm-up)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Refuse or allow acquisition of one kind, as if permission were denied
    pub fn set_denied(&self, kind: TrackKind, denied: bool) {
        match kind {
            TrackKind::Audio => self.deny_audio.store(denied, Ordering::SeqCst),
            TrackKind::Video => self.deny_video.store(denied, Ordering::SeqCst),
        }
    }

    /// Handles acquired and not yet stopped
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Handles ever acquired
    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    fn is_denied(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.deny_audio.load(Ordering::SeqCst),
            TrackKind::Video => self.deny_video.load(Ordering::SeqCst),
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevices for VirtualDevices {
    async fn acquire(&self, kind: TrackKind, resolution: VideoResolution) -> Result<Box<dyn LocalCapture>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.is_denied(kind) {
            bail!("Permission denied for {} capture", kind);
        }

        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        let info = TrackInfo {
            sid: format!("TR_{}_{}", kind, uuid::Uuid::new_v4().simple()),
            kind,
        };

        match kind {
            TrackKind::Audio => debug!("Virtual microphone #{} started ({})", n, info.sid),
            TrackKind::Video => debug!(
                "Virtual camera #{} started at {}x{} ({})",
                n, resolution.width, resolution.height, info.sid
            ),
        }

        Ok(Box::new(VirtualCapture {
            info,
            muted: false,
            live: true,
            counter: Arc::clone(&self.live),
        }))
    }
}

struct VirtualCapture {
    info: TrackInfo,
    muted: bool,
    live: bool,
    counter: Arc<AtomicUsize>,
}

impl LocalCapture for VirtualCapture {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counter.fetch_sub(1, Ordering::SeqCst);
            debug!("Virtual {} device stopped ({})", self.info.kind, self.info.sid);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for VirtualCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
