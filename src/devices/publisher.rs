use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::capture::{CaptureDevices, LocalCapture};
use crate::media::{MediaRoom, Region, SinkElement, Stage, TrackKind, VideoResolution};

/// Local control state exposed to views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublisherStatus {
    /// Microphone track is published
    pub audio_ready: bool,
    pub muted: bool,
    pub video_enabled: bool,
}

#[derive(Default)]
struct Tracks {
    audio: Option<Box<dyn LocalCapture>>,
    video: Option<Box<dyn LocalCapture>>,
}

/// Owns the local microphone track and the optional camera track of one session
///
/// Every async acquisition re-checks the liveness token before its result is
/// applied; a capture that completes after `detach` is stopped and discarded.
pub struct LocalPublisher {
    room: Arc<dyn MediaRoom>,
    devices: Arc<dyn CaptureDevices>,
    stage: Arc<Mutex<Stage>>,
    resolution: VideoResolution,
    liveness: CancellationToken,
    tracks: Mutex<Tracks>,
}

impl LocalPublisher {
    pub fn new(
        room: Arc<dyn MediaRoom>,
        devices: Arc<dyn CaptureDevices>,
        stage: Arc<Mutex<Stage>>,
        resolution: VideoResolution,
        liveness: CancellationToken,
    ) -> Self {
        Self {
            room,
            devices,
            stage,
            resolution,
            liveness,
            tracks: Mutex::new(Tracks::default()),
        }
    }

    /// Acquire and publish the microphone
    ///
    /// Returns `Ok(false)` when nothing was published because a track is
    /// already held or the publisher was detached meanwhile.
    pub async fn attach(&self) -> Result<bool> {
        if self.liveness.is_cancelled() || self.tracks.lock().await.audio.is_some() {
            return Ok(false);
        }

        let mut capture = self
            .devices
            .acquire(TrackKind::Audio, self.resolution)
            .await
            .context("Failed to acquire microphone")?;

        let mut tracks = self.tracks.lock().await;
        if self.liveness.is_cancelled() || tracks.audio.is_some() {
            debug!("Discarding microphone {} acquired after detach", capture.info().sid);
            capture.stop();
            return Ok(false);
        }

        if let Err(e) = self.room.publish_track(capture.info()).await {
            capture.stop();
            return Err(e.context("Failed to publish microphone track"));
        }

        info!("Audio track published ({})", capture.info().sid);
        tracks.audio = Some(capture);

        Ok(true)
    }

    /// Flip mute on the microphone. Returns the resulting mute state.
    pub async fn toggle_mute(&self) -> bool {
        let mut tracks = self.tracks.lock().await;

        match tracks.audio.as_mut() {
            Some(audio) => {
                let muted = !audio.is_muted();
                audio.set_muted(muted);
                info!("Microphone {}", if muted { "muted" } else { "unmuted" });
                muted
            }
            None => {
                debug!("No microphone track held, ignoring mute toggle");
                false
            }
        }
    }

    /// Turn the camera on or off. Returns whether video is enabled afterwards.
    ///
    /// Failures are logged and leave video disabled with no live capture.
    pub async fn toggle_video(&self) -> bool {
        let mut tracks = self.tracks.lock().await;

        if let Some(mut video) = tracks.video.take() {
            video.stop();
            self.stage.lock().await.clear_region(Region::LocalPreview);
            if let Err(e) = self.room.unpublish_track(&video.info().sid).await {
                warn!("Failed to unpublish camera track: {:#}", e);
            }
            info!("Video disabled");
            return false;
        }

        if self.liveness.is_cancelled() {
            return false;
        }

        let mut capture = match self.devices.acquire(TrackKind::Video, self.resolution).await {
            Ok(capture) => capture,
            Err(e) => {
                warn!("Failed to enable video: {:#}", e);
                return false;
            }
        };

        if self.liveness.is_cancelled() {
            capture.stop();
            return false;
        }

        if let Err(e) = self.room.publish_track(capture.info()).await {
            warn!("Failed to publish camera track: {:#}", e);
            capture.stop();
            return false;
        }

        self.stage
            .lock()
            .await
            .replace_region(Region::LocalPreview, SinkElement::local_preview(capture.info()));

        info!("Video enabled ({})", capture.info().sid);
        tracks.video = Some(capture);

        true
    }

    /// Stop and unpublish both tracks
    pub async fn detach(&self) {
        self.liveness.cancel();

        let mut tracks = self.tracks.lock().await;
        let held = [tracks.audio.take(), tracks.video.take()];

        for mut capture in held.into_iter().flatten() {
            capture.stop();
            if let Err(e) = self.room.unpublish_track(&capture.info().sid).await {
                warn!("Failed to unpublish {} track: {:#}", capture.info().kind, e);
            }
            debug!("Released {} track {}", capture.info().kind, capture.info().sid);
        }

        self.stage.lock().await.clear_region(Region::LocalPreview);
    }

    /// Stop capture without awaiting; used where no async teardown is possible
    ///
    /// Returns the sids of the released tracks, which are still published.
    pub fn release_now(&self) -> Vec<String> {
        self.liveness.cancel();

        let Ok(mut tracks) = self.tracks.try_lock() else {
            return Vec::new();
        };

        let held = [tracks.audio.take(), tracks.video.take()];
        held.into_iter()
            .flatten()
            .map(|mut capture| {
                capture.stop();
                capture.info().sid.clone()
            })
            .collect()
    }

    pub async fn status(&self) -> PublisherStatus {
        let tracks = self.tracks.lock().await;

        PublisherStatus {
            audio_ready: tracks.audio.is_some(),
            muted: tracks.audio.as_ref().is_some_and(|a| a.is_muted()),
            video_enabled: tracks.video.is_some(),
        }
    }
}

impl Drop for LocalPublisher {
    fn drop(&mut self) {
        let tracks = self.tracks.get_mut();
        for capture in [tracks.audio.as_mut(), tracks.video.as_mut()].into_iter().flatten() {
            capture.stop();
        }
    }
}
