use anyhow::Result;

use crate::media::{TrackInfo, TrackKind, VideoResolution};

/// A live local capture handle (microphone or camera)
///
/// Dropping a handle must release the device; `stop` releases it early.
pub trait LocalCapture: Send + Sync {
    fn info(&self) -> &TrackInfo;

    fn set_muted(&mut self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Stop capturing and release the underlying device
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Capture device backend
///
/// Platform implementations wrap the OS capture APIs; `VirtualDevices`
/// produces synthetic tracks.
#[async_trait::async_trait]
pub trait CaptureDevices: Send + Sync {
    /// Acquire a capture track. `resolution` only applies to video.
    async fn acquire(&self, kind: TrackKind, resolution: VideoResolution) -> Result<Box<dyn LocalCapture>>;
}
