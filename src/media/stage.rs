//! Rendering stage for attached tracks
//!
//! Remote agent audio goes to hidden sinks keyed by participant identity,
//! remote video into the avatar region, and the local camera into the
//! preview region. Detaching a track removes every element created for it.

use serde::Serialize;
use tracing::debug;

use super::room::{TrackInfo, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Hidden autoplay sinks for remote audio
    AgentAudio,
    /// Remote video display
    Avatar,
    /// Local camera preview
    LocalPreview,
}

/// A rendering element a track is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkElement {
    pub id: String,
    pub track_sid: String,
    pub kind: TrackKind,
    pub region: Region,
    pub hidden: bool,
}

impl SinkElement {
    pub fn local_preview(track: &TrackInfo) -> Self {
        Self {
            id: format!("local-{}", track.sid),
            track_sid: track.sid.clone(),
            kind: track.kind,
            region: Region::LocalPreview,
            hidden: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Stage {
    elements: Vec<SinkElement>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a remote track: audio into a hidden sink, video into the avatar region
    pub fn attach_remote(&mut self, participant: &str, track: &TrackInfo) -> &SinkElement {
        let element = match track.kind {
            TrackKind::Audio => SinkElement {
                id: format!("audio-{}", participant),
                track_sid: track.sid.clone(),
                kind: TrackKind::Audio,
                region: Region::AgentAudio,
                hidden: true,
            },
            TrackKind::Video => SinkElement {
                id: format!("video-{}", track.sid),
                track_sid: track.sid.clone(),
                kind: TrackKind::Video,
                region: Region::Avatar,
                hidden: false,
            },
        };

        debug!("Attached {} track {} as {}", track.kind, track.sid, element.id);
        self.elements.push(element);
        &self.elements[self.elements.len() - 1]
    }

    /// Remove and return every element attached for a track
    pub fn detach_track(&mut self, sid: &str) -> Vec<SinkElement> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.elements.drain(..).partition(|el| el.track_sid == sid);
        self.elements = kept;
        removed
    }

    /// Replace whatever a region currently shows with a single element
    pub fn replace_region(&mut self, region: Region, element: SinkElement) {
        self.clear_region(region);
        self.elements.push(element);
    }

    pub fn clear_region(&mut self, region: Region) -> usize {
        let before = self.elements.len();
        self.elements.retain(|el| el.region != region);
        before - self.elements.len()
    }

    pub fn in_region(&self, region: Region) -> impl Iterator<Item = &SinkElement> {
        self.elements.iter().filter(move |el| el.region == region)
    }

    pub fn elements(&self) -> &[SinkElement] {
        &self.elements
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(sid: &str, kind: TrackKind) -> TrackInfo {
        TrackInfo {
            sid: sid.to_string(),
            kind,
        }
    }

    #[test]
    fn test_remote_audio_is_hidden_and_keyed_by_participant() {
        let mut stage = Stage::new();
        let el = stage.attach_remote("agent-1", &track("TR_a1", TrackKind::Audio)).clone();

        assert_eq!(el.id, "audio-agent-1");
        assert_eq!(el.region, Region::AgentAudio);
        assert!(el.hidden);
    }

    #[test]
    fn test_remote_video_goes_to_avatar() {
        let mut stage = Stage::new();
        stage.attach_remote("agent-1", &track("TR_v1", TrackKind::Video));

        assert_eq!(stage.in_region(Region::Avatar).count(), 1);
        assert_eq!(stage.in_region(Region::AgentAudio).count(), 0);
    }

    #[test]
    fn test_detach_removes_only_that_track() {
        let mut stage = Stage::new();
        stage.attach_remote("agent-1", &track("TR_a1", TrackKind::Audio));
        stage.attach_remote("agent-1", &track("TR_v1", TrackKind::Video));

        let removed = stage.detach_track("TR_a1");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "audio-agent-1");
        assert_eq!(stage.elements().len(), 1);
        assert_eq!(stage.elements()[0].track_sid, "TR_v1");
    }

    #[test]
    fn test_detach_unknown_track_is_noop() {
        let mut stage = Stage::new();
        stage.attach_remote("agent-1", &track("TR_a1", TrackKind::Audio));

        assert!(stage.detach_track("TR_missing").is_empty());
        assert_eq!(stage.elements().len(), 1);
    }

    #[test]
    fn test_replace_region_drops_prior_preview() {
        let mut stage = Stage::new();
        stage.replace_region(
            Region::LocalPreview,
            SinkElement::local_preview(&track("TR_cam1", TrackKind::Video)),
        );
        stage.replace_region(
            Region::LocalPreview,
            SinkElement::local_preview(&track("TR_cam2", TrackKind::Video)),
        );

        let previews: Vec<_> = stage.in_region(Region::LocalPreview).collect();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].track_sid, "TR_cam2");
    }
}
