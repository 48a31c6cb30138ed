use crate::media::RoomOptions;

/// Configuration for call sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Options every room is joined with (adaptive stream, dynacast, 640x480 capture)
    pub room: RoomOptions,
}
