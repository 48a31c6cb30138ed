//! Media room abstraction
//!
//! The real-time transport is supplied through [`RoomConnector`]; this crate
//! only consumes the room's event surface and publishes local tracks into it.
//! [`Stage`] tracks the sink elements remote and local tracks are attached to.

pub mod loopback;
mod room;
mod stage;

pub use loopback::{LoopbackConnector, LoopbackHandle};
pub use room::{
    MediaRoom, RoomConnector, RoomEvent, RoomOptions, TrackInfo, TrackKind, VideoResolution,
};
pub use stage::{Region, SinkElement, Stage};
