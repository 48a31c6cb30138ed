//! Call session management
//!
//! This module provides the `CallController` abstraction that manages:
//! - Token fetch and room connection for one session at a time
//! - The room event loop (agent tracks, side-channel data, hang-up)
//! - Local microphone/camera publication through `LocalPublisher`
//! - The transcript, tool-call and summary state slices

mod config;
mod controller;
mod identity;
mod state;

pub use config::SessionConfig;
pub use controller::{CallController, CallSnapshot};
pub use identity::SessionIdentity;
pub use state::{CallState, CallSummary, ConnectionState, ToolCallRecord, TranscriptEntry};
