//! HTTP API for driving a call from another process
//!
//! - GET /health - Health check
//! - GET /call - Current call snapshot with rendered tool cards
//! - POST /call/connect - Start a call
//! - POST /call/disconnect - End the call
//! - POST /call/mute - Toggle microphone mute
//! - POST /call/video - Toggle the camera
//! - DELETE /call/error - Dismiss the error banner

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
