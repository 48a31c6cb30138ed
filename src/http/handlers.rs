use super::state::AppState;
use crate::session::CallSnapshot;
use crate::view::ToolCard;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CallStateResponse {
    #[serde(flatten)]
    pub snapshot: CallSnapshot,

    /// Tool calls in display form
    pub tool_cards: Vec<ToolCard>,
}

impl From<CallSnapshot> for CallStateResponse {
    fn from(snapshot: CallSnapshot) -> Self {
        let tool_cards = snapshot
            .state
            .tool_calls()
            .iter()
            .map(ToolCard::from_record)
            .collect();

        Self { snapshot, tool_cards }
    }
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub muted: bool,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub video_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /call
pub async fn get_call(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.controller.snapshot().await;
    (StatusCode::OK, Json(CallStateResponse::from(snapshot)))
}

/// POST /call/connect
/// Start a call; a no-op while one is connecting or connected
pub async fn connect_call(State(state): State<AppState>) -> impl IntoResponse {
    info!("Connect requested over HTTP");

    match state.controller.connect().await {
        Ok(()) => {
            let snapshot = state.controller.snapshot().await;
            (StatusCode::OK, Json(CallStateResponse::from(snapshot))).into_response()
        }
        Err(e) => {
            error!("Connect failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /call/disconnect
pub async fn disconnect_call(State(state): State<AppState>) -> impl IntoResponse {
    info!("Disconnect requested over HTTP");

    state.controller.disconnect().await;
    let snapshot = state.controller.snapshot().await;
    (StatusCode::OK, Json(CallStateResponse::from(snapshot)))
}

/// POST /call/mute
pub async fn toggle_mute(State(state): State<AppState>) -> impl IntoResponse {
    let muted = state.controller.toggle_mute().await;
    (StatusCode::OK, Json(MuteResponse { muted }))
}

/// POST /call/video
pub async fn toggle_video(State(state): State<AppState>) -> impl IntoResponse {
    let video_enabled = state.controller.toggle_video().await;
    (StatusCode::OK, Json(VideoResponse { video_enabled }))
}

/// DELETE /call/error
pub async fn dismiss_error(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.dismiss_error().await;
    StatusCode::NO_CONTENT
}
