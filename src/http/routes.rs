use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/call", get(handlers::get_call))
        // Session control
        .route("/call/connect", post(handlers::connect_call))
        .route("/call/disconnect", post(handlers::disconnect_call))
        // Local devices
        .route("/call/mute", post(handlers::toggle_mute))
        .route("/call/video", post(handlers::toggle_video))
        .route("/call/error", delete(handlers::dismiss_error))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
