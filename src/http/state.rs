use crate::session::CallController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<CallController>,
}

impl AppState {
    pub fn new(controller: Arc<CallController>) -> Self {
        Self { controller }
    }
}
