use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::messages::AgentMessage;
use crate::session::CallState;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not a valid agent message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one side-channel payload
pub fn decode(payload: &[u8]) -> Result<AgentMessage, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    let value: Value = serde_json::from_str(text)?;
    let message = AgentMessage::deserialize(&value)?;

    if message == AgentMessage::Unknown {
        let kind = value.get("type").unwrap_or(&Value::Null);
        debug!("Unknown agent message type: {}", kind);
    }

    Ok(message)
}

/// Decode a payload and apply it to the call state
///
/// Malformed payloads are logged and dropped. Returns whether state changed.
pub fn handle_payload(payload: &[u8], state: &mut CallState) -> bool {
    match decode(payload) {
        Ok(message) => state.apply(message),
        Err(e) => {
            warn!("Dropping side-channel message ({} bytes): {}", payload.len(), e);
            false
        }
    }
}
