use thiserror::Error;

/// Failure to obtain a room credential from the token backend
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure of a connect attempt. Each variant leaves the controller disconnected.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("failed to connect to room: {0}")]
    Transport(String),

    #[error("connect cancelled")]
    Cancelled,
}
