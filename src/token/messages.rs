use serde::{Deserialize, Serialize};

/// Body of `POST /api/token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub room_name: String,
    pub participant_name: String,
}

/// Room credential returned by the token backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub url: String,
}
