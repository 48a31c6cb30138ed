use async_trait::async_trait;
use tracing::{debug, info};

use super::messages::{Credentials, TokenRequest};
use crate::error::TokenError;

/// Source of room credentials
///
/// Every connect attempt asks for a fresh credential; implementations must not
/// cache or retry.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, room_name: &str, participant_name: &str) -> Result<Credentials, TokenError>;
}

/// HTTP client for the backend token endpoint
pub struct TokenClient {
    client: reqwest::Client,
    base_url: String,
}

impl TokenClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/token", self.base_url)
    }
}

#[async_trait]
impl TokenSource for TokenClient {
    async fn fetch(&self, room_name: &str, participant_name: &str) -> Result<Credentials, TokenError> {
        let endpoint = self.endpoint();
        debug!("Requesting token for {} in {} from {}", participant_name, room_name, endpoint);

        let request = TokenRequest {
            room_name: room_name.to_string(),
            participant_name: participant_name.to_string(),
        };

        let response = self.client.post(&endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let credentials: Credentials = response.json().await?;
        info!("Received room token (url={})", credentials.url);

        Ok(credentials)
    }
}

/// Pre-issued credential handed out on every fetch
pub struct StaticToken {
    credentials: Credentials,
}

impl StaticToken {
    pub fn new(token: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                token: token.into(),
                url: url.into(),
            },
        }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch(&self, room_name: &str, participant_name: &str) -> Result<Credentials, TokenError> {
        debug!("Using static token for {} in {}", participant_name, room_name);
        Ok(self.credentials.clone())
    }
}
