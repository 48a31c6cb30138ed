use anyhow::Result;
use serde::Deserialize;

use crate::media::{RoomOptions, VideoResolution};
use crate::session::SessionConfig;

/// Token backend used when neither the config file nor `API_BASE_URL` set one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// Config file looked up (without extension) when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/voice-call";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub room: RoomConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    pub adaptive_stream: bool,
    pub dynacast: bool,
    pub capture_width: u32,
    pub capture_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from defaults, an optional file, `VOICE_CALL__*`
    /// variables and finally `API_BASE_URL`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::from_sources(path, std::env::var("API_BASE_URL").ok())
    }

    pub fn from_sources(path: Option<&str>, api_base_url: Option<String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api.base_url", DEFAULT_API_BASE_URL)?
            .set_default("room.adaptive_stream", true)?
            .set_default("room.dynacast", true)?
            .set_default("room.capture_width", 640_i64)?
            .set_default("room.capture_height", 480_i64)?
            .set_default("http.bind", "127.0.0.1")?
            .set_default("http.port", 3002_i64)?;

        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_PATH).required(false)),
        };

        builder = builder.add_source(config::Environment::with_prefix("VOICE_CALL").separator("__"));

        if let Some(url) = api_base_url.filter(|url| !url.is_empty()) {
            builder = builder.set_override("api.base_url", url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            room: RoomOptions {
                adaptive_stream: self.room.adaptive_stream,
                dynacast: self.room.dynacast,
                capture_resolution: VideoResolution {
                    width: self.room.capture_width,
                    height: self.room.capture_height,
                },
            },
        }
    }
}
