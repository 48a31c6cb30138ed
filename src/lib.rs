pub mod config;
pub mod devices;
pub mod error;
pub mod events;
pub mod http;
pub mod media;
pub mod session;
pub mod token;
pub mod view;

pub use config::Config;
pub use devices::{CaptureDevices, LocalCapture, LocalPublisher, PublisherStatus, VirtualDevices};
pub use error::{CallError, TokenError};
pub use events::{decode, AgentMessage, DecodeError};
pub use http::{create_router, AppState};
pub use media::{LoopbackConnector, MediaRoom, RoomConnector, RoomEvent, RoomOptions, Stage};
pub use session::{CallController, CallSnapshot, CallState, ConnectionState, SessionConfig};
pub use token::{Credentials, StaticToken, TokenClient, TokenSource};
