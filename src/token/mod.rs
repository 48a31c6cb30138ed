pub mod client;
pub mod messages;

pub use client::{StaticToken, TokenClient, TokenSource};
pub use messages::{Credentials, TokenRequest};
