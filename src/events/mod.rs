//! Inbound side-channel messages from the agent
//!
//! Payloads arrive as UTF-8 JSON with a `type` discriminator and decode into
//! [`AgentMessage`]. Decoding is stateless; routing into the call state lives
//! in [`handle_payload`].

pub mod decoder;
pub mod messages;

pub use decoder::{decode, handle_payload, DecodeError};
pub use messages::{
    AgentMessage, AppointmentId, BookedAppointment, CostBreakdown, CostItem, Role, ToolCallPayload,
};
