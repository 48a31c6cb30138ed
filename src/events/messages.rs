use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Speaker of a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation reported by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fields the agent sends beyond the ones above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Appointment identifiers come from the booking backend as either numbers or strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppointmentId {
    Number(Number),
    Text(String),
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentId::Number(n) => write!(f, "{}", n),
            AppointmentId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedAppointment {
    /// ISO date, e.g. `2024-01-02`
    pub date: String,
    /// Time of day as `HH:MM`
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub id: AppointmentId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub service: String,
    pub cost: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub breakdown: Vec<CostItem>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Side-channel message schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum AgentMessage {
    #[serde(rename = "transcript")]
    Transcript { role: Role, content: String },

    #[serde(rename = "toolCall", rename_all = "camelCase")]
    ToolCall { tool_call: ToolCallPayload },

    #[serde(rename = "summary", rename_all = "camelCase")]
    Summary {
        summary: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        booked_appointments: Vec<BookedAppointment>,
        /// Passed through as sent; entries have no fixed shape
        #[serde(default, deserialize_with = "null_as_empty")]
        tool_calls: Vec<Value>,
        #[serde(default)]
        cost_breakdown: Option<CostBreakdown>,
    },

    /// Any `type` this client does not know
    #[serde(other)]
    Unknown,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
