use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::identity::SessionIdentity;
use crate::events::{AgentMessage, BookedAppointment, CostBreakdown, Role, ToolCallPayload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// A single transcript line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    /// When this line was received
    pub timestamp: DateTime<Utc>,
}

/// A tool invocation as reported by the agent
///
/// Records are never updated; a completed call arrives as a new record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Value,
    pub result: Option<Value>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl ToolCallRecord {
    pub fn from_payload(payload: ToolCallPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: payload.name,
            arguments: payload.arguments,
            result: payload.result,
            error: payload.error,
            extra: payload.extra,
            timestamp,
        }
    }
}

/// End-of-call summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub summary: String,
    pub booked_appointments: Vec<BookedAppointment>,
    pub tool_calls: Vec<Value>,
    pub cost_breakdown: Option<CostBreakdown>,
}

/// Everything the views render for one call
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallState {
    pub connection: ConnectionState,
    pub identity: Option<SessionIdentity>,
    /// Dismissible banner for the last failed connect
    pub error: Option<String>,
    transcripts: Vec<TranscriptEntry>,
    tool_calls: Vec<ToolCallRecord>,
    summary: Option<CallSummary>,
}

impl CallState {
    pub fn transcripts(&self) -> &[TranscriptEntry] {
        &self.transcripts
    }

    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        &self.tool_calls
    }

    pub fn summary(&self) -> Option<&CallSummary> {
        self.summary.as_ref()
    }

    /// Apply one decoded agent message. Returns whether state changed.
    pub fn apply(&mut self, message: AgentMessage) -> bool {
        self.apply_at(message, Utc::now())
    }

    pub fn apply_at(&mut self, message: AgentMessage, now: DateTime<Utc>) -> bool {
        match message {
            AgentMessage::Transcript { role, content } => {
                self.transcripts.push(TranscriptEntry {
                    role,
                    content,
                    timestamp: now,
                });
            }
            AgentMessage::ToolCall { tool_call } => {
                self.tool_calls.push(ToolCallRecord::from_payload(tool_call, now));
            }
            AgentMessage::Summary {
                summary,
                booked_appointments,
                tool_calls,
                cost_breakdown,
            } => {
                self.summary = Some(CallSummary {
                    summary,
                    booked_appointments,
                    tool_calls,
                    cost_breakdown,
                });
            }
            AgentMessage::Unknown => return false,
        }

        true
    }

    /// Drop transcripts, tool calls and summary
    pub fn clear_conversation(&mut self) {
        self.transcripts.clear();
        self.tool_calls.clear();
        self.summary = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript(content: &str) -> AgentMessage {
        AgentMessage::Transcript {
            role: Role::User,
            content: content.to_string(),
        }
    }

    fn summary(text: &str) -> AgentMessage {
        AgentMessage::Summary {
            summary: text.to_string(),
            booked_appointments: vec![],
            tool_calls: vec![],
            cost_breakdown: None,
        }
    }

    #[test]
    fn test_transcripts_append_in_order() {
        let mut state = CallState::default();
        for line in ["one", "two", "three"] {
            assert!(state.apply(transcript(line)));
        }

        let contents: Vec<_> = state.transcripts().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_existing_entries_unchanged_by_later_messages() {
        let mut state = CallState::default();
        state.apply(transcript("first"));
        let before = state.transcripts()[0].clone();

        state.apply(transcript("second"));
        state.apply(summary("done"));

        assert_eq!(state.transcripts()[0], before);
    }

    #[test]
    fn test_last_summary_wins() {
        let mut state = CallState::default();
        state.apply(summary("first"));
        state.apply(transcript("between"));
        state.apply(summary("second"));

        assert_eq!(state.summary().unwrap().summary, "second");
    }

    #[test]
    fn test_tool_call_is_stamped() {
        let mut state = CallState::default();
        let now = Utc::now();
        state.apply_at(
            AgentMessage::ToolCall {
                tool_call: ToolCallPayload {
                    name: "book_appointment".to_string(),
                    arguments: json!({"slot": 3}),
                    result: Some(json!({"success": true})),
                    error: None,
                    extra: Map::new(),
                },
            },
            now,
        );

        let record = &state.tool_calls()[0];
        assert_eq!(record.name, "book_appointment");
        assert_eq!(record.timestamp, now);
        assert_eq!(record.result, Some(json!({"success": true})));
    }

    #[test]
    fn test_unknown_is_ignored() {
        let mut state = CallState::default();
        assert!(!state.apply(AgentMessage::Unknown));
        assert!(state.transcripts().is_empty());
    }

    #[test]
    fn test_clear_conversation_keeps_connection_fields() {
        let mut state = CallState {
            connection: ConnectionState::Connected,
            ..Default::default()
        };
        state.apply(transcript("hello"));
        state.apply(summary("bye"));

        state.clear_conversation();

        assert!(state.transcripts().is_empty());
        assert!(state.tool_calls().is_empty());
        assert!(state.summary().is_none());
        assert_eq!(state.connection, ConnectionState::Connected);
    }
}
