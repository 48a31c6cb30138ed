use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

use super::format::{display_tool_name, format_date, format_time, is_truthy, tool_icon};
use crate::devices::PublisherStatus;
use crate::events::Role;
use crate::session::{CallSnapshot, CallSummary, ConnectionState, ToolCallRecord, TranscriptEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
    Pending,
}

impl ToolStatus {
    /// Error if an error is reported, success if `result.success` is truthy, pending otherwise
    pub fn of(record: &ToolCallRecord) -> Self {
        if record.error.as_deref().is_some_and(|e| !e.is_empty()) {
            ToolStatus::Error
        } else if record
            .result
            .as_ref()
            .and_then(|r| r.get("success"))
            .is_some_and(is_truthy)
        {
            ToolStatus::Success
        } else {
            ToolStatus::Pending
        }
    }

    fn label(self) -> &'static str {
        match self {
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
            ToolStatus::Pending => "pending",
        }
    }
}

/// Display form of one tool-call record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCard {
    pub icon: &'static str,
    pub title: String,
    pub status: ToolStatus,
    pub time: String,
    /// Pretty-printed arguments, omitted when empty
    pub arguments: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ToolCard {
    pub fn from_record(record: &ToolCallRecord) -> Self {
        Self {
            icon: tool_icon(&record.name),
            title: display_tool_name(&record.name),
            status: ToolStatus::of(record),
            time: record
                .timestamp
                .with_timezone(&Local)
                .format("%-I:%M:%S %p")
                .to_string(),
            arguments: (!is_empty_payload(&record.arguments)).then(|| pretty(&record.arguments)),
            result: record.result.as_ref().filter(|r| is_truthy(r)).map(pretty),
            error: record.error.clone().filter(|e| !e.is_empty()),
        }
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Connection screen, error banner and local control state
pub fn render_status(snapshot: &CallSnapshot) -> String {
    let state = &snapshot.state;
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "❌ {}", error);
    }

    match state.connection {
        ConnectionState::Disconnected => {
            let _ = writeln!(out, "Ready to start your conversation?");
        }
        ConnectionState::Connecting => {
            let _ = writeln!(out, "Connecting to voice agent...");
        }
        ConnectionState::Connected => {
            if let Some(identity) = &state.identity {
                let _ = writeln!(
                    out,
                    "Connected to {} as {}",
                    identity.room_name, identity.participant_name
                );
            }
            let _ = writeln!(out, "🤖 AI Assistant: {}", assistant_status(&snapshot.devices));
            let _ = writeln!(
                out,
                "Microphone: {}  Camera: {}",
                if snapshot.devices.muted { "muted" } else { "on" },
                if snapshot.devices.video_enabled { "on" } else { "off" }
            );
        }
    }

    out
}

fn assistant_status(devices: &PublisherStatus) -> &'static str {
    if devices.audio_ready {
        "Listening..."
    } else {
        "Connecting..."
    }
}

pub fn render_transcript(entries: &[TranscriptEntry], audio_ready: bool) -> String {
    let mut out = String::from("Conversation\n");

    if entries.is_empty() {
        out.push_str(if audio_ready {
            "  Start speaking to begin the conversation!\n"
        } else {
            "  Connecting to AI assistant...\n"
        });
        return out;
    }

    for entry in entries {
        let speaker = match entry.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        let _ = writeln!(out, "  {}: {}", speaker, entry.content);
    }

    out
}

pub fn render_tool_calls(records: &[ToolCallRecord]) -> String {
    let mut out = String::from("🛠️ Tool Calls\n");

    for card in records.iter().map(ToolCard::from_record) {
        let _ = writeln!(
            out,
            "  {} {} [{}] {}",
            card.icon,
            card.title,
            card.status.label(),
            card.time
        );
        if let Some(arguments) = &card.arguments {
            let _ = writeln!(out, "    Arguments:\n{}", indent(arguments, "      "));
        }
        if let Some(result) = &card.result {
            let _ = writeln!(out, "    Result:\n{}", indent(result, "      "));
        }
        if let Some(error) = &card.error {
            let _ = writeln!(out, "    Error: {}", error);
        }
    }

    out
}

pub fn render_summary(summary: &CallSummary) -> String {
    let mut out = String::from("📋 Call Summary\n");

    let _ = writeln!(out, "  Conversation Summary\n    {}", summary.summary);

    if !summary.booked_appointments.is_empty() {
        let _ = writeln!(out, "  📅 Booked Appointments");
        for apt in &summary.booked_appointments {
            let _ = writeln!(out, "    {} at {}", format_date(&apt.date), format_time(&apt.time));
            if let Some(service) = apt.service_type.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "    Service: {}", service);
            }
            let _ = writeln!(out, "    ID: #{}", apt.id);
        }
    }

    if let Some(costs) = &summary.cost_breakdown {
        let _ = writeln!(out, "  💰 Cost Breakdown");
        for item in &costs.breakdown {
            let _ = writeln!(out, "    {}  ${:.4}  {}", item.service, item.cost, item.unit);
        }
        let total = costs
            .total
            .map(|t| format!("{:.4}", t))
            .unwrap_or_else(|| "0.0000".to_string());
        let _ = writeln!(out, "    Total: ${}", total);
    }

    out
}

/// Full call view: status, transcript, tool calls (if any) and summary (if any)
pub fn render_call(snapshot: &CallSnapshot) -> String {
    let state = &snapshot.state;
    let mut sections = vec![render_status(snapshot)];

    if state.connection == ConnectionState::Connected || !state.transcripts().is_empty() {
        sections.push(render_transcript(state.transcripts(), snapshot.devices.audio_ready));
    }
    if !state.tool_calls().is_empty() {
        sections.push(render_tool_calls(state.tool_calls()));
    }
    if let Some(summary) = state.summary() {
        sections.push(render_summary(summary));
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AgentMessage, AppointmentId, BookedAppointment, CostBreakdown, CostItem};
    use crate::session::CallState;
    use chrono::Utc;
    use serde_json::json;

    fn record(result: Option<Value>, error: Option<&str>) -> ToolCallRecord {
        ToolCallRecord {
            name: "fetch_slots".to_string(),
            arguments: json!({"date": "2024-01-01"}),
            result,
            error: error.map(str::to_string),
            extra: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_status_pending_without_result() {
        assert_eq!(ToolStatus::of(&record(None, None)), ToolStatus::Pending);
    }

    #[test]
    fn test_status_success_flag() {
        assert_eq!(ToolStatus::of(&record(Some(json!({"success": true})), None)), ToolStatus::Success);
        assert_eq!(ToolStatus::of(&record(Some(json!({"success": false})), None)), ToolStatus::Pending);
        assert_eq!(ToolStatus::of(&record(Some(json!({"slots": []})), None)), ToolStatus::Pending);
    }

    #[test]
    fn test_status_error_wins() {
        let r = record(Some(json!({"success": true})), Some("slot taken"));
        assert_eq!(ToolStatus::of(&r), ToolStatus::Error);
        assert_eq!(ToolStatus::of(&record(None, Some(""))), ToolStatus::Pending);
    }

    #[test]
    fn test_card_omits_empty_arguments() {
        let mut r = record(None, None);
        r.arguments = json!({});
        let card = ToolCard::from_record(&r);

        assert!(card.arguments.is_none());
        assert!(card.result.is_none());
        assert_eq!(card.title, "Fetch Slots");
        assert_eq!(card.icon, "📅");
    }

    #[test]
    fn test_card_pretty_prints_arguments() {
        let card = ToolCard::from_record(&record(None, None));
        assert_eq!(card.arguments.as_deref(), Some("{\n  \"date\": \"2024-01-01\"\n}"));
    }

    #[test]
    fn test_transcript_hint_depends_on_microphone() {
        assert!(render_transcript(&[], true).contains("Start speaking"));
        assert!(render_transcript(&[], false).contains("Connecting to AI assistant"));
    }

    #[test]
    fn test_transcript_labels_roles() {
        let mut state = CallState::default();
        state.apply(AgentMessage::Transcript {
            role: Role::User,
            content: "Hello".to_string(),
        });
        state.apply(AgentMessage::Transcript {
            role: Role::Assistant,
            content: "Hi, how can I help?".to_string(),
        });

        let text = render_transcript(state.transcripts(), true);
        assert!(text.contains("You: Hello"));
        assert!(text.contains("Assistant: Hi, how can I help?"));
    }

    #[test]
    fn test_summary_appointment_card() {
        let summary = CallSummary {
            summary: "Booked one appointment.".to_string(),
            booked_appointments: vec![BookedAppointment {
                date: "2024-01-02".to_string(),
                time: "14:30".to_string(),
                service_type: Some("Consult".to_string()),
                id: AppointmentId::Number(7.into()),
            }],
            tool_calls: vec![],
            cost_breakdown: None,
        };

        let text = render_summary(&summary);
        assert!(text.contains("Booked one appointment."));
        assert!(text.contains("Tuesday, January 2, 2024 at 2:30 PM"));
        assert!(text.contains("Service: Consult"));
        assert!(text.contains("ID: #7"));
        assert!(!text.contains("Cost Breakdown"));
    }

    #[test]
    fn test_summary_cost_breakdown() {
        let summary = CallSummary {
            summary: "Done.".to_string(),
            booked_appointments: vec![],
            tool_calls: vec![],
            cost_breakdown: Some(CostBreakdown {
                breakdown: vec![CostItem {
                    service: "STT".to_string(),
                    cost: 0.0012,
                    unit: "per minute".to_string(),
                }],
                total: None,
            }),
        };

        let text = render_summary(&summary);
        assert!(text.contains("STT  $0.0012  per minute"));
        assert!(text.contains("Total: $0.0000"));
        assert!(!text.contains("Booked Appointments"));
    }

    #[test]
    fn test_status_screens() {
        let mut snapshot = CallSnapshot {
            state: CallState::default(),
            devices: PublisherStatus::default(),
            stage: vec![],
        };
        assert!(render_status(&snapshot).contains("Ready to start"));

        snapshot.state.connection = ConnectionState::Connecting;
        assert!(render_status(&snapshot).contains("Connecting to voice agent"));

        snapshot.state.connection = ConnectionState::Disconnected;
        snapshot.state.error = Some("token endpoint returned 401: denied".to_string());
        assert!(render_status(&snapshot).starts_with("❌ token endpoint returned 401"));
    }
}
