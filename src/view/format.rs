use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// `"14:30"` → `"2:30 PM"`. Input that is not `HH:MM` comes back unchanged.
pub fn format_time(time: &str) -> String {
    let mut parts = time.split(':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return time.to_string();
    };

    let Ok(hour) = hours.trim().parse::<u32>() else {
        return time.to_string();
    };

    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };

    format!("{}:{} {}", display_hour, minutes, suffix)
}

/// `"2024-01-02"` → `"Tuesday, January 2, 2024"`
///
/// Accepts a bare ISO date or an RFC 3339 timestamp; the calendar date is
/// rendered as written, without timezone conversion.
pub fn format_date(date: &str) -> String {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date.trim()).ok().map(|dt| dt.date_naive()));

    match parsed {
        Some(day) => day.format("%A, %B %-d, %Y").to_string(),
        None => date.to_string(),
    }
}

/// `"fetch_slots"` → `"Fetch Slots"`
pub fn display_tool_name(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn tool_icon(name: &str) -> &'static str {
    match name {
        "identify_user" => "👤",
        "fetch_slots" => "📅",
        "book_appointment" => "✅",
        "retrieve_appointments" => "🔍",
        "cancel_appointment" => "❌",
        "modify_appointment" => "✏️",
        "end_conversation" => "👋",
        _ => "⚙️",
    }
}

/// Truthiness as the agent's JSON producers use it
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
