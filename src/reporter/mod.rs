mod console;
mod export;
mod stats;

pub use console::{ConsoleReporter, MAX_EVENT_ROWS};
pub use export::{JsonExporter, SavedQuery};
pub use stats::{GroupRow, GroupTable, MAX_GROUP_ROWS, global_timeseries};

use chrono::{DateTime, Utc};
use serde_json::Value;

pub const DEFAULT_MAX_CHARS: usize = 500;

/// Millisecond epoch timestamps as `YYYY-MM-DD HH:MM:SS` (UTC). Anything
/// else is shown as-is.
pub fn format_timestamp(timestamp: Option<&Value>) -> String {
    let Some(ts) = timestamp.filter(|v| !v.is_null()) else {
        return String::new();
    };
    ts.as_i64()
        .or_else(|| ts.as_f64().map(|f| f as i64))
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| match ts {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// The `message` of every event, decoded when it holds JSON text.
pub fn event_messages(events: &[Value]) -> Vec<Value> {
    events
        .iter()
        .map(|event| match event.get("message") {
            Some(Value::String(text)) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            Some(other) => other.clone(),
            None => Value::String(String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_timestamp_millis() {
        assert_eq!(
            format_timestamp(Some(&json!(1_700_000_000_000i64))),
            "2023-11-14 22:13:20"
        );
        assert_eq!(format_timestamp(None), "");
        assert_eq!(format_timestamp(Some(&Value::Null)), "");
        assert_eq!(format_timestamp(Some(&json!("yesterday"))), "yesterday");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 5), "héllo");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_event_messages_decode_json_text() {
        let events = vec![
            json!({"message": "{\"user\": \"bob\"}"}),
            json!({"message": "plain text"}),
            json!({"timestamp": 1}),
        ];
        assert_eq!(
            event_messages(&events),
            vec![json!({"user": "bob"}), json!("plain text"), json!("")]
        );
    }
}
