//! Notification payloads for coordinate reports, and the sinks that deliver
//! them.
//!
//! The payload follows the shape of a chat-webhook embed: a title, inline
//! fields, a footer and a timestamp.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::io::Write;

use crate::coords::{format_coordinate, CoordinateEntry};

/// Embed titles are cut off by the notification service beyond this
pub const MAX_TITLE_CHARS: usize = 256;
pub const NO_LABEL: &str = "*No label*";
const MISSING_VALUE: &str = "-";
const AVATAR_URL: &str = "https://mc-heads.net/avatar/";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A structured message for the notification channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub fields: Vec<Field>,
    pub footer: Footer,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn from_entry(entry: &CoordinateEntry) -> Self {
        let title = match &entry.comment {
            Some(comment) => comment.chars().take(MAX_TITLE_CHARS).collect(),
            None => NO_LABEL.to_string(),
        };

        let field = |name: &str, value: Option<f64>| Field {
            name: name.to_string(),
            value: value
                .map(format_coordinate)
                .unwrap_or_else(|| MISSING_VALUE.to_string()),
            inline: true,
        };

        Self {
            title,
            fields: vec![
                field("X", Some(entry.x)),
                field("Y", entry.y),
                field("Z", Some(entry.z)),
            ],
            footer: Footer {
                text: entry.username.clone(),
                icon_url: Some(format!("{}{}", AVATAR_URL, entry.username)),
            },
            timestamp: entry.timestamp,
        }
    }
}

/// Identifier handed out by a sink for a delivered message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(pub String);

/// Somewhere notifications can be delivered to
pub trait NotificationSink {
    fn send(&mut self, notification: &Notification) -> Result<MessageId>;

    /// Replace the content of a message sent earlier
    fn edit(&mut self, id: &MessageId, notification: &Notification) -> Result<()>;
}

/// Writes one JSON object per notification
pub struct JsonLinesSink<W: Write> {
    out: W,
    next_id: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, next_id: 1 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(
        &mut self,
        action: &str,
        id: &MessageId,
        notification: &Notification,
    ) -> Result<()> {
        let record = json!({
            "action": action,
            "id": id,
            "embed": notification,
        });
        serde_json::to_writer(&mut self.out, &record).context("Failed to encode notification")?;
        writeln!(self.out).context("Failed to write notification")?;
        self.out.flush().context("Failed to flush notification output")?;
        Ok(())
    }
}

impl<W: Write> NotificationSink for JsonLinesSink<W> {
    fn send(&mut self, notification: &Notification) -> Result<MessageId> {
        let id = MessageId(self.next_id.to_string());
        self.next_id += 1;
        self.write_record("send", &id, notification)?;
        Ok(id)
    }

    fn edit(&mut self, id: &MessageId, notification: &Notification) -> Result<()> {
        self.write_record("edit", id, notification)
    }
}

/// Human-readable, one line per notification
pub struct TextSink<W: Write> {
    out: W,
    next_id: u64,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, next_id: 1 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(notification: &Notification) -> String {
        let fields: Vec<String> = notification
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        format!(
            "[{}] {}: {} ({})",
            notification.timestamp.format("%Y-%m-%d %H:%M:%S"),
            notification.footer.text,
            fields.join(" "),
            notification.title
        )
    }
}

impl<W: Write> NotificationSink for TextSink<W> {
    fn send(&mut self, notification: &Notification) -> Result<MessageId> {
        let id = MessageId(self.next_id.to_string());
        self.next_id += 1;
        writeln!(self.out, "{}", Self::render(notification))
            .context("Failed to write notification")?;
        Ok(id)
    }

    fn edit(&mut self, id: &MessageId, notification: &Notification) -> Result<()> {
        writeln!(self.out, "(edit #{}) {}", id.0, Self::render(notification))
            .context("Failed to write notification")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(comment: Option<&str>, y: Option<f64>) -> CoordinateEntry {
        CoordinateEntry {
            x: 100.0,
            y,
            z: -200.5,
            comment: comment.map(str::to_string),
            username: "Alex".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_payload_from_entry() {
        let n = Notification::from_entry(&entry(Some("base"), Some(64.0)));
        assert_eq!(n.title, "base");
        let values: Vec<_> = n.fields.iter().map(|f| (f.name.as_str(), f.value.as_str())).collect();
        assert_eq!(values, [("X", "100"), ("Y", "64"), ("Z", "-200.5")]);
        assert!(n.fields.iter().all(|f| f.inline));
        assert_eq!(n.footer.text, "Alex");
        assert_eq!(n.footer.icon_url.as_deref(), Some("https://mc-heads.net/avatar/Alex"));
        assert_eq!(n.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_placeholders() {
        let n = Notification::from_entry(&entry(None, None));
        assert_eq!(n.title, NO_LABEL);
        assert_eq!(n.fields[1].value, "-");
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let long = "é".repeat(300);
        let n = Notification::from_entry(&entry(Some(&long), None));
        assert_eq!(n.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let n = Notification::from_entry(&entry(Some("base"), None));

        let id = sink.send(&n).unwrap();
        assert_eq!(id, MessageId("1".to_string()));
        sink.edit(&id, &n).unwrap();
        assert_eq!(sink.send(&n).unwrap(), MessageId("2".to_string()));

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["action"], "send");
        assert_eq!(records[1]["action"], "edit");
        assert_eq!(records[1]["id"], "1");
        assert_eq!(records[0]["embed"]["title"], "base");
        assert_eq!(records[0]["embed"]["fields"][2]["value"], "-200.5");
        assert_eq!(records[0]["embed"]["timestamp"], "2024-01-01T12:00:00Z");
    }

    #[test]
    fn test_text_sink() {
        let mut sink = TextSink::new(Vec::new());
        sink.send(&Notification::from_entry(&entry(Some("base"), Some(64.0))))
            .unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "[2024-01-01 12:00:00] Alex: X=100 Y=64 Z=-200.5 (base)\n");
    }
}
