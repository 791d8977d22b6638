//! Recognizing player chat lines in server logs.
//!
//! A chat line looks like `[12:34:56] [Server thread/INFO]: <Steve> hello`.
//! The thread tag differs between server implementations (Paper writes
//! `[Async Chat Thread - #0/INFO]`), so only its `INFO` tail is required.

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

const CHAT_LINE_PATTERN: &str =
    r"^\[(?P<time>\d{2}:\d{2}:\d{2})\] \[[^\]]*INFO\]: <(?P<username>[^>]+)> (?P<content>.+)$";

static CHAT_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(CHAT_LINE_PATTERN).expect("failed to compile chat line regex"));

/// A single player chat message taken from one log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub time: NaiveTime,
    pub username: String,
    pub content: String,
}

/// Parse a raw log line into a chat message, or `None` for anything else
/// (startup noise, warnings, joins, commands).
pub fn extract_chat_message(line: &str) -> Option<ChatMessage> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = CHAT_LINE_REGEX.captures(line)?;

    let time = NaiveTime::parse_from_str(&caps["time"], "%H:%M:%S").ok()?;

    Some(ChatMessage {
        time,
        username: caps["username"].to_string(),
        content: caps["content"].to_string(),
    })
}
