//! Coordinate extraction from chat text.
//!
//! Best-effort by nature: the first run of two or three numbers separated by
//! commas, semicolons or spaces is taken as a position. Two numbers mean
//! `x z`, three mean `x y z`. Text on one side of the numbers becomes the
//! label; whatever sits on the other side is dropped.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::message::ChatMessage;

const NUMBER: &str = r"[-+]?[0-9]+(?:\.[0-9]+)?";

static COORDINATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?P<first>{n})[,; ]+(?P<second>{n})(?:[,; ]+(?P<third>{n}))?",
        n = NUMBER
    );
    Regex::new(&pattern).expect("failed to compile coordinate regex")
});

/// A position found in a chat message, before it is attributed to anyone
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatePosition {
    pub x: f64,
    pub y: Option<f64>,
    pub z: f64,
    pub comment: Option<String>,
}

/// A position reported by a player at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateEntry {
    pub x: f64,
    pub y: Option<f64>,
    pub z: f64,
    pub comment: Option<String>,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

impl CoordinateEntry {
    /// Attribute a position to the player who sent it. `log_date` is the
    /// calendar day of the log the message came from.
    pub fn new(position: CoordinatePosition, message: &ChatMessage, log_date: NaiveDate) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            comment: position.comment,
            username: message.username.clone(),
            timestamp: log_date.and_time(message.time).and_utc(),
        }
    }

    /// Run a chat message through the coordinate extractor
    pub fn from_message(message: &ChatMessage, log_date: NaiveDate) -> Option<Self> {
        extract_coordinates(&message.content).map(|pos| Self::new(pos, message, log_date))
    }
}

impl fmt::Display for CoordinateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.username,
            format_coordinate(self.x),
            self.y.map(format_coordinate).unwrap_or_else(|| "-".to_string()),
            format_coordinate(self.z),
        )?;
        if let Some(comment) = &self.comment {
            write!(f, " ({})", comment)?;
        }
        Ok(())
    }
}

/// Render a coordinate without a trailing `.0` when it is integral
pub fn format_coordinate(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// Digit runs too long for an f64 overflow to infinity
fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Look for the first coordinate pair or triple in `text`
pub fn extract_coordinates(text: &str) -> Option<CoordinatePosition> {
    let caps = COORDINATE_REGEX.captures(text)?;
    let whole = caps.get(0)?;

    let first = parse_number(&caps["first"])?;
    let second = parse_number(&caps["second"])?;
    let third = match caps.name("third") {
        Some(m) => Some(parse_number(m.as_str())?),
        None => None,
    };

    let (x, y, z) = match third {
        Some(third) => (first, Some(second), third),
        None => (first, None, second),
    };

    let comment = if whole.start() == 0 {
        &text[whole.end()..]
    } else {
        &text[..whole.start()]
    };
    let comment = comment.trim();

    Some(CoordinatePosition {
        x,
        y,
        z,
        comment: (!comment.is_empty()).then(|| comment.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use proptest::prelude::*;

    fn pos(x: f64, y: Option<f64>, z: f64, comment: Option<&str>) -> CoordinatePosition {
        CoordinatePosition {
            x,
            y,
            z,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn test_triple_with_trailing_label() {
        assert_eq!(
            extract_coordinates("100, 64, -200 base"),
            Some(pos(100.0, Some(64.0), -200.0, Some("base")))
        );
    }

    #[test]
    fn test_pair_with_leading_label() {
        assert_eq!(
            extract_coordinates("home -50 120"),
            Some(pos(-50.0, None, 120.0, Some("home")))
        );
    }

    #[test]
    fn test_label_after_is_dropped_when_label_before_exists() {
        assert_eq!(
            extract_coordinates("village 10;70;-3 near the river"),
            Some(pos(10.0, Some(70.0), -3.0, Some("village")))
        );
    }

    #[test]
    fn test_no_label() {
        assert_eq!(extract_coordinates("12,5,-8"), Some(pos(12.0, Some(5.0), -8.0, None)));
        assert_eq!(extract_coordinates("  12 -8  "), Some(pos(12.0, None, -8.0, None)));
    }

    #[test]
    fn test_fractional_coordinates() {
        assert_eq!(
            extract_coordinates("portal 12.5 64 -3.25"),
            Some(pos(12.5, Some(64.0), -3.25, Some("portal")))
        );
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(
            extract_coordinates("1 ,; 2;, 3"),
            Some(pos(1.0, Some(2.0), 3.0, None))
        );
    }

    #[test]
    fn test_only_first_match_counts() {
        assert_eq!(
            extract_coordinates("a 1 2 3 b 4 5 6"),
            Some(pos(1.0, Some(2.0), 3.0, Some("a")))
        );
    }

    #[test]
    fn test_single_number_is_not_a_coordinate() {
        assert!(extract_coordinates("I found 3 diamonds").is_none());
        assert!(extract_coordinates("gg").is_none());
        assert!(extract_coordinates("").is_none());
    }

    #[test]
    fn test_overflowing_numbers_are_rejected() {
        let huge = "9".repeat(400);
        assert!(extract_coordinates(&format!("{} 1 2", huge)).is_none());
    }

    #[test]
    fn test_entry_combines_log_date_with_message_time() {
        let message = ChatMessage {
            time: NaiveTime::from_hms_opt(13, 37, 0).unwrap(),
            username: "Steve".to_string(),
            content: "12,5,-8 spawn".to_string(),
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entry = CoordinateEntry::from_message(&message, date).unwrap();

        assert_eq!(entry.username, "Steve");
        assert_eq!(entry.comment.as_deref(), Some("spawn"));
        assert_eq!(entry.timestamp.to_rfc3339(), "2024-01-01T13:37:00+00:00");
        assert_eq!(
            entry.to_string(),
            "2024-01-01 13:37:00 Steve 12 5 -8 (spawn)"
        );
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(-200.0), "-200");
        assert_eq!(format_coordinate(12.5), "12.5");
    }

    proptest! {
        #[test]
        fn prop_text_without_digits_has_no_coordinates(text in "[^0-9]*") {
            prop_assert!(extract_coordinates(&text).is_none());
        }

        #[test]
        fn prop_leading_triple_round_trips(
            x in -30_000_000i64..30_000_000,
            y in -64i64..320,
            z in -30_000_000i64..30_000_000,
            label in "[a-z]{1,12}",
        ) {
            let text = format!("{x}, {y}, {z} {label}");
            let found = extract_coordinates(&text).unwrap();
            prop_assert_eq!(found, pos(x as f64, Some(y as f64), z as f64, Some(label.as_str())));
        }
    }
}
