//! Time parsing and formatting utilities

use crate::domain::model::{NS_PER_MS, NS_PER_SECOND};
use crate::error::{ChopError, ChopResult};

/// Parser for the duration forms accepted on the command line and in the environment
pub struct TimeParser;

impl TimeParser {
    /// Create a new time parser
    pub fn new() -> Self {
        Self
    }
}

impl Default for TimeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeParser {
    /// Parse a duration string to nanoseconds.
    ///
    /// Accepted forms: `123ns`, `20ms`, `1.5s`, `MM:SS(.fff)`,
    /// `HH:MM:SS(.fff)` and a bare integer taken as nanoseconds.
    pub fn parse_duration_ns(&self, value: &str) -> ChopResult<i64> {
        let value = value.trim();
        let invalid = || ChopError::InvalidDuration {
            value: value.to_string(),
        };

        if value.is_empty() || value.starts_with('-') {
            return Err(invalid());
        }

        if let Some(number) = value.strip_suffix("ns") {
            return number.trim().parse::<i64>().map_err(|_| invalid());
        }

        if let Some(number) = value.strip_suffix("ms") {
            return self.scaled(number, NS_PER_MS).ok_or_else(invalid);
        }

        if let Some(number) = value.strip_suffix('s') {
            return self.scaled(number, NS_PER_SECOND).ok_or_else(invalid);
        }

        if value.contains(':') {
            return self.parse_clock(value).ok_or_else(invalid);
        }

        value.parse::<i64>().map_err(|_| invalid())
    }

    /// Parse `MM:SS(.fff)` or `HH:MM:SS(.fff)`
    fn parse_clock(&self, value: &str) -> Option<i64> {
        let parts: Vec<&str> = value.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [m, s] => (0, m.parse::<i64>().ok()?, *s),
            [h, m, s] => (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?, *s),
            _ => return None,
        };
        if minutes >= 60 && parts.len() == 3 {
            return None;
        }
        let seconds_ns = self.scaled(seconds, NS_PER_SECOND)?;
        hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_mul(NS_PER_SECOND)?
            .checked_add(seconds_ns)
    }

    /// Decimal number times a unit, rounded to the nearest nanosecond
    fn scaled(&self, number: &str, unit_ns: i64) -> Option<i64> {
        let number = number.trim();
        if let Ok(whole) = number.parse::<i64>() {
            return whole.checked_mul(unit_ns);
        }
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = (value * unit_ns as f64).round();
        if scaled >= i64::MAX as f64 {
            return None;
        }
        Some(scaled as i64)
    }
}

/// Parse a duration string to nanoseconds
pub fn parse_duration_ns(value: &str) -> ChopResult<i64> {
    TimeParser::new().parse_duration_ns(value)
}

/// Format nanoseconds as `HH:MM:SS.mmm`, with the full nanosecond
/// fraction when the value is not a whole millisecond
pub fn format_ns(ns: i64) -> String {
    let sign = if ns < 0 { "-" } else { "" };
    let ns = ns.unsigned_abs();
    let total_seconds = ns / NS_PER_SECOND as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let fraction = ns % NS_PER_SECOND as u64;

    if fraction % NS_PER_MS as u64 == 0 {
        format!(
            "{}{:02}:{:02}:{:02}.{:03}",
            sign,
            hours,
            minutes,
            seconds,
            fraction / NS_PER_MS as u64
        )
    } else {
        format!("{}{:02}:{:02}:{:02}.{:09}", sign, hours, minutes, seconds, fraction)
    }
}
