use chrono::{DateTime, TimeZone};

/// Escapes text for interpolation into HTML element content or attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Human readable submission time, e.g. `10/18/2026, 1:05:09 PM`.
pub fn timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Only http(s) links are rendered as anchors.
pub(crate) fn is_web_link(raw: &str) -> bool {
    let lowered = raw.trim_start().to_ascii_lowercase();
    lowered.starts_with("https://") || lowered.starts_with("http://")
}
