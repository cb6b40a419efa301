use chrono::{NaiveDate, NaiveDateTime};

use crate::models::CommentDoc;

/// Format a duration in seconds as `"2h 30m"`, `"2h"`, or `"45m"`.
///
/// Integer division only; `0` renders as `"0m"`. Negative input is
/// undefined and not guarded against.
pub fn format_seconds(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours != 0 && minutes != 0 {
        format!("{hours}h {minutes}m")
    } else if hours != 0 {
        format!("{hours}h")
    } else {
        format!("{minutes}m")
    }
}

/// Flatten a rich-text comment body to plain text.
///
/// Joins the `text` payload of every inline `"text"`-typed node across all
/// content blocks with single spaces. Non-text nodes are skipped. Returns
/// an empty string when no comment exists.
pub fn extract_comment(comment: Option<&CommentDoc>) -> String {
    let Some(doc) = comment else {
        return String::new();
    };

    let mut texts = Vec::new();
    for block in &doc.content {
        for node in &block.content {
            if node.node_type == "text" {
                texts.push(node.text.clone().unwrap_or_default());
            }
        }
    }
    texts.join(" ")
}

/// Short local time (`HH:MM`) of a worklog start timestamp.
///
/// Parses the leading `YYYY-MM-DDTHH:MM:SS` portion; on parse failure falls
/// back to the raw `[11..16]` slice. Timestamps shorter than a full
/// datetime yield an empty string.
pub fn started_time(raw: &str) -> String {
    let Some(head) = raw.get(..19) else {
        return String::new();
    };

    match NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
        Ok(dt) => dt.format("%H:%M").to_string(),
        Err(_) => raw.get(11..16).unwrap_or_default().to_string(),
    }
}

/// Format a worklog update timestamp as `DD-MM-YYYY HH:MM`.
///
/// Falls back to a raw prefix slice when the timestamp does not parse.
pub fn format_updated(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let parsed = raw
        .get(..19)
        .and_then(|head| NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok());

    match parsed {
        Some(dt) => dt.format("%d-%m-%Y %H:%M").to_string(),
        None => raw.get(..16).unwrap_or(raw).to_string(),
    }
}

/// `YYYY-MM-DD` → `DD-MM-YYYY`; echoes the input when it does not parse.
pub fn format_work_date(iso: &str) -> String {
    match NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(_) => iso.to_string(),
    }
}
