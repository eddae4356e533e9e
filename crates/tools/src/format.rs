//! Shared text formatting for tool output.
//!
//! Tool output is read by the model, not rendered, so it stays compact:
//! entity ids always present, free-text fields clipped to a short preview,
//! lists capped so one tool call never floods the context window.

use serde_json::Value;

/// Longest preview kept for free-text fields (descriptions, notes).
pub const PREVIEW_CHARS: usize = 120;

/// Default cap on search results per call.
pub const SEARCH_RESULT_CAP: usize = 5;

/// Default cap on time-log entries per call.
pub const TIME_LOG_CAP: usize = 10;

/// Clip a string to `max` characters, appending an ellipsis when clipped.
/// Char-boundary safe.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max).collect();
    format!("{clipped}...")
}

/// A field from a JSON object as a display string, with a fallback.
pub fn field<'a>(value: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(fallback)
}

/// One summary line for a project.
pub fn project_line(project: &Value) -> String {
    let mut line = format!(
        "- {} (ID: {}) [{}]",
        field(project, "name", "Unknown"),
        field(project, "id_string", field(project, "id", "N/A")),
        field(project, "status", "unknown"),
    );
    let description = field(project, "description", "");
    if !description.is_empty() {
        line.push_str(&format!("\n  {}", preview(description, PREVIEW_CHARS)));
    }
    line
}

/// One summary line for a task.
pub fn task_line(task: &Value) -> String {
    format!(
        "- {} (ID: {}) [{} | {}% complete]",
        field(task, "name", "Unknown"),
        field(task, "id_string", field(task, "id", "N/A")),
        field(task, "status", field(task, "priority", "unknown")),
        task.get("percent_complete")
            .map(display_number)
            .unwrap_or_else(|| "0".to_string()),
    )
}

/// One summary line for a time log entry.
pub fn time_log_line(log: &Value) -> String {
    let mut line = format!(
        "- {} on {} by {} [{}]",
        field(log, "hours_display", "0:00"),
        field(log, "log_date", "unknown date"),
        field(log, "owner_name", "Unknown"),
        field(log, "bill_status", "Unknown"),
    );
    let notes = field(log, "notes", "");
    if !notes.is_empty() {
        line.push_str(&format!("\n  Notes: {}", preview(notes, PREVIEW_CHARS)));
    }
    line
}

/// Render a numeric-ish JSON value without quotes. The API returns some
/// numbers as strings ("20") and some as numbers (20).
fn display_number(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Join item lines under a count header, noting how many were clipped.
pub fn capped_list(header: &str, lines: Vec<String>, cap: usize) -> String {
    let total = lines.len();
    let mut out = String::from(header);
    out.push_str("\n\n");
    out.push_str(&lines.into_iter().take(cap).collect::<Vec<_>>().join("\n"));
    if total > cap {
        out.push_str(&format!("\n\n(showing {cap} of {total})"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preview_clips_long_text() {
        let long = "x".repeat(200);
        let clipped = preview(&long, PREVIEW_CHARS);
        assert_eq!(clipped.chars().count(), PREVIEW_CHARS + 3);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("short", PREVIEW_CHARS), "short");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "héllo wörld".repeat(20);
        let clipped = preview(&text, 10);
        assert_eq!(clipped.chars().count(), 13);
    }

    #[test]
    fn task_line_handles_numeric_and_string_percent() {
        let a = json!({"name": "A", "id": "1", "percent_complete": "20"});
        let b = json!({"name": "B", "id": "2", "percent_complete": 20});
        assert!(task_line(&a).contains("20% complete"));
        assert!(task_line(&b).contains("20% complete"));
    }

    #[test]
    fn capped_list_notes_clipped_items() {
        let lines: Vec<String> = (0..8).map(|i| format!("- item {i}")).collect();
        let out = capped_list("Found 8 items:", lines, 5);
        assert!(out.contains("- item 4"));
        assert!(!out.contains("- item 5"));
        assert!(out.contains("(showing 5 of 8)"));
    }

    #[test]
    fn capped_list_no_note_when_under_cap() {
        let lines = vec!["- one".to_string()];
        let out = capped_list("Found 1 item:", lines, 5);
        assert!(!out.contains("showing"));
    }
}
