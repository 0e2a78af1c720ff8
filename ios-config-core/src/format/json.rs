use crate::diff::result::DiffEntry;
use crate::format::text::format_summary;

/// Format diff entries as JSON, with the count summary alongside.
pub fn format_json(entries: &[DiffEntry]) -> String {
    let report = serde_json::json!({
        "summary": format_summary(entries),
        "entries": entries,
    });
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}
