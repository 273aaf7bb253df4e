//! Output formatting functions.

pub mod json;
pub mod pretty;

use serde_json::Value;

use crate::cli::OutputFormat;

/// Format a single document for output.
pub fn format_document(document: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(document),
        OutputFormat::Pretty => pretty::format_document(document),
    }
}

/// Format the result of a write command.
///
/// Pretty output is headed by `action` (for example `Inserted`) unless
/// `quiet` is set. JSON output is never headed.
pub fn format_result(action: &str, document: &Value, format: OutputFormat, quiet: bool) -> String {
    let body = format_document(document, format);
    match format {
        OutputFormat::Pretty if !quiet => format!("{action}:\n{body}"),
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({ "id": "abc-123", "type": "TestDocument" })
    }

    #[test]
    fn test_format_result_pretty_has_header() {
        let output = format_result("Inserted", &document(), OutputFormat::Pretty, false);
        assert_eq!(output, "Inserted:\nabc-123 [TestDocument]");
    }

    #[test]
    fn test_format_result_quiet_drops_header() {
        let output = format_result("Inserted", &document(), OutputFormat::Pretty, true);
        assert_eq!(output, "abc-123 [TestDocument]");
    }

    #[test]
    fn test_format_result_json_is_document_only() {
        let output = format_result("Updated", &document(), OutputFormat::Json, false);
        assert_eq!(output, json::format_json(&document()));
    }
}
