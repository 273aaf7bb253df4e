//! Pretty output formatting.

use serde_json::Value;

const METADATA_FIELDS: [(&str, &str); 3] = [("_etag", "Etag"), ("_ts", "Timestamp"), ("_self", "Link")];

/// Format a document for display.
pub fn format_document(document: &Value) -> String {
    let text = |field: &str| document.get(field).and_then(Value::as_str).unwrap_or("?");
    let mut output = format!("{} [{}]", text("id"), text("type"));

    for (field, label) in METADATA_FIELDS {
        match document.get(field) {
            Some(Value::String(value)) => output.push_str(&format!("\n  {label}: {value}")),
            Some(value) => output.push_str(&format!("\n  {label}: {value}")),
            None => {}
        }
    }

    if let Value::Object(fields) = document {
        for (name, value) in fields {
            if name == "id" || name == "type" || name.starts_with('_') {
                continue;
            }
            output.push_str(&format!("\n  {name}: {value}"));
        }
    }

    output
}

/// Format documents for display.
pub fn format_documents(documents: &[Value]) -> String {
    if documents.is_empty() {
        return "No documents found.".to_string();
    }
    let mut output = format!("DOCUMENTS ({})\n", documents.len());
    output.push_str(&"-".repeat(40));
    for document in documents {
        output.push_str(&format!("\n{}", format_document(document)));
        output.push('\n');
    }
    output
}
