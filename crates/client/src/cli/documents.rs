//! Parsing of document and parameter arguments.

use std::io::Read;

use serde_json::Value;

use crate::error::{ClientError, Result};

/// Parse a `name=value` query parameter.
///
/// The value is read as JSON when it parses (`2`, `true`, `"x"`) and as a
/// plain string otherwise.
pub fn parse_param(arg: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{arg}'"))?;
    if name.is_empty() {
        return Err(format!("parameter name is empty in '{arg}'"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Read a JSON document argument.
///
/// `-` reads standard input and `@path` reads a file; anything else is parsed
/// as JSON text.
pub fn read_document(arg: &str) -> Result<Value> {
    let text = if arg == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)?
    } else {
        arg.to_string()
    };

    let value: Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(ClientError::InvalidInput(
            "Document must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}
