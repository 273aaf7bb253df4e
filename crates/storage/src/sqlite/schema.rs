//! SQLite schema definitions and SQL query constants.
//!
//! This module contains all SQL statements used by the SQLite store,
//! following the Functional Core pattern - pure data, no I/O.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Documents table. `seq` orders documents for keyset pagination.
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    container TEXT NOT NULL,
    partition_key TEXT NOT NULL,
    id TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    etag TEXT NOT NULL,
    body TEXT NOT NULL,
    UNIQUE (container, partition_key, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_partition_seq
    ON documents(container, partition_key, seq);
"#;

pub const INSERT_DOCUMENT: &str = r#"
INSERT INTO documents (container, partition_key, id, resource_id, etag, body)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_DOCUMENT: &str = r#"
SELECT body
FROM documents
WHERE container = ?1 AND partition_key = ?2 AND id = ?3
"#;

pub const SELECT_DOCUMENT_VERSION: &str = r#"
SELECT resource_id, etag
FROM documents
WHERE container = ?1 AND partition_key = ?2 AND id = ?3
"#;

pub const UPDATE_DOCUMENT: &str = r#"
UPDATE documents
SET etag = ?4, body = ?5
WHERE container = ?1 AND partition_key = ?2 AND id = ?3
"#;

pub const DELETE_DOCUMENT: &str = r#"
DELETE FROM documents
WHERE container = ?1 AND partition_key = ?2 AND id = ?3
"#;

// Named parameters reserved by the page query. Caller parameters must not
// start with `__`.
pub const CONTAINER_PARAM: &str = ":__container";
pub const PARTITION_PARAM: &str = ":__partition";
pub const AFTER_PARAM: &str = ":__after";
pub const LIMIT_PARAM: &str = ":__limit";

/// Builds the page query, optionally restricted by a caller predicate.
///
/// The predicate only sees the `seq` and `body` columns of rows already
/// scoped to the container, partition and cursor. Run [`check_predicate`]
/// on caller text before splicing it in.
pub fn select_page(predicate: Option<&str>) -> String {
    let scoped = format!(
        "SELECT seq, body\nFROM documents\nWHERE container = {CONTAINER_PARAM}\n  AND partition_key = {PARTITION_PARAM}\n  AND seq > {AFTER_PARAM}"
    );

    match predicate {
        None => format!("{scoped}\nORDER BY seq ASC\nLIMIT {LIMIT_PARAM}"),
        Some(p) => format!(
            "SELECT seq, body\nFROM (\n{scoped}\n)\nWHERE ({p})\nORDER BY seq ASC\nLIMIT {LIMIT_PARAM}"
        ),
    }
}

/// Checks that a caller predicate is a single self-contained expression.
///
/// Rejects unbalanced parentheses, unterminated literals, comments and
/// statement separators outside of quoted text.
pub fn check_predicate(predicate: &str) -> Result<(), String> {
    let mut depth = 0usize;
    let mut chars = predicate.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                loop {
                    match chars.next() {
                        Some(q) if q == close => {
                            // A doubled quote is an escaped quote.
                            if close != ']' && chars.peek() == Some(&close) {
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        Some(_) => {}
                        None => return Err(format!("Unterminated {c} in predicate")),
                    }
                }
            }
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "Unbalanced ')' in predicate".to_string())?;
            }
            ';' => return Err("Statement separators are not allowed in predicates".to_string()),
            '-' if chars.peek() == Some(&'-') => {
                return Err("Comments are not allowed in predicates".to_string())
            }
            '/' if chars.peek() == Some(&'*') => {
                return Err("Comments are not allowed in predicates".to_string())
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err("Unbalanced '(' in predicate".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_page_without_predicate() {
        let sql = select_page(None);
        assert!(sql.contains("seq > :__after"));
        assert!(sql.ends_with("LIMIT :__limit"));
        assert!(!sql.contains("WHERE ("));
    }

    #[test]
    fn test_select_page_scopes_before_predicate() {
        let sql = select_page(Some("json_extract(body, '$.a') = :a OR 1 = 1"));
        let scope = sql.find("partition_key = :__partition").unwrap();
        let filter = sql
            .find("WHERE (json_extract(body, '$.a') = :a OR 1 = 1)")
            .unwrap();
        assert!(sql.starts_with("SELECT seq, body\nFROM (\n"));
        assert!(scope < filter);
        assert!(sql.ends_with("LIMIT :__limit"));
    }

    #[test]
    fn test_check_predicate_accepts_expressions() {
        assert!(check_predicate("json_extract(body, '$.a') = :a").is_ok());
        assert!(check_predicate("(a = 1) OR (b = ')')").is_ok());
        assert!(check_predicate("json_extract(body, '$.name') = 'O''Brien'").is_ok());
        assert!(check_predicate("a - b > 0").is_ok());
    }

    #[test]
    fn test_check_predicate_rejects_scope_escapes() {
        assert!(check_predicate("1) OR (1").is_err());
        assert!(check_predicate("(1").is_err());
        assert!(check_predicate("1 = 1; DELETE FROM documents").is_err());
        assert!(check_predicate("1 = 1 -- trailing").is_err());
        assert!(check_predicate("1 = 1 /* open").is_err());
        assert!(check_predicate("body = 'open").is_err());
    }
}
