//! SQLite schema definition.

/// Schema for the SQLite-backed key-value store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Local Storage (key -> raw string value, JSON for structured entries)
-- ============================================================================

CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_key_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)",
            ["reports", "[]"],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)",
            ["reports", "[]"],
        );
        assert!(result.is_err());
    }
}
