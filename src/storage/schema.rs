//! Database schema definition

/// SQL schema for the NavBuddy settings database
pub const SCHEMA: &str = r#"
-- Key-value settings, scoped per project root ('' for global keys)
CREATE TABLE IF NOT EXISTS settings (
    scope TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (scope, key)
);
"#;
