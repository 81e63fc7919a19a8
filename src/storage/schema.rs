//! Database schema definitions
//!
//! This module contains the SQL schema of the SQLite state backend.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Single row holding the position markers
CREATE TABLE IF NOT EXISTS crawler_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    cursor_state TEXT,
    last_created_at TEXT,
    sites_fingerprint TEXT
);

-- One row per crawled page, position keeps first-seen order
CREATE TABLE IF NOT EXISTS pages (
    slug TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    category TEXT,
    created_at TEXT,
    external_id TEXT,
    source TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_position ON pages(position);

-- Extracted metadata, one row per value
CREATE TABLE IF NOT EXISTS extracts (
    page_slug TEXT NOT NULL REFERENCES pages(slug) ON DELETE CASCADE,
    extract_type TEXT NOT NULL,
    extract_index INTEGER NOT NULL,
    source TEXT NOT NULL,
    PRIMARY KEY (page_slug, extract_type, extract_index)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
