//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StateStore trait.
//! Each save rewrites the whole snapshot inside one transaction.

use crate::extract::{Field, RULES};
use crate::state::{CrawlState, PageRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite state backend
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    fn load_pages(&self) -> StorageResult<IndexMap<String, PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, url, title, category, created_at, external_id, source
             FROM pages ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut pages = IndexMap::new();
        for row in rows {
            let (slug, url, title, category, created_at, external_id, source) = row?;
            let created_at = created_at.as_deref().map(parse_timestamp).transpose()?;

            pages.insert(
                slug.clone(),
                PageRecord {
                    url,
                    slug,
                    title,
                    category,
                    created_at,
                    external_id,
                    source,
                    extracted: Default::default(),
                },
            );
        }

        Ok(pages)
    }

    fn load_extracts(&self, pages: &mut IndexMap<String, PageRecord>) -> StorageResult<()> {
        let mut stmt = self.conn.prepare(
            "SELECT page_slug, extract_type, source FROM extracts
             ORDER BY page_slug, extract_type, extract_index",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (slug, kind, value) = row?;
            let field = Field::from_str_name(&kind)
                .ok_or_else(|| StorageError::Corrupt(format!("unknown extract type '{}'", kind)))?;
            let page = pages.get_mut(&slug).ok_or_else(|| {
                StorageError::Corrupt(format!("extract refers to unknown page '{}'", slug))
            })?;
            page.extracted.field_mut(field).push(value);
        }

        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn load(&self) -> StorageResult<Option<CrawlState>> {
        let markers = self
            .conn
            .query_row(
                "SELECT cursor_state, last_created_at, sites_fingerprint
                 FROM crawler_state WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((continuation_token, last_created_at, sites_fingerprint)) = markers else {
            return Ok(None);
        };

        let mut pages = self.load_pages()?;
        self.load_extracts(&mut pages)?;

        Ok(Some(CrawlState {
            continuation_token,
            high_water_mark: last_created_at.as_deref().map(parse_timestamp).transpose()?,
            sites_fingerprint,
            pages,
        }))
    }

    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM extracts", [])?;
        tx.execute("DELETE FROM pages", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO crawler_state
                 (id, cursor_state, last_created_at, sites_fingerprint)
             VALUES (1, ?1, ?2, ?3)",
            params![
                state.continuation_token,
                state.high_water_mark.map(|at| at.to_rfc3339()),
                state.sites_fingerprint,
            ],
        )?;

        {
            let mut insert_page = tx.prepare(
                "INSERT INTO pages
                     (slug, position, url, title, category, created_at, external_id, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let mut insert_extract = tx.prepare(
                "INSERT INTO extracts (page_slug, extract_type, extract_index, source)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for (position, (slug, page)) in state.pages.iter().enumerate() {
                insert_page.execute(params![
                    slug,
                    position as i64,
                    page.url,
                    page.title,
                    page.category,
                    page.created_at.map(|at| at.to_rfc3339()),
                    page.external_id,
                    page.source,
                ])?;

                for rule in RULES.iter() {
                    let kind = rule.field.as_str();
                    for (index, value) in page.extracted.field(rule.field).iter().enumerate() {
                        insert_extract.execute(params![slug, kind, index as i64, value])?;
                    }
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(
            "BEGIN;
             DELETE FROM extracts;
             DELETE FROM pages;
             DELETE FROM crawler_state;
             COMMIT;",
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".to_string(),
        }
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn page(slug: &str, source: &str, day: u32) -> PageRecord {
        PageRecord {
            url: format!("http://scp-wiki.wikidot.com/{}", slug),
            slug: slug.to_string(),
            title: Some(slug.to_string()),
            category: Some("_default".to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2021, 3, day, 12, 0, 0).unwrap()),
            external_id: Some(format!("{}", day)),
            source: Some(source.to_string()),
            extracted: extract(source),
        }
    }

    fn sample_state() -> CrawlState {
        let mut state = CrawlState::new();
        state.sites_fingerprint = Some("abc".to_string());
        state.merge_batch(
            vec![
                page(
                    "scp-010",
                    r#"[[div class="b a b" style="x: 1"]] [[include info-ruv]]"#,
                    2,
                ),
                page("scp-002", "[[module css]]\n.a {}\n[[/module]]", 1),
                page("main", "plain", 3),
            ],
            Some("cursor-3".to_string()),
        );
        state
    }

    #[test]
    fn test_empty_store_loads_none() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, state);
        let slugs: Vec<_> = loaded.pages.keys().cloned().collect();
        assert_eq!(slugs, vec!["scp-010", "scp-002", "main"]);
        assert_eq!(loaded.pages["scp-010"].extracted.classes, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.save(&sample_state()).unwrap();

        let mut smaller = CrawlState::new();
        smaller.merge(page("scp-999", "", 9));
        store.save(&smaller).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, smaller);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_state_without_markers() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let state = CrawlState::new();

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn test_clear() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.save(&sample_state()).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        let state = sample_state();

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.save(&state).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
        assert!(store.describe().ends_with("state.db"));
    }

    #[test]
    fn test_unknown_extract_type_is_corrupt() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.save(&sample_state()).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO extracts (page_slug, extract_type, extract_index, source)
                 VALUES ('main', 'bogus', 0, 'x')",
                [],
            )
            .unwrap();

        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }
}
