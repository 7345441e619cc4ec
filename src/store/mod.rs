//! SQLite persistence for bookmarks, categories, and import sessions.
//!
//! One long-lived connection behind a mutex serves every caller; the
//! schema is created idempotently on open. Multi-step operations
//! (bulk replace, merge) run in a transaction so observers see either
//! the before- or the after-state.

pub mod models;

use crate::classify::taxonomy::{preset_keywords, preset_parent, slugify, DEFAULT_TAXONOMY};
use crate::discovery::hierarchy::MAX_DEPTH;
use crate::discovery::DiscoveredCategory;
use crate::error::FuryError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub use models::{
    Bookmark, BookmarkFields, BulkOutcome, Category, ImportSession, MergeOutcome, UpsertOutcome,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT,
    parent_id   INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    keywords    TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookmarks (
    id                 INTEGER PRIMARY KEY,
    url                TEXT NOT NULL UNIQUE,
    title              TEXT NOT NULL,
    description        TEXT,
    source_folder      TEXT,
    category_id        INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    meta_title         TEXT,
    meta_description   TEXT,
    og_title           TEXT,
    og_description     TEXT,
    og_image           TEXT,
    keywords           TEXT,
    summary            TEXT,
    suggested_category TEXT,
    confidence         INTEGER,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_sessions (
    id              INTEGER PRIMARY KEY,
    file_name       TEXT NOT NULL,
    total_bookmarks INTEGER NOT NULL,
    successful      INTEGER NOT NULL,
    failed          INTEGER NOT NULL,
    skipped         INTEGER NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookmarks_category ON bookmarks(category_id);
CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);
";

const BOOKMARK_COLS: &str = "id, url, title, description, source_folder, category_id, \
     meta_title, meta_description, og_title, og_description, og_image, \
     keywords, summary, suggested_category, confidence, created_at, updated_at";

const CATEGORY_COLS: &str = "id, name, slug, description, parent_id, keywords, created_at";

/// The persistence layer. Cheap to share via `Arc`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FuryError> {
        let conn = Connection::open(path)
            .map_err(|e| FuryError::StorageUnavailable(e.to_string()))?;
        Self::init(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, FuryError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FuryError::StorageUnavailable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, FuryError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| FuryError::StorageUnavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| FuryError::StorageUnavailable(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    // ── Categories ──────────────────────────────────────────────

    /// Find or create a category by name.
    ///
    /// Idempotent: the slug is the identity, so repeated calls return
    /// the same row. Built-in preset names get their preset parent
    /// (created first) and keyword list on first creation.
    pub fn ensure_category(&self, name: &str) -> Result<Category, FuryError> {
        let conn = self.lock();
        ensure_category_inner(&conn, name)
    }

    /// Seed the built-in taxonomy. A no-op whenever any category exists.
    pub fn ensure_defaults(&self) -> Result<usize, FuryError> {
        let conn = self.lock();
        let existing: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .map_err(FuryError::from)?;
        if existing > 0 {
            return Ok(0);
        }
        let mut created = 0usize;
        for rule in DEFAULT_TAXONOMY {
            ensure_category_inner(&conn, rule.name)?;
            created += 1;
        }
        Ok(created)
    }

    pub fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, FuryError> {
        let conn = self.lock();
        category_by_slug_inner(&conn, slug)
    }

    pub fn category_by_id(&self, id: i64) -> Result<Option<Category>, FuryError> {
        let conn = self.lock();
        category_by_id_inner(&conn, id)
    }

    /// All categories, parents before children within the listing.
    pub fn list_categories(&self) -> Result<Vec<Category>, FuryError> {
        let conn = self.lock();
        list_categories_inner(&conn)
    }

    /// Number of parent hops from a category to its root.
    pub fn category_depth(&self, id: i64) -> Result<u32, FuryError> {
        let conn = self.lock();
        let parents = parent_map(&conn)?;
        Ok(depth_in(&parents, id))
    }

    /// The category the classifier's `"Other"` sentinel maps to:
    /// slug `other`, then `uncategorized`, created as "Other" if absent.
    pub fn other_category(&self) -> Result<Category, FuryError> {
        let conn = self.lock();
        for slug in ["other", "uncategorized"] {
            if let Some(cat) = category_by_slug_inner(&conn, slug)? {
                return Ok(cat);
            }
        }
        ensure_category_inner(&conn, "Other")
    }

    /// The category unassigned bookmarks fall back to: `uncategorized`,
    /// then `other`, then the first category, created if none exist.
    pub fn fallback_category(&self) -> Result<Category, FuryError> {
        let conn = self.lock();
        for slug in ["uncategorized", "other"] {
            if let Some(cat) = category_by_slug_inner(&conn, slug)? {
                return Ok(cat);
            }
        }
        let first = conn
            .query_row(
                &format!("SELECT {CATEGORY_COLS} FROM categories ORDER BY id LIMIT 1"),
                [],
                row_to_category,
            )
            .optional()
            .map_err(FuryError::from)?;
        match first {
            Some(cat) => Ok(cat),
            None => ensure_category_inner(&conn, "Uncategorized"),
        }
    }

    /// Write a discovered forest, parent-first, mapping temp ids to row
    /// ids. With `replace`, existing categories are cleared first (after
    /// nulling every bookmark's category); the whole operation is atomic.
    pub fn create_categories_bulk(
        &self,
        roots: &[DiscoveredCategory],
        replace: bool,
    ) -> Result<BulkOutcome, FuryError> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(FuryError::from)?;

        if replace {
            tx.execute("UPDATE bookmarks SET category_id = NULL", [])
                .map_err(FuryError::from)?;
            tx.execute("DELETE FROM categories", [])
                .map_err(FuryError::from)?;
        }

        let mut outcome = BulkOutcome::default();
        for root in roots {
            write_node(&tx, root, None, &mut outcome)?;
        }

        tx.commit().map_err(FuryError::from)?;
        Ok(outcome)
    }

    /// Merge `source` into `target`: keywords union, children
    /// reparented, bookmarks reassigned, source deleted. Atomic; the
    /// depth bound is re-established before commit.
    pub fn merge_categories(
        &self,
        source_id: i64,
        target_id: i64,
    ) -> Result<MergeOutcome, FuryError> {
        if source_id == target_id {
            return Err(FuryError::StorageConflict(
                "cannot merge a category into itself".into(),
            ));
        }

        let mut conn = self.lock();
        let tx = conn.transaction().map_err(FuryError::from)?;

        let source = category_by_id_inner(&tx, source_id)?
            .ok_or_else(|| FuryError::StorageConflict(format!("no category {source_id}")))?;
        let target = category_by_id_inner(&tx, target_id)?
            .ok_or_else(|| FuryError::StorageConflict(format!("no category {target_id}")))?;

        // Keyword union, target's order first, new source keywords after.
        let mut merged_keywords = target.keywords.clone();
        for kw in &source.keywords {
            if !merged_keywords.contains(kw) {
                merged_keywords.push(kw.clone());
            }
        }
        tx.execute(
            "UPDATE categories SET keywords = ?1 WHERE id = ?2",
            params![encode_keywords(&merged_keywords), target_id],
        )
        .map_err(FuryError::from)?;

        tx.execute(
            "UPDATE categories SET parent_id = ?1 WHERE parent_id = ?2",
            params![target_id, source_id],
        )
        .map_err(FuryError::from)?;

        tx.execute(
            "UPDATE bookmarks SET category_id = ?1 WHERE category_id = ?2",
            params![target_id, source_id],
        )
        .map_err(FuryError::from)?;

        tx.execute("DELETE FROM categories WHERE id = ?1", params![source_id])
            .map_err(FuryError::from)?;

        clamp_category_depth(&tx)?;

        let merged_bookmarks: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM bookmarks WHERE category_id = ?1",
                params![target_id],
                |row| row.get(0),
            )
            .map_err(FuryError::from)?;

        tx.commit().map_err(FuryError::from)?;
        Ok(MergeOutcome {
            merged_bookmarks: merged_bookmarks as usize,
            merged_keywords,
        })
    }

    // ── Bookmarks ───────────────────────────────────────────────

    /// Insert or update by canonical URL.
    ///
    /// A unique-key race on insert is resolved by re-reading and
    /// switching to update.
    pub fn upsert_bookmark(
        &self,
        url: &str,
        fields: &BookmarkFields,
    ) -> Result<UpsertOutcome, FuryError> {
        let conn = self.lock();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM bookmarks WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()
            .map_err(FuryError::from)?;

        match existing {
            Some(id) => {
                update_bookmark(&conn, id, fields)?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let now = Self::now();
                let inserted = conn.execute(
                    "INSERT INTO bookmarks (url, title, description, source_folder, category_id, \
                     meta_title, meta_description, og_title, og_description, og_image, \
                     keywords, summary, suggested_category, confidence, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                    params![
                        url,
                        fields.title,
                        fields.description,
                        fields.source_folder,
                        fields.category_id,
                        fields.meta_title,
                        fields.meta_description,
                        fields.og_title,
                        fields.og_description,
                        fields.og_image,
                        fields.keywords,
                        fields.summary,
                        fields.suggested_category,
                        fields.confidence,
                        now,
                        now,
                    ],
                );
                match inserted {
                    Ok(_) => Ok(UpsertOutcome::Inserted),
                    Err(e) if is_constraint(&e) => {
                        // Lost the race: another writer inserted this URL.
                        let id: i64 = conn
                            .query_row(
                                "SELECT id FROM bookmarks WHERE url = ?1",
                                params![url],
                                |row| row.get(0),
                            )
                            .map_err(FuryError::from)?;
                        update_bookmark(&conn, id, fields)?;
                        Ok(UpsertOutcome::Updated)
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    pub fn bookmark_by_url(&self, url: &str) -> Result<Option<Bookmark>, FuryError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {BOOKMARK_COLS} FROM bookmarks WHERE url = ?1"),
            params![url],
            row_to_bookmark,
        )
        .optional()
        .map_err(FuryError::from)
    }

    pub fn bookmark_count(&self) -> Result<i64, FuryError> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))
            .map_err(FuryError::from)
    }

    /// Paginated bookmark listing with substring search and category
    /// filter. Returns (rows, total matching).
    pub fn list_bookmarks(
        &self,
        query: Option<&str>,
        category_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Bookmark>, i64), FuryError> {
        let conn = self.lock();

        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(q) = query {
            let pattern = format!("%{q}%");
            clauses.push(format!(
                "(title LIKE ?{n} OR url LIKE ?{n} OR description LIKE ?{n})",
                n = args.len() + 1
            ));
            args.push(Box::new(pattern));
        }
        if let Some(cid) = category_id {
            clauses.push(format!("category_id = ?{}", args.len() + 1));
            args.push(Box::new(cid));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let params_ref: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM bookmarks {where_sql}"),
                params_ref.as_slice(),
                |row| row.get(0),
            )
            .map_err(FuryError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOKMARK_COLS} FROM bookmarks {where_sql} \
                 ORDER BY updated_at DESC LIMIT {limit} OFFSET {offset}"
            ))
            .map_err(FuryError::from)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), row_to_bookmark)
            .map_err(FuryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FuryError::from)?;

        Ok((rows, total))
    }

    /// Categories and bookmarks in one consistent snapshot for export.
    pub fn export_snapshot(&self) -> Result<(Vec<Category>, Vec<Bookmark>), FuryError> {
        let conn = self.lock();
        let categories = list_categories_inner(&conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOKMARK_COLS} FROM bookmarks ORDER BY id"
            ))
            .map_err(FuryError::from)?;
        let bookmarks = stmt
            .query_map([], row_to_bookmark)
            .map_err(FuryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FuryError::from)?;
        Ok((categories, bookmarks))
    }

    // ── Sessions ────────────────────────────────────────────────

    /// Record an import run. Called exactly once per run, at the end.
    pub fn record_session(
        &self,
        file_name: &str,
        total: i64,
        successful: i64,
        failed: i64,
        skipped: i64,
    ) -> Result<i64, FuryError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO import_sessions (file_name, total_bookmarks, successful, failed, skipped, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![file_name, total, successful, failed, skipped, Self::now()],
        )
        .map_err(FuryError::from)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn recent_sessions(&self, limit: i64) -> Result<Vec<ImportSession>, FuryError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, file_name, total_bookmarks, successful, failed, skipped, created_at \
                 FROM import_sessions ORDER BY id DESC LIMIT ?1",
            )
            .map_err(FuryError::from)?;
        let rows = stmt
            .query_map(params![limit], row_to_session)
            .map_err(FuryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FuryError::from)?;
        Ok(rows)
    }
}

// ── Connection-level helpers ────────────────────────────────────

fn ensure_category_inner(conn: &Connection, name: &str) -> Result<Category, FuryError> {
    let slug = slugify(name);
    if let Some(existing) = category_by_slug_inner(conn, &slug)? {
        return Ok(existing);
    }

    let parent_id = match preset_parent(name) {
        Some(parent) => Some(ensure_category_inner(conn, parent)?.id),
        None => None,
    };
    let keywords: Vec<String> = preset_keywords(name)
        .map(|ks| ks.iter().map(|k| (*k).to_string()).collect())
        .unwrap_or_default();

    let inserted = conn.execute(
        "INSERT INTO categories (name, slug, description, parent_id, keywords, created_at) \
         VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
        params![
            name,
            slug,
            parent_id,
            encode_keywords(&keywords),
            Utc::now().to_rfc3339()
        ],
    );
    if let Err(e) = inserted {
        if is_constraint(&e) {
            // Concurrent creation: the row exists now, use it.
            if let Some(existing) = category_by_slug_inner(conn, &slug)? {
                return Ok(existing);
            }
        }
        return Err(e.into());
    }

    category_by_slug_inner(conn, &slug)?
        .ok_or_else(|| FuryError::StorageUnavailable("category vanished after insert".into()))
}

fn category_by_slug_inner(conn: &Connection, slug: &str) -> Result<Option<Category>, FuryError> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLS} FROM categories WHERE slug = ?1"),
        params![slug],
        row_to_category,
    )
    .optional()
    .map_err(FuryError::from)
}

fn category_by_id_inner(conn: &Connection, id: i64) -> Result<Option<Category>, FuryError> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1"),
        params![id],
        row_to_category,
    )
    .optional()
    .map_err(FuryError::from)
}

fn list_categories_inner(conn: &Connection) -> Result<Vec<Category>, FuryError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CATEGORY_COLS} FROM categories ORDER BY parent_id IS NOT NULL, id"
        ))
        .map_err(FuryError::from)?;
    let rows = stmt
        .query_map([], row_to_category)
        .map_err(FuryError::from)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(FuryError::from)?;
    Ok(rows)
}

fn update_bookmark(conn: &Connection, id: i64, fields: &BookmarkFields) -> Result<(), FuryError> {
    conn.execute(
        "UPDATE bookmarks SET \
            title = ?1, \
            description = COALESCE(?2, description), \
            source_folder = COALESCE(?3, source_folder), \
            category_id = COALESCE(?4, category_id), \
            meta_title = COALESCE(?5, meta_title), \
            meta_description = COALESCE(?6, meta_description), \
            og_title = COALESCE(?7, og_title), \
            og_description = COALESCE(?8, og_description), \
            og_image = COALESCE(?9, og_image), \
            keywords = COALESCE(?10, keywords), \
            summary = COALESCE(?11, summary), \
            suggested_category = COALESCE(?12, suggested_category), \
            confidence = COALESCE(?13, confidence), \
            updated_at = ?14 \
         WHERE id = ?15",
        params![
            fields.title,
            fields.description,
            fields.source_folder,
            fields.category_id,
            fields.meta_title,
            fields.meta_description,
            fields.og_title,
            fields.og_description,
            fields.og_image,
            fields.keywords,
            fields.summary,
            fields.suggested_category,
            fields.confidence,
            Utc::now().to_rfc3339(),
            id,
        ],
    )
    .map_err(FuryError::from)?;
    Ok(())
}

fn write_node(
    conn: &Connection,
    node: &DiscoveredCategory,
    parent_id: Option<i64>,
    outcome: &mut BulkOutcome,
) -> Result<(), FuryError> {
    let slug = if node.slug.is_empty() {
        slugify(&node.name)
    } else {
        node.slug.clone()
    };

    let id = match category_by_slug_inner(conn, &slug)? {
        Some(existing) => {
            conn.execute(
                "UPDATE categories SET name = ?1, description = ?2, parent_id = ?3, keywords = ?4 \
                 WHERE id = ?5",
                params![
                    node.name,
                    empty_to_null(&node.description),
                    parent_id,
                    encode_keywords(&node.keywords),
                    existing.id,
                ],
            )
            .map_err(FuryError::from)?;
            outcome.updated += 1;
            existing.id
        }
        None => {
            conn.execute(
                "INSERT INTO categories (name, slug, description, parent_id, keywords, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    node.name,
                    slug,
                    empty_to_null(&node.description),
                    parent_id,
                    encode_keywords(&node.keywords),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(FuryError::from)?;
            outcome.created += 1;
            conn.last_insert_rowid()
        }
    };

    if !node.id.is_empty() {
        outcome.category_map.insert(node.id.clone(), id);
    }

    for child in &node.children {
        write_node(conn, child, Some(id), outcome)?;
    }
    Ok(())
}

/// Reparent any category deeper than [`MAX_DEPTH`] to its grandparent
/// until the bound holds again.
fn clamp_category_depth(conn: &Connection) -> Result<(), FuryError> {
    loop {
        let parents = parent_map(conn)?;
        let mut fixed_any = false;
        for (&id, _) in parents.iter() {
            if depth_in(&parents, id) > MAX_DEPTH {
                let parent = parents.get(&id).copied().flatten();
                let grandparent = parent.and_then(|p| parents.get(&p).copied().flatten());
                conn.execute(
                    "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
                    params![grandparent, id],
                )
                .map_err(FuryError::from)?;
                fixed_any = true;
            }
        }
        if !fixed_any {
            return Ok(());
        }
    }
}

fn parent_map(conn: &Connection) -> Result<HashMap<i64, Option<i64>>, FuryError> {
    let mut stmt = conn
        .prepare("SELECT id, parent_id FROM categories")
        .map_err(FuryError::from)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)))
        .map_err(FuryError::from)?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(FuryError::from)?;
    Ok(rows)
}

/// 1-based depth of a category; a broken parent chain stops counting.
fn depth_in(parents: &HashMap<i64, Option<i64>>, id: i64) -> u32 {
    let mut depth = 1;
    let mut current = id;
    while let Some(Some(parent)) = parents.get(&current) {
        depth += 1;
        current = *parent;
        if depth > MAX_DEPTH + 8 {
            break; // defense against a corrupted cycle
        }
    }
    depth
}

fn is_constraint(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn encode_keywords(keywords: &[String]) -> String {
    serde_json::to_string(keywords).unwrap_or_else(|_| "[]".to_string())
}

fn empty_to_null(text: &str) -> Option<&str> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn row_to_bookmark(row: &Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        source_folder: row.get(4)?,
        category_id: row.get(5)?,
        meta_title: row.get(6)?,
        meta_description: row.get(7)?,
        og_title: row.get(8)?,
        og_description: row.get(9)?,
        og_image: row.get(10)?,
        keywords: row.get(11)?,
        summary: row.get(12)?,
        suggested_category: row.get(13)?,
        confidence: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let keywords_json: String = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        parent_id: row.get(4)?,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        created_at: row.get(6)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<ImportSession> {
    Ok(ImportSession {
        id: row.get(0)?,
        file_name: row.get(1)?,
        total_bookmarks: row.get(2)?,
        successful: row.get(3)?,
        failed: row.get(4)?,
        skipped: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> BookmarkFields {
        BookmarkFields {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_reopens_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fury.db");

        let store = Store::open(&path).unwrap();
        store.ensure_category("Disk").unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        assert!(reopened.category_by_slug("disk").unwrap().is_some());
    }

    #[test]
    fn test_ensure_category_idempotent_with_preset_parent() {
        let store = Store::open_in_memory().unwrap();

        let first = store.ensure_category("Web Development").unwrap();
        let second = store.ensure_category("Web Development").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, "web-development");

        // The preset parent was created first and linked.
        let parent = store.category_by_id(first.parent_id.unwrap()).unwrap().unwrap();
        assert_eq!(parent.name, "Technology");
        assert!(!first.keywords.is_empty());
    }

    #[test]
    fn test_ensure_defaults_noop_when_any_category_exists() {
        let store = Store::open_in_memory().unwrap();
        let created = store.ensure_defaults().unwrap();
        assert_eq!(created, DEFAULT_TAXONOMY.len());
        assert_eq!(store.ensure_defaults().unwrap(), 0);

        let store2 = Store::open_in_memory().unwrap();
        store2.ensure_category("Custom").unwrap();
        assert_eq!(store2.ensure_defaults().unwrap(), 0);
    }

    #[test]
    fn test_upsert_insert_then_update() {
        let store = Store::open_in_memory().unwrap();
        let url = "https://example.com/a";

        let outcome = store.upsert_bookmark(url, &fields("First")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let mut updated = fields("Second");
        updated.meta_title = Some("Meta".to_string());
        assert_eq!(
            store.upsert_bookmark(url, &updated).unwrap(),
            UpsertOutcome::Updated
        );

        // A later upsert without enrichment keeps the earlier values.
        assert_eq!(
            store.upsert_bookmark(url, &fields("Third")).unwrap(),
            UpsertOutcome::Updated
        );
        let row = store.bookmark_by_url(url).unwrap().unwrap();
        assert_eq!(row.title, "Third");
        assert_eq!(row.meta_title.as_deref(), Some("Meta"));
        assert_eq!(store.bookmark_count().unwrap(), 1);
    }

    #[test]
    fn test_merge_unions_keywords_and_moves_everything() {
        let store = Store::open_in_memory().unwrap();

        let a = store.ensure_category("Alpha").unwrap();
        let b = store.ensure_category("Beta").unwrap();
        let conn = store.lock();
        conn.execute(
            "UPDATE categories SET keywords = ?1 WHERE id = ?2",
            params![encode_keywords(&["x".into(), "y".into()]), a.id],
        )
        .unwrap();
        conn.execute(
            "UPDATE categories SET keywords = ?1 WHERE id = ?2",
            params![encode_keywords(&["y".into(), "z".into()]), b.id],
        )
        .unwrap();
        // A child under Alpha that must end up under Beta.
        conn.execute(
            "INSERT INTO categories (name, slug, parent_id, keywords, created_at) \
             VALUES ('Alpha Child', 'alpha-child', ?1, '[]', ?2)",
            params![a.id, Utc::now().to_rfc3339()],
        )
        .unwrap();
        drop(conn);

        for i in 0..3 {
            let mut f = fields(&format!("A{i}"));
            f.category_id = Some(a.id);
            store.upsert_bookmark(&format!("https://a.example/{i}"), &f).unwrap();
        }
        for i in 0..2 {
            let mut f = fields(&format!("B{i}"));
            f.category_id = Some(b.id);
            store.upsert_bookmark(&format!("https://b.example/{i}"), &f).unwrap();
        }

        let outcome = store.merge_categories(a.id, b.id).unwrap();
        assert_eq!(outcome.merged_bookmarks, 5);
        assert_eq!(outcome.merged_keywords, vec!["y", "z", "x"]);

        assert!(store.category_by_id(a.id).unwrap().is_none());
        let child = store.category_by_slug("alpha-child").unwrap().unwrap();
        assert_eq!(child.parent_id, Some(b.id));
        assert!(store.category_depth(child.id).unwrap() <= MAX_DEPTH);
    }

    #[test]
    fn test_merge_rejects_self_and_missing() {
        let store = Store::open_in_memory().unwrap();
        let a = store.ensure_category("Solo").unwrap();
        assert!(store.merge_categories(a.id, a.id).is_err());
        assert!(store.merge_categories(a.id, 9999).is_err());
        // Failed merge left the store unchanged.
        assert!(store.category_by_id(a.id).unwrap().is_some());
    }

    #[test]
    fn test_bulk_create_maps_temp_ids_and_replaces() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_category("Old").unwrap();
        let mut f = fields("Orphan");
        f.category_id = store.category_by_slug("old").unwrap().map(|c| c.id);
        store.upsert_bookmark("https://o.example/", &f).unwrap();

        let tree = vec![DiscoveredCategory {
            id: "t1".into(),
            name: "Root".into(),
            slug: "root".into(),
            keywords: vec!["r".into()],
            children: vec![DiscoveredCategory {
                id: "t2".into(),
                name: "Leaf".into(),
                slug: "leaf".into(),
                ..Default::default()
            }],
            ..Default::default()
        }];

        let outcome = store.create_categories_bulk(&tree, true).unwrap();
        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.category_map.len(), 2);

        // Old category gone; bookmark orphaned, per replace semantics.
        assert!(store.category_by_slug("old").unwrap().is_none());
        let row = store.bookmark_by_url("https://o.example/").unwrap().unwrap();
        assert!(row.category_id.is_none());

        let leaf = store.category_by_slug("leaf").unwrap().unwrap();
        assert_eq!(leaf.parent_id, Some(outcome.category_map["t1"]));
    }

    #[test]
    fn test_session_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let id = store.record_session("bookmarks.html", 10, 7, 1, 2).unwrap();
        let sessions = store.recent_sessions(5).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].successful + sessions[0].failed + sessions[0].skipped, 10);
    }

    #[test]
    fn test_list_bookmarks_search_and_filter() {
        let store = Store::open_in_memory().unwrap();
        let cat = store.ensure_category("Docs").unwrap();
        let mut f = fields("Rust Book");
        f.category_id = Some(cat.id);
        store.upsert_bookmark("https://doc.rust-lang.org/book", &f).unwrap();
        store.upsert_bookmark("https://example.com/misc", &fields("Misc")).unwrap();

        let (rows, total) = store.list_bookmarks(Some("rust"), None, 10, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "Rust Book");

        let (rows, total) = store.list_bookmarks(None, Some(cat.id), 10, 0).unwrap();
        assert_eq!((rows.len(), total), (1, 1));

        let (_, total) = store.list_bookmarks(None, None, 10, 0).unwrap();
        assert_eq!(total, 2);
    }
}
