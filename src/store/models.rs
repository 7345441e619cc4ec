//! Persisted row types and the upsert field bundle.

use serde::Serialize;

/// A stored bookmark. `url` is the canonical form and the natural key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub source_folder: Option<String>,
    pub category_id: Option<i64>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    /// Comma-joined extracted keywords.
    pub keywords: Option<String>,
    pub summary: Option<String>,
    pub suggested_category: Option<String>,
    /// Advisory 0–100; written by the classifier, read by nobody.
    pub confidence: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored category. `slug` is unique; `parent_id` forms a forest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub keywords: Vec<String>,
    pub created_at: String,
}

/// One import run's final counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: i64,
    pub file_name: String,
    pub total_bookmarks: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub created_at: String,
}

/// Mutable bookmark fields for an upsert. Enrichment columns only
/// overwrite when Some, so a fetch-less re-import keeps earlier
/// enrichment.
#[derive(Debug, Clone, Default)]
pub struct BookmarkFields {
    pub title: String,
    pub description: Option<String>,
    pub source_folder: Option<String>,
    pub category_id: Option<i64>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub keywords: Option<String>,
    pub summary: Option<String>,
    pub suggested_category: Option<String>,
    pub confidence: Option<i64>,
}

/// Whether an upsert created or refreshed the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Result of a bulk category write.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub created: usize,
    pub updated: usize,
    /// Temporary tree id → persisted row id.
    pub category_map: std::collections::HashMap<String, i64>,
}

/// Result of merging one category into another.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub merged_bookmarks: usize,
    pub merged_keywords: Vec<String>,
}
