//! Export the persisted corpus as Chrome-style nested JSON or Netscape
//! HTML, mirroring the category forest as a folder tree.

use crate::store::{Bookmark, Category};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::str::FromStr;

/// Supported export targets. Chrome gets nested JSON, the rest get
/// Netscape HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Chrome,
    Firefox,
    Safari,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            "safari" => Ok(Self::Safari),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Safari => "safari",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Chrome => "json",
            Self::Firefox | Self::Safari => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Chrome => "application/json",
            Self::Firefox | Self::Safari => "text/html",
        }
    }
}

/// Attachment name: `fury_bookmarks_<format>_<YYYY-MM-DD>.<ext>`.
pub fn attachment_filename(format: ExportFormat) -> String {
    format!(
        "fury_bookmarks_{}_{}.{}",
        format.as_str(),
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render the corpus in the requested format, optionally filtered to
/// one category's subtree (ancestors included).
pub fn render(
    categories: &[Category],
    bookmarks: &[Bookmark],
    format: ExportFormat,
    filter: Option<i64>,
) -> String {
    let scope = Scope::build(categories, bookmarks, filter);
    match format {
        ExportFormat::Chrome => {
            serde_json::to_string_pretty(&chrome_json(&scope)).unwrap_or_else(|_| "{}".into())
        }
        ExportFormat::Firefox | ExportFormat::Safari => netscape_html(&scope),
    }
}

/// Everything the renderers need, with filtering already applied.
struct Scope<'a> {
    /// Root categories to emit, in id order.
    roots: Vec<&'a Category>,
    children: HashMap<i64, Vec<&'a Category>>,
    by_category: HashMap<i64, Vec<&'a Bookmark>>,
    /// Bookmarks without a (surviving) category; empty when filtered.
    uncategorized: Vec<&'a Bookmark>,
    /// Categories that own at least one in-scope bookmark, or have a
    /// descendant that does.
    populated: HashSet<i64>,
}

impl<'a> Scope<'a> {
    fn build(categories: &'a [Category], bookmarks: &'a [Bookmark], filter: Option<i64>) -> Self {
        let ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
        let mut children: HashMap<i64, Vec<&Category>> = HashMap::new();
        let mut roots: Vec<&Category> = Vec::new();
        for cat in categories {
            match cat.parent_id.filter(|p| ids.contains(p)) {
                Some(parent) => children.entry(parent).or_default().push(cat),
                None => roots.push(cat),
            }
        }

        // With a filter, scope is the chosen subtree; bookmarks outside
        // it (and the uncategorized) drop out.
        let in_scope: Option<HashSet<i64>> = filter.map(|start| {
            let mut set = HashSet::new();
            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                if set.insert(id) {
                    if let Some(kids) = children.get(&id) {
                        stack.extend(kids.iter().map(|c| c.id));
                    }
                }
            }
            set
        });

        let mut by_category: HashMap<i64, Vec<&Bookmark>> = HashMap::new();
        let mut uncategorized: Vec<&Bookmark> = Vec::new();
        for bm in bookmarks {
            match bm.category_id.filter(|c| ids.contains(c)) {
                Some(cid) => {
                    if in_scope.as_ref().map_or(true, |scope| scope.contains(&cid)) {
                        by_category.entry(cid).or_default().push(bm);
                    }
                }
                None => {
                    if in_scope.is_none() {
                        uncategorized.push(bm);
                    }
                }
            }
        }

        // A category is emitted when its subtree holds any bookmark.
        let mut populated: HashSet<i64> = HashSet::new();
        let parent_of: HashMap<i64, Option<i64>> =
            categories.iter().map(|c| (c.id, c.parent_id)).collect();
        for &cid in by_category.keys() {
            let mut current = Some(cid);
            while let Some(id) = current {
                if !populated.insert(id) {
                    break;
                }
                current = parent_of.get(&id).copied().flatten();
            }
        }

        Self {
            roots,
            children,
            by_category,
            uncategorized,
            populated,
        }
    }
}

// ── Chrome JSON ─────────────────────────────────────────────────

fn chrome_json(scope: &Scope) -> Value {
    let bar_children: Vec<Value> = scope.uncategorized.iter().map(|bm| url_node(bm)).collect();
    let other_children: Vec<Value> = scope
        .roots
        .iter()
        .filter(|cat| scope.populated.contains(&cat.id))
        .map(|cat| folder_node(cat, scope))
        .collect();

    json!({
        "version": 1,
        "roots": {
            "bookmark_bar": {
                "name": "Bookmarks bar",
                "type": "folder",
                "children": bar_children,
            },
            "other": {
                "name": "Other bookmarks",
                "type": "folder",
                "children": other_children,
            },
        },
    })
}

fn folder_node(category: &Category, scope: &Scope) -> Value {
    let mut children: Vec<Value> = Vec::new();
    if let Some(bookmarks) = scope.by_category.get(&category.id) {
        children.extend(bookmarks.iter().map(|bm| url_node(bm)));
    }
    if let Some(kids) = scope.children.get(&category.id) {
        children.extend(
            kids.iter()
                .filter(|kid| scope.populated.contains(&kid.id))
                .map(|kid| folder_node(kid, scope)),
        );
    }
    json!({
        "name": category.name,
        "type": "folder",
        "children": children,
    })
}

fn url_node(bookmark: &Bookmark) -> Value {
    json!({
        "name": bookmark.title,
        "type": "url",
        "url": bookmark.url,
        "date_added": unix_time(&bookmark.created_at),
    })
}

// ── Netscape HTML ───────────────────────────────────────────────

fn netscape_html(scope: &Scope) -> String {
    let mut out = String::from(
        "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
         <!-- This is an automatically generated file. It will be read and overwritten. Do not edit! -->\n\
         <META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
         <TITLE>Bookmarks</TITLE>\n\
         <H1>Bookmarks</H1>\n\
         <DL><p>\n",
    );

    for bm in &scope.uncategorized {
        write_bookmark(&mut out, bm, 1);
    }
    for cat in &scope.roots {
        if scope.populated.contains(&cat.id) {
            write_folder(&mut out, cat, scope, 1);
        }
    }

    out.push_str("</DL><p>\n");
    out
}

fn write_folder(out: &mut String, category: &Category, scope: &Scope, depth: usize) {
    let pad = "    ".repeat(depth);
    let _ = writeln!(
        out,
        "{pad}<DT><H3 ADD_DATE=\"{}\">{}</H3>",
        unix_time(&category.created_at),
        escape_html(&category.name)
    );
    let _ = writeln!(out, "{pad}<DL><p>");

    if let Some(bookmarks) = scope.by_category.get(&category.id) {
        for bm in bookmarks {
            write_bookmark(out, bm, depth + 1);
        }
    }
    if let Some(kids) = scope.children.get(&category.id) {
        for kid in kids {
            if scope.populated.contains(&kid.id) {
                write_folder(out, kid, scope, depth + 1);
            }
        }
    }

    let _ = writeln!(out, "{pad}</DL><p>");
}

fn write_bookmark(out: &mut String, bookmark: &Bookmark, depth: usize) {
    let pad = "    ".repeat(depth);
    let _ = writeln!(
        out,
        "{pad}<DT><A HREF=\"{}\" ADD_DATE=\"{}\">{}</A>",
        escape_html(&bookmark.url),
        unix_time(&bookmark.created_at),
        escape_html(&bookmark.title)
    );
    if let Some(desc) = &bookmark.description {
        if !desc.is_empty() {
            let _ = writeln!(out, "{pad}<DD>{}", escape_html(desc));
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unix_time(rfc3339: &str) -> i64 {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}
