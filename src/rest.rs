// Copyright 2026 Fury Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP API for the import core.
//!
//! The streaming import endpoint frames orchestrator events as
//! Server-Sent Events; everything else is plain JSON. Closing the
//! import stream is the cancellation signal — the orchestrator notices
//! the dropped consumer between items.

use crate::discovery::{discover_taxonomy, hierarchy, DiscoveredCategory, LlmClient};
use crate::enrich::Fetcher;
use crate::events::EventSink;
use crate::export::{attachment_filename, render, ExportFormat};
use crate::import::{ImportOptions, Importer};
use crate::ingest::{parse_netscape, ParsedBookmark};
use crate::store::{Category, Store};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state for all handlers.
pub struct AppState {
    pub store: Arc<Store>,
    pub fetcher: Arc<dyn Fetcher>,
    pub llm: Option<Arc<LlmClient>>,
}

/// Build the router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/import", post(handle_import))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/categories", get(handle_list_categories))
        .route("/api/categories/bulk", post(handle_bulk_categories))
        .route("/api/categories/merge", post(handle_merge))
        .route("/api/bookmarks", get(handle_list_bookmarks))
        .route("/api/sessions", get(handle_sessions))
        .route("/api/export", get(handle_export))
        .layer(axum::extract::DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on the given port until the process exits.
pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Streaming import: multipart in, SSE out.
async fn handle_import(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut html: Option<String> = None;
    let mut file_name = "bookmarks.html".to_string();
    let mut custom: Option<Vec<DiscoveredCategory>> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if let Some(original) = field.file_name() {
                    file_name = original.to_string();
                }
                match field.text().await {
                    Ok(text) => html = Some(text),
                    Err(e) => return bad_request(&format!("unreadable file field: {e}")),
                }
            }
            Some("customCategories") => match field.text().await {
                Ok(text) => match parse_category_tree(&text) {
                    Ok(tree) => custom = Some(tree),
                    Err(e) => return bad_request(&format!("invalid customCategories: {e}")),
                },
                Err(e) => return bad_request(&format!("unreadable customCategories: {e}")),
            },
            _ => {}
        }
    }

    let Some(html) = html else {
        return bad_request("missing 'file' field");
    };

    let (sink, mut rx) = EventSink::channel();
    let importer = Importer::new(
        Arc::clone(&state.store),
        Arc::clone(&state.fetcher),
        state.llm.clone(),
    );
    let opts = ImportOptions {
        file_name,
        custom_categories: custom,
        replace_categories: false,
        discover: false,
    };

    // The run outlives this handler; events flow through the channel
    // and the run's own error event is its only failure surface.
    tokio::spawn(async move {
        let _ = importer.run(&html, opts, sink).await;
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            yield Ok::<_, Infallible>(
                Event::default().event(event.name()).data(event.payload_json()),
            );
            if terminal {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    bookmarks_html: Option<String>,
    #[serde(default)]
    bookmarks: Option<Vec<AnalyzeBookmark>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBookmark {
    url: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source_folder: Option<String>,
}

/// Synchronous taxonomy discovery over an uploaded archive or an
/// explicit bookmark list.
async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<Value> {
    let bookmarks: Vec<ParsedBookmark> = if let Some(html) = &request.bookmarks_html {
        match parse_netscape(html) {
            Ok(parsed) => parsed,
            Err(e) => return Json(json!({ "success": false, "error": e.to_string() })),
        }
    } else {
        request
            .bookmarks
            .unwrap_or_default()
            .into_iter()
            .map(|b| ParsedBookmark {
                url: b.url,
                title: b.title,
                description: b.description,
                source_folder: b.source_folder,
            })
            .collect()
    };

    if bookmarks.is_empty() {
        return Json(json!({ "success": false, "error": "no bookmarks to analyze" }));
    }

    let discovery = discover_taxonomy(&bookmarks, state.llm.as_deref()).await;
    let validation = hierarchy::validate(&discovery.categories);
    let stats = hierarchy::stats(&discovery.categories);

    Json(json!({
        "success": true,
        "result": {
            "discoveryResult": discovery,
            "validation": validation,
            "stats": stats,
            "bookmarkCount": bookmarks.len(),
        },
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest {
    categories: Vec<DiscoveredCategory>,
    #[serde(default)]
    replace_existing: bool,
}

async fn handle_bulk_categories(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRequest>,
) -> Response {
    match state
        .store
        .create_categories_bulk(&request.categories, request.replace_existing)
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => internal_error(&e.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeRequest {
    source_id: Option<i64>,
    target_id: Option<i64>,
}

async fn handle_merge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MergeRequest>,
) -> Response {
    let (Some(source), Some(target)) = (request.source_id, request.target_id) else {
        return bad_request("sourceId and targetId are required");
    };
    if source == target {
        return bad_request("sourceId and targetId must differ");
    }
    match state.store.merge_categories(source, target) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(crate::error::FuryError::StorageConflict(msg)) => bad_request(&msg),
        Err(e) => internal_error(&e.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

async fn handle_list_bookmarks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookmarkQuery>,
) -> Response {
    match state.store.list_bookmarks(
        query.q.as_deref(),
        query.category_id,
        query.limit.clamp(1, 500),
        query.offset.max(0),
    ) {
        Ok((bookmarks, total)) => {
            Json(json!({ "bookmarks": bookmarks, "total": total })).into_response()
        }
        Err(e) => internal_error(&e.to_string()),
    }
}

async fn handle_list_categories(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_categories() {
        Ok(categories) => Json(json!({ "categories": category_tree(&categories) })).into_response(),
        Err(e) => internal_error(&e.to_string()),
    }
}

async fn handle_sessions(State(state): State<Arc<AppState>>) -> Response {
    match state.store.recent_sessions(50) {
        Ok(sessions) => Json(json!({ "sessions": sessions })).into_response(),
        Err(e) => internal_error(&e.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportQuery {
    format: String,
    #[serde(default)]
    category_id: Option<i64>,
}

async fn handle_export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let format = match ExportFormat::from_str(&query.format) {
        Ok(f) => f,
        Err(e) => return bad_request(&e),
    };

    let (categories, bookmarks) = match state.store.export_snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => return internal_error(&e.to_string()),
    };

    let body = render(&categories, &bookmarks, format, query.category_id);
    let disposition = format!("attachment; filename=\"{}\"", attachment_filename(format));

    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

// ── Helpers ─────────────────────────────────────────────────────

/// `customCategories` arrives either as a bare array of roots or
/// wrapped in a `{categories: […]}` envelope (the analyze result
/// shape); accept both.
fn parse_category_tree(text: &str) -> Result<Vec<DiscoveredCategory>, serde_json::Error> {
    #[derive(Deserialize)]
    struct Envelope {
        categories: Vec<DiscoveredCategory>,
    }

    serde_json::from_str::<Vec<DiscoveredCategory>>(text)
        .or_else(|_| serde_json::from_str::<Envelope>(text).map(|e| e.categories))
}

/// Nest the flat category listing into a tree for the read API.
fn category_tree(categories: &[Category]) -> Vec<Value> {
    fn node(category: &Category, categories: &[Category]) -> Value {
        let children: Vec<Value> = categories
            .iter()
            .filter(|c| c.parent_id == Some(category.id))
            .map(|c| node(c, categories))
            .collect();
        json!({
            "id": category.id,
            "name": category.name,
            "slug": category.slug,
            "description": category.description,
            "parentId": category.parent_id,
            "keywords": category.keywords,
            "children": children,
        })
    }

    categories
        .iter()
        .filter(|c| c.parent_id.is_none())
        .map(|c| node(c, categories))
        .collect()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str, parent: Option<i64>) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: crate::classify::slugify(name),
            description: None,
            parent_id: parent,
            keywords: vec![],
            created_at: String::new(),
        }
    }

    #[test]
    fn test_category_tree_nests_children() {
        let categories = vec![
            category(1, "Tech", None),
            category(2, "Rust", Some(1)),
            category(3, "Food", None),
        ];
        let tree = category_tree(&categories);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0]["name"], "Tech");
        assert_eq!(tree[0]["children"][0]["name"], "Rust");
        assert_eq!(tree[1]["children"].as_array().unwrap().len(), 0);
    }
}
