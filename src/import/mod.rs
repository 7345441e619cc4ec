//! The import orchestrator: parse → dedupe → categorize → upsert,
//! streaming progress events to the caller.
//!
//! Two paths. The default-taxonomy path pushes each bookmark through
//! validate → fetch → classify → upsert with a bounded pool of 5 and a
//! polite inter-batch sleep. The custom-taxonomy path persists the
//! supplied (or discovered) tree, asks the LLM to assign bookmarks in
//! batches, and falls back to keyword matching — no metadata fetch, so
//! large imports stay fast.
//!
//! Per-bookmark failures are counted and never stop the run; the
//! session row is written exactly once at the end, partial runs
//! included.

use crate::classify::{keyword_fallback, BookmarkSignals, RuleSet, OTHER_LABEL};
use crate::discovery::{batch_assign, discover_taxonomy, DiscoveredCategory, LlmClient};
use crate::enrich::{Fetcher, PageMetadata};
use crate::error::FuryError;
use crate::events::{
    CompletePayload, EventSink, ImportEvent, InitPayload, ProgressPayload, SkippedPayload,
};
use crate::ingest::{normalize_url, parse_netscape, ParsedBookmark};
use crate::store::{BookmarkFields, Store, UpsertOutcome};
use crate::text::{
    domain_hints, extract_semantic_keywords, extract_url_tokens, Keyword, KeywordConfig,
};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Concurrent workers on the default path.
const WORKER_POOL: usize = 5;

/// Fast-path progress cadence (every N items).
const FAST_PROGRESS_EVERY: usize = 10;

/// How much stored summary text a bookmark keeps.
const SUMMARY_LIMIT: usize = 500;

/// Options for one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub file_name: String,
    /// A caller-supplied custom taxonomy; switches to the fast path.
    pub custom_categories: Option<Vec<DiscoveredCategory>>,
    /// Replace existing categories when persisting the custom tree.
    pub replace_categories: bool,
    /// Discover a taxonomy from the input when none was supplied.
    pub discover: bool,
}

/// Final counters for one run.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub session_id: i64,
    pub total_in_file: usize,
    pub unique_bookmarks: usize,
    pub duplicates_in_file: usize,
    pub new_bookmarks: usize,
    pub updated_bookmarks: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub custom_categories_created: usize,
    pub ai_assignments: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    processed: usize,
    new: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
    successful: usize,
}

/// The import pipeline. One instance serves one run at a time.
pub struct Importer {
    store: Arc<Store>,
    fetcher: Arc<dyn Fetcher>,
    llm: Option<Arc<LlmClient>>,
}

impl Importer {
    pub fn new(store: Arc<Store>, fetcher: Arc<dyn Fetcher>, llm: Option<Arc<LlmClient>>) -> Self {
        Self {
            store,
            fetcher,
            llm,
        }
    }

    /// Run a full import of a Netscape bookmark file.
    ///
    /// Emits progress events into the sink throughout; the terminal
    /// event (`complete` or `error`) is always last. Cancellation is
    /// observed through the sink: once the consumer disconnects, no new
    /// work is scheduled, the partial session is recorded, and a
    /// terminal `error: "cancelled"` is emitted.
    pub async fn run(
        &self,
        html: &str,
        opts: ImportOptions,
        sink: EventSink,
    ) -> Result<ImportOutcome, FuryError> {
        sink.emit(ImportEvent::status("parsing", "Parsing bookmark file"));

        let parsed = match parse_netscape(html) {
            Ok(p) => p,
            Err(e) => {
                sink.emit(ImportEvent::error(e.to_string()));
                return Err(e);
            }
        };

        let total_in_file = parsed.len();
        let unique = dedupe(parsed);
        let duplicates = total_in_file - unique.len();

        sink.emit(ImportEvent::Init(InitPayload {
            total_in_file,
            unique_bookmarks: unique.len(),
            duplicates_in_file: duplicates,
        }));

        // In-file duplicates count as skipped from the start, so the
        // session invariant successful + failed + skipped =
        // unique + duplicates holds.
        let counters = Arc::new(Mutex::new(Counters {
            skipped: duplicates,
            ..Default::default()
        }));

        let custom_path = opts.custom_categories.is_some() || opts.discover;
        let mut custom_created = 0usize;
        let mut ai_assignments = 0usize;
        let mut cancelled = false;

        if custom_path {
            let (created, assigned) = self
                .run_custom_path(&unique, &opts, &sink, &counters, &mut cancelled)
                .await?;
            custom_created = created;
            ai_assignments = assigned;
        } else {
            self.run_default_path(&unique, &sink, &counters, &mut cancelled)
                .await?;
        }

        sink.emit(ImportEvent::status("sessioning", "Recording import session"));

        let snapshot = *lock(&counters);
        let session_id = match self.store.record_session(
            &opts.file_name,
            total_in_file as i64,
            snapshot.successful as i64,
            snapshot.failed as i64,
            snapshot.skipped as i64,
        ) {
            Ok(id) => id,
            Err(e) => {
                sink.emit(ImportEvent::error(e.to_string()));
                return Err(e);
            }
        };

        let outcome = ImportOutcome {
            session_id,
            total_in_file,
            unique_bookmarks: unique.len(),
            duplicates_in_file: duplicates,
            new_bookmarks: snapshot.new,
            updated_bookmarks: snapshot.updated,
            successful: snapshot.successful,
            failed: snapshot.failed,
            skipped: snapshot.skipped,
            custom_categories_created: custom_created,
            ai_assignments,
            cancelled,
        };

        if cancelled {
            sink.emit(ImportEvent::error("cancelled"));
        } else {
            sink.emit(ImportEvent::Complete(CompletePayload {
                import_session_id: outcome.session_id,
                total_in_file: outcome.total_in_file,
                unique_bookmarks: outcome.unique_bookmarks,
                duplicates_in_file: outcome.duplicates_in_file,
                new_bookmarks: outcome.new_bookmarks,
                updated_bookmarks: outcome.updated_bookmarks,
                successful_bookmarks: outcome.successful,
                failed_bookmarks: outcome.failed,
                skipped_bookmarks: outcome.skipped,
                custom_categories_created: outcome.custom_categories_created,
                ai_assignments: outcome.ai_assignments,
            }));
        }

        Ok(outcome)
    }

    // ── Path A: default taxonomy ────────────────────────────────

    async fn run_default_path(
        &self,
        unique: &[(String, ParsedBookmark)],
        sink: &EventSink,
        counters: &Arc<Mutex<Counters>>,
        cancelled: &mut bool,
    ) -> Result<(), FuryError> {
        // An empty archive records a session but must not seed anything.
        if unique.is_empty() {
            return Ok(());
        }

        self.store.ensure_defaults()?;
        sink.emit(ImportEvent::status("processing", "Importing bookmarks"));

        let total = unique.len();
        for (chunk_idx, chunk) in unique.chunks(WORKER_POOL).enumerate() {
            if sink.is_closed() {
                *cancelled = true;
                break;
            }

            // Polite crawling: pause between batches of 5.
            if chunk_idx > 0 {
                tokio::time::sleep(batch_delay(chunk_idx)).await;
            }

            let tasks = chunk.iter().map(|(canonical, bookmark)| {
                self.process_default_item(canonical, bookmark, total, sink, counters)
            });
            join_all(tasks).await;
        }
        Ok(())
    }

    async fn process_default_item(
        &self,
        canonical: &str,
        bookmark: &ParsedBookmark,
        total: usize,
        sink: &EventSink,
        counters: &Arc<Mutex<Counters>>,
    ) {
        if !self.fetcher.validate(canonical).await {
            let mut c = lock(counters);
            c.processed += 1;
            c.skipped += 1;
            let snapshot = *c;
            drop(c);
            sink.emit(ImportEvent::Skipped(SkippedPayload {
                url: canonical.to_string(),
                reason: "Invalid URL".to_string(),
            }));
            emit_progress(sink, &snapshot, total, &bookmark.title, None);
            return;
        }

        let metadata = self.fetcher.fetch(canonical).await;

        let result = self.classify_and_store(canonical, bookmark, metadata.as_ref());
        let mut c = lock(counters);
        c.processed += 1;
        match result {
            Ok(UpsertOutcome::Inserted) => {
                c.new += 1;
                c.successful += 1;
            }
            Ok(UpsertOutcome::Updated) => {
                c.updated += 1;
                c.successful += 1;
            }
            Err(e) => {
                warn!("import failed for {canonical}: {e}");
                c.failed += 1;
            }
        }
        let snapshot = *c;
        drop(c);
        emit_progress(sink, &snapshot, total, &bookmark.title, None);
    }

    fn classify_and_store(
        &self,
        canonical: &str,
        bookmark: &ParsedBookmark,
        metadata: Option<&PageMetadata>,
    ) -> Result<UpsertOutcome, FuryError> {
        let keywords = gather_keywords(canonical, bookmark, metadata);
        let description = bookmark.description.as_deref().unwrap_or("");
        let signals = BookmarkSignals {
            url: canonical,
            title: &bookmark.title,
            description,
            keywords: &keywords,
        };

        let classification = RuleSet::default_taxonomy().classify(&signals);
        let category = if classification.category == OTHER_LABEL {
            self.store.other_category()?
        } else {
            self.store.ensure_category(&classification.category)?
        };

        let mut fields = BookmarkFields {
            title: bookmark.title.clone(),
            description: bookmark.description.clone(),
            source_folder: bookmark.source_folder.clone(),
            category_id: Some(category.id),
            keywords: Some(join_keywords(&keywords)),
            confidence: Some(i64::from(classification.confidence)),
            ..Default::default()
        };
        if let Some(meta) = metadata {
            fields.meta_title = meta.title.clone();
            fields.meta_description = meta.meta_description.clone();
            fields.og_title = meta.og_title.clone();
            fields.og_description = meta.og_description.clone();
            fields.og_image = meta.og_image.clone();
            if !meta.body_text.is_empty() {
                fields.summary = Some(meta.body_text.chars().take(SUMMARY_LIMIT).collect());
            }
        }

        self.store.upsert_bookmark(canonical, &fields)
    }

    // ── Path B: custom taxonomy ─────────────────────────────────

    async fn run_custom_path(
        &self,
        unique: &[(String, ParsedBookmark)],
        opts: &ImportOptions,
        sink: &EventSink,
        counters: &Arc<Mutex<Counters>>,
        cancelled: &mut bool,
    ) -> Result<(usize, usize), FuryError> {
        let created = match &opts.custom_categories {
            Some(tree) => {
                sink.emit(ImportEvent::status("categories", "Saving custom categories"));
                self.store
                    .create_categories_bulk(tree, opts.replace_categories)?
                    .created
            }
            None => {
                sink.emit(ImportEvent::status("discovery", "Discovering categories"));
                let bookmarks: Vec<ParsedBookmark> =
                    unique.iter().map(|(_, b)| b.clone()).collect();
                let result = discover_taxonomy(&bookmarks, self.llm.as_deref()).await;
                self.store
                    .create_categories_bulk(&result.categories, opts.replace_categories)?
                    .created
            }
        };

        let categories = self.store.list_categories()?;
        let keyword_table: Vec<(String, Vec<String>)> = categories
            .iter()
            .map(|c| (c.name.clone(), c.keywords.clone()))
            .collect();

        // LLM assignment over (index, name) / (index, title, host).
        let indexed_categories: Vec<(usize, String)> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.name.clone()))
            .collect();
        let indexed_bookmarks: Vec<(usize, String, String)> = unique
            .iter()
            .enumerate()
            .map(|(j, (canonical, b))| (j, b.title.clone(), host_of(canonical)))
            .collect();

        let assignments = match &self.llm {
            Some(llm) => {
                sink.emit(ImportEvent::status("assigning", "Assigning categories"));
                let progress_sink = sink.clone();
                let total = unique.len();
                batch_assign(llm, &indexed_categories, &indexed_bookmarks, |done, _| {
                    progress_sink.emit(ImportEvent::status(
                        "assigning",
                        format!("Assigned {done}/{total} bookmarks"),
                    ));
                })
                .await
            }
            None => Default::default(),
        };
        let ai_assignments = assignments.assigned.len();

        sink.emit(ImportEvent::status("processing", "Importing bookmarks"));
        let total = unique.len();

        for (j, (canonical, bookmark)) in unique.iter().enumerate() {
            if sink.is_closed() {
                *cancelled = true;
                break;
            }

            let result =
                self.store_custom_item(canonical, bookmark, assignments.assigned.get(&j), &keyword_table);

            let mut c = lock(counters);
            c.processed += 1;
            match result {
                Ok(UpsertOutcome::Inserted) => {
                    c.new += 1;
                    c.successful += 1;
                }
                Ok(UpsertOutcome::Updated) => {
                    c.updated += 1;
                    c.successful += 1;
                }
                Err(e) => {
                    warn!("import failed for {canonical}: {e}");
                    c.failed += 1;
                }
            }
            let snapshot = *c;
            drop(c);

            if (j + 1) % FAST_PROGRESS_EVERY == 0 || j + 1 == total {
                emit_progress(sink, &snapshot, total, &bookmark.title, Some("custom"));
            }
        }

        Ok((created, ai_assignments))
    }

    fn store_custom_item(
        &self,
        canonical: &str,
        bookmark: &ParsedBookmark,
        assigned: Option<&String>,
        keyword_table: &[(String, Vec<String>)],
    ) -> Result<UpsertOutcome, FuryError> {
        let keywords = gather_keywords(canonical, bookmark, None);
        let description = bookmark.description.as_deref().unwrap_or("");
        let signals = BookmarkSignals {
            url: canonical,
            title: &bookmark.title,
            description,
            keywords: &keywords,
        };

        // LLM choice, then keyword match, then the fallback category.
        let (category, suggested) = match assigned {
            Some(name) => (self.store.ensure_category(name)?, Some(name.clone())),
            None => match keyword_fallback(&signals, keyword_table) {
                Some(name) => (self.store.ensure_category(&name)?, None),
                None => (self.store.fallback_category()?, None),
            },
        };

        let fields = BookmarkFields {
            title: bookmark.title.clone(),
            description: bookmark.description.clone(),
            source_folder: bookmark.source_folder.clone(),
            category_id: Some(category.id),
            keywords: Some(join_keywords(&keywords)),
            suggested_category: suggested,
            ..Default::default()
        };
        self.store.upsert_bookmark(canonical, &fields)
    }
}

/// Fold in-file duplicates, keeping the first occurrence of each
/// canonical URL in input order.
fn dedupe(parsed: Vec<ParsedBookmark>) -> Vec<(String, ParsedBookmark)> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for bookmark in parsed {
        let canonical = normalize_url(&bookmark.url);
        if seen.insert(canonical.clone()) {
            unique.push((canonical, bookmark));
        }
    }
    unique
}

/// Domain hints plus semantic keywords from everything we know about
/// the bookmark.
fn gather_keywords(
    canonical: &str,
    bookmark: &ParsedBookmark,
    metadata: Option<&PageMetadata>,
) -> Vec<Keyword> {
    let mut keywords: Vec<Keyword> = domain_hints(canonical)
        .into_iter()
        .map(|tag| Keyword {
            text: tag,
            score: 100,
        })
        .collect();

    let mut text = bookmark.title.clone();
    if let Some(desc) = &bookmark.description {
        text.push(' ');
        text.push_str(desc);
    }
    for token in extract_url_tokens(canonical) {
        text.push(' ');
        text.push_str(&token);
    }
    if let Some(meta) = metadata {
        for piece in [
            meta.title.as_deref(),
            meta.meta_description.as_deref(),
            meta.og_title.as_deref(),
            meta.og_description.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            text.push(' ');
            text.push_str(piece);
        }
        text.push(' ');
        text.push_str(&meta.body_text);
    }

    for kw in extract_semantic_keywords(&text, &KeywordConfig::default()) {
        if !keywords.iter().any(|existing| existing.text == kw.text) {
            keywords.push(kw);
        }
    }
    keywords
}

fn join_keywords(keywords: &[Keyword]) -> String {
    keywords
        .iter()
        .map(|kw| kw.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_progress(
    sink: &EventSink,
    counters: &Counters,
    total: usize,
    current: &str,
    phase: Option<&str>,
) {
    let percent = if total == 0 {
        100
    } else {
        (counters.processed * 100 / total) as u32
    };
    sink.emit(ImportEvent::Progress(ProgressPayload {
        processed: counters.processed,
        total,
        percent,
        current_bookmark: current.to_string(),
        new_bookmarks: counters.new,
        updated_bookmarks: counters.updated,
        skipped: counters.skipped,
        failed: counters.failed,
        phase: phase.map(str::to_string),
    }));
}

/// 500–1000 ms, varied deterministically by batch index.
fn batch_delay(chunk_idx: usize) -> Duration {
    Duration::from_millis(500 + ((chunk_idx * 137) % 501) as u64)
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

fn lock<'a>(counters: &'a Arc<Mutex<Counters>>) -> std::sync::MutexGuard<'a, Counters> {
    counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(url: &str) -> ParsedBookmark {
        ParsedBookmark {
            url: url.to_string(),
            title: url.to_string(),
            description: None,
            source_folder: None,
        }
    }

    #[test]
    fn test_dedupe_folds_trailing_slash_and_case() {
        let parsed = vec![
            bm("https://x.com/"),
            bm("https://x.com"),
            bm("HTTPS://X.COM/"),
            bm("https://y.com/page"),
        ];
        let unique = dedupe(parsed);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].0, "https://x.com");
        assert_eq!(unique[1].0, "https://y.com/page");
    }

    #[test]
    fn test_batch_delay_in_range() {
        for idx in 0..50 {
            let delay = batch_delay(idx).as_millis();
            assert!((500..=1000).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn test_gather_keywords_includes_hints() {
        let bookmark = bm("https://github.com/rust-lang/rust");
        let keywords = gather_keywords("https://github.com/rust-lang/rust", &bookmark, None);
        assert!(keywords.iter().any(|k| k.text == "development" && k.score == 100));
    }
}
