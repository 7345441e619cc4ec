//! Export → re-import round trips: the canonical URL set and the
//! category naming survive a trip through the Netscape format.

use async_trait::async_trait;
use fury::enrich::{Fetcher, PageMetadata};
use fury::events::EventSink;
use fury::export::{render, ExportFormat};
use fury::import::{ImportOptions, Importer};
use fury::ingest::{normalize_url, parse_netscape};
use fury::store::Store;
use std::collections::HashSet;
use std::sync::Arc;

struct AcceptAll;

#[async_trait]
impl Fetcher for AcceptAll {
    async fn validate(&self, _url: &str) -> bool {
        true
    }
    async fn fetch(&self, _url: &str) -> Option<PageMetadata> {
        None
    }
}

fn opts(name: &str) -> ImportOptions {
    ImportOptions {
        file_name: name.to_string(),
        ..Default::default()
    }
}

const ARCHIVE: &str = r#"<DL><p>
    <DT><A HREF="https://github.com/rust-lang/rust">Rust</A>
    <DT><A HREF="https://stackoverflow.com/questions/1">SO question</A>
    <DT><A HREF="https://www.novartis.com/">Novartis | Home</A>
    <DT><A HREF="https://no-category-at-all.example/zzz">qqq</A>
</DL><p>"#;

#[tokio::test]
async fn test_export_reimport_preserves_urls_and_categories() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let importer = Importer::new(Arc::clone(&store), Arc::new(AcceptAll), None);

    let (sink, _rx) = EventSink::channel();
    let first = importer.run(ARCHIVE, opts("first.html"), sink).await.unwrap();
    assert_eq!(first.new_bookmarks, 4);

    let (categories, bookmarks) = store.export_snapshot().unwrap();
    let html = render(&categories, &bookmarks, ExportFormat::Firefox, None);

    // The exported file parses back with the same canonical URL set.
    let reparsed = parse_netscape(&html).unwrap();
    let exported_urls: HashSet<String> =
        reparsed.iter().map(|b| normalize_url(&b.url)).collect();
    let stored_urls: HashSet<String> = bookmarks.iter().map(|b| b.url.clone()).collect();
    assert_eq!(exported_urls, stored_urls);

    // Folder breadcrumbs carry the category names.
    let rust = reparsed
        .iter()
        .find(|b| normalize_url(&b.url) == "https://github.com/rust-lang/rust")
        .unwrap();
    assert!(rust
        .source_folder
        .as_deref()
        .unwrap()
        .contains("Web Development"));
    let novartis = reparsed
        .iter()
        .find(|b| normalize_url(&b.url) == "https://www.novartis.com")
        .unwrap();
    assert!(novartis
        .source_folder
        .as_deref()
        .unwrap()
        .contains("Pharmaceutical Companies"));

    // Re-importing the export into the same store changes nothing but
    // the update counters.
    let before = store.bookmark_count().unwrap();
    let (sink, _rx) = EventSink::channel();
    let second = importer.run(&html, opts("second.html"), sink).await.unwrap();
    assert_eq!(store.bookmark_count().unwrap(), before);
    assert_eq!(second.new_bookmarks, 0);
    assert_eq!(second.updated_bookmarks, before as usize);
}

#[tokio::test]
async fn test_chrome_export_matches_store() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let importer = Importer::new(Arc::clone(&store), Arc::new(AcceptAll), None);
    let (sink, _rx) = EventSink::channel();
    importer.run(ARCHIVE, opts("first.html"), sink).await.unwrap();

    let (categories, bookmarks) = store.export_snapshot().unwrap();
    let json = render(&categories, &bookmarks, ExportFormat::Chrome, None);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    // Every stored URL appears exactly once somewhere in the tree.
    let rendered = value.to_string();
    for bm in &bookmarks {
        assert_eq!(rendered.matches(&bm.url).count(), 1, "{}", bm.url);
    }
    assert!(value["roots"]["bookmark_bar"].is_object());
    assert!(value["roots"]["other"].is_object());
}
