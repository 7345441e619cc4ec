//! Netscape bookmark-file parser.
//!
//! The format is a tree of definition lists: `<DT><H3>` terms open
//! folders, `<DT><A HREF>` terms hold bookmarks, and an optional `<DD>`
//! carries the description. Browsers emit the file with unclosed `<DT>`
//! tags, so the html5ever tree can carry a folder's `<DL>` either nested
//! inside its `<DT>` or as the following sibling; the walk below accepts
//! both shapes.
//!
//! Parsing is best-effort: entries without an href are dropped, and the
//! only hard failure is an input with no `<dl>` at all.

use crate::error::FuryError;
use scraper::{ElementRef, Html, Selector};

/// A flat bookmark pulled out of the archive, with its folder breadcrumb.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBookmark {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// Folder path joined as "A / B / C"; None for top-level entries.
    pub source_folder: Option<String>,
}

/// Parse a Netscape bookmark file into an ordered list of bookmarks.
pub fn parse_netscape(html: &str) -> Result<Vec<ParsedBookmark>, FuryError> {
    let doc = Html::parse_document(html);
    let dl_sel = Selector::parse("dl").expect("static selector");

    // Walk every top-level list; nested lists are reached by recursion.
    let roots: Vec<ElementRef> = doc
        .select(&dl_sel)
        .filter(|el| {
            !el.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map_or(false, |e| e.name() == "dl")
            })
        })
        .collect();

    if roots.is_empty() {
        return Err(FuryError::MalformedInput(
            "no bookmark list (<DL>) found".into(),
        ));
    }

    let mut out = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    for root in roots {
        walk_list(root, &mut stack, &mut out);
    }
    Ok(out)
}

/// Collapse an element's text to single-spaced trimmed form.
fn text_of(el: &ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn walk_list(dl: ElementRef, stack: &mut Vec<String>, out: &mut Vec<ParsedBookmark>) {
    let children: Vec<ElementRef> = dl.children().filter_map(ElementRef::wrap).collect();

    // A folder header whose <DL> has not been seen yet. Consumed by the
    // next list, whether it turns up inside the <DT> or as a sibling.
    let mut pending_folder: Option<String> = None;

    for (i, el) in children.iter().enumerate() {
        match el.value().name() {
            "dt" => {
                for inner in el.children().filter_map(ElementRef::wrap) {
                    match inner.value().name() {
                        "h3" => {
                            pending_folder = Some(text_of(&inner));
                        }
                        "a" => {
                            if let Some(bm) = bookmark_from_anchor(&inner, &children, i, stack) {
                                out.push(bm);
                            }
                        }
                        "dl" => {
                            descend(inner, pending_folder.take(), stack, out);
                        }
                        _ => {}
                    }
                }
            }
            "dl" => {
                descend(*el, pending_folder.take(), stack, out);
            }
            // <DD> siblings are consumed as lookahead from their <DT>;
            // the <p> separators Netscape emits are empty.
            _ => {}
        }
    }
}

fn descend(
    dl: ElementRef,
    folder: Option<String>,
    stack: &mut Vec<String>,
    out: &mut Vec<ParsedBookmark>,
) {
    match folder {
        Some(name) if !name.is_empty() => {
            stack.push(name);
            walk_list(dl, stack, out);
            stack.pop();
        }
        _ => walk_list(dl, stack, out),
    }
}

fn bookmark_from_anchor(
    anchor: &ElementRef,
    siblings: &[ElementRef],
    dt_index: usize,
    stack: &[String],
) -> Option<ParsedBookmark> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let mut title = text_of(anchor);
    if title.is_empty() {
        title = href.to_string();
    }

    // The description, if any, is the <DD> immediately following this
    // entry's <DT> and before the next term.
    let description = siblings
        .get(dt_index + 1)
        .filter(|sib| sib.value().name() == "dd")
        .map(|sib| text_of(sib))
        .filter(|t| !t.is_empty());

    let source_folder = if stack.is_empty() {
        None
    } else {
        Some(stack.join(" / "))
    };

    Some(ParsedBookmark {
        url: href.to_string(),
        title,
        description,
        source_folder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1700000000">Dev</H3>
    <DL><p>
        <DT><A HREF="https://github.com/rust-lang/rust" ADD_DATE="1700000001">Rust</A>
        <DD>The Rust repository
        <DT><H3>Docs</H3>
        <DL><p>
            <DT><A HREF="https://doc.rust-lang.org/book/">The Book</A>
        </DL><p>
    </DL><p>
    <DT><A HREF="https://news.ycombinator.com/">Hacker News</A>
</DL><p>
"#;

    #[test]
    fn test_parses_nested_folders() {
        let bookmarks = parse_netscape(SAMPLE).unwrap();
        assert_eq!(bookmarks.len(), 3);

        assert_eq!(bookmarks[0].url, "https://github.com/rust-lang/rust");
        assert_eq!(bookmarks[0].title, "Rust");
        assert_eq!(bookmarks[0].description.as_deref(), Some("The Rust repository"));
        assert_eq!(bookmarks[0].source_folder.as_deref(), Some("Dev"));

        assert_eq!(bookmarks[1].source_folder.as_deref(), Some("Dev / Docs"));

        assert_eq!(bookmarks[2].title, "Hacker News");
        assert!(bookmarks[2].source_folder.is_none());
    }

    #[test]
    fn test_closed_dt_sibling_list_shape() {
        // Some exporters close </DT> so the folder's list is a sibling.
        let html = r#"<DL>
            <DT><H3>Tools</H3></DT>
            <DL><DT><A HREF="https://example.com/t">T</A></DT></DL>
        </DL>"#;
        let bookmarks = parse_netscape(html).unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].source_folder.as_deref(), Some("Tools"));
    }

    #[test]
    fn test_missing_href_dropped_and_title_defaults() {
        let html = r#"<DL>
            <DT><A>no href</A>
            <DT><A HREF="   ">blank href</A>
            <DT><A HREF="https://example.com/x"></A>
        </DL>"#;
        let bookmarks = parse_netscape(html).unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].title, "https://example.com/x");
    }

    #[test]
    fn test_no_list_is_malformed() {
        let err = parse_netscape("<html><body><p>hello</p></body></html>").unwrap_err();
        assert!(matches!(err, FuryError::MalformedInput(_)));
    }

    #[test]
    fn test_empty_list_parses_to_nothing() {
        let bookmarks = parse_netscape("<DL><p></DL>").unwrap();
        assert!(bookmarks.is_empty());
    }
}
