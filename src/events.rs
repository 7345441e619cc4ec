// Copyright 2026 Fury Contributors
// SPDX-License-Identifier: Apache-2.0

//! Import progress events and the caller-owned sink.
//!
//! The orchestrator emits [`ImportEvent`]s into an [`EventSink`]; the
//! HTTP layer frames them as Server-Sent Events (`event: <name>` +
//! `data: <json>`), the CLI prints them. The sink is an unbounded mpsc
//! channel with a single consumer: emitting never blocks, and once the
//! consumer is gone the sink degrades to a no-op whose closed state
//! doubles as the cancellation signal.

use serde::Serialize;
use tokio::sync::mpsc;

/// Lifecycle tick.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub phase: String,
    pub message: String,
}

/// Emitted once, after parse + dedupe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub total_in_file: usize,
    pub unique_bookmarks: usize,
    pub duplicates_in_file: usize,
}

/// Emitted per processed bookmark (default path) or every few items
/// (fast path).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub processed: usize,
    pub total: usize,
    pub percent: u32,
    pub current_bookmark: String,
    pub new_bookmarks: usize,
    pub updated_bookmarks: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// One bookmark was skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPayload {
    pub url: String,
    pub reason: String,
}

/// Terminal success event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub import_session_id: i64,
    pub total_in_file: usize,
    pub unique_bookmarks: usize,
    pub duplicates_in_file: usize,
    pub new_bookmarks: usize,
    pub updated_bookmarks: usize,
    pub successful_bookmarks: usize,
    pub failed_bookmarks: usize,
    pub skipped_bookmarks: usize,
    pub custom_categories_created: usize,
    pub ai_assignments: usize,
}

/// Terminal failure event.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Every event an import run can emit.
#[derive(Debug, Clone)]
pub enum ImportEvent {
    Status(StatusPayload),
    Init(InitPayload),
    Progress(ProgressPayload),
    Skipped(SkippedPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl ImportEvent {
    /// The SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Init(_) => "init",
            Self::Progress(_) => "progress",
            Self::Skipped(_) => "skipped",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    /// The JSON payload carried in the SSE `data:` line.
    pub fn payload_json(&self) -> String {
        let result = match self {
            Self::Status(p) => serde_json::to_string(p),
            Self::Init(p) => serde_json::to_string(p),
            Self::Progress(p) => serde_json::to_string(p),
            Self::Skipped(p) => serde_json::to_string(p),
            Self::Complete(p) => serde_json::to_string(p),
            Self::Error(p) => serde_json::to_string(p),
        };
        result.unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    pub fn status(phase: &str, message: impl Into<String>) -> Self {
        Self::Status(StatusPayload {
            phase: phase.to_string(),
            message: message.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

/// Sender half of the progress stream.
#[derive(Clone)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ImportEvent>>,
}

impl EventSink {
    /// A connected sink plus its consumer end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ImportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops everything (imports nobody watches).
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    /// Emit an event. Never blocks; send failures are ignored.
    pub fn emit(&self, event: ImportEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    /// True once the consumer dropped its receiver. The orchestrator
    /// polls this between items as the cancellation flag.
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_and_payloads() {
        let event = ImportEvent::Init(InitPayload {
            total_in_file: 3,
            unique_bookmarks: 2,
            duplicates_in_file: 1,
        });
        assert_eq!(event.name(), "init");
        let json = event.payload_json();
        assert!(json.contains("\"totalInFile\":3"));
        assert!(json.contains("\"duplicatesInFile\":1"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_progress_omits_missing_phase() {
        let event = ImportEvent::Progress(ProgressPayload {
            processed: 1,
            total: 4,
            percent: 25,
            current_bookmark: "Example".into(),
            new_bookmarks: 1,
            updated_bookmarks: 0,
            skipped: 0,
            failed: 0,
            phase: None,
        });
        let json = event.payload_json();
        assert!(json.contains("\"currentBookmark\":\"Example\""));
        assert!(!json.contains("phase"));
    }

    #[test]
    fn test_terminal_events() {
        assert!(ImportEvent::error("boom").is_terminal());
        assert_eq!(ImportEvent::error("boom").name(), "error");
    }

    #[test]
    fn test_sink_closed_after_receiver_drop() {
        let (sink, rx) = EventSink::channel();
        assert!(!sink.is_closed());
        sink.emit(ImportEvent::status("parsing", "reading file"));
        drop(rx);
        assert!(sink.is_closed());
        // Emitting into a closed sink is a silent no-op.
        sink.emit(ImportEvent::status("parsing", "still fine"));
        assert!(EventSink::disconnected().is_closed());
    }
}
