// Copyright 2026 Fury Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fury::config::Config;
use fury::discovery::LlmClient;
use fury::enrich::HttpFetcher;
use fury::events::{EventSink, ImportEvent};
use fury::export::{attachment_filename, render, ExportFormat};
use fury::import::{ImportOptions, Importer};
use fury::rest::{self, AppState};
use fury::store::Store;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "fury",
    about = "Fury — bookmark import, categorization, and export engine",
    version
)]
struct Cli {
    /// Database path (overrides FURY_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides FURY_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Import a Netscape bookmark file
    Import {
        /// Path to the exported bookmark HTML file
        file: PathBuf,
        /// Discover a custom taxonomy instead of using the built-in one
        #[arg(long)]
        discover: bool,
    },
    /// Export the stored corpus
    Export {
        /// Output format (chrome, firefox, safari)
        #[arg(long, default_value = "chrome")]
        format: String,
        /// Output file; defaults to the standard attachment name
        #[arg(long)]
        output: Option<PathBuf>,
        /// Restrict to one category's subtree
        #[arg(long)]
        category: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fury=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let db_path = cli.db.unwrap_or(config.db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let store = Arc::new(Store::open(&db_path).context("failed to open database")?);

    match cli.command {
        Commands::Serve { port } => {
            let state = Arc::new(AppState {
                store,
                fetcher: Arc::new(HttpFetcher::new()),
                llm: LlmClient::from_env().map(Arc::new),
            });
            if state.llm.is_none() {
                info!("ANTHROPIC_API_KEY not set; discovery and assignment use fallbacks");
            }
            rest::serve(state, port.unwrap_or(config.port)).await
        }
        Commands::Import { file, discover } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "bookmarks.html".to_string());

            let importer = Importer::new(
                store,
                Arc::new(HttpFetcher::new()),
                LlmClient::from_env().map(Arc::new),
            );
            let (sink, mut rx) = EventSink::channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    print_event(&event);
                }
            });

            let opts = ImportOptions {
                file_name,
                custom_categories: None,
                replace_categories: false,
                discover,
            };
            let outcome = importer.run(&html, opts, sink).await?;
            let _ = printer.await;

            println!(
                "Imported {} bookmarks ({} new, {} updated, {} skipped, {} failed); session {}",
                outcome.successful,
                outcome.new_bookmarks,
                outcome.updated_bookmarks,
                outcome.skipped,
                outcome.failed,
                outcome.session_id
            );
            Ok(())
        }
        Commands::Export {
            format,
            output,
            category,
        } => {
            let format = ExportFormat::from_str(&format).map_err(anyhow::Error::msg)?;
            let (categories, bookmarks) = store.export_snapshot()?;
            let body = render(&categories, &bookmarks, format, category);
            let path = output.unwrap_or_else(|| PathBuf::from(attachment_filename(format)));
            std::fs::write(&path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} bookmarks to {}", bookmarks.len(), path.display());
            Ok(())
        }
    }
}

fn print_event(event: &ImportEvent) {
    match event {
        ImportEvent::Status(status) => eprintln!("  [{}] {}", status.phase, status.message),
        ImportEvent::Init(init) => eprintln!(
            "  {} in file, {} unique, {} duplicates",
            init.total_in_file, init.unique_bookmarks, init.duplicates_in_file
        ),
        ImportEvent::Progress(progress) => eprintln!(
            "  {}/{} ({}%) {}",
            progress.processed, progress.total, progress.percent, progress.current_bookmark
        ),
        ImportEvent::Skipped(skipped) => {
            eprintln!("  skipped {} ({})", skipped.url, skipped.reason)
        }
        ImportEvent::Complete(_) => {}
        ImportEvent::Error(error) => eprintln!("  error: {}", error.message),
    }
}
