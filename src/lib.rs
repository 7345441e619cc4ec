// Copyright 2026 Fury Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fury core — bookmark import, categorization, and export engine.
//!
//! Ingests Netscape bookmark archives, deduplicates by canonical URL,
//! enriches from the live pages, categorizes with a weighted rule
//! taxonomy or an LLM-discovered custom hierarchy, persists to SQLite,
//! and exports back out in browser-native formats.

pub mod classify;
pub mod config;
pub mod discovery;
pub mod enrich;
pub mod error;
pub mod events;
pub mod export;
pub mod import;
pub mod ingest;
pub mod rest;
pub mod store;
pub mod text;
