//! Custom-taxonomy discovery and LLM batch assignment.
//!
//! The primary path asks the LLM to synthesize a category hierarchy from
//! a bookmark sample; the fallback path clusters deterministically by
//! folder, domain, and keyword frequency. Either way the result is a
//! [`DiscoveredCategory`] forest that the persistence layer writes
//! parent-first.

pub mod assign;
pub mod cluster;
pub mod discover;
pub mod hierarchy;
pub mod llm;

use serde::{Deserialize, Serialize};

pub use assign::{batch_assign, AssignmentOutcome};
pub use discover::discover_taxonomy;
pub use llm::LlmClient;

/// A node of the discovered category tree, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredCategory {
    /// Temporary id, unique within one discovery result.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Temporary id of the parent node, if any.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// 1-based depth; roots are level 1.
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub estimated_count: u32,
    #[serde(default)]
    pub children: Vec<DiscoveredCategory>,
}

/// Which path produced a discovery result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Llm,
    Clustering,
}

/// A discovered forest plus the model's (or heuristic's) rationale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub categories: Vec<DiscoveredCategory>,
    pub reasoning: String,
    pub source: DiscoverySource,
}
