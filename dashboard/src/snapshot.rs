//! Business snapshot
//!
//! Coarse counters scraped from free-form markdown notes. These are
//! heuristics over text patterns, not a markdown parser: the notes have no
//! guaranteed structure and the numbers are approximate by nature.
//!
//! Like the log engine, every read is best-effort. A missing or unreadable
//! document counts as empty.

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TOTAL_LEADS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total Leads Found[:\s]+(\d+)").expect("Invalid total leads regex")
});
static LEAD_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+Lead").expect("Invalid lead heading regex"));
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+").expect("Invalid heading regex"));
static H2_OR_H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{2,3}\s+").expect("Invalid heading regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*]\s+").expect("Invalid bullet regex"));
static H2_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+(.+)").expect("Invalid heading regex"));

/// Where the snapshot's documents live
#[derive(Debug, Clone)]
pub struct SnapshotSources {
    pub leads_log: PathBuf,
    pub properties_log: PathBuf,
    pub ideas_log: PathBuf,
    pub business_log: PathBuf,
    pub memory_dir: PathBuf,
}

impl SnapshotSources {
    /// Standard layout: leads live in the business workspace, everything
    /// else in the main workspace
    pub fn from_workspaces(workspace_main: &Path, workspace_business: &Path) -> Self {
        Self {
            leads_log: workspace_business.join("leads.md"),
            properties_log: workspace_main.join("properties.md"),
            ideas_log: workspace_main.join("ideas.md"),
            business_log: workspace_main.join("business-log.md"),
            memory_dir: workspace_main.join("memory"),
        }
    }
}

/// Heuristic business counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSnapshot {
    #[serde(rename = "leads")]
    pub leads_count: u64,
    #[serde(rename = "properties")]
    pub properties_count: usize,
    #[serde(rename = "ideas")]
    pub ideas_count: usize,
    #[serde(rename = "memoryFiles")]
    pub memory_file_count: usize,
    /// Text of the last `##` heading in the business log
    pub last_log_entry: Option<String>,
}

fn read_document(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// A "Total Leads Found: N" marker wins; otherwise count `## Lead` headings
pub fn count_leads(content: &str) -> u64 {
    let total = TOTAL_LEADS_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    match total {
        Some(total) => total,
        None => LEAD_HEADING_RE.find_iter(content).count() as u64,
    }
}

/// Every level-2 heading is one property
pub fn count_properties(content: &str) -> usize {
    H2_RE.find_iter(content).count()
}

/// Level-2/3 headings, or top-level bullets when there are no headings
pub fn count_ideas(content: &str) -> usize {
    match H2_OR_H3_RE.find_iter(content).count() {
        0 => BULLET_RE.find_iter(content).count(),
        headings => headings,
    }
}

/// The last level-2 heading in document order
pub fn last_log_entry(content: &str) -> Option<String> {
    H2_TEXT_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|m| m.as_str().trim().to_string())
}

/// Number of markdown files in `dir`
pub fn count_markdown_files(dir: &Path) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".md"))
            .count(),
        Err(e) => {
            tracing::debug!("Cannot list memory directory {}: {}", dir.display(), e);
            0
        }
    }
}

/// Build the snapshot from the configured documents
pub fn extract_snapshot(sources: &SnapshotSources) -> BusinessSnapshot {
    let leads = read_document(&sources.leads_log);
    let properties = read_document(&sources.properties_log);
    let ideas = read_document(&sources.ideas_log);
    let business_log = read_document(&sources.business_log);

    BusinessSnapshot {
        leads_count: leads.as_deref().map(count_leads).unwrap_or(0),
        properties_count: properties.as_deref().map(count_properties).unwrap_or(0),
        ideas_count: ideas.as_deref().map(count_ideas).unwrap_or(0),
        memory_file_count: count_markdown_files(&sources.memory_dir),
        last_log_entry: business_log.as_deref().and_then(last_log_entry),
    }
}
