//! Memory digest
//!
//! Today's daily memory note, the tail of the long-term memory file and the
//! age of the overnight log. Read-only and best-effort like everything else.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logs::serialize_iso_opt;

/// Long-term memory is cut to its last this-many characters
pub const LONG_TERM_TAIL_CHARS: usize = 500;

/// Where the memory documents live
#[derive(Debug, Clone)]
pub struct MemorySources {
    /// Directory of dated daily notes (`YYYY-MM-DD.md`)
    pub memory_dir: PathBuf,
    pub long_term: PathBuf,
    pub overnight_log: PathBuf,
}

impl MemorySources {
    pub fn from_workspace(workspace_main: &Path) -> Self {
        Self {
            memory_dir: workspace_main.join("memory"),
            long_term: workspace_main.join("MEMORY.md"),
            overnight_log: workspace_main.join("overnight-log.md"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyNote {
    pub date: String,
    pub content: Option<String>,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongTermNote {
    pub content: Option<String>,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OvernightLog {
    /// Modification time in epoch milliseconds
    pub mtime: Option<i64>,
    #[serde(serialize_with = "serialize_iso_opt")]
    pub mtime_iso: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDigest {
    pub today: DailyNote,
    pub long_term: LongTermNote,
    pub overnight_log: OvernightLog,
}

fn read_document(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .map_err(|e| tracing::debug!("Cannot read {}: {}", path.display(), e))
        .ok()
}

/// Keep the last `max_chars` characters, marking the cut with a leading ellipsis
fn tail_chars(content: String, max_chars: usize) -> String {
    let total = content.chars().count();
    if total <= max_chars {
        return content;
    }
    let skip = total - max_chars;
    let start = content
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    format!("…{}", &content[start..])
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

/// Gather the digest for `today` (a local calendar date)
pub fn read_memory_digest(sources: &MemorySources, today: NaiveDate) -> MemoryDigest {
    let date = today.format("%Y-%m-%d").to_string();
    let today_content = read_document(&sources.memory_dir.join(format!("{date}.md")));
    let long_term = read_document(&sources.long_term).map(|c| tail_chars(c, LONG_TERM_TAIL_CHARS));
    let overnight = modified_at(&sources.overnight_log);

    MemoryDigest {
        today: DailyNote {
            date,
            exists: today_content.is_some(),
            content: today_content,
        },
        long_term: LongTermNote {
            exists: long_term.is_some(),
            content: long_term,
        },
        overnight_log: OvernightLog {
            mtime: overnight.map(|at| at.timestamp_millis()),
            mtime_iso: overnight,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("short".to_string(), 10), "short");
        assert_eq!(tail_chars("abcdefghij".to_string(), 4), "…ghij");
    }

    #[test]
    fn test_digest_reads_today_and_long_term() {
        let dir = tempdir().unwrap();
        let memory = dir.path().join("memory");
        fs::create_dir(&memory).unwrap();
        fs::write(memory.join("2026-01-17.md"), "# Today\n- shipped").unwrap();
        fs::write(memory.join("2026-01-16.md"), "# Yesterday").unwrap();
        fs::write(dir.path().join("MEMORY.md"), "x".repeat(600)).unwrap();
        fs::write(dir.path().join("overnight-log.md"), "ran").unwrap();

        let sources = MemorySources::from_workspace(dir.path());
        let today = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
        let digest = read_memory_digest(&sources, today);

        assert_eq!(digest.today.date, "2026-01-17");
        assert!(digest.today.exists);
        assert_eq!(digest.today.content.as_deref(), Some("# Today\n- shipped"));

        let long_term = digest.long_term.content.unwrap();
        assert!(long_term.starts_with('…'));
        assert_eq!(long_term.chars().count(), LONG_TERM_TAIL_CHARS + 1);

        assert!(digest.overnight_log.mtime.is_some());
        assert!(digest.overnight_log.mtime_iso.is_some());
    }

    #[test]
    fn test_missing_documents_degrade_to_null() {
        let dir = tempdir().unwrap();
        let sources = MemorySources::from_workspace(dir.path());
        let today = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
        let digest = read_memory_digest(&sources, today);

        assert!(!digest.today.exists);
        assert!(digest.today.content.is_none());
        assert!(!digest.long_term.exists);
        assert_eq!(digest.overnight_log.mtime, None);

        let value = serde_json::to_value(&digest).unwrap();
        assert!(value["overnightLog"]["mtimeIso"].is_null());
        assert!(value["longTerm"]["content"].is_null());
    }
}
