//! Session file selection and reading
//!
//! Directory listings and stats are best-effort: a missing directory, an
//! unreadable entry or a file deleted between listing and stat simply drops
//! out of the result.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Session logs are line-delimited JSON
pub const SESSION_EXTENSION: &str = ".jsonl";

/// A session log file and its last modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl SessionFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.modified)
    }
}

fn is_session_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SESSION_EXTENSION))
}

/// All session logs in `dir`, sorted by file name
fn list_session_files(dir: &Path) -> Vec<SessionFile> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list session directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<SessionFile> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_session_log(path))
        .filter_map(|path| {
            // The file may have been removed since the listing
            let metadata = fs::metadata(&path).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some(SessionFile { path, modified })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Session logs in `dir` modified within `window` of `now`
pub fn recent_session_files(dir: &Path, window: Duration, now: SystemTime) -> Vec<SessionFile> {
    let cutoff = now.checked_sub(window);
    list_session_files(dir)
        .into_iter()
        .filter(|file| cutoff.map_or(true, |cutoff| file.modified > cutoff))
        .collect()
}

/// The session log in `dir` with the latest modification time
pub fn most_recent_session_file(dir: &Path) -> Option<SessionFile> {
    list_session_files(dir)
        .into_iter()
        .max_by_key(|file| file.modified)
}

/// Read a file and split it into its non-blank lines.
///
/// Invalid UTF-8 is replaced rather than failing the file. Unreadable files
/// yield no lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Cannot read session file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    String::from_utf8_lossy(&bytes)
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// The last `n` non-blank lines of a file, in file order
pub fn tail_lines(path: &Path, n: usize) -> Vec<String> {
    let mut lines = read_lines(path);
    let skip = lines.len().saturating_sub(n);
    lines.drain(..skip);
    lines
}
