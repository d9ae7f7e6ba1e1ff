//! Multi-agent activity feed
//!
//! Each call rescans every agent's recently modified session logs in full and
//! merges the accepted messages into one newest-first feed. There is no
//! incremental state; this is sized for a handful of agents and polling every
//! few seconds, and becomes the first scaling limit if log volume grows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::time::Duration;

use super::files::{read_lines, recent_session_files, SessionFile};
use super::record::{ActivityEntry, RecordParser, FEED_MAX_CHARS};
use crate::roster::{Agent, Roster};

/// Limits for one aggregation pass
#[derive(Debug, Clone, Copy)]
pub struct ActivityOptions {
    /// Only files modified within this window are scanned
    pub window: Duration,
    /// Maximum number of entries returned
    pub cap: usize,
    /// Truncation limit for entry content
    pub max_chars: usize,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(24 * 60 * 60),
            cap: 50,
            max_chars: FEED_MAX_CHARS,
        }
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Serialize)]
pub struct ActivityFeed {
    /// Newest first, at most `cap` entries
    pub activity: Vec<ActivityEntry>,
    /// Number of entries before truncation
    pub total: usize,
}

fn parse_session_file(parser: &RecordParser<'_>, file: &SessionFile) -> Vec<ActivityEntry> {
    let file_name = file.file_name();
    // Sequential: fallback ids depend on each line's position
    read_lines(&file.path)
        .iter()
        .enumerate()
        .filter_map(|(index, line)| parser.parse(line, &file_name, index))
        .collect()
}

/// All accepted entries from one agent's recent session logs, in file order
pub fn collect_agent_activity(
    agent: &Agent,
    now: DateTime<Utc>,
    options: &ActivityOptions,
) -> Vec<ActivityEntry> {
    let files = recent_session_files(agent.session_dir(), options.window, now.into());
    let parser = RecordParser::new(agent, options.max_chars, now);

    let entries: Vec<ActivityEntry> = files
        .iter()
        .flat_map(|file| parse_session_file(&parser, file))
        .collect();

    tracing::debug!(
        agent = %agent.id,
        files = files.len(),
        entries = entries.len(),
        "Collected agent activity"
    );
    entries
}

/// Merge per-agent entries into one feed.
///
/// Sorted by timestamp, newest first. The sort is stable, so equal
/// timestamps keep encounter order (agent order, then file name, then line).
/// Entries whose timestamp cannot be parsed sort last.
pub fn merge_activity<I>(per_agent: I, cap: usize) -> ActivityFeed
where
    I: IntoIterator<Item = Vec<ActivityEntry>>,
{
    let mut activity: Vec<ActivityEntry> = per_agent.into_iter().flatten().collect();
    activity.sort_by_cached_key(|entry| Reverse(entry.timestamp_instant()));

    let total = activity.len();
    activity.truncate(cap);
    ActivityFeed { activity, total }
}

/// Run one aggregation pass over the whole roster
pub fn aggregate_activity(
    roster: &Roster,
    now: DateTime<Utc>,
    options: &ActivityOptions,
) -> ActivityFeed {
    merge_activity(
        roster
            .iter()
            .map(|agent| collect_agent_activity(agent, now, options)),
        options.cap,
    )
}
