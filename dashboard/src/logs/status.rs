//! Per-agent liveness
//!
//! An agent's status is derived from the tail of its most recent session log:
//! the newest timestamp seen decides how long ago the agent was last heard
//! from, and the newest assistant message becomes its status line.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::path::Path;

use super::files::{most_recent_session_file, tail_lines};
use super::record::{truncate, LogLine, STATUS_MAX_CHARS};
use super::serialize_iso_opt;
use crate::roster::Agent;

/// Liveness classification of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Idle,
    Offline,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Thresholds and limits for status resolution
#[derive(Debug, Clone, Copy)]
pub struct StatusOptions {
    /// How many trailing lines of the session log to inspect
    pub tail_lines: usize,
    /// Truncation limit for the last message
    pub max_chars: usize,
    /// Signals newer than this are `active`
    pub active_within: Duration,
    /// Signals newer than this (but not active) are `idle`
    pub idle_within: Duration,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            tail_lines: 10,
            max_chars: STATUS_MAX_CHARS,
            active_within: Duration::minutes(5),
            idle_within: Duration::minutes(30),
        }
    }
}

impl AgentStatus {
    /// Classify by time elapsed since the last signal
    pub fn classify(
        now: DateTime<Utc>,
        last_active: Option<DateTime<Utc>>,
        options: &StatusOptions,
    ) -> Self {
        let Some(last_active) = last_active else {
            return AgentStatus::Offline;
        };
        let elapsed = now - last_active;
        if elapsed < options.active_within {
            AgentStatus::Active
        } else if elapsed < options.idle_within {
            AgentStatus::Idle
        } else {
            AgentStatus::Offline
        }
    }
}

/// Status of one agent as of one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusSnapshot {
    pub status: AgentStatus,
    #[serde(serialize_with = "serialize_iso_opt")]
    pub last_active_at: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    /// File name of the session log the status was read from
    #[serde(rename = "sessionFile")]
    pub source_file: Option<String>,
}

impl AgentStatusSnapshot {
    pub fn offline() -> Self {
        Self {
            status: AgentStatus::Offline,
            last_active_at: None,
            last_message: None,
            source_file: None,
        }
    }
}

/// An agent's status together with its display identity
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusView {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(flatten)]
    pub snapshot: AgentStatusSnapshot,
}

impl AgentStatusView {
    pub fn new(agent: &Agent, snapshot: AgentStatusSnapshot) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            color: agent.color.clone(),
            snapshot,
        }
    }
}

/// First-match accumulators for the backward tail scan
#[derive(Debug, Default)]
struct TailSignals {
    /// Set by the newest line carrying a `timestamp` field
    timestamp_seen: bool,
    /// `None` when that timestamp could not be interpreted
    last_timestamp: Option<DateTime<Utc>>,
    last_message: Option<String>,
}

impl TailSignals {
    /// Scan lines newest-first, parsing each once. A single line may supply
    /// both the timestamp and the message.
    fn scan(lines: &[String], max_chars: usize) -> Self {
        let mut signals = Self::default();
        for line in lines.iter().rev() {
            if signals.timestamp_seen && signals.last_message.is_some() {
                break;
            }
            let Some(record) = LogLine::parse(line) else {
                continue;
            };
            if !signals.timestamp_seen && record.has_timestamp() {
                signals.timestamp_seen = true;
                signals.last_timestamp = record.timestamp_instant();
            }
            if signals.last_message.is_none() {
                signals.last_message = record.assistant_text().map(|text| truncate(text, max_chars));
            }
        }
        signals
    }
}

/// Resolve the status of the agent whose session logs live in `session_dir`
pub fn resolve_status(
    session_dir: &Path,
    now: DateTime<Utc>,
    options: &StatusOptions,
) -> AgentStatusSnapshot {
    let Some(session) = most_recent_session_file(session_dir) else {
        return AgentStatusSnapshot::offline();
    };

    let lines = tail_lines(&session.path, options.tail_lines);
    let signals = TailSignals::scan(&lines, options.max_chars);

    // A missing or unreadable newest timestamp falls back to the file's mtime,
    // never to an older line
    let last_active = signals
        .last_timestamp
        .unwrap_or_else(|| session.modified_at());

    AgentStatusSnapshot {
        status: AgentStatus::classify(now, Some(last_active), options),
        last_active_at: Some(last_active),
        last_message: signals.last_message,
        source_file: Some(session.file_name()),
    }
}

/// Resolve one roster agent's status
pub fn agent_status(agent: &Agent, now: DateTime<Utc>, options: &StatusOptions) -> AgentStatusView {
    let snapshot = resolve_status(agent.session_dir(), now, options);
    tracing::debug!(agent = %agent.id, status = %snapshot.status, "Resolved agent status");
    AgentStatusView::new(agent, snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{iso_timestamp, parse_timestamp};
    use serde_json::json;
    use std::fs::{self, File};
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn write_session(dir: &Path, name: &str, lines: &[serde_json::Value]) -> std::path::PathBuf {
        let path = dir.join(name);
        let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_classify_thresholds() {
        let now = now();
        let options = StatusOptions::default();
        let ago = |mins| Some(now - Duration::minutes(mins));

        assert_eq!(AgentStatus::classify(now, ago(2), &options), AgentStatus::Active);
        assert_eq!(AgentStatus::classify(now, ago(10), &options), AgentStatus::Idle);
        assert_eq!(AgentStatus::classify(now, ago(40), &options), AgentStatus::Offline);
        assert_eq!(AgentStatus::classify(now, None, &options), AgentStatus::Offline);
    }

    #[test]
    fn test_classify_boundaries() {
        let now = now();
        let options = StatusOptions::default();
        let ago = |mins| Some(now - Duration::minutes(mins));

        assert_eq!(AgentStatus::classify(now, ago(5), &options), AgentStatus::Idle);
        assert_eq!(AgentStatus::classify(now, ago(30), &options), AgentStatus::Offline);
        // Clock skew: a signal from the future still counts as active
        assert_eq!(AgentStatus::classify(now, ago(-3), &options), AgentStatus::Active);
    }

    #[test]
    fn test_missing_directory_is_offline() {
        let dir = tempdir().unwrap();
        let snapshot = resolve_status(&dir.path().join("missing"), now(), &StatusOptions::default());
        assert_eq!(snapshot, AgentStatusSnapshot::offline());
    }

    #[test]
    fn test_latest_timestamp_and_assistant_message() {
        let dir = tempdir().unwrap();
        let now = now();
        let recent = now - Duration::minutes(2);
        write_session(
            dir.path(),
            "s.jsonl",
            &[
                json!({ "type": "message", "timestamp": iso_timestamp(&(now - Duration::hours(1))),
                        "message": { "role": "assistant", "content": "Older reply" } }),
                json!({ "type": "message", "timestamp": iso_timestamp(&(now - Duration::minutes(3))),
                        "message": { "role": "assistant", "content": [{ "type": "text", "text": "Latest reply" }] } }),
                json!({ "type": "message", "timestamp": iso_timestamp(&(now - Duration::minutes(2))),
                        "message": { "role": "user", "content": "thanks, carry on" } }),
                json!({ "type": "tool_result", "timestamp": iso_timestamp(&recent) }),
            ],
        );

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Active);
        assert_eq!(
            snapshot.last_active_at.map(|t| iso_timestamp(&t)),
            Some(iso_timestamp(&recent))
        );
        assert_eq!(snapshot.last_message.as_deref(), Some("Latest reply"));
        assert_eq!(snapshot.source_file.as_deref(), Some("s.jsonl"));
    }

    #[test]
    fn test_one_line_can_supply_both_signals() {
        let dir = tempdir().unwrap();
        let now = now();
        write_session(
            dir.path(),
            "s.jsonl",
            &[json!({ "type": "message", "timestamp": iso_timestamp(&(now - Duration::minutes(12))),
                      "message": { "role": "assistant", "content": "Waiting on CI" } })],
        );

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Idle);
        assert_eq!(snapshot.last_message.as_deref(), Some("Waiting on CI"));
    }

    #[test]
    fn test_only_tail_window_is_inspected() {
        let dir = tempdir().unwrap();
        let now = now();
        let mut lines = vec![json!({ "type": "message", "timestamp": iso_timestamp(&now),
                                     "message": { "role": "assistant", "content": "Buried message" } })];
        for _ in 0..10 {
            lines.push(json!({ "type": "message", "timestamp": iso_timestamp(&(now - Duration::minutes(45))),
                               "message": { "role": "user", "content": "user chatter" } }));
        }
        write_session(dir.path(), "s.jsonl", &lines);

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Offline);
        assert!(snapshot.last_message.is_none());
    }

    #[test]
    fn test_falls_back_to_file_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        fs::write(&path, "not json\n{\"type\":\"message\",\"timestamp\":\"garbled\"}\n").unwrap();
        let mtime = SystemTime::now() - std::time::Duration::from_secs(15 * 60);
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();

        let snapshot = resolve_status(dir.path(), now(), &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Idle);
        let drift = snapshot.last_active_at.unwrap() - DateTime::<Utc>::from(mtime);
        assert!(drift.num_seconds().abs() <= 1);
        assert!(snapshot.last_message.is_none());
    }

    #[test]
    fn test_unreadable_newest_timestamp_uses_mtime_not_older_lines() {
        let dir = tempdir().unwrap();
        let now = now();
        let path = write_session(
            dir.path(),
            "s.jsonl",
            &[
                json!({ "type": "message", "timestamp": "2020-01-01T00:00:00Z",
                        "message": { "role": "assistant", "content": "Years old" } }),
                json!({ "type": "tool_result", "timestamp": "sometime today" }),
            ],
        );
        let mtime = SystemTime::now() - std::time::Duration::from_secs(60);
        File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Active);
        let drift = snapshot.last_active_at.unwrap() - DateTime::<Utc>::from(mtime);
        assert!(drift.num_seconds().abs() <= 1);
        assert_eq!(snapshot.last_message.as_deref(), Some("Years old"));
    }

    #[test]
    fn test_offsetless_timestamp_keeps_agent_active() {
        let dir = tempdir().unwrap();
        let now = now();
        let recent = (now - Duration::minutes(1)).format("%Y-%m-%dT%H:%M:%S").to_string();
        write_session(
            dir.path(),
            "s.jsonl",
            &[
                json!({ "type": "message", "timestamp": "2020-01-01T00:00:00Z",
                        "message": { "role": "assistant", "content": "Years old" } }),
                json!({ "type": "message", "timestamp": &recent,
                        "message": { "role": "assistant", "content": "Just now" } }),
            ],
        );

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        assert_eq!(snapshot.status, AgentStatus::Active);
        assert_eq!(snapshot.last_active_at, parse_timestamp(&recent));
        assert_eq!(snapshot.last_message.as_deref(), Some("Just now"));
    }

    #[test]
    fn test_status_message_truncated_to_status_limit() {
        let dir = tempdir().unwrap();
        let now = now();
        write_session(
            dir.path(),
            "s.jsonl",
            &[json!({ "type": "message", "timestamp": iso_timestamp(&now),
                      "message": { "role": "assistant", "content": "z".repeat(400) } })],
        );

        let snapshot = resolve_status(dir.path(), now, &StatusOptions::default());
        let message = snapshot.last_message.unwrap();
        assert_eq!(message.chars().count(), 200);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn test_view_serializes_with_identity() {
        let agent = Agent::new("jarvis", "Jarvis", "#63D866", "/nonexistent");
        let at = parse_timestamp("2026-01-17T12:00:00Z").unwrap();
        let view = AgentStatusView::new(
            &agent,
            AgentStatusSnapshot {
                status: AgentStatus::Idle,
                last_active_at: Some(at),
                last_message: Some("Working".to_string()),
                source_file: Some("s.jsonl".to_string()),
            },
        );

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "jarvis",
                "name": "Jarvis",
                "color": "#63D866",
                "status": "idle",
                "lastActiveAt": "2026-01-17T12:00:00.000Z",
                "lastMessage": "Working",
                "sessionFile": "s.jsonl"
            })
        );
    }
}
