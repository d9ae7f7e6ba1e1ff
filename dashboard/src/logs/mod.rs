//! Session log ingestion
//!
//! Every call is a fresh, read-only scan of the agents' append-only session
//! logs. Nothing is cached between polls and nothing is written back.
//!
//! Failures never propagate out of this module: a corrupt line, an unreadable
//! file or a missing directory simply contributes nothing.

pub mod activity;
pub mod files;
pub mod record;
pub mod status;

pub use activity::{
    aggregate_activity, collect_agent_activity, merge_activity, ActivityFeed, ActivityOptions,
};
pub use files::{most_recent_session_file, recent_session_files, SessionFile};
pub use record::{ActivityEntry, LogLine, RecordParser};
pub use status::{
    agent_status, resolve_status, AgentStatus, AgentStatusSnapshot, AgentStatusView, StatusOptions,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serializer;

/// Render a timestamp the way the dashboard emits them (`2026-01-17T14:30:00.000Z`)
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Offset-less ISO-8601 forms accepted after RFC 3339
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp from a log record.
///
/// RFC 3339 (with an offset) is tried first. Date-times without an offset
/// and bare dates are read as UTC; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Interpret a numeric timestamp as epoch milliseconds
pub fn timestamp_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

pub(crate) fn serialize_iso<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_timestamp(at))
}

pub(crate) fn serialize_iso_opt<S: Serializer>(
    at: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serialize_iso(at, s),
        None => s.serialize_none(),
    }
}
