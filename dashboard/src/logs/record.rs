//! Session log record parsing
//!
//! A session log line is a JSON object. Only `message` records written by the
//! assistant or the user are surfaced; anything else (other record types,
//! malformed JSON, operational chatter) is rejected silently.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{iso_timestamp, parse_timestamp, timestamp_from_millis};
use crate::roster::Agent;

/// Truncation limit for entries in the activity feed
pub const FEED_MAX_CHARS: usize = 300;
/// Truncation limit for the last message shown on a status badge
pub const STATUS_MAX_CHARS: usize = 200;

const MIN_TEXT_CHARS: usize = 5;
const HEARTBEAT_PREFIX: &str = "HEARTBEAT_OK";
const ANNOUNCE_MARKER: &str = "Queued announce";
const ELLIPSIS: char = '…';

/// One raw line of a session log.
///
/// Fields with an unexpected JSON shape are treated as absent rather than
/// failing the whole line.
#[derive(Debug, Default, Deserialize)]
pub struct LogLine {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<LogMessage>,
}

/// The `message` payload of a log line
#[derive(Debug, Default, Deserialize)]
pub struct LogMessage {
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    /// Either a plain string or an ordered list of typed content blocks
    #[serde(default)]
    pub content: Option<Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl LogLine {
    /// Parse one raw line, `None` if it is not a JSON object
    pub fn parse(line: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!("Skipping malformed log line: {}", e);
                return None;
            }
        };
        // Arrays would otherwise bind to the fields positionally
        if !value.is_object() {
            tracing::trace!("Skipping non-object log line");
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn is_message(&self) -> bool {
        self.kind.as_deref() == Some("message")
    }

    /// Role of a `message` record
    pub fn role(&self) -> Option<&str> {
        self.message.as_ref()?.role.as_deref()
    }

    /// The record's own identifier, if it carries a usable one
    pub fn record_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether the record carries a timestamp at all, parsable or not
    pub fn has_timestamp(&self) -> bool {
        match &self.timestamp {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// The timestamp as it should appear in the feed: strings verbatim,
    /// epoch-millisecond numbers rendered as ISO-8601
    pub fn timestamp_text(&self) -> Option<String> {
        match self.timestamp.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n
                .as_f64()
                .and_then(timestamp_from_millis)
                .map(|at| iso_timestamp(&at)),
            _ => None,
        }
    }

    /// The timestamp as an instant, if it can be interpreted as one
    pub fn timestamp_instant(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => n.as_f64().and_then(timestamp_from_millis),
            _ => None,
        }
    }

    /// Display text of a `message` record, untruncated
    pub fn message_text(&self) -> Option<&str> {
        if !self.is_message() {
            return None;
        }
        extract_text(self.message.as_ref()?.content.as_ref()?)
    }

    /// Display text of an assistant `message` record, untruncated
    pub fn assistant_text(&self) -> Option<&str> {
        if self.role() != Some("assistant") {
            return None;
        }
        self.message_text()
    }
}

/// Extract display text from message content.
///
/// A string is used verbatim. For a list of blocks, the first `text` block
/// with non-blank text wins, trimmed. Empty results are `None`.
pub fn extract_text(content: &Value) -> Option<&str> {
    let text = match content {
        Value::String(s) => s.as_str(),
        Value::Array(blocks) => blocks.iter().find_map(|block| {
            if block.get("type").and_then(Value::as_str) != Some("text") {
                return None;
            }
            let text = block.get("text")?.as_str()?.trim();
            (!text.is_empty()).then_some(text)
        })?,
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Heartbeat probes and queued-announce notices are operational chatter
pub fn is_noise(text: &str) -> bool {
    text.starts_with(HEARTBEAT_PREFIX) || (text.starts_with('[') && text.contains(ANNOUNCE_MARKER))
}

/// Cut `text` to at most `max_chars` characters.
///
/// Over-long text keeps its first `max_chars - 1` characters, drops trailing
/// whitespace and ends in an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.char_indices().nth(max_chars).is_none() {
        return text.to_string();
    }
    let Some(keep) = max_chars.checked_sub(1) else {
        return String::new();
    };
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let mut out = text[..cut].trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// One message surfaced in the activity feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Stable across polls while the underlying line is unchanged
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_color: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ActivityEntry {
    pub fn timestamp_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Turns raw lines of one agent's session log into activity entries
#[derive(Debug, Clone)]
pub struct RecordParser<'a> {
    agent: &'a Agent,
    max_chars: usize,
    now: DateTime<Utc>,
}

impl<'a> RecordParser<'a> {
    /// `now` stands in for records without a timestamp, so such entries
    /// sort to the top of a newest-first feed.
    pub fn new(agent: &'a Agent, max_chars: usize, now: DateTime<Utc>) -> Self {
        Self {
            agent,
            max_chars,
            now,
        }
    }

    /// Parse one line. `file_name` and `index` (position among the file's
    /// non-blank lines) build the fallback id for records without their own.
    pub fn parse(&self, line: &str, file_name: &str, index: usize) -> Option<ActivityEntry> {
        let record = LogLine::parse(line)?;
        if !record.is_message() {
            return None;
        }

        let role = record.role().filter(|r| matches!(*r, "assistant" | "user"))?;
        let text = record.message_text()?;
        if text.chars().count() < MIN_TEXT_CHARS || is_noise(text) {
            return None;
        }

        let id = match record.record_id() {
            Some(record_id) => format!("{}-{}", self.agent.id, record_id),
            None => format!("{}-{}-{}", self.agent.id, file_name, index),
        };

        Some(ActivityEntry {
            id,
            agent_id: self.agent.id.clone(),
            agent_name: self.agent.name.clone(),
            agent_color: self.agent.color.clone(),
            role: role.to_string(),
            content: truncate(text, self.max_chars),
            timestamp: record
                .timestamp_text()
                .unwrap_or_else(|| iso_timestamp(&self.now)),
            model: record.model.clone(),
        })
    }
}
