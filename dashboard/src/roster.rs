//! Agent roster
//!
//! The agents the dashboard observes are static configuration injected at
//! startup. The engine never discovers agents on its own, so the resolver and
//! aggregator can be driven with any roster, including fake ones in tests.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Color used when an agent has none configured
pub const DEFAULT_AGENT_COLOR: &str = "#888";

/// One observed agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color (CSS hex)
    pub color: String,
    /// Directory holding this agent's session logs
    #[serde(skip)]
    pub session_dir: PathBuf,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        session_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            session_dir: session_dir.into(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }
}

/// The ordered set of agents shown on the dashboard.
///
/// Order matters: it is the encounter order used to break timestamp ties in
/// the activity feed, and the order of the status list.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    agents: Vec<Agent>,
}

impl Roster {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
