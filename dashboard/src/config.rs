//! Configuration loading

use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::logs::{ActivityOptions, StatusOptions};
use crate::memory::MemorySources;
use crate::roster::{Agent, Roster, DEFAULT_AGENT_COLOR};
use crate::snapshot::SnapshotSources;
use crate::system::ServiceTarget;

/// Config file name searched for on disk
pub const CONFIG_FILE_NAME: &str = ".dashboard.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/fleet-dashboard/
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("fleet-dashboard").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Expand a leading `~` (and `$VARS`) in a configured path
fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!("Could not expand path '{}': {}", raw, e);
            PathBuf::from(shellexpand::tilde(raw).as_ref())
        }
    }
}

/// A liveness threshold in seconds, rejected if chrono cannot represent it
fn threshold(key: &'static str, secs: i64) -> Result<TimeDelta, ConfigError> {
    TimeDelta::try_seconds(secs).ok_or(ConfigError::InvalidDuration { key, secs })
}

// ============================================================================
// Dashboard Configuration (.dashboard.toml)
// ============================================================================

/// Top-level dashboard configuration
#[derive(Debug, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub activity: ActivitySection,
    #[serde(default)]
    pub status: StatusSection,
    #[serde(default)]
    pub health: HealthSection,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentEntry>,
}

/// HTTP server section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Filesystem locations read by the engine
#[derive(Debug, Deserialize)]
pub struct PathsSection {
    /// Parent of each agent's `<id>/sessions` directory
    #[serde(default = "default_agents_base")]
    pub agents_base: String,
    #[serde(default = "default_workspace_main")]
    pub workspace_main: String,
    #[serde(default = "default_workspace_business")]
    pub workspace_business: String,
}

/// Activity feed section
#[derive(Debug, Deserialize)]
pub struct ActivitySection {
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
    #[serde(default = "default_cap")]
    pub cap: usize,
    #[serde(default = "default_feed_chars")]
    pub max_chars: usize,
}

/// Liveness section
#[derive(Debug, Deserialize)]
pub struct StatusSection {
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
    #[serde(default = "default_status_chars")]
    pub max_chars: usize,
    #[serde(default = "default_active_secs")]
    pub active_secs: i64,
    #[serde(default = "default_idle_secs")]
    pub idle_secs: i64,
}

/// System health section
#[derive(Debug, Deserialize)]
pub struct HealthSection {
    /// Mount point whose filesystem usage is reported
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
    /// Connect timeout for each service probe
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceEntry>,
}

/// One `[[health.services]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    /// `host:port`
    pub address: String,
}

/// One `[[agents]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AgentEntry {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    /// Overrides `<agents_base>/<id>/sessions`
    pub session_dir: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_agents_base() -> String {
    "~/.openclaw/agents".to_string()
}

fn default_workspace_main() -> String {
    "~/.openclaw/workspace-main".to_string()
}

fn default_workspace_business() -> String {
    "~/.openclaw/workspace-business".to_string()
}

fn default_window_hours() -> u64 {
    24
}

fn default_cap() -> usize {
    50
}

fn default_feed_chars() -> usize {
    crate::logs::record::FEED_MAX_CHARS
}

fn default_tail_lines() -> usize {
    10
}

fn default_status_chars() -> usize {
    crate::logs::record::STATUS_MAX_CHARS
}

fn default_active_secs() -> i64 {
    5 * 60
}

fn default_idle_secs() -> i64 {
    30 * 60
}

fn default_disk_mount() -> String {
    "/".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_services() -> Vec<ServiceEntry> {
    [("gateway", "127.0.0.1:18789"), ("ollama", "127.0.0.1:11434")]
        .into_iter()
        .map(|(name, address)| ServiceEntry {
            name: name.to_string(),
            address: address.to_string(),
        })
        .collect()
}

fn default_agents() -> Vec<AgentEntry> {
    [
        ("jarvis", "Jarvis", "#63D866"),
        ("codebot", "CodeBot", "#3A7BC8"),
        ("reviewbot", "ReviewBot", "#B49A60"),
        ("bizbot", "BizBot", "#9AED9C"),
    ]
    .into_iter()
    .map(|(id, name, color)| AgentEntry {
        id: id.to_string(),
        name: Some(name.to_string()),
        color: Some(color.to_string()),
        session_dir: None,
    })
    .collect()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            agents_base: default_agents_base(),
            workspace_main: default_workspace_main(),
            workspace_business: default_workspace_business(),
        }
    }
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            cap: default_cap(),
            max_chars: default_feed_chars(),
        }
    }
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            tail_lines: default_tail_lines(),
            max_chars: default_status_chars(),
            active_secs: default_active_secs(),
            idle_secs: default_idle_secs(),
        }
    }
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            disk_mount: default_disk_mount(),
            timeout_ms: default_probe_timeout_ms(),
            services: default_services(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            paths: PathsSection::default(),
            activity: ActivitySection::default(),
            status: StatusSection::default(),
            health: HealthSection::default(),
            agents: default_agents(),
        }
    }
}

impl DashboardConfig {
    /// Load config from .dashboard.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .dashboard.toml
    /// 2. Check ~/.config/fleet-dashboard/.dashboard.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(config_path) = find_config_file(CONFIG_FILE_NAME) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Build the agent roster, resolving session directories
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        let agents_base = expand_path(&self.paths.agents_base);
        let mut seen = HashSet::new();
        let mut agents = Vec::with_capacity(self.agents.len());

        for entry in &self.agents {
            let id = entry.id.trim();
            if id.is_empty() {
                return Err(ConfigError::EmptyAgentId);
            }
            if !seen.insert(id.to_string()) {
                return Err(ConfigError::DuplicateAgent(id.to_string()));
            }

            let session_dir = match &entry.session_dir {
                Some(dir) => expand_path(dir),
                None => agents_base.join(id).join("sessions"),
            };
            agents.push(Agent::new(
                id,
                entry.name.clone().unwrap_or_else(|| id.to_string()),
                entry
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AGENT_COLOR.to_string()),
                session_dir,
            ));
        }

        Ok(Roster::new(agents))
    }

    pub fn activity_options(&self) -> ActivityOptions {
        ActivityOptions {
            window: Duration::from_secs(self.activity.window_hours.saturating_mul(3600)),
            cap: self.activity.cap,
            max_chars: self.activity.max_chars,
        }
    }

    pub fn status_options(&self) -> Result<StatusOptions, ConfigError> {
        Ok(StatusOptions {
            tail_lines: self.status.tail_lines,
            max_chars: self.status.max_chars,
            active_within: threshold("status.active_secs", self.status.active_secs)?,
            idle_within: threshold("status.idle_secs", self.status.idle_secs)?,
        })
    }

    pub fn snapshot_sources(&self) -> SnapshotSources {
        SnapshotSources::from_workspaces(
            &expand_path(&self.paths.workspace_main),
            &expand_path(&self.paths.workspace_business),
        )
    }

    pub fn memory_sources(&self) -> MemorySources {
        MemorySources::from_workspace(&expand_path(&self.paths.workspace_main))
    }

    pub fn service_targets(&self) -> Vec<ServiceTarget> {
        self.health
            .services
            .iter()
            .map(|service| ServiceTarget::new(&service.name, &service.address))
            .collect()
    }

    pub fn disk_mount(&self) -> PathBuf {
        expand_path(&self.health.disk_mount)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health.timeout_ms)
    }
}
