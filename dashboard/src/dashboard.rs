//! Poll entry points shared by the HTTP handlers and the CLI
//!
//! Each call is an independent, side-effect-free scan. Per-agent work runs on
//! the blocking pool, one task per agent; results are joined back in roster
//! order so output stays deterministic. A task that dies contributes nothing
//! for its agent rather than failing the poll.

use chrono::{Local, Utc};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinError};

use crate::config::DashboardConfig;
use crate::error::ConfigError;
use crate::logs::{
    agent_status, collect_agent_activity, merge_activity, ActivityFeed, ActivityOptions,
    AgentStatusSnapshot, AgentStatusView, StatusOptions,
};
use crate::memory::{read_memory_digest, MemoryDigest, MemorySources};
use crate::roster::Roster;
use crate::snapshot::{extract_snapshot, BusinessSnapshot, SnapshotSources};
use crate::system::{check_services, collect_stats, ServiceTarget, SystemHealth};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// What the system panel probes
#[derive(Debug, Clone)]
struct HealthProbe {
    services: Vec<ServiceTarget>,
    disk_mount: PathBuf,
    timeout: Duration,
}

/// Read-only view over the fleet's logs and notes
#[derive(Debug, Clone)]
pub struct Dashboard {
    roster: Arc<Roster>,
    activity: ActivityOptions,
    status: StatusOptions,
    snapshot: Arc<SnapshotSources>,
    memory: Arc<MemorySources>,
    health: Arc<HealthProbe>,
}

impl Dashboard {
    pub fn new(
        roster: Roster,
        activity: ActivityOptions,
        status: StatusOptions,
        snapshot: SnapshotSources,
        memory: MemorySources,
    ) -> Self {
        Self {
            roster: Arc::new(roster),
            activity,
            status,
            snapshot: Arc::new(snapshot),
            memory: Arc::new(memory),
            health: Arc::new(HealthProbe {
                services: Vec::new(),
                disk_mount: PathBuf::from("/"),
                timeout: DEFAULT_PROBE_TIMEOUT,
            }),
        }
    }

    /// Set the services and mount point reported by [`Dashboard::system_health`]
    pub fn with_health(
        mut self,
        services: Vec<ServiceTarget>,
        disk_mount: PathBuf,
        timeout: Duration,
    ) -> Self {
        self.health = Arc::new(HealthProbe {
            services,
            disk_mount,
            timeout,
        });
        self
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.roster()?,
            config.activity_options(),
            config.status_options()?,
            config.snapshot_sources(),
            config.memory_sources(),
        )
        .with_health(
            config.service_targets(),
            config.disk_mount(),
            config.probe_timeout(),
        ))
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Aggregate the activity feed across all agents
    pub async fn activity(&self) -> ActivityFeed {
        self.activity_with_cap(self.activity.cap).await
    }

    /// Aggregate the activity feed with a caller-chosen cap
    pub async fn activity_with_cap(&self, cap: usize) -> ActivityFeed {
        let now = Utc::now();
        let options = self.activity;

        let tasks = self.roster.iter().cloned().map(|agent| {
            task::spawn_blocking(move || collect_agent_activity(&agent, now, &options))
        });
        let results = join_all(tasks).await;

        let per_agent = results
            .into_iter()
            .zip(self.roster.iter())
            .map(|(result, agent)| {
                result.unwrap_or_else(|e| {
                    tracing::warn!(agent = %agent.id, "Activity scan failed: {}", e);
                    Vec::new()
                })
            });
        merge_activity(per_agent, cap)
    }

    /// Resolve every agent's liveness, in roster order
    pub async fn agent_statuses(&self) -> Vec<AgentStatusView> {
        let now = Utc::now();
        let options = self.status;

        let tasks = self.roster.iter().cloned().map(|agent| {
            task::spawn_blocking(move || agent_status(&agent, now, &options))
        });
        let results = join_all(tasks).await;

        results
            .into_iter()
            .zip(self.roster.iter())
            .map(|(result, agent)| {
                result.unwrap_or_else(|e| {
                    tracing::warn!(agent = %agent.id, "Status scan failed: {}", e);
                    AgentStatusView::new(agent, AgentStatusSnapshot::offline())
                })
            })
            .collect()
    }

    /// Scrape the business counters
    pub async fn snapshot(&self) -> Result<BusinessSnapshot, JoinError> {
        let sources = Arc::clone(&self.snapshot);
        task::spawn_blocking(move || extract_snapshot(&sources)).await
    }

    /// Read the memory digest for the current local date
    pub async fn memory(&self) -> Result<MemoryDigest, JoinError> {
        let sources = Arc::clone(&self.memory);
        let today = Local::now().date_naive();
        task::spawn_blocking(move || read_memory_digest(&sources, today)).await
    }

    /// Sample host stats and probe companion services concurrently
    pub async fn system_health(&self) -> Result<SystemHealth, JoinError> {
        let probe = Arc::clone(&self.health);
        let stats = task::spawn_blocking(move || collect_stats(&probe.disk_mount));
        let services = check_services(&self.health.services, self.health.timeout);

        let (stats, services) = tokio::join!(stats, services);
        Ok(SystemHealth {
            stats: stats?,
            services,
        })
    }
}
