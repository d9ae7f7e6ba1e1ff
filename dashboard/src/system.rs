//! Host health for the dashboard's system panel
//!
//! Disk, memory and uptime come from `sysinfo`. Companion services are probed
//! with a bounded TCP connect; an unreachable or slow service is simply
//! reported as down.

use futures_util::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Disks, System};
use tokio::net::TcpStream;

/// A companion service whose reachability is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub name: String,
    /// `host:port` to connect to
    pub address: String,
}

impl ServiceTarget {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Usage of the filesystem holding the watched mount point
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
}

/// Physical memory usage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uptime {
    pub seconds: u64,
    /// e.g. "3 days, 2 hours"
    pub human: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub address: String,
    pub reachable: bool,
}

/// Host statistics sampled in one pass
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub disk: Option<DiskUsage>,
    pub memory: Option<MemoryUsage>,
    pub uptime: Uptime,
}

/// Everything the system panel shows
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    #[serde(flatten)]
    pub stats: SystemStats,
    pub services: Vec<ServiceStatus>,
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Disk usage for `mount_point`, falling back to the filesystem with the
/// longest mount point that contains it
pub fn disk_usage(mount_point: &Path) -> Option<DiskUsage> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .iter()
        .filter(|disk| mount_point.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())?;

    let total = disk.total_space();
    let available = disk.available_space();
    let used = total.saturating_sub(available);

    Some(DiskUsage {
        mount_point: disk.mount_point().to_string_lossy().into_owned(),
        total_bytes: total,
        used_bytes: used,
        available_bytes: available,
        usage_percent: percent(used, total),
    })
}

/// Physical memory usage, `None` if the platform reports no memory
pub fn memory_usage() -> Option<MemoryUsage> {
    let mut sys = System::new();
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        return None;
    }
    let used = sys.used_memory();

    Some(MemoryUsage {
        total_bytes: total,
        used_bytes: used,
        available_bytes: sys.available_memory(),
        usage_percent: percent(used, total),
    })
}

pub fn uptime() -> Uptime {
    let seconds = System::uptime();
    Uptime {
        seconds,
        human: format_uptime(seconds),
    }
}

/// Days, hours and minutes, dropping zero units
fn format_uptime(seconds: u64) -> String {
    let plural = |n: u64, unit: &str| format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" });

    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(plural(minutes, "minute"));
    }
    parts.join(", ")
}

/// Sample disk, memory and uptime. Blocking.
pub fn collect_stats(disk_mount: &Path) -> SystemStats {
    SystemStats {
        disk: disk_usage(disk_mount),
        memory: memory_usage(),
        uptime: uptime(),
    }
}

/// Whether a TCP connection to `address` opens within `timeout`
pub async fn check_service(address: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!("Service at {} unreachable: {}", address, e);
            false
        }
        Err(_) => {
            tracing::debug!("Service at {} timed out after {:?}", address, timeout);
            false
        }
    }
}

/// Probe all targets concurrently, reporting in target order
pub async fn check_services(targets: &[ServiceTarget], timeout: Duration) -> Vec<ServiceStatus> {
    let checks = targets
        .iter()
        .map(|target| check_service(&target.address, timeout));
    let results = join_all(checks).await;

    targets
        .iter()
        .zip(results)
        .map(|(target, reachable)| ServiceStatus {
            name: target.name.clone(),
            address: target.address.clone(),
            reachable,
        })
        .collect()
}
