//! Resource metrics reports.
//!
//! Nothing runs, so every counter is zero. The shapes match what a real
//! backend reports so API clients can decode them.

use mirage_common::error::Result;
use serde::{Deserialize, Serialize};

/// Memory usage counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStat {
    /// Page cache usage.
    pub cache: u64,
    /// Resident set size.
    pub rss: u64,
    /// Total usage including cache.
    pub total_usage: u64,
}

/// CPU usage counters in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuStat {
    /// Total CPU time.
    pub usage: u64,
    /// Time spent in user mode.
    pub user: u64,
    /// Time spent in kernel mode.
    pub system: u64,
}

/// Disk usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskStat {
    /// Bytes used, including shared layers.
    pub total_bytes_used: u64,
    /// Inodes used, including shared layers.
    pub total_inodes_used: u64,
    /// Bytes used by this container alone.
    pub exclusive_bytes_used: u64,
    /// Inodes used by this container alone.
    pub exclusive_inodes_used: u64,
}

/// Snapshot of a container's resource usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetrics {
    /// Memory counters.
    pub memory_stat: MemoryStat,
    /// CPU counters.
    pub cpu_stat: CpuStat,
    /// Disk counters.
    pub disk_stat: DiskStat,
}

/// Per-handle result of a bulk metrics query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetricsEntry {
    /// The metrics snapshot, or a default value when `error` is set.
    pub metrics: ContainerMetrics,
    /// Failure message for this handle alone.
    pub error: Option<String>,
}

impl From<Result<ContainerMetrics>> for ContainerMetricsEntry {
    fn from(result: Result<ContainerMetrics>) -> Self {
        match result {
            Ok(metrics) => Self {
                metrics,
                error: None,
            },
            Err(e) => Self {
                metrics: ContainerMetrics::default(),
                error: Some(e.to_string()),
            },
        }
    }
}
