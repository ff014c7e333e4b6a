//! Periodic operational-snapshot computation and fan-out.
//!
//! A 1-second ticker builds a [`Snapshot`] while at least one subscriber is
//! connected, serializes it once, and broadcasts the frame. Alert-level
//! derivation happens on the consumer side; this task only supplies the raw
//! inputs and the fixed thresholds.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, interval};
use tracing::error;

use crate::services::telemetry::{Telemetry, TelemetryCounters};

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub at: String,
    pub uptime_secs: u64,
    pub requests: TelemetryCounters,
    pub process: ProcessMemory,
    pub host: HostSignals,
    pub thresholds: AlertThresholds,
}

/// Process memory figures, in bytes. Zero when the platform does not expose
/// them.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProcessMemory {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

/// Host-level signals. `cpu_pressure` is the 1-minute load average divided
/// by the core count.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HostSignals {
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub free_memory_bytes: u64,
    pub cores: usize,
    pub load1: f64,
    pub cpu_pressure: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AlertThresholds {
    pub cpu_warn: f64,
    pub cpu_crit: f64,
    pub ram_warn: f64,
    pub ram_crit: f64,
    pub rpm_warn: u64,
    pub rpm_crit: u64,
}

impl AlertThresholds {
    #[must_use]
    pub const fn fixed() -> Self {
        Self {
            cpu_warn: 0.70,
            cpu_crit: 0.90,
            ram_warn: 0.70,
            ram_crit: 0.85,
            rpm_warn: 120,
            rpm_crit: 240,
        }
    }
}

/// Builds a point-in-time snapshot. Host and process figures are read under
/// `spawn_blocking` since they touch the filesystem.
pub async fn build_snapshot(telemetry: &Telemetry) -> anyhow::Result<Snapshot> {
    let uptime_secs = telemetry.uptime_secs();
    let requests = telemetry.counters();

    let (process, host) = tokio::task::spawn_blocking(|| {
        (
            read_process_memory().unwrap_or_default(),
            read_host_signals().unwrap_or_default(),
        )
    })
    .await?;

    Ok(Snapshot {
        at: chrono::Utc::now().to_rfc3339(),
        uptime_secs,
        requests,
        process,
        host,
        thresholds: AlertThresholds::fixed(),
    })
}

/// Spawns the broadcast ticker. Ticks with zero subscribers are skipped
/// without building a snapshot; the telemetry window stays prunable because
/// every reader prunes it lazily.
pub fn start(telemetry: Arc<Telemetry>, tx: broadcast::Sender<String>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;

            if tx.receiver_count() == 0 {
                continue;
            }

            match build_snapshot(&telemetry).await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(frame) => {
                        let _ = tx.send(frame);
                    }
                    Err(e) => error!("Failed to serialize snapshot: {}", e),
                },
                Err(e) => error!("Failed to build snapshot: {}", e),
            }
        }
    });
}

/// Reads VmRSS/VmSize from /proc/self/status (Linux).
fn read_process_memory() -> Option<ProcessMemory> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;

    let mut rss_bytes = 0;
    let mut virtual_bytes = 0;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            rss_bytes = parse_kb_line(rest)?;
        } else if let Some(rest) = line.strip_prefix("VmSize:") {
            virtual_bytes = parse_kb_line(rest)?;
        }
    }

    Some(ProcessMemory {
        rss_bytes,
        virtual_bytes,
    })
}

/// Reads memory and load figures from /proc (Linux).
fn read_host_signals() -> Option<HostSignals> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let loadavg = std::fs::read_to_string("/proc/loadavg").ok()?;
    let cores = std::thread::available_parallelism().map_or(1, std::num::NonZero::get);

    Some(parse_host_signals(&meminfo, &loadavg, cores))
}

fn parse_host_signals(meminfo: &str, loadavg: &str, cores: usize) -> HostSignals {
    let mut total = 0;
    let mut available = 0;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = parse_kb_line(rest).unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = parse_kb_line(rest).unwrap_or(0);
        }
    }

    let load1 = loadavg
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    #[allow(clippy::cast_precision_loss)]
    let cpu_pressure = if cores > 0 { load1 / cores as f64 } else { 0.0 };

    HostSignals {
        total_memory_bytes: total,
        used_memory_bytes: total.saturating_sub(available),
        free_memory_bytes: available,
        cores,
        load1,
        cpu_pressure,
    }
}

/// Parses the "    1234 kB" tail of a /proc line into bytes.
fn parse_kb_line(rest: &str) -> Option<u64> {
    rest.split_whitespace()
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kb_line() {
        assert_eq!(parse_kb_line("    1234 kB"), Some(1234 * 1024));
        assert_eq!(parse_kb_line("garbage"), None);
    }

    #[test]
    fn test_parse_host_signals() {
        let meminfo = "MemTotal:       16384000 kB\nMemFree:         1000000 kB\nMemAvailable:    8192000 kB\n";
        let loadavg = "1.50 0.80 0.40 2/345 6789\n";

        let host = parse_host_signals(meminfo, loadavg, 4);

        assert_eq!(host.total_memory_bytes, 16_384_000 * 1024);
        assert_eq!(host.free_memory_bytes, 8_192_000 * 1024);
        assert_eq!(host.used_memory_bytes, 8_192_000 * 1024);
        assert_eq!(host.cores, 4);
        assert!((host.load1 - 1.5).abs() < f64::EPSILON);
        assert!((host.cpu_pressure - 0.375).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fixed_thresholds() {
        let t = AlertThresholds::fixed();
        assert!((t.cpu_warn - 0.70).abs() < f64::EPSILON);
        assert!((t.ram_crit - 0.85).abs() < f64::EPSILON);
        assert_eq!(t.rpm_warn, 120);
        assert_eq!(t.rpm_crit, 240);
    }
}
