//! Metrics collection using sysinfo.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::OnceCell;
use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate};

use crate::state::AppState;
use crate::types::{MetricsSnapshot, ProcessInfo};

// Short TTL so bursts of requests reuse one collection pass.
fn snapshot_ttl() -> Duration {
    static MS: OnceCell<u64> = OnceCell::new();
    let ms = *MS.get_or_init(|| {
        std::env::var("SYSMON_AGENT_METRICS_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(250)
    });
    Duration::from_millis(ms)
}

pub fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((used as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as f32
}

/// Collect a fresh utilization snapshot, or serve the cached one if it
/// is recent enough. Processes sysinfo cannot read are simply absent.
pub async fn collect_snapshot(state: &AppState) -> MetricsSnapshot {
    let ttl = snapshot_ttl();
    {
        let cache = state.cache_snapshot.lock().await;
        if cache.is_fresh(ttl) {
            if let Some(c) = cache.take_clone() {
                return c;
            }
        }
    }

    let (cpu_percent, memory_percent, processes) = {
        let mut sys = state.sys.lock().await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let cpu = sys.global_cpu_usage().clamp(0.0, 100.0);
        let mem_total = sys.total_memory();
        let mem_used = mem_total.saturating_sub(sys.available_memory());

        let mut processes: Vec<ProcessInfo> = sys
            .processes()
            .values()
            .map(|p| ProcessInfo {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
            })
            .collect();
        processes.sort_by_key(|p| p.pid);

        (cpu, percent(mem_used, mem_total), processes)
    };

    let disk_percent = {
        let mut disks = state.disks.lock().await;
        disks.refresh(true);
        root_disk_percent(&disks)
    };

    let snapshot = MetricsSnapshot {
        hostname: state.hostname.clone(),
        cpu_percent,
        memory_percent,
        disk_percent,
        process_count: processes.len(),
        processes,
    };
    {
        let mut cache = state.cache_snapshot.lock().await;
        cache.set(snapshot.clone());
    }
    snapshot
}

// Utilization of the root mount; aggregate over all listed disks when
// no "/" mount is visible (e.g. inside containers).
fn root_disk_percent(disks: &Disks) -> f32 {
    let root = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"));
    match root {
        Some(d) => percent(
            d.total_space().saturating_sub(d.available_space()),
            d.total_space(),
        ),
        None => {
            let (used, total) = disks.list().iter().fold((0u64, 0u64), |(u, t), d| {
                (
                    u.saturating_add(d.total_space().saturating_sub(d.available_space())),
                    t.saturating_add(d.total_space()),
                )
            });
            percent(used, total)
        }
    }
}
