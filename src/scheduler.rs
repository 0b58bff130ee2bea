//! Round-robin stub over the live process table.
//!
//! Not a real scheduler: one step pins the front of the queue to CPU 0,
//! sleeps for the quantum to simulate execution, and rotates the entry
//! to the back. The queue is rebuilt wholesale whenever it runs empty.

use std::time::Duration;

use nix::sched::{sched_setaffinity, CpuSet};
use nix::unistd::Pid;
use once_cell::sync::OnceCell;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate};
use tokio::time::sleep;
use tracing::debug;

use crate::state::AppState;
use crate::types::QueuedProcess;

fn quantum() -> Duration {
    static MS: OnceCell<u64> = OnceCell::new();
    let ms = *MS.get_or_init(|| {
        std::env::var("SYSMON_AGENT_QUANTUM_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2_000)
    });
    Duration::from_millis(ms)
}

/// Outcome of one scheduling step, reported back over HTTP.
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Scheduled { pid: u32, name: String },
    Dropped { pid: u32 },
    Idle,
}

/// Rebuild the queue from every process with non-zero CPU usage.
/// Entries are pids observed now; some may exit before they are
/// dequeued, which a later step handles by dropping them.
async fn refill_queue(state: &AppState) -> usize {
    let mut sys = state.sys.lock().await;
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu(),
    );
    let mut queue = state.queue.lock().await;
    queue.clear();
    for p in sys.processes().values() {
        if p.cpu_usage() > 0.0 {
            queue.push_back(QueuedProcess {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                cpu_percent: p.cpu_usage(),
            });
        }
    }
    queue.len()
}

/// Run one scheduling step. The pop and the re-enqueue are separate
/// critical sections so concurrent steps rotate distinct entries; the
/// quantum sleep never holds the queue lock.
pub async fn schedule_step(state: &AppState) -> StepOutcome {
    let entry = {
        let mut queue = state.queue.lock().await;
        queue.pop_front()
    };
    let entry = match entry {
        Some(e) => e,
        None => {
            if refill_queue(state).await == 0 {
                return StepOutcome::Idle;
            }
            let mut queue = state.queue.lock().await;
            match queue.pop_front() {
                Some(e) => e,
                None => return StepOutcome::Idle,
            }
        }
    };

    match pin_to_cpu0(entry.pid) {
        Ok(()) => {
            sleep(quantum()).await;
            let pid = entry.pid;
            let name = entry.name.clone();
            let mut queue = state.queue.lock().await;
            queue.push_back(entry);
            StepOutcome::Scheduled { pid, name }
        }
        Err(errno) => {
            // Exited or inaccessible between refill and dequeue.
            debug!(
                pid = entry.pid,
                cpu = entry.cpu_percent,
                %errno,
                "skipping unschedulable process"
            );
            StepOutcome::Dropped { pid: entry.pid }
        }
    }
}

fn pin_to_cpu0(pid: u32) -> nix::Result<()> {
    let mut set = CpuSet::new();
    set.set(0)?;
    sched_setaffinity(Pid::from_raw(pid as i32), &set)
}
