//! Shared agent state: sysinfo handles, the scheduler queue, and a hot
//! snapshot cache.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, ProcessRefreshKind, RefreshKind, System};
use tokio::sync::Mutex;

use crate::types::{MetricsSnapshot, QueuedProcess};

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedDisks = Arc<Mutex<Disks>>;
pub type SharedQueue = Arc<Mutex<VecDeque<QueuedProcess>>>;

/// Last collected value plus a freshness timestamp.
pub struct Cached<T> {
    at: Option<Instant>,
    v: Option<T>,
}

impl<T: Clone> Cached<T> {
    pub fn empty() -> Self {
        Self { at: None, v: None }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.v.is_some() && self.at.is_some_and(|t| t.elapsed() < ttl)
    }

    pub fn take_clone(&self) -> Option<T> {
        self.v.clone()
    }

    pub fn set(&mut self, v: T) {
        self.v = Some(v);
        self.at = Some(Instant::now());
    }
}

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles: CPU usage is a delta since the last
    // refresh, so the same System must live across requests.
    pub sys: SharedSystem,
    pub disks: SharedDisks,

    // Round-robin queue, rebuilt wholesale whenever it runs empty.
    pub queue: SharedQueue,

    pub hostname: String,
    pub cache_snapshot: Arc<Mutex<Cached<MetricsSnapshot>>>,
}

impl AppState {
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(ProcessRefreshKind::nothing().with_cpu().with_memory());
        let sys = System::new_with_specifics(refresh);

        let mut disks = Disks::new();
        disks.refresh(true);

        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(disks)),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
            cache_snapshot: Arc::new(Mutex::new(Cached::empty())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
