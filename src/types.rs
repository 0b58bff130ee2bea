//! Data types exchanged with HTTP clients.
//! Keep this module minimal and stable — it defines the wire format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct MetricsSnapshot {
    pub hostname: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub process_count: usize,
    pub processes: Vec<ProcessInfo>,
}

/// One entry in the round-robin queue, as observed at the last refill.
/// The pid may no longer exist by the time it is dequeued.
#[derive(Debug, Clone)]
pub struct QueuedProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
}

#[derive(Debug, Deserialize)]
pub struct KillRequest {
    // Optional so a missing field is reported by the handler as a 400
    // with a JSON error body, not rejected by the extractor.
    pub pid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
