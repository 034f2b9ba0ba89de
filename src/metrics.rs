//! Process-wide counters for the bridge.
//! Cheap relaxed atomics; [`snapshot`] is logged when the stdio host shuts down.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static REQUESTS_STARTED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_FAILED: AtomicU64 = AtomicU64::new(0);
static COMMANDS_EXTRACTED: AtomicU64 = AtomicU64::new(0);
static LINES_DELIVERED: AtomicU64 = AtomicU64::new(0);
static LINES_FAILED: AtomicU64 = AtomicU64::new(0);
static LATENCY_SUM_MS: AtomicU64 = AtomicU64::new(0);
static LATENCY_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn inc_requests_started() {
    REQUESTS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_requests_failed() {
    REQUESTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn add_commands_extracted(n: usize) {
    COMMANDS_EXTRACTED.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn inc_lines_delivered() {
    LINES_DELIVERED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_lines_failed() {
    LINES_FAILED.fetch_add(1, Ordering::Relaxed);
}

/// Record how long a remote request took, measured from `started`.
pub fn observe_request_latency(started: Instant) {
    let ms = started.elapsed().as_millis() as u64;
    LATENCY_SUM_MS.fetch_add(ms, Ordering::Relaxed);
    LATENCY_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub requests_started: u64,
    pub requests_failed: u64,
    pub commands_extracted: u64,
    pub lines_delivered: u64,
    pub lines_failed: u64,
    pub request_latency_avg_ms: Option<u64>,
}

pub fn snapshot() -> Snapshot {
    let sum = LATENCY_SUM_MS.load(Ordering::Relaxed);
    let count = LATENCY_COUNT.load(Ordering::Relaxed);
    Snapshot {
        requests_started: REQUESTS_STARTED.load(Ordering::Relaxed),
        requests_failed: REQUESTS_FAILED.load(Ordering::Relaxed),
        commands_extracted: COMMANDS_EXTRACTED.load(Ordering::Relaxed),
        lines_delivered: LINES_DELIVERED.load(Ordering::Relaxed),
        lines_failed: LINES_FAILED.load(Ordering::Relaxed),
        request_latency_avg_ms: if count > 0 { Some(sum / count) } else { None },
    }
}
