use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PollSummary {
    // Polling
    pub ticks: u64,
    pub snapshots: u64,
    pub transient_failures: u64,
    pub consecutive_failures: u32,
    pub last_snapshot_secs: Option<u64>,

    // Build outcomes
    pub validation_rejections: u64,
    pub submit_failures: u64,
    pub builds_completed: u64,
    pub builds_failed: u64,
    pub builds_timed_out: u64,

    pub uptime_seconds: u64,
    pub link_health: String,
}

#[derive(Debug)]
pub struct PollStats {
    ticks: AtomicU64,
    snapshots: AtomicU64,
    transient_failures: AtomicU64,
    consecutive_failures: AtomicU32,

    validation_rejections: AtomicU64,
    submit_failures: AtomicU64,
    builds_completed: AtomicU64,
    builds_failed: AtomicU64,
    builds_timed_out: AtomicU64,

    start_time: Instant,
    last_snapshot_time: Mutex<Option<Instant>>,
}

impl Default for PollStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PollStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            snapshots: AtomicU64::new(0),
            transient_failures: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            validation_rejections: AtomicU64::new(0),
            submit_failures: AtomicU64::new(0),
            builds_completed: AtomicU64::new(0),
            builds_failed: AtomicU64::new(0),
            builds_timed_out: AtomicU64::new(0),
            start_time: Instant::now(),
            last_snapshot_time: Mutex::new(None),
        }
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if let Ok(mut last) = self.last_snapshot_time.lock() {
            *last = Some(Instant::now());
        }
    }

    pub fn record_completed(&self) {
        self.builds_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, error_type: ErrorType) {
        match error_type {
            ErrorType::Validation => self.validation_rejections.fetch_add(1, Ordering::Relaxed),
            ErrorType::Submission => self.submit_failures.fetch_add(1, Ordering::Relaxed),
            ErrorType::BuildFailed => self.builds_failed.fetch_add(1, Ordering::Relaxed),
            ErrorType::Timeout => self.builds_timed_out.fetch_add(1, Ordering::Relaxed),
            ErrorType::Transient => {
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                self.transient_failures.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    pub fn get_summary(&self) -> PollSummary {
        let last_snapshot_secs = match self.last_snapshot_time.lock() {
            Ok(last) => last.map(|time| time.duration_since(self.start_time).as_secs()),
            Err(_) => None,
        };

        PollSummary {
            ticks: self.ticks.load(Ordering::Relaxed),
            snapshots: self.snapshots.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            last_snapshot_secs,
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            submit_failures: self.submit_failures.load(Ordering::Relaxed),
            builds_completed: self.builds_completed.load(Ordering::Relaxed),
            builds_failed: self.builds_failed.load(Ordering::Relaxed),
            builds_timed_out: self.builds_timed_out.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            link_health: self.link_health().to_string(),
        }
    }

    pub fn link_health(&self) -> LinkHealth {
        match self.consecutive_failures.load(Ordering::Relaxed) {
            0 => LinkHealth::Healthy,
            1..=2 => LinkHealth::Degraded,
            _ => LinkHealth::Lost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Validation,
    Submission,
    BuildFailed,
    Timeout,
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    Healthy,
    Degraded,
    Lost,
}

impl std::fmt::Display for LinkHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkHealth::Healthy => write!(f, "healthy"),
            LinkHealth::Degraded => write!(f, "degraded"),
            LinkHealth::Lost => write!(f, "lost"),
        }
    }
}
