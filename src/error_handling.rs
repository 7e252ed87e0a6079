use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::api::ApiError;
use crate::metrics::{ErrorType, PollStats};
use crate::validation::ValidationError;

/// Logs each failure category and counts it. None of these end the
/// controller; the caller decides what the view shows.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    stats: Arc<PollStats>,
}

impl ErrorHandler {
    pub fn new(stats: Arc<PollStats>) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &Arc<PollStats> {
        &self.stats
    }

    pub fn handle_validation_error(&self, err: &ValidationError) {
        warn!(error = %err, "build form rejected");
        self.stats.record_error(ErrorType::Validation);
    }

    pub fn handle_submit_error(&self, err: &ApiError) {
        error!(error = %err, "build submission failed");
        self.stats.record_error(ErrorType::Submission);
    }

    pub fn handle_build_failure(&self, build_id: &str, reason: &str) {
        error!(build_id, reason, "build reported failure");
        self.stats.record_error(ErrorType::BuildFailed);
    }

    pub fn handle_timeout(&self, build_id: &str, ceiling: Duration) {
        error!(build_id, ceiling_secs = ceiling.as_secs(), "build polling timed out");
        self.stats.record_error(ErrorType::Timeout);
    }

    /// A single poll tick failed; polling carries on.
    pub fn handle_transient_error(&self, context: &str, err: &ApiError) {
        warn!(context, error = %err, "status check failed");
        self.stats.record_error(ErrorType::Transient);
    }
}
