//! ISO builder controller: validate, submit, then poll the build until it
//! completes, fails or runs out of time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{MinerApi, download_path};
use crate::error_handling::ErrorHandler;
use crate::metrics::PollStats;
use crate::render::{BuildProgress, BuildView, StatusKind, ViewSink};
use crate::schedule::{PollSchedule, Tick};
use crate::types::{BuildState, BuildStatus};
use crate::validation::{BuildForm, ValidationError};

pub const TIMEOUT_MESSAGE: &str = "Build timed out. Please try again.";
const MISSING_FILENAME: &str = "server reported completion without an image filename";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTiming {
    pub poll_interval: Duration,
    pub ceiling: Duration,
}

impl Default for BuildTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2_000),
            ceiling: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Completed {
        build_id: String,
        filename: String,
        download_href: String,
    },
    Rejected(ValidationError),
    SubmitFailed(String),
    Failed {
        build_id: String,
        error: String,
    },
    TimedOut {
        build_id: String,
    },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Completed { .. })
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Completed { filename, .. } => write!(f, "build completed: {filename}"),
            BuildOutcome::Rejected(err) => write!(f, "{err}"),
            BuildOutcome::SubmitFailed(reason) => write!(f, "Build failed: {reason}"),
            BuildOutcome::Failed { error, .. } => write!(f, "Build failed: {error}"),
            BuildOutcome::TimedOut { .. } => f.write_str(TIMEOUT_MESSAGE),
        }
    }
}

pub struct BuildController<A, S> {
    api: A,
    sink: S,
    timing: BuildTiming,
    phase: BuildPhase,
    view: BuildView,
    last_snapshot: Option<BuildStatus>,
    errors: ErrorHandler,
}

impl<A, S> BuildController<A, S>
where
    A: MinerApi,
    S: ViewSink<BuildView>,
{
    pub fn new(api: A, sink: S, timing: BuildTiming, stats: Arc<PollStats>) -> Self {
        Self {
            api,
            sink,
            timing,
            phase: BuildPhase::Idle,
            view: BuildView::default(),
            last_snapshot: None,
            errors: ErrorHandler::new(stats),
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn view(&self) -> &BuildView {
        &self.view
    }

    pub fn last_snapshot(&self) -> Option<&BuildStatus> {
        self.last_snapshot.as_ref()
    }

    fn render(&mut self) {
        self.sink.apply(&self.view);
    }

    /// Re-enables the form and hides the build panels.
    pub fn reset(&mut self) {
        self.view.reset();
        self.phase = BuildPhase::Idle;
        self.render();
    }

    /// Runs one build attempt to a terminal state.
    pub async fn submit(&mut self, form: &BuildForm) -> BuildOutcome {
        // a completed build keeps its download link until the next attempt
        if self.phase == BuildPhase::Completed {
            self.reset();
        }

        let config = match form.validate() {
            Ok(config) => config,
            Err(err) => {
                self.errors.handle_validation_error(&err);
                self.view.show_status(err.to_string(), StatusKind::Error);
                self.render();
                return BuildOutcome::Rejected(err);
            }
        };

        self.phase = BuildPhase::Submitting;
        self.last_snapshot = None;
        self.view.begin_build();
        self.render();
        info!(worker = %config.worker_name, pool = %config.pool_url, "submitting build");

        let build_id = match self.api.submit_build(&config).await {
            Ok(build_id) => build_id,
            Err(err) => {
                self.errors.handle_submit_error(&err);
                let reason = err.to_string();
                self.view.show_status(format!("Build failed: {reason}"), StatusKind::Error);
                self.reset();
                return BuildOutcome::SubmitFailed(reason);
            }
        };

        info!(build_id = %build_id, "build accepted, polling for progress");
        self.poll(build_id).await
    }

    async fn poll(&mut self, build_id: String) -> BuildOutcome {
        self.phase = BuildPhase::Polling;
        let stats = Arc::clone(self.errors.stats());
        let mut schedule =
            PollSchedule::every(self.timing.poll_interval).with_deadline(self.timing.ceiling);

        loop {
            if schedule.next().await == Tick::Deadline {
                self.errors.handle_timeout(&build_id, self.timing.ceiling);
                self.phase = BuildPhase::TimedOut;
                self.view.show_status(TIMEOUT_MESSAGE, StatusKind::Error);
                self.view.reset();
                self.render();
                self.phase = BuildPhase::Idle;
                return BuildOutcome::TimedOut { build_id };
            }

            stats.record_tick();
            let snapshot = match self.api.build_status(&build_id).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    self.errors.handle_transient_error("build status", &err);
                    self.view.connection_lost = true;
                    self.render();
                    continue;
                }
            };
            stats.record_snapshot();
            debug!(
                build_id = %build_id,
                status = ?snapshot.status,
                progress = ?snapshot.progress,
                "build status"
            );

            // render first so the final snapshot is always visible
            self.view.apply_progress(BuildProgress::from_snapshot(&snapshot));
            self.render();

            let state = snapshot.status;
            let filename = snapshot.filename.clone();
            let error = snapshot.error.clone();
            self.last_snapshot = Some(snapshot);

            match state {
                BuildState::Completed => {
                    let Some(filename) = filename.filter(|f| !f.is_empty()) else {
                        warn!(build_id = %build_id, "build completed without an image filename");
                        let error = MISSING_FILENAME.to_string();
                        return self.fail(build_id, error);
                    };
                    let download_href = download_path(&filename);
                    info!(build_id = %build_id, filename = %filename, "build completed");
                    stats.record_completed();
                    self.phase = BuildPhase::Completed;
                    self.view.show_download(download_href.clone());
                    self.render();
                    return BuildOutcome::Completed {
                        build_id,
                        filename,
                        download_href,
                    };
                }
                BuildState::Failed => {
                    let error = error.unwrap_or_else(|| "unknown error".to_string());
                    return self.fail(build_id, error);
                }
                BuildState::Running | BuildState::Unknown => {}
            }
        }
    }

    fn fail(&mut self, build_id: String, error: String) -> BuildOutcome {
        self.errors.handle_build_failure(&build_id, &error);
        self.phase = BuildPhase::Failed;
        self.view.show_status(format!("Build failed: {error}"), StatusKind::Error);
        self.view.reset();
        self.render();
        self.phase = BuildPhase::Idle;
        BuildOutcome::Failed { build_id, error }
    }
}
