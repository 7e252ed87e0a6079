//! Rig dashboard monitor: refreshes `/api/status` on a fixed period for as
//! long as it runs.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::MinerApi;
use crate::error_handling::ErrorHandler;
use crate::metrics::PollStats;
use crate::render::{DashboardView, ViewSink};
use crate::schedule::{PollHandle, PollSchedule};
use crate::types::DashboardStatus;

pub const DEFAULT_REFRESH: Duration = Duration::from_millis(5_000);

pub struct DashboardMonitor<A, S> {
    api: A,
    sink: S,
    refresh: Duration,
    view: DashboardView,
    last_snapshot: Option<DashboardStatus>,
    errors: ErrorHandler,
}

impl<A, S> DashboardMonitor<A, S>
where
    A: MinerApi,
    S: ViewSink<DashboardView>,
{
    pub fn new(api: A, sink: S, refresh: Duration, stats: Arc<PollStats>) -> Self {
        Self {
            api,
            sink,
            refresh,
            view: DashboardView::default(),
            last_snapshot: None,
            errors: ErrorHandler::new(stats),
        }
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn last_snapshot(&self) -> Option<&DashboardStatus> {
        self.last_snapshot.as_ref()
    }

    /// One status check. Returns `false` when the rig could not be reached,
    /// in which case the view shows "Connection Lost".
    pub async fn refresh(&mut self) -> bool {
        let stats = Arc::clone(self.errors.stats());
        stats.record_tick();

        match self.api.dashboard_status().await {
            Ok(snapshot) => {
                stats.record_snapshot();
                debug!(
                    active = snapshot.mining.as_ref().is_some_and(|m| m.active),
                    log_lines = snapshot.logs.len(),
                    "dashboard status"
                );
                self.view.apply(&snapshot);
                self.last_snapshot = Some(snapshot);
                self.sink.apply(&self.view);
                true
            }
            Err(err) => {
                self.errors.handle_transient_error("dashboard status", &err);
                self.view.mark_connection_lost();
                self.sink.apply(&self.view);
                false
            }
        }
    }

    /// Refreshes now and then every period, forever.
    pub async fn run(mut self) {
        let mut schedule = PollSchedule::immediate(self.refresh);
        loop {
            schedule.next().await;
            self.refresh().await;
        }
    }
}

impl<A, S> DashboardMonitor<A, S>
where
    A: MinerApi + 'static,
    S: ViewSink<DashboardView> + Send + 'static,
{
    /// Moves the loop onto its own task. Stop it through the handle.
    pub fn start(self) -> PollHandle {
        PollHandle::spawn(self.run())
    }
}
