//! Prints view updates to stdout. Only changes are printed so a long build
//! or a dashboard session reads like a log rather than a redraw.

use crate::render::{BuildView, DashboardView, Indicator, LogEntry, StatusKind, ViewSink};

#[derive(Debug, Default)]
pub struct TerminalSink {
    base_url: String,
    last_progress: Option<(u8, String)>,
    last_logs: Vec<String>,
    last_status: Option<String>,
    last_summary: Option<String>,
    connection_lost: bool,
}

impl TerminalSink {
    /// `base_url` turns relative download links into something clickable.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    fn print_new_logs(&mut self, entries: &[LogEntry]) {
        let lines: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        for line in unseen_tail(&self.last_logs, &lines) {
            println!("  | {line}");
        }
        self.last_logs = lines;
    }
}

/// Lines of `next` that were not already at the end of `prev`. Both are
/// windows over the same growing log, so the overlap is a suffix of `prev`
/// matching a prefix of `next`.
fn unseen_tail<'a>(prev: &[String], next: &'a [String]) -> &'a [String] {
    let max = prev.len().min(next.len());
    for overlap in (1..=max).rev() {
        if prev[prev.len() - overlap..] == next[..overlap] {
            return &next[overlap..];
        }
    }
    next
}

impl ViewSink<BuildView> for TerminalSink {
    fn apply(&mut self, view: &BuildView) {
        if view.progress_visible {
            let progress = (view.progress_percent, view.progress_text.clone());
            if self.last_progress.as_ref() != Some(&progress) {
                println!("[{:>3}%] {}", progress.0, progress.1);
                self.last_progress = Some(progress);
            }
        } else {
            self.last_progress = None;
        }

        if view.logs_visible {
            self.print_new_logs(&view.logs.entries);
        } else {
            self.last_logs.clear();
        }

        if view.connection_lost && !self.connection_lost {
            println!("(!) lost contact with the builder, retrying");
        }
        self.connection_lost = view.connection_lost;

        let status = view.status.as_ref().map(|s| s.text.clone());
        if status != self.last_status {
            if let Some(message) = &view.status {
                let tag = match message.kind {
                    StatusKind::Success => "ok",
                    StatusKind::Error => "error",
                };
                println!("{tag}: {}", message.text);
            }
            self.last_status = status;
        }

        if let (true, Some(href)) = (view.download_visible, &view.download_href) {
            println!("download: {}{href}", self.base_url);
        }
    }
}

impl ViewSink<DashboardView> for TerminalSink {
    fn apply(&mut self, view: &DashboardView) {
        let dot = match view.mining.indicator {
            Indicator::Online => "●",
            Indicator::Offline => "○",
        };
        let summary = format!(
            "{dot} {label}  worker {worker}  pool {pool}  uptime {uptime}\n  \
             hashrate {hashrate}  accepted {accepted}  rejected {rejected}  efficiency {efficiency}\n  \
             gpu {name}  {temp}  {power}  {util}",
            label = view.mining.label,
            worker = view.mining.worker,
            pool = view.mining.pool,
            uptime = view.mining.uptime,
            hashrate = view.performance.hashrate,
            accepted = view.performance.accepted,
            rejected = view.performance.rejected,
            efficiency = view.performance.efficiency,
            name = view.gpu.name,
            temp = view.gpu.temperature,
            power = view.gpu.power,
            util = view.gpu.utilization,
        );
        if self.last_summary.as_ref() != Some(&summary) {
            match &view.updated_at {
                Some(at) => println!("[{at}]"),
                None => println!("[-]"),
            }
            println!("{summary}");
            self.last_summary = Some(summary);
        }
        self.print_new_logs(&view.logs.entries);
    }
}
