//! Snapshot → view model mapping.
//!
//! Nothing in here touches a terminal or a page. Each function turns (part
//! of) a status snapshot into plain display strings; a [`ViewSink`] applies
//! the result to whatever is showing it.

use chrono::{DateTime, NaiveDateTime};

use crate::types::{BuildStatus, DashboardStatus, GpuStats, MiningStatus, Performance};

pub const DASH: &str = "-";
pub const BUILD_LOG_TAIL: usize = 20;
pub const DASHBOARD_LOG_TAIL: usize = 15;

/// Receives every view update, in order.
pub trait ViewSink<V> {
    fn apply(&mut self, view: &V);
}

/// Escapes text for insertion as element content: `&`, `<` and `>`.
/// Quotes are left alone.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

pub fn format_uptime(seconds: Option<u64>) -> String {
    let seconds = match seconds {
        None | Some(0) => return DASH.to_string(),
        Some(s) => s,
    };

    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

pub fn format_efficiency(accepted: u64, rejected: u64) -> String {
    let total = accepted + rejected;
    if total == 0 {
        return DASH.to_string();
    }
    format!("{:.1}%", accepted as f64 / total as f64 * 100.0)
}

pub fn format_hashrate(hashrate: f64) -> String {
    format!("{hashrate:.2} G/s")
}

/// Drops the scheme and the default pool port for display.
pub fn format_pool_url(url: &str) -> String {
    url.replacen("stratum+tcp://", "", 1).replacen(":4040", "", 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogView {
    pub entries: Vec<LogEntry>,
    pub scrolled_to_end: bool,
}

impl LogView {
    /// Keeps the last `limit` lines, oldest first.
    pub fn tail(logs: &[String], limit: usize) -> Self {
        let start = logs.len().saturating_sub(limit);
        Self {
            entries: logs[start..]
                .iter()
                .map(|line| LogEntry {
                    text: line.clone(),
                    html: escape_html(line),
                })
                .collect(),
            scrolled_to_end: true,
        }
    }

    pub fn single(line: &str) -> Self {
        Self::tail(&[line.to_string()], 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

/// Display-ready numbers pulled out of one build snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProgress {
    pub percent: u8,
    pub text: String,
    /// `None` when the snapshot carried no log lines.
    pub logs: Option<LogView>,
}

impl BuildProgress {
    pub fn from_snapshot(status: &BuildStatus) -> Self {
        let percent = status.progress.unwrap_or(0).clamp(0, 100) as u8;
        let text = match status.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => "Building...".to_string(),
        };
        let logs = (!status.logs.is_empty()).then(|| LogView::tail(&status.logs, BUILD_LOG_TAIL));
        Self { percent, text, logs }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildView {
    pub inputs_enabled: bool,
    pub button_label: String,
    pub progress_visible: bool,
    pub progress_percent: u8,
    pub progress_text: String,
    pub logs_visible: bool,
    pub logs: LogView,
    pub status: Option<StatusMessage>,
    pub download_visible: bool,
    pub download_href: Option<String>,
    /// Last status check failed; cleared by the next snapshot.
    pub connection_lost: bool,
}

const IDLE_LABEL: &str = "Build Custom ISO";
const BUSY_LABEL: &str = "Building ISO...";

impl Default for BuildView {
    fn default() -> Self {
        Self {
            inputs_enabled: true,
            button_label: IDLE_LABEL.to_string(),
            progress_visible: false,
            progress_percent: 0,
            progress_text: String::new(),
            logs_visible: false,
            logs: LogView::default(),
            status: None,
            download_visible: false,
            download_href: None,
            connection_lost: false,
        }
    }
}

impl BuildView {
    pub fn show_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        let text = text.into();
        self.status = (!text.is_empty()).then_some(StatusMessage { text, kind });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    fn set_inputs_enabled(&mut self, enabled: bool) {
        self.inputs_enabled = enabled;
        self.button_label = if enabled { IDLE_LABEL } else { BUSY_LABEL }.to_string();
    }

    /// Locks the form and opens the progress and log panels.
    pub fn begin_build(&mut self) {
        self.set_inputs_enabled(false);
        self.progress_visible = true;
        self.progress_percent = 0;
        self.progress_text = "Initializing...".to_string();
        self.logs_visible = true;
        self.logs = LogView::single("Build process starting...");
        self.download_visible = false;
        self.download_href = None;
        self.connection_lost = false;
        self.clear_status();
    }

    pub fn apply_progress(&mut self, progress: BuildProgress) {
        self.progress_percent = progress.percent;
        self.progress_text = progress.text;
        if let Some(logs) = progress.logs {
            self.logs = logs;
        }
        self.connection_lost = false;
    }

    pub fn show_download(&mut self, href: String) {
        self.show_status("ISO build completed successfully!", StatusKind::Success);
        self.download_href = Some(href);
        self.download_visible = true;
        self.progress_visible = false;
        self.set_inputs_enabled(true);
    }

    /// Back to an editable form. The status message survives so the user
    /// still sees why the build ended.
    pub fn reset(&mut self) {
        self.set_inputs_enabled(true);
        self.progress_visible = false;
        self.logs_visible = false;
        self.download_visible = false;
        self.download_href = None;
        self.connection_lost = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningView {
    pub indicator: Indicator,
    pub label: String,
    pub worker: String,
    pub pool: String,
    pub uptime: String,
}

impl MiningView {
    pub fn from_status(mining: Option<&MiningStatus>) -> Self {
        match mining {
            Some(mining) if mining.active => Self {
                indicator: Indicator::Online,
                label: "Mining".to_string(),
                worker: non_empty_or_dash(mining.worker.as_deref()),
                pool: format_pool_url(&non_empty_or_dash(mining.pool.as_deref())),
                uptime: format_uptime(mining.uptime),
            },
            _ => Self::offline("Offline"),
        }
    }

    fn offline(label: &str) -> Self {
        Self {
            indicator: Indicator::Offline,
            label: label.to_string(),
            worker: DASH.to_string(),
            pool: DASH.to_string(),
            uptime: DASH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceView {
    pub hashrate: String,
    pub accepted: String,
    pub rejected: String,
    pub efficiency: String,
}

impl PerformanceView {
    pub fn from_status(performance: Option<&Performance>) -> Self {
        match performance {
            Some(perf) => {
                let accepted = perf.shares_accepted.unwrap_or(0);
                let rejected = perf.shares_rejected.unwrap_or(0);
                Self {
                    hashrate: format_hashrate(perf.hashrate.unwrap_or(0.0)),
                    accepted: accepted.to_string(),
                    rejected: rejected.to_string(),
                    efficiency: format_efficiency(accepted, rejected),
                }
            }
            None => Self {
                hashrate: "- G/s".to_string(),
                accepted: "0".to_string(),
                rejected: "0".to_string(),
                efficiency: DASH.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuView {
    pub name: String,
    pub temperature: String,
    pub power: String,
    pub utilization: String,
}

impl GpuView {
    pub fn from_status(gpu: Option<&GpuStats>) -> Self {
        let gpu = gpu.cloned().unwrap_or_default();
        Self {
            name: non_empty_or_dash(gpu.name.as_deref()),
            temperature: reading(gpu.temperature, " °C"),
            power: reading(gpu.power_draw, " W"),
            utilization: match gpu.utilization.filter(|v| *v != 0.0) {
                Some(value) => format!("{value}%"),
                None => "- %".to_string(),
            },
        }
    }
}

// the rig reports 0 when it could not query the card
fn reading(value: Option<f64>, unit: &str) -> String {
    match value.filter(|v| *v != 0.0) {
        Some(value) => format!("{value}{unit}"),
        None => format!("{DASH}{unit}"),
    }
}

fn non_empty_or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => DASH.to_string(),
    }
}

/// Formats a backend timestamp as wall-clock time; `None` if unparseable.
pub fn format_updated_at(timestamp: &str) -> Option<String> {
    if let Ok(naive) = timestamp.parse::<NaiveDateTime>() {
        return Some(naive.format("%H:%M:%S").to_string());
    }
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.format("%H:%M:%S").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub mining: MiningView,
    pub performance: PerformanceView,
    pub gpu: GpuView,
    pub logs: LogView,
    pub updated_at: Option<String>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            mining: MiningView::from_status(None),
            performance: PerformanceView::from_status(None),
            gpu: GpuView::from_status(None),
            logs: LogView::default(),
            updated_at: None,
        }
    }
}

impl DashboardView {
    /// Replaces every region from the snapshot. An empty log list keeps the
    /// lines already on screen.
    pub fn apply(&mut self, status: &DashboardStatus) {
        self.mining = MiningView::from_status(status.mining.as_ref());
        self.performance = PerformanceView::from_status(status.performance.as_ref());
        self.gpu = GpuView::from_status(status.gpu.as_ref());
        if !status.logs.is_empty() {
            self.logs = LogView::tail(&status.logs, DASHBOARD_LOG_TAIL);
        }
        self.updated_at = status.timestamp.as_deref().and_then(format_updated_at);
    }

    /// Flags the indicator only; the last figures stay visible.
    pub fn mark_connection_lost(&mut self) {
        self.mining.indicator = Indicator::Offline;
        self.mining.label = "Connection Lost".to_string();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildState;

    #[test]
    fn should_format_uptime_with_largest_units() {
        assert_eq!(format_uptime(None), "-");
        assert_eq!(format_uptime(Some(0)), "-");
        assert_eq!(format_uptime(Some(125)), "2m");
        assert_eq!(format_uptime(Some(3725)), "1h 2m");
        assert_eq!(format_uptime(Some(90_000)), "1d 1h 0m");
        assert_eq!(format_uptime(Some(90_061)), "1d 1h 1m");
    }

    #[test]
    fn should_show_zero_minutes_for_sub_minute_uptime() {
        assert_eq!(format_uptime(Some(30)), "0m");
    }

    #[test]
    fn should_format_efficiency_to_one_decimal() {
        assert_eq!(format_efficiency(7, 3), "70.0%");
        assert_eq!(format_efficiency(2, 1), "66.7%");
        assert_eq!(format_efficiency(5, 0), "100.0%");
        assert_eq!(format_efficiency(0, 0), "-");
    }

    #[test]
    fn should_format_hashrate_with_two_decimals() {
        assert_eq!(format_hashrate(5.234), "5.23 G/s");
        assert_eq!(format_hashrate(0.0), "0.00 G/s");
    }

    #[test]
    fn should_shorten_pool_url() {
        assert_eq!(format_pool_url("stratum+tcp://ae.2miners.com:4040"), "ae.2miners.com");
        assert_eq!(format_pool_url("stratum+tcp://my.pool:3333"), "my.pool:3333");
        assert_eq!(format_pool_url("-"), "-");
    }

    #[test]
    fn should_escape_markup_like_a_text_node() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert('x')&lt;/script&gt;"
        );
        assert_eq!(escape_html("a & b \"q\" 'r'"), "a &amp; b \"q\" 'r'");
        assert_eq!(escape_html("plain line"), "plain line");
    }

    #[test]
    fn should_keep_only_last_entries_in_order() {
        let logs: Vec<String> = (1..=25).map(|i| format!("line {i}")).collect();
        let view = LogView::tail(&logs, BUILD_LOG_TAIL);
        assert_eq!(view.entries.len(), 20);
        assert_eq!(view.entries[0].text, "line 6");
        assert_eq!(view.entries[19].text, "line 25");
        assert!(view.scrolled_to_end);

        let short = LogView::tail(&logs[..3], DASHBOARD_LOG_TAIL);
        assert_eq!(short.entries.len(), 3);
        assert_eq!(short.entries[0].text, "line 1");
    }

    #[test]
    fn should_escape_each_log_entry() {
        let logs = vec!["ok".to_string(), "<script>x</script>".to_string()];
        let view = LogView::tail(&logs, DASHBOARD_LOG_TAIL);
        assert_eq!(view.entries[1].html, "&lt;script&gt;x&lt;/script&gt;");
        assert_eq!(view.entries[1].text, "<script>x</script>");
    }

    #[test]
    fn should_default_missing_build_progress_fields() {
        let status = BuildStatus {
            status: BuildState::Running,
            progress: None,
            message: None,
            logs: Vec::new(),
            error: None,
            filename: None,
        };
        let progress = BuildProgress::from_snapshot(&status);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.text, "Building...");
        assert!(progress.logs.is_none());
    }

    #[test]
    fn should_clamp_progress_percent() {
        let progress = BuildProgress::from_snapshot(&BuildStatus::running(140, "almost"));
        assert_eq!(progress.percent, 100);
        let progress = BuildProgress::from_snapshot(&BuildStatus::running(-5, "odd"));
        assert_eq!(progress.percent, 0);
    }

    #[test]
    fn should_keep_status_message_across_reset() {
        let mut view = BuildView::default();
        view.begin_build();
        assert!(!view.inputs_enabled);
        assert_eq!(view.button_label, "Building ISO...");
        assert_eq!(view.progress_text, "Initializing...");
        assert_eq!(view.logs.entries[0].text, "Build process starting...");

        view.show_status("Build failed: boom", StatusKind::Error);
        view.reset();
        assert!(view.inputs_enabled);
        assert!(!view.progress_visible);
        assert!(!view.logs_visible);
        assert!(view.download_href.is_none());
        assert_eq!(view.status.unwrap().text, "Build failed: boom");
    }

    #[test]
    fn should_hide_empty_status_message() {
        let mut view = BuildView::default();
        view.show_status("", StatusKind::Error);
        assert!(view.status.is_none());
    }

    #[test]
    fn should_render_active_mining_section() {
        let mining = MiningStatus {
            active: true,
            worker: Some("rig01".to_string()),
            pool: Some("stratum+tcp://ae.2miners.com:4040".to_string()),
            uptime: Some(3725),
        };
        let view = MiningView::from_status(Some(&mining));
        assert_eq!(view.indicator, Indicator::Online);
        assert_eq!(view.label, "Mining");
        assert_eq!(view.worker, "rig01");
        assert_eq!(view.pool, "ae.2miners.com");
        assert_eq!(view.uptime, "1h 2m");
    }

    #[test]
    fn should_render_dashes_for_inactive_or_missing_mining() {
        let inactive = MiningStatus {
            active: false,
            worker: Some("rig01".to_string()),
            ..MiningStatus::default()
        };
        for mining in [None, Some(&inactive)] {
            let view = MiningView::from_status(mining);
            assert_eq!(view.indicator, Indicator::Offline);
            assert_eq!(view.label, "Offline");
            assert_eq!(view.worker, "-");
            assert_eq!(view.uptime, "-");
        }
    }

    #[test]
    fn should_render_performance_section() {
        let perf = Performance {
            hashrate: Some(5.234),
            shares_accepted: Some(7),
            shares_rejected: Some(3),
        };
        let view = PerformanceView::from_status(Some(&perf));
        assert_eq!(view.hashrate, "5.23 G/s");
        assert_eq!(view.accepted, "7");
        assert_eq!(view.efficiency, "70.0%");

        let missing = PerformanceView::from_status(None);
        assert_eq!(missing.hashrate, "- G/s");
        assert_eq!(missing.accepted, "0");
        assert_eq!(missing.efficiency, "-");
    }

    #[test]
    fn should_fall_back_per_gpu_field() {
        let gpu = GpuStats {
            name: Some("NVIDIA RTX A5000".to_string()),
            temperature: Some(72.0),
            power_draw: None,
            utilization: Some(0.0),
        };
        let view = GpuView::from_status(Some(&gpu));
        assert_eq!(view.name, "NVIDIA RTX A5000");
        assert_eq!(view.temperature, "72 °C");
        assert_eq!(view.power, "- W");
        assert_eq!(view.utilization, "- %");

        let missing = GpuView::from_status(None);
        assert_eq!(missing.name, "-");
        assert_eq!(missing.temperature, "- °C");
    }

    #[test]
    fn should_keep_previous_logs_when_snapshot_has_none() {
        let mut view = DashboardView::default();
        view.apply(&DashboardStatus {
            logs: vec!["Speed: 5.2 G/s".to_string()],
            ..DashboardStatus::default()
        });
        view.apply(&DashboardStatus::default());
        assert_eq!(view.logs.entries.len(), 1);
    }

    #[test]
    fn should_distinguish_connection_lost_from_offline() {
        let mut view = DashboardView::default();
        assert_eq!(view.mining.label, "Offline");
        view.mark_connection_lost();
        assert_eq!(view.mining.label, "Connection Lost");
        assert_eq!(view.mining.indicator, Indicator::Offline);
    }

    #[test]
    fn should_format_backend_timestamps() {
        assert_eq!(
            format_updated_at("2025-03-01T14:05:09.123456").as_deref(),
            Some("14:05:09")
        );
        assert_eq!(
            format_updated_at("2025-03-01T14:05:09+02:00").as_deref(),
            Some("14:05:09")
        );
        assert!(format_updated_at("yesterday").is_none());
    }
}
