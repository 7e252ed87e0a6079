use serde::{Deserialize, Serialize};

/// Rig configuration posted to the ISO builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub wallet: String,
    pub worker_name: String,
    pub pool_url: String,
    pub power_limit: i32,
    pub core_offset: i32,
    pub mem_offset: i32,
}

/// Reply to `POST /api/build-iso`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildAccepted {
    #[serde(default)]
    pub success: bool,
    pub build_id: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Running,
    Completed,
    Failed,
    // "not_found", "error", or anything newer than this client
    #[serde(other)]
    Unknown,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Completed | BuildState::Failed)
    }
}

/// Snapshot returned by `GET /api/build-status/{build_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub status: BuildState,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl BuildStatus {
    pub fn running(progress: i64, message: &str) -> Self {
        Self {
            status: BuildState::Running,
            progress: Some(progress),
            message: Some(message.to_string()),
            logs: Vec::new(),
            error: None,
            filename: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningStatus {
    #[serde(default)]
    pub active: bool,
    pub worker: Option<String>,
    pub pool: Option<String>,
    pub uptime: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub hashrate: Option<f64>,
    pub shares_accepted: Option<u64>,
    pub shares_rejected: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuStats {
    pub name: Option<String>,
    pub temperature: Option<f64>,
    pub power_draw: Option<f64>,
    pub utilization: Option<f64>,
}

/// Snapshot returned by `GET /api/status`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatus {
    pub mining: Option<MiningStatus>,
    pub performance: Option<Performance>,
    pub gpu: Option<GpuStats>,
    #[serde(default)]
    pub logs: Vec<String>,
    pub timestamp: Option<String>,
}
