use std::sync::Arc;

use a5000mine_client::api::HttpMinerApi;
use a5000mine_client::build::{BuildController, BuildOutcome, BuildTiming};
use a5000mine_client::config::Config;
use a5000mine_client::dashboard::DashboardMonitor;
use a5000mine_client::metrics::PollStats;
use a5000mine_client::terminal::TerminalSink;
use a5000mine_client::validation::{BuildForm, DEFAULT_POOL_URL, PoolSelection};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "a5000mine", version, about = "A5000mine ISO builder and rig dashboard client")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a custom mining ISO and wait for it
    Build(BuildArgs),
    /// Watch a running rig's status
    Dashboard {
        /// Render a single refresh and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Aeternity wallet address (ak_...)
    #[arg(long, default_value = "")]
    wallet: String,
    #[arg(long, default_value = "")]
    worker: String,
    /// Preset pool URL, or `custom` to use --custom-pool
    #[arg(long, default_value = DEFAULT_POOL_URL)]
    pool: String,
    #[arg(long, default_value = "")]
    custom_pool: String,
    /// GPU power limit in watts
    #[arg(long, default_value_t = 200)]
    power_limit: i32,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    core_offset: i32,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    mem_offset: i32,
}

impl From<BuildArgs> for BuildForm {
    fn from(args: BuildArgs) -> Self {
        BuildForm {
            wallet: args.wallet,
            worker: args.worker,
            pool: PoolSelection::from_arg(&args.pool),
            custom_pool: args.custom_pool,
            power_limit: args.power_limit,
            core_offset: args.core_offset,
            mem_offset: args.mem_offset,
        }
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run_build(config: &Config, stats: Arc<PollStats>, form: BuildForm) -> anyhow::Result<()> {
    let api = HttpMinerApi::new(&config.builder_url, config.get_request_timeout())?;
    let sink = TerminalSink::new(api.base_url());
    let timing = BuildTiming {
        poll_interval: config.get_build_poll_interval(),
        ceiling: config.get_build_timeout(),
    };
    let mut controller = BuildController::new(api, sink, timing, stats);

    let outcome = tokio::select! {
        outcome = controller.submit(&form) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, the build keeps running on the server");
            return Ok(());
        }
    };

    match outcome {
        BuildOutcome::Completed { .. } => Ok(()),
        other => anyhow::bail!("{other}"),
    }
}

async fn run_dashboard(config: &Config, stats: Arc<PollStats>, once: bool) -> anyhow::Result<()> {
    let api = HttpMinerApi::new(&config.dashboard_url, config.get_request_timeout())?;
    let sink = TerminalSink::new(api.base_url());
    let mut monitor = DashboardMonitor::new(api, sink, config.get_dashboard_refresh(), stats);

    if once {
        if !monitor.refresh().await {
            anyhow::bail!("rig at {} is unreachable", config.dashboard_url);
        }
        return Ok(());
    }

    info!(url = %config.dashboard_url, "watching rig, Ctrl-C to stop");
    let handle = monitor.start();
    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;
    init_tracing(&config.log_level)?;

    let stats = Arc::new(PollStats::new());
    let result = match cli.cmd {
        Cmd::Build(args) => run_build(&config, Arc::clone(&stats), args.into()).await,
        Cmd::Dashboard { once } => run_dashboard(&config, Arc::clone(&stats), once).await,
    };

    let summary = stats.get_summary();
    info!(
        ticks = summary.ticks,
        snapshots = summary.snapshots,
        transient_failures = summary.transient_failures,
        validation_rejections = summary.validation_rejections,
        submit_failures = summary.submit_failures,
        builds_completed = summary.builds_completed,
        builds_failed = summary.builds_failed,
        builds_timed_out = summary.builds_timed_out,
        link = %summary.link_health,
        "session finished"
    );
    result
}
