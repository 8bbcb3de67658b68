//! `ridepool` — discrete-time simulator and batch dispatcher for a shared
//! on-demand ride-pooling fleet.
//!
//! ```text
//! ridepool N_THREADS [KEY VALUE]…
//! ridepool 8 DATAROOT data/manhattan CARSIZE 4 INTERVAL 30 CTSP FIX_PREFIX
//! ```
//!
//! The positional pairs override [`rp_core::Settings`] defaults; an unknown
//! key or malformed value aborts before anything is loaded.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use rp_core::{config, Settings};
use rp_model::load::{load_requests, load_vehicles};
use rp_network::Network;
use rp_output::RunLogs;
use rp_sim::driver::worker_pool;

#[derive(Parser)]
#[command(name = "ridepool", version, about = "Ride-pooling fleet dispatcher")]
struct Cli {
    /// Worker threads for the planning and simulation fan-outs.
    n_threads: usize,

    /// Flat `KEY VALUE` configuration overrides.
    #[arg(value_name = "KEY VALUE", num_args = 0..)]
    overrides: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.n_threads == 0 {
        bail!("thread count must be positive");
    }

    let mut settings = Settings::default();
    settings.apply_pairs(&cli.overrides)?;
    settings.validate()?;

    let pool = worker_pool(cli.n_threads);
    info!(threads = cli.n_threads, "worker pool ready");

    let logs = RunLogs::open(&settings.results_directory, config::RTV_TRACE)
        .context("opening run logs")?;

    let network = Network::load(&settings).context("loading the road network")?;
    info!(nodes = network.node_count(), "network loaded");

    let mut vehicles = load_vehicles(&settings, &network).context("loading the fleet")?;
    let mut requests = load_requests(&settings, &network).context("loading requests")?;
    info!(
        vehicles = vehicles.len(),
        requests = requests.len(),
        "fleet and demand loaded"
    );

    rp_sim::run(
        &settings,
        &network,
        &mut requests,
        &mut vehicles,
        &pool,
        &logs,
    )?;
    info!("run complete");
    Ok(())
}
