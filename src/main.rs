use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};

use gamegrab::config::{RunConfig, StragglerPolicy};
use gamegrab::run;

/// Harvest game listings from the configured storefronts into JSON and CSV.
/// The run always produces the full configured record count: live data
/// where the stores cooperate, synthetic records where they do not.
#[derive(Parser, Debug)]
#[command(name = "gamegrab", version, about)]
struct Cli {
    /// Wall-clock budget for the whole run, in seconds.
    #[arg(long, default_value_t = 400)]
    timeout: u64,

    /// Maximum simultaneous page fetches per source.
    #[arg(long, default_value_t = 20)]
    concurrency: usize,

    /// What to do with fetches still pending when a batch times out.
    #[arg(long, value_enum, default_value_t = StragglerPolicy::Abandon)]
    straggler_policy: StragglerPolicy,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    gamegrab::tracing::init_tracing("info")?;

    let cfg = RunConfig::from_cli(cli.timeout, cli.concurrency, cli.straggler_policy);
    info!(
        timeout_secs = cli.timeout,
        concurrency = cfg.concurrency,
        straggler_policy = %cfg.straggler_policy,
        "starting harvest run"
    );

    tokio::select! {
        _ = run::execute(&cfg) => {}
        _ = tokio::signal::ctrl_c() => {
            // The one deliberate early exit: prior output files stay as they
            // were, nothing is half-written.
            warn!("interrupted by user; leaving existing output files untouched");
        }
    }
    Ok(())
}
