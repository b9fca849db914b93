use std::time::Duration;

use clap::Parser;
use token_refresh::authorizers::simulated::SimulatedAuthorizer;
use token_refresh::resilience::retry::{RetryingAuthorizer, RetrySettings};
use token_refresh::server;
use token_refresh::utils::config_loader;
use token_refresh::utils::logging;
use token_refresh::{RefreshSchedule, RefreshingCell};
use anyhow::Result;
use token_refresh::utils::logging::LogLevel;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-refresh.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
    /// concurrent readers hammering the cell
    #[arg(long, default_value_t = 4)]
    readers: usize,
    #[arg(long, default_value_t = 25)]
    read_interval_ms: u64,
    /// stop after this many seconds; runs until Ctrl-C when absent
    #[arg(long)]
    run_for_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned())?;

    // -------------------------------
    // 2. Shutdown signal
    // -------------------------------

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    let run_for = args.run_for_secs.map(Duration::from_secs);
    tokio::spawn(async move {
        match run_for {
            Some(run_for) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = tokio::time::sleep(run_for) => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        info!("shutdown requested");
        signal_shutdown.cancel();
    });

    // -------------------------------
    // 3. Start the refreshing cell over the simulated authorizer
    // -------------------------------

    let authorizer = RetryingAuthorizer::new(
        SimulatedAuthorizer::from(&service_config.authorizer),
        RetrySettings::from(&service_config.settings.retry),
    );
    let cell = RefreshingCell::spawn(
        service_config.cell.name.to_owned(),
        authorizer,
        RefreshSchedule::from(&service_config.cell),
        shutdown.clone(),
    );

    // -------------------------------
    // 4. Start readers
    // -------------------------------

    let mut readers = JoinSet::new();
    for reader_id in 0..args.readers {
        let cell = cell.clone();
        let interval = Duration::from_millis(args.read_interval_ms);
        readers.spawn(async move {
            loop {
                match cell.get().await {
                    Ok(token) => info!(reader = reader_id, "token: {}", token),
                    Err(err) if err.is_stopped() => break,
                    Err(err) => warn!(reader = reader_id, "token error: {}", err),
                }
                tokio::time::sleep(interval).await;
            }
            info!(reader = reader_id, "reader stopped");
        });
    }

    // -------------------------------
    // 5. Start metrics server
    // -------------------------------

    info!("Service starting...");
    server::server::start(&service_config.settings, shutdown.clone()).await?;

    shutdown.cancelled().await;
    while readers.join_next().await.is_some() {}

    info!("Service stopped");
    Ok(())
}
