use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use dexscore::config::Config;
use dexscore::core::pipeline::{StatsHandle, StreamProcessor};
use dexscore::scoring::ScoreEngine;
use dexscore::transport::zmq_io;

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = match "dexscore=info".parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("DEX reputation scorer starting...");

    let config_path = std::env::var("DEXSCORE_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = match Config::load(&config_path) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Config: {:?}", config);

    let ctx = zmq::Context::new();
    let transport = match zmq_io::connect(&ctx, &config.transport) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("Failed to set up transport: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut processor = StreamProcessor::new(
        ScoreEngine::new(config.scoring.withdraw_matching),
        transport,
        Duration::from_millis(config.transport.poll_timeout_ms),
    );
    if let Err(e) = processor.start() {
        tracing::error!("Failed to start stream processor: {e}");
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {e}");
            processor.stop();
            return ExitCode::FAILURE;
        }
    };

    let stats = processor.stats_handle();
    let interval = Duration::from_secs(config.service.stats_interval_secs.max(1));
    rt.block_on(supervise(stats, interval));

    // Joining may block on an in-flight send, so keep it off the runtime.
    let stopped = rt.block_on(rt.spawn_blocking(move || {
        processor.stop();
        processor.stats()
    }));
    match stopped {
        Ok(snapshot) => {
            tracing::info!("Final stats: {}", stats_json(&snapshot));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Shutdown task failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log stats periodically until Ctrl-C or until the worker exits on its own.
async fn supervise(stats: StatsHandle, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                return;
            }
            _ = ticker.tick() => {
                let snapshot = stats.snapshot();
                tracing::info!("Stats: {}", stats_json(&snapshot));
                if !snapshot.is_running {
                    tracing::error!("Stream processor is no longer running; restart required");
                    return;
                }
            }
        }
    }
}

fn stats_json(snapshot: &dexscore::core::stats::StatsSnapshot) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
