//! TapeReplay - simulated trading against a replayed price tape
//!
//! Usage: cargo run, then type `reset` to start and `long` / `short` / `close` to trade

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tapereplay::config::{AppConfig, LoggingConfig};
use tapereplay::console::{self, ConsoleRenderer};
use tapereplay::engine::ReplayEngine;
use tapereplay::market_data;
use tapereplay::replay::{ReplayDriver, ReplaySettings};

fn init_tracing(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;
    info!("🚀 TapeReplay starting | {}", config);

    // Fetched and built once; resets replay the same tape
    let source = market_data::source_from_config(&config.data)?;
    let tape = market_data::load_tape(
        source.as_ref(),
        &config.instrument.ticker,
        config.instrument.lookback_days,
        config.replay.upsample_factor,
    )
    .await
    .with_context(|| format!("Cannot start session for {}", config.instrument.ticker))?;
    let tape = if config.replay.truncate_prices {
        tape.truncated()
            .context("Price truncation would produce a zero price")?
    } else {
        tape
    };

    let engine = ReplayEngine::new(tape);
    let (handle, driver) = ReplayDriver::new(engine, ReplaySettings::from(&config.replay));

    let renderer = ConsoleRenderer::new(&config.display, handle.subscribe());
    let render_task = tokio::spawn(renderer.run());
    let mut driver_task = tokio::spawn(driver.run());

    // Stdin blocks, so it gets its own thread rather than a runtime worker
    let (input_closed_tx, input_closed) = oneshot::channel();
    let commands = handle.commands();
    std::thread::spawn(move || {
        if let Err(e) = console::forward_commands(std::io::stdin().lock(), commands) {
            error!("Command input failed: {}", e);
        }
        let _ = input_closed_tx.send(());
    });
    info!("⌨️ Commands: long | short | close | reset (Ctrl-C to quit)");

    let finished = tokio::select! {
        res = &mut driver_task => Some(res),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            None
        }
        _ = input_closed => {
            info!("Input closed, shutting down");
            None
        }
    };

    let result = match finished {
        Some(res) => res,
        None => {
            handle.stop();
            driver_task.await
        }
    };
    drop(handle);
    let engine = result.context("Replay task panicked")??;
    let _ = render_task.await;

    info!(
        "🏁 Session over | ticks {}/{} | cumulative return {:+.2}%",
        engine.cursor(),
        engine.len(),
        engine.cumulative_return()
    );
    Ok(())
}
