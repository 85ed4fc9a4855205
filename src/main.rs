// =============================================================================
// Candela — Main Entry Point
// =============================================================================
//
// Wires the pieces together: backfill seed history over REST, spawn the
// engine task (the single serialized mutation point), attach the live candle
// stream, apply the configured preset, and wait for shutdown.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod engine;
mod indicators;
mod market_data;
mod registry;
mod runtime_config;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::engine::ChartEngine;
use crate::market_data::{BarEventKind, HistoryClient, StreamFeed, StreamMessage};
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "candela_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Candela Chart Engine — Starting Up               ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Env overrides for the common knobs.
    if let Ok(symbol) = std::env::var("CANDELA_SYMBOL") {
        config.symbol = symbol.trim().to_uppercase();
    }
    if let Ok(timeframe) = std::env::var("CANDELA_TIMEFRAME") {
        config.timeframe = timeframe.trim().to_string();
    }
    if let Ok(url) = std::env::var("CANDELA_STREAM_URL") {
        config.stream_url = url;
    }

    info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        stream_url = %config.stream_url,
        "Configured subscription"
    );

    // ── 2. Spawn the engine ──────────────────────────────────────────────
    let (handle, engine_task) =
        ChartEngine::spawn(config.symbol.clone(), config.timeframe.clone(), config.max_candles);

    // ── 3. Historical backfill ───────────────────────────────────────────
    if config.history_url.is_empty() {
        info!("history_url empty — skipping backfill");
    } else {
        let client = HistoryClient::new(config.history_url.clone());
        match client
            .fetch_candles(&config.symbol, &config.timeframe, config.history_limit)
            .await
        {
            Ok(candles) => {
                info!(count = candles.len(), "backfilling candle history");
                for c in candles {
                    handle.ingest(StreamMessage {
                        kind: BarEventKind::Historical,
                        symbol: config.symbol.clone(),
                        ts_start_ms: c.time,
                        open: c.open,
                        high: c.high,
                        low: c.low,
                        close: c.close,
                        volume: c.volume,
                    });
                }
            }
            Err(e) => {
                // The stream alone still works; indicators just warm up live.
                warn!(error = %e, "historical backfill failed — continuing without it");
            }
        }
    }

    // ── 4. Startup preset ────────────────────────────────────────────────
    if let Some(preset) = &config.default_preset {
        match handle.apply_preset(preset).await {
            Ok(ids) => info!(preset = %preset, count = ids.len(), "startup preset applied"),
            Err(e) => warn!(preset = %preset, error = %e, "startup preset rejected"),
        }
    }

    // ── 5. Live candle stream ────────────────────────────────────────────
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let feed = StreamFeed::spawn(
        config.stream_url.clone(),
        config.symbol.clone(),
        config.timeframe.clone(),
        config.reconnect_delay_secs,
        msg_tx,
    );

    let forward_handle = handle.clone();
    tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            forward_handle.ingest(msg);
        }
        info!("stream forwarder stopped");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    // Reconnect flag is cleared before the socket closes, so the feed cannot
    // resurrect itself mid-shutdown.
    feed.disconnect().await;
    engine_task.abort();

    if let Err(e) = config.save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Candela shut down complete.");
    Ok(())
}
