// =============================================================================
// Candle Stream Adapter — WebSocket feed with typed bar events
// =============================================================================
//
// Normalizes inbound stream messages into typed events:
//   BAR_FORMING    — in-progress update of the current interval
//   BAR_CONFIRMED  — the interval closed; the bar is final
//   BAR_HISTORICAL — backfill delivery of an older confirmed bar
//   SUBSCRIBED     — subscription acknowledgement (no bar payload)
//
// Malformed payloads are dropped and logged; they never halt ingestion.
// An unexpected close reconnects after a fixed delay, indefinitely.  A manual
// disconnect clears the retry flag *before* the socket is torn down so a
// half-closed connection cannot resurrect itself.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::market_data::Candle;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// Classification of an inbound stream message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarEventKind {
    #[serde(rename = "BAR_FORMING")]
    Forming,
    #[serde(rename = "BAR_CONFIRMED")]
    Confirmed,
    #[serde(rename = "BAR_HISTORICAL")]
    Historical,
    #[serde(rename = "SUBSCRIBED")]
    Subscribed,
}

/// A normalized inbound stream message.
///
/// SUBSCRIBED acknowledgements carry only the echoed symbol; the OHLCV fields
/// default to zero and are never read for that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type")]
    pub kind: BarEventKind,
    pub symbol: String,
    #[serde(default)]
    pub ts_start_ms: i64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl StreamMessage {
    /// The bar payload as a [`Candle`].  Meaningless for SUBSCRIBED messages.
    pub fn candle(&self) -> Candle {
        Candle::new(
            self.ts_start_ms,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

/// Parse one raw WebSocket text frame into a [`StreamMessage`].
///
/// Rejects payloads with a negative volume — the one field the wire format
/// constrains beyond its type.
pub fn parse_stream_message(text: &str) -> Result<StreamMessage> {
    let msg: StreamMessage =
        serde_json::from_str(text).context("failed to parse stream message JSON")?;

    if msg.volume < 0.0 {
        anyhow::bail!("stream message has negative volume: {}", msg.volume);
    }

    Ok(msg)
}

// ---------------------------------------------------------------------------
// Feed task
// ---------------------------------------------------------------------------

/// Handle to a running feed task.  Dropping the handle does not stop the feed;
/// call [`StreamFeed::disconnect`] for a clean, reconnect-suppressed teardown.
pub struct StreamFeed {
    reconnect_enabled: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamFeed {
    /// Spawn the feed task for one (symbol, timeframe) subscription.
    ///
    /// Parsed messages are forwarded through `tx`; the caller decides what to
    /// do with them (normally: wrap into an engine command).
    pub fn spawn(
        url: String,
        symbol: String,
        timeframe: String,
        reconnect_delay_secs: u64,
        tx: mpsc::UnboundedSender<StreamMessage>,
    ) -> Self {
        let reconnect_enabled = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let flag = reconnect_enabled.clone();
        let task = tokio::spawn(async move {
            run_feed_loop(
                url,
                symbol,
                timeframe,
                reconnect_delay_secs,
                tx,
                flag,
                shutdown_rx,
            )
            .await;
        });

        Self {
            reconnect_enabled,
            shutdown_tx,
            task,
        }
    }

    /// Manual disconnect.  The retry flag is cleared first, then the socket is
    /// signalled to close — in that order, so the reconnect loop observes the
    /// flag before it can re-dial.
    pub async fn disconnect(self) {
        self.reconnect_enabled.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
        info!("stream feed disconnected");
    }
}

/// Outer connect/reconnect loop.  Retries after a fixed, non-jittered delay
/// for as long as the retry flag stays set; there is no attempt cutoff.
async fn run_feed_loop(
    url: String,
    symbol: String,
    timeframe: String,
    reconnect_delay_secs: u64,
    tx: mpsc::UnboundedSender<StreamMessage>,
    reconnect_enabled: Arc<AtomicBool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        match run_connection(&url, &symbol, &timeframe, &tx, &mut shutdown_rx).await {
            Ok(()) => info!(symbol = %symbol, "stream connection closed"),
            Err(e) => error!(symbol = %symbol, error = %e, "stream connection error"),
        }

        if !reconnect_enabled.load(Ordering::SeqCst) {
            info!(symbol = %symbol, "reconnect suppressed — feed loop exiting");
            return;
        }
        if shutdown_rx.has_changed().is_err() || *shutdown_rx.borrow() {
            // The handle is gone or a close was signalled; don't re-dial.
            info!(symbol = %symbol, "feed handle released — feed loop exiting");
            return;
        }

        warn!(
            symbol = %symbol,
            delay_secs = reconnect_delay_secs,
            "stream disconnected — reconnecting"
        );
        tokio::time::sleep(tokio::time::Duration::from_secs(reconnect_delay_secs)).await;

        // A disconnect raised during the sleep must not trigger one more dial.
        if !reconnect_enabled.load(Ordering::SeqCst) {
            info!(symbol = %symbol, "reconnect suppressed — feed loop exiting");
            return;
        }
    }
}

/// One connection lifetime: dial, subscribe, pump messages until the stream
/// ends, errors, or a shutdown is signalled.
async fn run_connection(
    url: &str,
    symbol: &str,
    timeframe: &str,
    tx: &mpsc::UnboundedSender<StreamMessage>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Result<()> {
    info!(url = %url, symbol = %symbol, timeframe = %timeframe, "connecting to candle stream");

    let (ws_stream, _response) = connect_async(url)
        .await
        .context("failed to connect to candle stream WebSocket")?;

    info!(symbol = %symbol, timeframe = %timeframe, "candle stream connected");
    let (mut write, mut read) = ws_stream.split();

    // Request the subscription; the server answers with a SUBSCRIBED ack.
    let subscribe = serde_json::json!({
        "op": "subscribe",
        "symbol": symbol,
        "timeframe": timeframe,
    });
    write
        .send(Message::Text(subscribe.to_string()))
        .await
        .context("failed to send subscribe request")?;

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender counts as a shutdown signal.
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match parse_stream_message(&text) {
                            Ok(parsed) => {
                                debug!(
                                    kind = ?parsed.kind,
                                    ts = parsed.ts_start_ms,
                                    close = parsed.close,
                                    "stream message"
                                );
                                if tx.send(parsed).is_err() {
                                    // Receiver gone — the engine shut down.
                                    return Ok(());
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "malformed stream message dropped");
                            }
                        }
                    }
                    // Tungstenite answers pings itself; other frames carry
                    // nothing we consume.
                    Some(Ok(Message::Close(_))) => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_confirmed_bar() {
        let json = r#"{
            "type": "BAR_CONFIRMED",
            "symbol": "BTCUSDT",
            "ts_start_ms": 1700000000000,
            "open": 37000.0,
            "high": 37050.0,
            "low": 36990.0,
            "close": 37020.0,
            "volume": 123.456
        }"#;
        let msg = parse_stream_message(json).expect("should parse");
        assert_eq!(msg.kind, BarEventKind::Confirmed);
        assert_eq!(msg.symbol, "BTCUSDT");
        let candle = msg.candle();
        assert_eq!(candle.time, 1_700_000_000_000);
        assert!((candle.close - 37020.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_forming_bar() {
        let json = r#"{
            "type": "BAR_FORMING",
            "symbol": "ETHUSDT",
            "ts_start_ms": 1700000060000,
            "open": 2000.0,
            "high": 2001.0,
            "low": 1999.0,
            "close": 2000.5,
            "volume": 10.0
        }"#;
        let msg = parse_stream_message(json).unwrap();
        assert_eq!(msg.kind, BarEventKind::Forming);
    }

    #[test]
    fn parse_subscribed_ack_without_bar_fields() {
        let json = r#"{ "type": "SUBSCRIBED", "symbol": "BTCUSDT" }"#;
        let msg = parse_stream_message(json).unwrap();
        assert_eq!(msg.kind, BarEventKind::Subscribed);
        assert_eq!(msg.symbol, "BTCUSDT");
        assert_eq!(msg.ts_start_ms, 0);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse_stream_message("{ not json").is_err());
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let json = r#"{ "type": "BAR_WEIRD", "symbol": "BTCUSDT" }"#;
        assert!(parse_stream_message(json).is_err());
    }

    #[test]
    fn parse_rejects_negative_volume() {
        let json = r#"{
            "type": "BAR_CONFIRMED",
            "symbol": "BTCUSDT",
            "ts_start_ms": 0,
            "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0,
            "volume": -5.0
        }"#;
        assert!(parse_stream_message(json).is_err());
    }

    #[test]
    fn parse_rejects_missing_type() {
        let json = r#"{ "symbol": "BTCUSDT" }"#;
        assert!(parse_stream_message(json).is_err());
    }
}
