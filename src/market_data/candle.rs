// =============================================================================
// Candle & CandleStore — the canonical chart timeline
// =============================================================================
//
// The store holds an ordered, deduplicated sequence of confirmed candles plus
// at most one mutable "forming" candle at the tail.  Confirmed candles are
// strictly increasing in open time; a forming candle is replaced wholesale on
// every update and never appended to history.  Every indicator reads the same
// timeline: confirmed history with the forming candle appended last.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single OHLCV bar.  `time` is the bar's open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Midpoint of the bar's range — used by band-style indicators.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Typical price (H + L + C) / 3 — used by the money-flow family.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Ordered candle series for one (symbol, timeframe) subscription.
///
/// Invariants:
/// - `confirmed` is strictly increasing in `time` with no duplicates.
/// - `forming`, when present, has `time >= ` the last confirmed candle's time.
#[derive(Debug, Default)]
pub struct CandleStore {
    confirmed: Vec<Candle>,
    forming: Option<Candle>,
    /// Maximum confirmed candles retained; oldest are trimmed beyond this.
    max_candles: usize,
}

impl CandleStore {
    /// Create a store that retains at most `max_candles` confirmed candles,
    /// plus the forming candle.
    pub fn new(max_candles: usize) -> Self {
        Self {
            confirmed: Vec::new(),
            forming: None,
            max_candles,
        }
    }

    /// Replace the forming candle wholesale.
    ///
    /// A forming candle older than the newest confirmed candle is stale
    /// re-delivery and is dropped.  Returns `true` when the tail changed.
    pub fn apply_forming(&mut self, candle: Candle) -> bool {
        if let Some(last) = self.confirmed.last() {
            if candle.time < last.time {
                warn!(
                    forming_time = candle.time,
                    last_confirmed = last.time,
                    "stale forming candle dropped"
                );
                return false;
            }
        }
        self.forming = Some(candle);
        true
    }

    /// Append a confirmed (or historical) candle.
    ///
    /// Duplicate delivery is idempotent: if a confirmed candle with the same
    /// open time already exists the message is discarded.  Backfill may arrive
    /// out of order, so insertion keeps the series sorted.  Returns `true`
    /// when the series changed.
    pub fn apply_confirmed(&mut self, candle: Candle) -> bool {
        match self.confirmed.binary_search_by_key(&candle.time, |c| c.time) {
            Ok(_) => {
                debug!(time = candle.time, "duplicate confirmed candle discarded");
                false
            }
            Err(pos) => {
                self.confirmed.insert(pos, candle);

                // The forming candle for this interval is now finalized; a
                // forming candle older than the new tail is stale either way.
                if let Some(f) = self.forming {
                    if f.time <= candle.time {
                        self.forming = None;
                    }
                }

                while self.confirmed.len() > self.max_candles {
                    self.confirmed.remove(0);
                }
                true
            }
        }
    }

    /// The canonical timeline: confirmed history plus the forming candle
    /// appended as the provisional last element.
    pub fn timeline(&self) -> Vec<Candle> {
        let mut out = self.confirmed.clone();
        if let Some(f) = self.forming {
            out.push(f);
        }
        out
    }

    /// Confirmed candles only (oldest first).
    pub fn confirmed(&self) -> &[Candle] {
        &self.confirmed
    }

    /// The current forming candle, if any.
    pub fn forming(&self) -> Option<&Candle> {
        self.forming.as_ref()
    }

    /// Number of confirmed candles.
    pub fn confirmed_len(&self) -> usize {
        self.confirmed.len()
    }

    /// Total timeline length (confirmed + forming).
    pub fn len(&self) -> usize {
        self.confirmed.len() + usize::from(self.forming.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all candles.  Called on symbol/timeframe switch.
    pub fn clear(&mut self) {
        self.confirmed.clear();
        self.forming = None;
    }
}
