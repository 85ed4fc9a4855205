// =============================================================================
// Price Envelopes — Keltner Channel & Donchian Channel
// =============================================================================
//
// Keltner:  middle = EMA(close), bands = middle ± multiplier * ATR.
// Donchian: upper/lower = rolling highest high / lowest low, middle = their
//           midpoint.
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::atr::atr;
use crate::indicators::moving_averages::ema;
use crate::market_data::Candle;

/// Three aligned band series shared by both envelope kinds.
#[derive(Debug, Clone)]
pub struct EnvelopeSeries {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
}

/// Keltner Channel: EMA midline with ATR-scaled bands.
pub fn keltner(candles: &[Candle], period: usize, multiplier: f64) -> EnvelopeSeries {
    let n = candles.len();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let midline = ema(&closes, period);
    let atr_series = atr(candles, period);

    let mut middle = vec![None; n];
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for i in 0..n {
        if let (Some(m), Some(a)) = (midline[i], atr_series[i]) {
            middle[i] = Some(m);
            upper[i] = Some(m + multiplier * a);
            lower[i] = Some(m - multiplier * a);
        }
    }

    EnvelopeSeries {
        middle,
        upper,
        lower,
    }
}

/// Donchian Channel: rolling extrema of the trailing `period` bars.
pub fn donchian(candles: &[Candle], period: usize) -> EnvelopeSeries {
    let n = candles.len();
    let mut middle = vec![None; n];
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    if period > 0 && n >= period {
        for i in (period - 1)..n {
            let window = &candles[i + 1 - period..=i];
            let mut hi = f64::NEG_INFINITY;
            let mut lo = f64::INFINITY;
            for c in window {
                hi = hi.max(c.high);
                lo = lo.min(c.low);
            }
            upper[i] = Some(hi);
            lower[i] = Some(lo);
            middle[i] = Some((hi + lo) / 2.0);
        }
    }

    EnvelopeSeries {
        middle,
        upper,
        lower,
    }
}
