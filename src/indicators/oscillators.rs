// =============================================================================
// Oscillators — CCI, ROC, Momentum, TRIX
// =============================================================================
//
// CCI       = (typicalPrice - SMA(tp)) / (0.015 * meanDeviation); zero mean
//             deviation reads 0.
// ROC       = (close - close_n) / close_n * 100; a zero reference reads 0.
// Momentum  = close - close_n.
// TRIX      = one-bar rate of change of a triple-smoothed EMA, in percent.
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::moving_averages::{ema, ema_over_series};
use crate::market_data::Candle;

/// Commodity Channel Index over typical prices.
pub fn cci(candles: &[Candle], period: usize) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let tp: Vec<f64> = candles.iter().map(Candle::typical_price).collect();

    for i in (period - 1)..n {
        let window = &tp[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let mean_dev: f64 =
            window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;

        out[i] = Some(if mean_dev == 0.0 {
            0.0
        } else {
            (tp[i] - mean) / (0.015 * mean_dev)
        });
    }
    out
}

/// Rate of Change in percent over `period` bars.
pub fn roc(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n <= period {
        return out;
    }

    for i in period..n {
        let reference = closes[i - period];
        out[i] = Some(if reference == 0.0 {
            0.0
        } else {
            (closes[i] - reference) / reference * 100.0
        });
    }
    out
}

/// Raw momentum: close minus the close `period` bars back.
pub fn momentum(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n <= period {
        return out;
    }
    for i in period..n {
        out[i] = Some(closes[i] - closes[i - period]);
    }
    out
}

/// TRIX: percentage one-bar change of the triple EMA.
pub fn trix(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 {
        return out;
    }

    let e1 = ema(closes, period);
    let e2 = ema_over_series(&e1, period);
    let e3 = ema_over_series(&e2, period);

    for i in 1..n {
        if let (Some(prev), Some(curr)) = (e3[i - 1], e3[i]) {
            out[i] = Some(if prev == 0.0 {
                0.0
            } else {
                (curr - prev) / prev * 100.0
            });
        }
    }
    out
}
