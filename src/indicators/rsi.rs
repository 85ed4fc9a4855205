// =============================================================================
// Relative Strength Index (RSI) & Stochastic RSI — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Price deltas from consecutive closes.
// Step 2 — Seed average gain / average loss with the simple mean of the first
//          `period` deltas.
// Step 3 — Wilder's recursion:
//            avg = (avg * (period - 1) + new) / period
// Step 4 — RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS).
//
// When the average loss is zero the RSI is 100 by convention, never a
// division error.  StochRSI applies the stochastic formula to the RSI series
// itself, with the zero-range window falling back to 50.
// =============================================================================

use crate::engine::channels::Series;

/// Compute the full RSI series, index-aligned with `closes`.
///
/// The first `period` slots are warmup (the deltas that seed the averages).
pub fn rsi(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let period_f = period as f64;

    // Seed averages from the first `period` deltas.
    let (mut avg_gain, mut avg_loss) = {
        let (mut gain, mut loss) = (0.0_f64, 0.0_f64);
        for w in closes[..=period].windows(2) {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                gain += delta;
            } else {
                loss += -delta;
            }
        }
        (gain / period_f, loss / period_f)
    };

    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in (period + 1)..n {
        let delta = closes[i] - closes[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        out[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    out
}

/// RSI from the smoothed averages.  Zero average loss clamps to 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Stochastic RSI: where the current RSI sits inside its own trailing
/// `period`-window range, scaled to [0, 100].  A zero-range window (flat RSI)
/// reads 50.
pub fn stoch_rsi(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 {
        return out;
    }

    let rsi_series = rsi(closes, period);

    for i in 0..n {
        // Need `period` defined RSI values ending at i.
        if i + 1 < period {
            continue;
        }
        let window = &rsi_series[i + 1 - period..=i];
        if window.iter().any(Option::is_none) {
            continue;
        }

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in window.iter().flatten() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }

        let current = rsi_series[i].unwrap_or(0.0);
        let range = hi - lo;
        out[i] = Some(if range == 0.0 {
            50.0
        } else {
            (current - lo) / range * 100.0
        });
    }

    out
}
