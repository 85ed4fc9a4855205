// =============================================================================
// Moving Averages — SMA, EMA, WMA
// =============================================================================
//
// SMA is the arithmetic mean of the trailing `period` closes.  EMA is seeded
// with the SMA of the first full window, then recursed with smoothing
// constant k = 2 / (period + 1).  WMA weights the window linearly, newest
// heaviest.
//
// Every function returns one slot per input value; slots before the first
// full window hold the warmup sentinel.
// =============================================================================

use crate::engine::channels::Series;

/// Simple moving average.
pub fn sma(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let mut window_sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(window_sum / period as f64);

    for i in period..n {
        window_sum += values[i] - values[i - period];
        out[i] = Some(window_sum / period as f64);
    }
    out
}

/// Exponential moving average, SMA-seeded.
pub fn ema(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let k = 2.0 / (period + 1) as f64;
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let next = values[i] * k + prev * (1.0 - k);
        out[i] = Some(next);
        prev = next;
    }
    out
}

/// Weighted moving average with linear weights 1..=period, newest heaviest.
pub fn wma(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let denom = (period * (period + 1)) as f64 / 2.0;
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(j, v)| v * (j + 1) as f64)
            .sum();
        out[i] = Some(weighted / denom);
    }
    out
}

/// EMA over a warmup-prefixed series, SMA-seeded over the first `period`
/// defined values.  Series produced by this module are always a warmup
/// prefix followed by a contiguous defined suffix, which this relies on.
pub fn ema_over_series(series: &Series, period: usize) -> Series {
    let n = series.len();
    let mut out = vec![None; n];
    let start = match series.iter().position(Option::is_some) {
        Some(s) => s,
        None => return out,
    };

    let dense: Vec<f64> = series[start..].iter().map(|v| v.unwrap_or(0.0)).collect();
    for (i, v) in ema(&dense, period).into_iter().enumerate() {
        out[start + i] = v;
    }
    out
}

/// EMA over a warmup-prefixed series, seeded with the *first defined value*
/// rather than an SMA window.  Used for signal lines that start as soon as
/// their source line does.
pub fn ema_seeded_at_first(series: &Series, period: usize) -> Series {
    let n = series.len();
    let mut out = vec![None; n];
    if period == 0 {
        return out;
    }
    let start = match series.iter().position(Option::is_some) {
        Some(s) => s,
        None => return out,
    };

    let k = 2.0 / (period + 1) as f64;
    let mut prev = series[start].unwrap_or(0.0);
    out[start] = Some(prev);

    for i in (start + 1)..n {
        match series[i] {
            Some(v) => {
                let next = v * k + prev * (1.0 - k);
                out[i] = Some(next);
                prev = next;
            }
            None => out[i] = None,
        }
    }
    out
}
