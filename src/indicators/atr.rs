// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// True Range for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the Wilder-smoothed average of TR:
//   ATR_seed = SMA of the first `period` TR values
//   ATR_t    = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// The first bar has no previous close; its TR is the plain high-low range and
// it is excluded from the seed window.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Per-bar true range.  `tr[0]` falls back to the bar's own range.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.high - c.low
            } else {
                let prev_close = candles[i - 1].close;
                (c.high - c.low)
                    .max((c.high - prev_close).abs())
                    .max((c.low - prev_close).abs())
            }
        })
        .collect()
}

/// Wilder smoothing of a raw value series: seeded with the simple mean of
/// `values[offset..offset + period]`, recursed thereafter.  Slots before the
/// seed completes are warmup.
pub fn wilder_smooth(values: &[f64], period: usize, offset: usize) -> Series {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < offset + period {
        return out;
    }

    let period_f = period as f64;
    let seed: f64 = values[offset..offset + period].iter().sum::<f64>() / period_f;
    let seed_idx = offset + period - 1;
    out[seed_idx] = Some(seed);

    let mut prev = seed;
    for i in (seed_idx + 1)..n {
        let next = (prev * (period_f - 1.0) + values[i]) / period_f;
        out[i] = Some(next);
        prev = next;
    }
    out
}

/// Full ATR series, index-aligned with `candles`.
///
/// The seed window starts at bar 1 (the first bar with a previous close), so
/// the first defined value lands at index `period`.
pub fn atr(candles: &[Candle], period: usize) -> Series {
    let tr = true_range(candles);
    wilder_smooth(&tr, period, 1)
}
