// =============================================================================
// Stochastic Oscillator & Williams %R — windowed extrema momentum
// =============================================================================
//
// %K  = 100 * (close - lowestLow) / (highestHigh - lowestLow)
// %D  = SMA of %K over `smooth_period`
// %R  = -100 * (highestHigh - close) / (highestHigh - lowestLow)
//
// A zero-range window cannot divide; the stochastic falls back to 50 and
// Williams %R to -50 (mid-range), never NaN or infinity.
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::moving_averages::sma;
use crate::market_data::Candle;

/// Rolling (highest high, lowest low) over the trailing `period` candles
/// ending at each index; `None` during warmup.
fn rolling_extrema(candles: &[Candle], period: usize) -> Vec<Option<(f64, f64)>> {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }
    for i in (period - 1)..n {
        let window = &candles[i + 1 - period..=i];
        let mut hi = f64::NEG_INFINITY;
        let mut lo = f64::INFINITY;
        for c in window {
            hi = hi.max(c.high);
            lo = lo.min(c.low);
        }
        out[i] = Some((hi, lo));
    }
    out
}

/// Output of a stochastic pass.
#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

/// Compute %K and its SMA-smoothed %D signal.
pub fn stochastic(candles: &[Candle], period: usize, smooth_period: usize) -> StochasticSeries {
    let n = candles.len();
    let extrema = rolling_extrema(candles, period);

    let k: Series = (0..n)
        .map(|i| {
            extrema[i].map(|(hi, lo)| {
                let range = hi - lo;
                if range == 0.0 {
                    50.0
                } else {
                    (candles[i].close - lo) / range * 100.0
                }
            })
        })
        .collect();

    // %D: SMA over the defined suffix of %K.
    let d = sma_over_series(&k, smooth_period);

    StochasticSeries { k, d }
}

/// Williams %R over the trailing `period` window.
pub fn williams_r(candles: &[Candle], period: usize) -> Series {
    let n = candles.len();
    let extrema = rolling_extrema(candles, period);

    (0..n)
        .map(|i| {
            extrema[i].map(|(hi, lo)| {
                let range = hi - lo;
                if range == 0.0 {
                    -50.0
                } else {
                    (hi - candles[i].close) / range * -100.0
                }
            })
        })
        .collect()
}

/// SMA over a warmup-prefixed series (defined suffix only).
pub fn sma_over_series(series: &Series, period: usize) -> Series {
    let n = series.len();
    let mut out = vec![None; n];
    let start = match series.iter().position(Option::is_some) {
        Some(s) => s,
        None => return out,
    };
    let dense: Vec<f64> = series[start..].iter().map(|v| v.unwrap_or(0.0)).collect();
    for (i, v) in sma(&dense, period).into_iter().enumerate() {
        out[start + i] = v;
    }
    out
}
