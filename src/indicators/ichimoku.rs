// =============================================================================
// Ichimoku — rolling-midpoint trend system
// =============================================================================
//
// tenkan   = midpoint of (highest high, lowest low) over `tenkan_period`
// kijun    = same midpoint over `kijun_period`
// senkou A = (tenkan + kijun) / 2
// senkou B = same midpoint over `senkou_b_period`
//
// The spans are emitted at their computation index *without* the traditional
// forward displacement — shifting the cloud is a rendering concern, not an
// engine one.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Output of an Ichimoku pass: four aligned series.
#[derive(Debug, Clone)]
pub struct IchimokuSeries {
    pub tenkan: Series,
    pub kijun: Series,
    pub senkou_a: Series,
    pub senkou_b: Series,
}

/// Rolling (highestHigh + lowestLow) / 2 over the trailing `period` bars.
fn midpoint(candles: &[Candle], period: usize) -> Series {
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
        out[i] = Some((hi + lo) / 2.0);
    }
    out
}

/// Compute the four Ichimoku lines.
pub fn ichimoku(
    candles: &[Candle],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
) -> IchimokuSeries {
    let n = candles.len();
    let tenkan = midpoint(candles, tenkan_period);
    let kijun = midpoint(candles, kijun_period);
    let senkou_b = midpoint(candles, senkou_b_period);

    let senkou_a: Series = (0..n)
        .map(|i| match (tenkan[i], kijun[i]) {
            (Some(t), Some(k)) => Some((t + k) / 2.0),
            _ => None,
        })
        .collect();

    IchimokuSeries {
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
    }
}
