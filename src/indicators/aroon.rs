// =============================================================================
// Aroon — bars-since-extreme trend gauge
// =============================================================================
//
// Over a trailing window of `period + 1` bars:
//   up   = 100 * (period - barsSinceHighestHigh) / period
//   down = 100 * (period - barsSinceLowestLow)  / period
//   oscillator = up - down
//
// Ties go to the most recent bar, so a fresh extreme always reads 100.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Output of an Aroon pass.
#[derive(Debug, Clone)]
pub struct AroonSeries {
    pub up: Series,
    pub down: Series,
    pub oscillator: Series,
}

/// Compute Aroon up/down/oscillator over `candles`.
pub fn aroon(candles: &[Candle], period: usize) -> AroonSeries {
    let n = candles.len();
    let mut out = AroonSeries {
        up: vec![None; n],
        down: vec![None; n],
        oscillator: vec![None; n],
    };
    if period == 0 || n <= period {
        return out;
    }

    let period_f = period as f64;

    for i in period..n {
        let window = &candles[i - period..=i];

        let mut hi_offset = 0usize; // bars since highest high
        let mut lo_offset = 0usize; // bars since lowest low
        let mut hi = f64::NEG_INFINITY;
        let mut lo = f64::INFINITY;

        for (j, c) in window.iter().enumerate() {
            let age = period - j; // 0 for the newest bar
            if c.high >= hi {
                hi = c.high;
                hi_offset = age;
            }
            if c.low <= lo {
                lo = c.low;
                lo_offset = age;
            }
        }

        let up = 100.0 * (period_f - hi_offset as f64) / period_f;
        let down = 100.0 * (period_f - lo_offset as f64) / period_f;
        out.up[i] = Some(up);
        out.down[i] = Some(down);
        out.oscillator[i] = Some(up - down);
    }

    out
}
