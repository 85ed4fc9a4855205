// =============================================================================
// Supertrend — ATR-banded directional fold
// =============================================================================
//
// Basic bands: hl2 ± multiplier * ATR.  The working bands are sticky: the
// upper band may only move down (tighten toward price) unless the prior close
// already broke above it, and the lower band may only move up unless the
// prior close broke below it.  Direction flips when the close crosses the
// currently active band; the line then tracks the opposite band.
//
// Each value depends on the previous bar's chosen band, so this is a strict
// left-to-right fold over the candle sequence — it cannot be evaluated
// independently per index.
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::atr::atr;
use crate::market_data::Candle;

/// Output of a Supertrend pass: the band line plus the trend direction
/// (+1 up, -1 down).
#[derive(Debug, Clone)]
pub struct SupertrendSeries {
    pub line: Series,
    pub direction: Series,
}

/// Band state carried bar to bar.
#[derive(Debug, Clone, Copy)]
struct BandState {
    upper: f64,
    lower: f64,
    trending_up: bool,
}

/// Compute the Supertrend line and direction over `candles`.
pub fn supertrend(candles: &[Candle], period: usize, multiplier: f64) -> SupertrendSeries {
    let n = candles.len();
    let mut out = SupertrendSeries {
        line: vec![None; n],
        direction: vec![None; n],
    };

    let atr_series = atr(candles, period);
    let start = match atr_series.iter().position(Option::is_some) {
        Some(s) => s,
        None => return out,
    };

    // Initialize from the first bar with a defined ATR; trend starts up.
    let hl2 = candles[start].hl2();
    let a = atr_series[start].unwrap_or(0.0);
    let mut state = BandState {
        upper: hl2 + multiplier * a,
        lower: hl2 - multiplier * a,
        trending_up: true,
    };
    out.line[start] = Some(state.lower);
    out.direction[start] = Some(1.0);

    for i in (start + 1)..n {
        let a = match atr_series[i] {
            Some(a) => a,
            None => continue,
        };

        let hl2 = candles[i].hl2();
        let basic_upper = hl2 + multiplier * a;
        let basic_lower = hl2 - multiplier * a;
        let prev_close = candles[i - 1].close;

        // Sticky bands: tighten-only unless the prior close broke through.
        let upper = if prev_close <= state.upper {
            basic_upper.min(state.upper)
        } else {
            basic_upper
        };
        let lower = if prev_close >= state.lower {
            basic_lower.max(state.lower)
        } else {
            basic_lower
        };

        // Flip when the close crosses the active band.
        let close = candles[i].close;
        let trending_up = if state.trending_up {
            close >= lower
        } else {
            close > upper
        };

        state = BandState {
            upper,
            lower,
            trending_up,
        };
        out.line[i] = Some(if trending_up { lower } else { upper });
        out.direction[i] = Some(if trending_up { 1.0 } else { -1.0 });
    }

    out
}
