// =============================================================================
// Average Directional Index (ADX/DMI)
// =============================================================================
//
// Pipeline:
//   1. +DM / -DM from consecutive high/low deltas, True Range per bar.
//   2. Wilder-smoothed running sums of +DM, -DM, TR.
//   3. DI± = smoothed±DM / smoothedTR * 100.
//   4. DX  = |DI+ - DI-| / (DI+ + DI-) * 100.
//   5. ADX = Wilder-smoothed average of DX.
//
// DI needs `period` bar transitions, and ADX needs another `period` DX values
// on top — a double warmup: the first ADX lands at index 2*period - 1, longer
// than any single-window indicator.  Zero smoothed TR or a zero DI sum reads
// 0, never a division error.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Output of an ADX pass: the ADX line plus both directional indices.
#[derive(Debug, Clone)]
pub struct AdxSeries {
    pub adx: Series,
    pub plus_di: Series,
    pub minus_di: Series,
}

/// Compute ADX and DI± over `candles`.
pub fn adx(candles: &[Candle], period: usize) -> AdxSeries {
    let n = candles.len();
    let mut out = AdxSeries {
        adx: vec![None; n],
        plus_di: vec![None; n],
        minus_di: vec![None; n],
    };
    if period == 0 || n < period + 1 {
        return out;
    }

    let period_f = period as f64;

    // ── Raw +DM / -DM / TR per bar transition ───────────────────────────
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    let mut tr = vec![0.0; n];

    for i in 1..n {
        let up_move = candles[i].high - candles[i - 1].high;
        let down_move = candles[i - 1].low - candles[i].low;

        plus_dm[i] = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        minus_dm[i] = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        let prev_close = candles[i - 1].close;
        tr[i] = (candles[i].high - candles[i].low)
            .max((candles[i].high - prev_close).abs())
            .max((candles[i].low - prev_close).abs());
    }

    // ── Wilder-smoothed running sums, seeded over bars 1..=period ───────
    let mut smooth_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[1..=period].iter().sum();
    let mut smooth_tr: f64 = tr[1..=period].iter().sum();

    let mut dx = vec![None; n];

    let (p, m, d) = di_dx(smooth_plus, smooth_minus, smooth_tr);
    out.plus_di[period] = Some(p);
    out.minus_di[period] = Some(m);
    dx[period] = Some(d);

    for i in (period + 1)..n {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr[i];

        let (p, m, d) = di_dx(smooth_plus, smooth_minus, smooth_tr);
        out.plus_di[i] = Some(p);
        out.minus_di[i] = Some(m);
        dx[i] = Some(d);
    }

    // ── ADX: Wilder-smoothed mean of DX, double warmup ──────────────────
    let adx_start = 2 * period - 1;
    if n <= adx_start {
        return out;
    }

    let seed: f64 = dx[period..=adx_start]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum::<f64>()
        / period_f;
    out.adx[adx_start] = Some(seed);

    let mut prev = seed;
    for i in (adx_start + 1)..n {
        let next = (prev * (period_f - 1.0) + dx[i].unwrap_or(0.0)) / period_f;
        out.adx[i] = Some(next);
        prev = next;
    }

    out
}

/// DI± and DX from the smoothed sums, with zero-divisor fallbacks.
fn di_dx(smooth_plus: f64, smooth_minus: f64, smooth_tr: f64) -> (f64, f64, f64) {
    if smooth_tr == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let plus_di = smooth_plus / smooth_tr * 100.0;
    let minus_di = smooth_minus / smooth_tr * 100.0;
    let di_sum = plus_di + minus_di;
    let dx = if di_sum == 0.0 {
        0.0
    } else {
        (plus_di - minus_di).abs() / di_sum * 100.0
    };
    (plus_di, minus_di, dx)
}
