// =============================================================================
// Parabolic SAR — Wilder's stop-and-reverse system
// =============================================================================
//
// An explicit two-state machine {UP, DOWN} carrying the extreme point (EP)
// and acceleration factor (AF).  AF starts at `af_start`, grows by `af_step`
// each time a new extreme prints, and caps at `af_max`.
//
//   SAR_next = SAR + AF * (EP - SAR)
//
// While UP the SAR is clamped under the two prior lows and a low below it
// triggers a reversal; while DOWN the mirror rule applies.  On reversal the
// SAR snaps to the prior extreme and EP/AF reset.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Trend state of the SAR machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SarTrend {
    Up,
    Down,
}

/// Compute the Parabolic SAR series over `candles`.
pub fn parabolic_sar(candles: &[Candle], af_start: f64, af_step: f64, af_max: f64) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if n < 2 {
        return out;
    }

    // Initial direction from the first two closes.
    let mut trend = if candles[1].close >= candles[0].close {
        SarTrend::Up
    } else {
        SarTrend::Down
    };
    let mut af = af_start;
    let (mut sar, mut ep) = match trend {
        SarTrend::Up => (candles[0].low, candles[1].high),
        SarTrend::Down => (candles[0].high, candles[1].low),
    };

    out[1] = Some(sar);

    for i in 2..n {
        let mut next = sar + af * (ep - sar);

        match trend {
            SarTrend::Up => {
                // SAR may not rise above the two prior lows.
                next = next.min(candles[i - 1].low).min(candles[i - 2].low);

                if candles[i].low < next {
                    // Reverse: SAR snaps to the prior extreme, state resets.
                    trend = SarTrend::Down;
                    next = ep;
                    ep = candles[i].low;
                    af = af_start;
                } else if candles[i].high > ep {
                    ep = candles[i].high;
                    af = (af + af_step).min(af_max);
                }
            }
            SarTrend::Down => {
                // SAR may not fall below the two prior highs.
                next = next.max(candles[i - 1].high).max(candles[i - 2].high);

                if candles[i].high > next {
                    trend = SarTrend::Up;
                    next = ep;
                    ep = candles[i].high;
                    af = af_start;
                } else if candles[i].low < ep {
                    ep = candles[i].low;
                    af = (af + af_step).min(af_max);
                }
            }
        }

        sar = next;
        out[i] = Some(sar);
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, open, high, low, close, 100.0)
    }

    #[test]
    fn uptrend_sar_below_price() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                candle(base, base + 2.0, base - 1.0, base + 1.5)
            })
            .collect();
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.2);
        for i in 2..10 {
            let sar = out[i].unwrap();
            assert!(
                sar < candles[i].low,
                "SAR {sar} should sit below low {} at bar {i}",
                candles[i].low
            );
        }
    }

    #[test]
    fn downtrend_sar_moves_above_price() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| {
                let base = 200.0 - i as f64 * 3.0;
                candle(base, base + 1.0, base - 2.0, base - 1.5)
            })
            .collect();
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.2);
        let above = (2..10).any(|i| out[i].unwrap() > candles[i].high);
        assert!(above, "SAR should ride above price in a downtrend");
    }

    #[test]
    fn sharp_reversal_flips_sar_side() {
        let data = [
            (100.0, 105.0, 98.0, 103.0),
            (103.0, 108.0, 101.0, 107.0),
            (107.0, 112.0, 105.0, 111.0),
            (111.0, 115.0, 109.0, 114.0),
            (114.0, 114.5, 100.0, 101.0), // collapse
            (101.0, 102.0, 95.0, 96.0),
            (96.0, 97.0, 90.0, 91.0),
        ];
        let candles: Vec<Candle> = data
            .iter()
            .map(|&(o, h, l, c)| candle(o, h, l, c))
            .collect();
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.2);

        let mut was_below = false;
        let mut flipped_above = false;
        for i in 1..candles.len() {
            if let Some(sar) = out[i] {
                if sar < candles[i].close {
                    was_below = true;
                }
                if was_below && sar > candles[i].close {
                    flipped_above = true;
                }
            }
        }
        assert!(flipped_above, "SAR should flip sides after the reversal");
    }

    #[test]
    fn reversal_snaps_to_prior_extreme() {
        // Rise to a clear extreme then crash through the SAR.
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.5),
            candle(100.5, 103.0, 100.0, 102.5),
            candle(102.5, 106.0, 102.0, 105.5),
            candle(105.5, 110.0, 105.0, 109.5),
            candle(109.5, 109.8, 90.0, 91.0), // low crashes far below SAR
        ];
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.2);
        // On the reversal bar the SAR snaps to the highest high seen (110).
        assert_eq!(out[4], Some(110.0));
    }

    #[test]
    fn warmup_and_alignment() {
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0); 5];
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.2);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], None);
        assert!(out[1].is_some());
    }

    #[test]
    fn single_bar_is_all_warmup() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0)];
        assert!(parabolic_sar(&candles, 0.02, 0.02, 0.2)
            .iter()
            .all(Option::is_none));
        assert!(parabolic_sar(&[], 0.02, 0.02, 0.2).is_empty());
    }

    #[test]
    fn long_trend_does_not_panic_at_af_cap() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(base, base + 1.0, base - 0.5, base + 0.8)
            })
            .collect();
        let out = parabolic_sar(&candles, 0.02, 0.02, 0.1);
        let defined = out.iter().flatten().count();
        assert!(defined > 30);
    }
}
