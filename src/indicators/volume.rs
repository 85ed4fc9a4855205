// =============================================================================
// Volume family — OBV, MFI, CMF, A/D Line, VWMA
// =============================================================================
//
// OBV  — cumulative signed-volume walk: add volume on an up close, subtract
//        on a down close, carry on an equal close.
// MFI  — volume-weighted RSI over typical-price money flow.
// CMF  — Chaikin Money Flow: windowed money-flow volume over windowed volume.
// ADL  — cumulative money-flow volume.
// VWMA — volume-weighted trailing mean of closes.
//
// The money-flow multiplier ((close-low) - (high-close)) / (high-low) reads 0
// on a zero-range bar.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Money-flow multiplier for one bar; 0 when the bar has no range.
fn money_flow_multiplier(c: &Candle) -> f64 {
    let range = c.high - c.low;
    if range == 0.0 {
        0.0
    } else {
        ((c.close - c.low) - (c.high - c.close)) / range
    }
}

/// On-Balance Volume.  Defined from the first bar (which reads 0 — there is
/// no prior close to sign against).
pub fn obv(candles: &[Candle]) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if n == 0 {
        return out;
    }

    let mut total = 0.0;
    out[0] = Some(total);
    for i in 1..n {
        let delta = candles[i].close - candles[i - 1].close;
        if delta > 0.0 {
            total += candles[i].volume;
        } else if delta < 0.0 {
            total -= candles[i].volume;
        }
        out[i] = Some(total);
    }
    out
}

/// Money Flow Index over the trailing `period` bar transitions.
///
/// Zero negative flow clamps to 100 (all buying pressure); an entirely flat
/// window reads 50.
pub fn mfi(candles: &[Candle], period: usize) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    // Signed money flow per transition (index i compares tp[i] to tp[i-1]).
    let tp: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
    let mut pos = vec![0.0; n];
    let mut neg = vec![0.0; n];
    for i in 1..n {
        let flow = tp[i] * candles[i].volume;
        if tp[i] > tp[i - 1] {
            pos[i] = flow;
        } else if tp[i] < tp[i - 1] {
            neg[i] = flow;
        }
    }

    for i in period..n {
        let pos_sum: f64 = pos[i + 1 - period..=i].iter().sum();
        let neg_sum: f64 = neg[i + 1 - period..=i].iter().sum();

        out[i] = Some(if pos_sum == 0.0 && neg_sum == 0.0 {
            50.0
        } else if neg_sum == 0.0 {
            100.0
        } else {
            let ratio = pos_sum / neg_sum;
            100.0 - 100.0 / (1.0 + ratio)
        });
    }
    out
}

/// Chaikin Money Flow over the trailing `period` bars.  A zero-volume window
/// reads 0.
pub fn cmf(candles: &[Candle], period: usize) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let mfv: Vec<f64> = candles
        .iter()
        .map(|c| money_flow_multiplier(c) * c.volume)
        .collect();

    for i in (period - 1)..n {
        let mfv_sum: f64 = mfv[i + 1 - period..=i].iter().sum();
        let vol_sum: f64 = candles[i + 1 - period..=i].iter().map(|c| c.volume).sum();
        out[i] = Some(if vol_sum == 0.0 { 0.0 } else { mfv_sum / vol_sum });
    }
    out
}

/// Accumulation/Distribution Line: running sum of money-flow volume.
pub fn adl(candles: &[Candle]) -> Series {
    let mut total = 0.0;
    candles
        .iter()
        .map(|c| {
            total += money_flow_multiplier(c) * c.volume;
            Some(total)
        })
        .collect()
}

/// Volume-weighted moving average of closes.  A zero-volume window falls back
/// to the plain mean of the window's closes.
pub fn vwma(candles: &[Candle], period: usize) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    for i in (period - 1)..n {
        let window = &candles[i + 1 - period..=i];
        let vol_sum: f64 = window.iter().map(|c| c.volume).sum();
        out[i] = Some(if vol_sum == 0.0 {
            window.iter().map(|c| c.close).sum::<f64>() / period as f64
        } else {
            window.iter().map(|c| c.close * c.volume).sum::<f64>() / vol_sum
        });
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle::new(0, close, high, low, close, volume)
    }

    #[test]
    fn obv_signed_walk() {
        let candles = vec![
            candle(11.0, 9.0, 10.0, 100.0),
            candle(12.0, 10.0, 11.0, 200.0), // up: +200
            candle(11.0, 9.0, 10.0, 50.0),   // down: -50
            candle(11.0, 9.0, 10.0, 500.0),  // flat: carry
        ];
        let out = obv(&candles);
        assert_eq!(out, vec![Some(0.0), Some(200.0), Some(150.0), Some(150.0)]);
    }

    #[test]
    fn mfi_range_and_warmup() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + ((i * 7) % 13) as f64;
                candle(base + 1.0, base - 1.0, base, 100.0 + i as f64)
            })
            .collect();
        let out = mfi(&candles, 14);
        assert_eq!(out.len(), 30);
        assert_eq!(out[13], None);
        assert!(out[14].is_some());
        for v in out.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn mfi_all_rising_clamps_to_100() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(base + 1.0, base - 1.0, base, 100.0)
            })
            .collect();
        let last = mfi(&candles, 14).last().unwrap().unwrap();
        assert!((last - 100.0).abs() < 1e-10);
    }

    #[test]
    fn mfi_flat_window_reads_50() {
        let candles = vec![candle(101.0, 99.0, 100.0, 100.0); 20];
        let last = mfi(&candles, 14).last().unwrap().unwrap();
        assert!((last - 50.0).abs() < 1e-10);
    }

    #[test]
    fn cmf_close_at_high_reads_plus_one() {
        // Close pinned to the high: multiplier = +1 every bar.
        let candles = vec![candle(110.0, 90.0, 110.0, 100.0); 25];
        let last = cmf(&candles, 20).last().unwrap().unwrap();
        assert!((last - 1.0).abs() < 1e-10);
    }

    #[test]
    fn cmf_zero_range_bars_read_zero() {
        let candles = vec![candle(100.0, 100.0, 100.0, 100.0); 25];
        let last = cmf(&candles, 20).last().unwrap().unwrap();
        assert!(last.abs() < 1e-12);
    }

    #[test]
    fn cmf_zero_volume_window_reads_zero() {
        let candles = vec![candle(110.0, 90.0, 100.0, 0.0); 25];
        let last = cmf(&candles, 20).last().unwrap().unwrap();
        assert!(last.abs() < 1e-12);
    }

    #[test]
    fn adl_accumulates_money_flow() {
        // multiplier = +1 (close at high), volume 100 => +100 per bar.
        let candles = vec![candle(110.0, 90.0, 110.0, 100.0); 3];
        let out = adl(&candles);
        assert_eq!(out, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn vwma_weights_by_volume() {
        let candles = vec![
            candle(11.0, 9.0, 10.0, 100.0),
            candle(13.0, 11.0, 12.0, 300.0),
        ];
        let out = vwma(&candles, 2);
        // (10*100 + 12*300) / 400 = 11.5
        assert!((out[1].unwrap() - 11.5).abs() < 1e-12);
    }

    #[test]
    fn vwma_zero_volume_falls_back_to_mean() {
        let candles = vec![
            candle(11.0, 9.0, 10.0, 0.0),
            candle(13.0, 11.0, 12.0, 0.0),
        ];
        let out = vwma(&candles, 2);
        assert!((out[1].unwrap() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn volume_family_handles_empty_input() {
        assert!(obv(&[]).is_empty());
        assert!(mfi(&[], 14).is_empty());
        assert!(cmf(&[], 20).is_empty());
        assert!(adl(&[]).is_empty());
        assert!(vwma(&[], 20).is_empty());
    }
}
