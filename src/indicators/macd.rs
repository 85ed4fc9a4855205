// =============================================================================
// MACD — Moving Average Convergence/Divergence
// =============================================================================
//
// MACD line = fast EMA − slow EMA.
// Signal    = EMA of the MACD line, seeded at the first defined MACD value.
// Histogram = MACD − signal.
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::moving_averages::{ema, ema_seeded_at_first};

/// Output of a MACD pass: three index-aligned series.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// Compute MACD/signal/histogram over `closes`.
pub fn macd(closes: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdSeries {
    let n = closes.len();

    let fast = ema(closes, fast_period);
    let slow = ema(closes, slow_period);

    let macd_line: Series = (0..n)
        .map(|i| match (fast[i], slow[i]) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = ema_seeded_at_first(&macd_line, signal_period);

    let histogram: Series = (0..n)
        .map(|i| match (macd_line[i], signal[i]) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd: macd_line,
        signal,
        histogram,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_channels_match_input_length() {
        let closes: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let out = macd(&closes, 12, 26, 9);
        assert_eq!(out.macd.len(), 60);
        assert_eq!(out.signal.len(), 60);
        assert_eq!(out.histogram.len(), 60);
    }

    #[test]
    fn macd_defined_from_slow_window() {
        let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let out = macd(&closes, 12, 26, 9);
        assert_eq!(out.macd[24], None);
        assert!(out.macd[25].is_some());
        // Signal starts with the MACD line itself.
        assert_eq!(out.signal[25], out.macd[25]);
        // Histogram is zero at the seed point.
        assert!((out.histogram[25].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn flat_series_gives_zero_macd() {
        let closes = vec![100.0; 50];
        let out = macd(&closes, 12, 26, 9);
        for v in out.macd.iter().flatten() {
            assert!(v.abs() < 1e-12);
        }
        for v in out.histogram.iter().flatten() {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn rising_series_gives_positive_macd() {
        let closes: Vec<f64> = (1..=80).map(|x| x as f64 * 2.0).collect();
        let out = macd(&closes, 12, 26, 9);
        let last = out.macd.last().unwrap().unwrap();
        assert!(last > 0.0, "expected positive MACD in an uptrend, got {last}");
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 11) % 17) as f64).collect();
        let out = macd(&closes, 5, 10, 4);
        for i in 0..60 {
            if let (Some(m), Some(s), Some(h)) = (out.macd[i], out.signal[i], out.histogram[i]) {
                assert!((h - (m - s)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = macd(&[], 12, 26, 9);
        assert!(out.macd.is_empty());
        assert!(out.signal.is_empty());
        assert!(out.histogram.is_empty());
    }
}
