// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle = SMA(close, period); bands = middle ± k * σ where σ is the
// *population* standard deviation over the same window (divide by `period`,
// not `period - 1`).
// =============================================================================

use crate::engine::channels::Series;
use crate::indicators::moving_averages::sma;

/// Output of a Bollinger pass: three index-aligned series.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub middle: Series,
    pub upper: Series,
    pub lower: Series,
}

/// Compute Bollinger Bands over `closes`.
pub fn bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma(closes, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    if period > 0 && n >= period {
        for i in (period - 1)..n {
            let mean = match middle[i] {
                Some(m) => m,
                None => continue,
            };
            let window = &closes[i + 1 - period..=i];
            let variance =
                window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
            let std_dev = variance.sqrt();
            upper[i] = Some(mean + num_std * std_dev);
            lower[i] = Some(mean - num_std * std_dev);
        }
    }

    BollingerSeries {
        middle,
        upper,
        lower,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_straddle_the_middle() {
        let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let out = bollinger(&closes, 20, 2.0);
        for i in 0..40 {
            if let (Some(m), Some(u), Some(l)) = (out.middle[i], out.upper[i], out.lower[i]) {
                assert!(u > m, "upper {u} must exceed middle {m}");
                assert!(l < m, "lower {l} must undercut middle {m}");
            }
        }
    }

    #[test]
    fn flat_market_collapses_bands() {
        let closes = vec![100.0; 30];
        let out = bollinger(&closes, 20, 2.0);
        let i = 25;
        assert_eq!(out.middle[i], Some(100.0));
        assert_eq!(out.upper[i], Some(100.0));
        assert_eq!(out.lower[i], Some(100.0));
    }

    #[test]
    fn population_std_dev_known_value() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, population σ = 2.
        let closes = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = bollinger(&closes, 8, 2.0);
        assert_eq!(out.middle[7], Some(5.0));
        assert_eq!(out.upper[7], Some(9.0));
        assert_eq!(out.lower[7], Some(1.0));
    }

    #[test]
    fn warmup_and_alignment() {
        let closes: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        let out = bollinger(&closes, 20, 2.0);
        assert_eq!(out.middle.len(), 25);
        assert_eq!(out.upper.len(), 25);
        assert_eq!(out.lower.len(), 25);
        assert_eq!(out.middle[18], None);
        assert!(out.middle[19].is_some());
        assert!(out.upper[19].is_some());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = bollinger(&[], 20, 2.0);
        assert!(out.middle.is_empty());
        assert!(out.upper.is_empty());
        assert!(out.lower.is_empty());
    }
}
