// =============================================================================
// VWAP family — session VWAP, VWAP bands, anchored VWAP
// =============================================================================
//
// VWAP accumulates typicalPrice * volume over cumulative volume.  The session
// variants reset their sums when the calendar day of the bar's timestamp
// changes — derived from the candle time, never from the wall clock, so
// replays are bit-identical to live runs.  The anchored variant accumulates
// from a fixed anchor index instead and never resets.
//
// A session that has traded no volume yet reads the bar's typical price.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Calendar day (UTC) of an epoch-ms timestamp.  Out-of-range timestamps
/// fall back to the epoch day rather than failing the pass.
fn session_day(time_ms: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(time_ms)
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Running VWAP accumulator.
#[derive(Debug, Clone, Copy, Default)]
struct VwapAccum {
    cum_volume: f64,
    cum_pv: f64,
    /// Sum of tp^2 * volume, for the volume-weighted variance.
    cum_pv2: f64,
}

impl VwapAccum {
    fn push(&mut self, tp: f64, volume: f64) {
        self.cum_volume += volume;
        self.cum_pv += tp * volume;
        self.cum_pv2 += tp * tp * volume;
    }

    fn vwap(&self, fallback_tp: f64) -> f64 {
        if self.cum_volume == 0.0 {
            fallback_tp
        } else {
            self.cum_pv / self.cum_volume
        }
    }

    /// Volume-weighted population standard deviation around the VWAP.
    fn std_dev(&self) -> f64 {
        if self.cum_volume == 0.0 {
            return 0.0;
        }
        let mean = self.cum_pv / self.cum_volume;
        let variance = (self.cum_pv2 / self.cum_volume - mean * mean).max(0.0);
        variance.sqrt()
    }
}

/// Session VWAP: resets on every calendar-day change.
pub fn vwap(candles: &[Candle]) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if n == 0 {
        return out;
    }

    let mut accum = VwapAccum::default();
    let mut day = session_day(candles[0].time);

    for (i, c) in candles.iter().enumerate() {
        let bar_day = session_day(c.time);
        if bar_day != day {
            accum = VwapAccum::default();
            day = bar_day;
        }
        let tp = c.typical_price();
        accum.push(tp, c.volume);
        out[i] = Some(accum.vwap(tp));
    }
    out
}

/// Output of a VWAP-bands pass.
#[derive(Debug, Clone)]
pub struct VwapBandSeries {
    pub vwap: Series,
    pub upper: Series,
    pub lower: Series,
}

/// Session VWAP with ± `num_std` volume-weighted standard-deviation bands.
pub fn vwap_bands(candles: &[Candle], num_std: f64) -> VwapBandSeries {
    let n = candles.len();
    let mut out = VwapBandSeries {
        vwap: vec![None; n],
        upper: vec![None; n],
        lower: vec![None; n],
    };
    if n == 0 {
        return out;
    }

    let mut accum = VwapAccum::default();
    let mut day = session_day(candles[0].time);

    for (i, c) in candles.iter().enumerate() {
        let bar_day = session_day(c.time);
        if bar_day != day {
            accum = VwapAccum::default();
            day = bar_day;
        }
        let tp = c.typical_price();
        accum.push(tp, c.volume);

        let mid = accum.vwap(tp);
        let band = num_std * accum.std_dev();
        out.vwap[i] = Some(mid);
        out.upper[i] = Some(mid + band);
        out.lower[i] = Some(mid - band);
    }
    out
}

/// Anchored VWAP: accumulates from `anchor_index` onward, warmup before it.
/// An anchor beyond the timeline yields all-warmup output.
pub fn anchored_vwap(candles: &[Candle], anchor_index: usize) -> Series {
    let n = candles.len();
    let mut out = vec![None; n];
    if anchor_index >= n {
        return out;
    }

    let mut accum = VwapAccum::default();
    for (i, c) in candles.iter().enumerate().skip(anchor_index) {
        let tp = c.typical_price();
        accum.push(tp, c.volume);
        out[i] = Some(accum.vwap(tp));
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn candle(time: i64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle::new(time, close, high, low, close, volume)
    }

    #[test]
    fn vwap_worked_example() {
        let candles = vec![
            candle(0, 12.0, 8.0, 10.0, 100.0),
            candle(60_000, 15.0, 9.0, 12.0, 200.0),
        ];
        let out = vwap(&candles);
        // tp0 = 10, vwap0 = 10; tp1 = 12, vwap1 = 3400 / 300.
        assert!((out[0].unwrap() - 10.0).abs() < 1e-12);
        assert!((out[1].unwrap() - 3400.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn vwap_resets_on_calendar_day_change() {
        let candles = vec![
            candle(0, 12.0, 8.0, 10.0, 100.0),
            candle(60_000, 15.0, 9.0, 12.0, 200.0),
            // Next calendar day: the accumulator starts over.
            candle(DAY_MS, 22.0, 18.0, 20.0, 50.0),
        ];
        let out = vwap(&candles);
        assert!((out[2].unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn vwap_zero_volume_session_reads_typical_price() {
        let candles = vec![candle(0, 12.0, 8.0, 10.0, 0.0)];
        let out = vwap(&candles);
        assert!((out[0].unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn bands_straddle_vwap_and_collapse_when_flat() {
        let varied = vec![
            candle(0, 12.0, 8.0, 10.0, 100.0),
            candle(60_000, 16.0, 10.0, 14.0, 100.0),
            candle(120_000, 9.0, 5.0, 7.0, 100.0),
        ];
        let out = vwap_bands(&varied, 2.0);
        let i = 2;
        assert!(out.upper[i].unwrap() > out.vwap[i].unwrap());
        assert!(out.lower[i].unwrap() < out.vwap[i].unwrap());

        let flat = vec![candle(0, 10.0, 10.0, 10.0, 100.0); 3];
        let out = vwap_bands(&flat, 2.0);
        assert_eq!(out.upper[2], out.lower[2]);
    }

    #[test]
    fn anchored_matches_session_from_day_start() {
        // Anchoring at the first bar of a single-day series reproduces the
        // session VWAP exactly.
        let candles: Vec<Candle> = (0..10)
            .map(|i| {
                candle(
                    i * 60_000,
                    101.0 + i as f64,
                    99.0 + i as f64,
                    100.0 + i as f64,
                    100.0,
                )
            })
            .collect();
        assert_eq!(vwap(&candles), anchored_vwap(&candles, 0));
    }

    #[test]
    fn anchored_warmup_before_anchor() {
        let candles: Vec<Candle> = (0..6)
            .map(|i| candle(i * 60_000, 101.0, 99.0, 100.0, 100.0))
            .collect();
        let out = anchored_vwap(&candles, 3);
        assert_eq!(out[2], None);
        assert!(out[3].is_some());
    }

    #[test]
    fn anchored_beyond_timeline_is_all_warmup() {
        let candles = vec![candle(0, 101.0, 99.0, 100.0, 100.0)];
        assert!(anchored_vwap(&candles, 5).iter().all(Option::is_none));
    }

    #[test]
    fn vwap_family_handles_empty_input() {
        assert!(vwap(&[]).is_empty());
        assert!(vwap_bands(&[], 2.0).vwap.is_empty());
        assert!(anchored_vwap(&[], 0).is_empty());
    }
}
