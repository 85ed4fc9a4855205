// =============================================================================
// Volume Profile — POC and Value Area over price rows
// =============================================================================
//
// The visible price range [lowest low, highest high] is split into `rows`
// equal bands.  Each candle's volume is distributed *evenly* across every row
// its high-low range spans.  The Point of Control (POC) is the row holding
// the most volume.  The Value Area grows outward from the POC by always
// absorbing whichever neighbouring row (above or below) holds more volume,
// until it encloses at least `value_area_pct` percent of total volume.
//
// The engine publishes the profile as three constant, timeline-aligned lines:
// the POC price and the Value Area high/low edges.
// =============================================================================

use crate::engine::channels::Series;
use crate::market_data::Candle;

/// Resolved profile levels for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileLevels {
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
}

/// Compute the row histogram and derive POC / Value Area levels.
///
/// Returns `None` for empty input, a degenerate row count, or zero traded
/// volume (no profile exists to point at).
pub fn profile_levels(candles: &[Candle], rows: usize, value_area_pct: f64) -> Option<ProfileLevels> {
    if candles.is_empty() || rows == 0 {
        return None;
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for c in candles {
        lo = lo.min(c.low);
        hi = hi.max(c.high);
    }

    // All prices identical: the profile collapses to a single level.
    if hi <= lo {
        let total: f64 = candles.iter().map(|c| c.volume).sum();
        if total == 0.0 {
            return None;
        }
        return Some(ProfileLevels {
            poc: lo,
            value_area_high: lo,
            value_area_low: lo,
        });
    }

    let row_height = (hi - lo) / rows as f64;
    let row_of = |price: f64| -> usize {
        (((price - lo) / row_height) as usize).min(rows - 1)
    };

    // Distribute each candle's volume evenly across the rows it spans.
    let mut volume_per_row = vec![0.0_f64; rows];
    for c in candles {
        if c.volume == 0.0 {
            continue;
        }
        let first = row_of(c.low);
        let last = row_of(c.high);
        let share = c.volume / (last - first + 1) as f64;
        for row in &mut volume_per_row[first..=last] {
            *row += share;
        }
    }

    let total: f64 = volume_per_row.iter().sum();
    if total == 0.0 {
        return None;
    }

    // POC: the highest-volume row.  Ties resolve to the lowest row index so
    // identical inputs always pick the same row.
    let mut poc_idx = 0;
    for (i, &v) in volume_per_row.iter().enumerate() {
        if v > volume_per_row[poc_idx] {
            poc_idx = i;
        }
    }

    // Grow the Value Area outward from the POC, absorbing the heavier
    // neighbour each step.
    let target = total * (value_area_pct / 100.0);
    let mut low_idx = poc_idx;
    let mut high_idx = poc_idx;
    let mut covered = volume_per_row[poc_idx];

    while covered < target && (low_idx > 0 || high_idx < rows - 1) {
        let below = if low_idx > 0 {
            Some(volume_per_row[low_idx - 1])
        } else {
            None
        };
        let above = if high_idx < rows - 1 {
            Some(volume_per_row[high_idx + 1])
        } else {
            None
        };

        match (below, above) {
            (Some(b), Some(a)) if a >= b => {
                high_idx += 1;
                covered += a;
            }
            (Some(b), _) => {
                low_idx -= 1;
                covered += b;
            }
            (None, Some(a)) => {
                high_idx += 1;
                covered += a;
            }
            (None, None) => break,
        }
    }

    Some(ProfileLevels {
        poc: lo + (poc_idx as f64 + 0.5) * row_height,
        value_area_high: lo + (high_idx + 1) as f64 * row_height,
        value_area_low: lo + low_idx as f64 * row_height,
    })
}

/// Timeline-aligned constant lines for the profile levels.
#[derive(Debug, Clone)]
pub struct VolumeProfileSeries {
    pub poc: Series,
    pub value_area_high: Series,
    pub value_area_low: Series,
}

/// Compute the profile and broadcast its levels across the timeline.
pub fn volume_profile(candles: &[Candle], rows: usize, value_area_pct: f64) -> VolumeProfileSeries {
    let n = candles.len();
    match profile_levels(candles, rows, value_area_pct) {
        Some(levels) => VolumeProfileSeries {
            poc: vec![Some(levels.poc); n],
            value_area_high: vec![Some(levels.value_area_high); n],
            value_area_low: vec![Some(levels.value_area_low); n],
        },
        None => VolumeProfileSeries {
            poc: vec![None; n],
            value_area_high: vec![None; n],
            value_area_low: vec![None; n],
        },
    }
}
