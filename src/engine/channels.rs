// =============================================================================
// Output channels — index-aligned indicator series
// =============================================================================
//
// Every indicator publishes 1-4 channels, each aligned one-to-one, by index
// and timestamp, with the candle timeline it was computed from.  A point
// holds `None` while the indicator is still warming up — an explicit
// "insufficient history" marker, not a numeric NaN that escaped a division.
// =============================================================================

use serde::Serialize;

use crate::market_data::Candle;
use crate::registry::ChannelRole;

/// Raw calculator output: one slot per input candle, `None` during warmup.
pub type Series = Vec<Option<f64>>;

/// One plotted point.  `value == None` is the warmup sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub time: i64,
    pub value: Option<f64>,
}

/// A full channel: points aligned with the timeline.
pub type Channel = Vec<DataPoint>;

/// Zip a calculator series with the timeline it was computed from.
///
/// The two lengths must already agree; calculators guarantee this.
pub fn align(candles: &[Candle], series: Series) -> Channel {
    debug_assert_eq!(candles.len(), series.len());
    candles
        .iter()
        .zip(series)
        .map(|(c, value)| DataPoint {
            time: c.time,
            value,
        })
        .collect()
}

/// The channel bundle one indicator instance publishes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelSet {
    pub primary: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<Channel>,
}

impl ChannelSet {
    /// A set with only a primary channel.
    pub fn single(primary: Channel) -> Self {
        Self {
            primary,
            ..Self::default()
        }
    }

    /// The channel for a given role, when present.
    pub fn get(&self, role: ChannelRole) -> Option<&Channel> {
        match role {
            ChannelRole::Primary => Some(&self.primary),
            ChannelRole::Signal => self.signal.as_ref(),
            ChannelRole::Histogram => self.histogram.as_ref(),
            ChannelRole::UpperBand => self.upper.as_ref(),
            ChannelRole::LowerBand => self.lower.as_ref(),
        }
    }

    /// True when every present channel has `len` points.
    pub fn is_aligned(&self, len: usize) -> bool {
        self.primary.len() == len
            && self.signal.as_ref().map_or(true, |c| c.len() == len)
            && self.histogram.as_ref().map_or(true, |c| c.len() == len)
            && self.upper.as_ref().map_or(true, |c| c.len() == len)
            && self.lower.as_ref().map_or(true, |c| c.len() == len)
    }
}
