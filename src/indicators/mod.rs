// =============================================================================
// Indicator Calculation Engine — dispatch
// =============================================================================
//
// Pure functions from an ordered candle slice to index-aligned output
// channels, one family per module.  `compute` is the single entry point the
// recompute controller calls; the match over `IndicatorKind` is exhaustive,
// so adding a kind without a branch fails to compile.
//
// Calculators never panic on short input: slots before the first full window
// hold the warmup sentinel and empty input yields empty channels.  All
// families except Supertrend and Parabolic SAR (and the Wilder-smoothed
// scans, which carry scalar state without branching) are pure functions of
// the whole input; those two are strict left-to-right folds.
// =============================================================================

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod envelopes;
pub mod ichimoku;
pub mod macd;
pub mod moving_averages;
pub mod oscillators;
pub mod parabolic_sar;
pub mod rsi;
pub mod stochastic;
pub mod supertrend;
pub mod volume;
pub mod volume_profile;
pub mod vwap;

use crate::engine::channels::{align, ChannelSet};
use crate::engine::instance::IndicatorParams;
use crate::market_data::Candle;
use crate::registry::IndicatorKind;

/// Numeric parameter with a fallback for missing or non-finite values.
fn num(params: &IndicatorParams, name: &str, fallback: f64) -> f64 {
    match params.number(name) {
        Some(v) if v.is_finite() => v,
        _ => fallback,
    }
}

/// Compute the output channels for one indicator instance.
///
/// Every returned channel has exactly `candles.len()` points, aligned by
/// index and timestamp with the input timeline.
pub fn compute(kind: IndicatorKind, candles: &[Candle], params: &IndicatorParams) -> ChannelSet {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let period = params.window("period");

    match kind {
        IndicatorKind::Sma => ChannelSet::single(align(candles, moving_averages::sma(&closes, period))),
        IndicatorKind::Ema => ChannelSet::single(align(candles, moving_averages::ema(&closes, period))),
        IndicatorKind::Wma => ChannelSet::single(align(candles, moving_averages::wma(&closes, period))),

        IndicatorKind::Macd => {
            let out = macd::macd(
                &closes,
                params.window("fast_period"),
                params.window("slow_period"),
                params.window("signal_period"),
            );
            ChannelSet {
                primary: align(candles, out.macd),
                signal: Some(align(candles, out.signal)),
                histogram: Some(align(candles, out.histogram)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Supertrend => {
            let out = supertrend::supertrend(candles, period, num(params, "multiplier", 3.0));
            ChannelSet {
                primary: align(candles, out.line),
                signal: Some(align(candles, out.direction)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::ParabolicSar => {
            let series = parabolic_sar::parabolic_sar(
                candles,
                num(params, "af_start", 0.02),
                num(params, "af_step", 0.02),
                num(params, "af_max", 0.2),
            );
            ChannelSet::single(align(candles, series))
        }

        IndicatorKind::Adx => {
            let out = adx::adx(candles, period);
            ChannelSet {
                primary: align(candles, out.adx),
                upper: Some(align(candles, out.plus_di)),
                lower: Some(align(candles, out.minus_di)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Aroon => {
            let out = aroon::aroon(candles, period);
            ChannelSet {
                primary: align(candles, out.up),
                signal: Some(align(candles, out.down)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::AroonOscillator => {
            let out = aroon::aroon(candles, period);
            ChannelSet::single(align(candles, out.oscillator))
        }

        IndicatorKind::Ichimoku => {
            let out = ichimoku::ichimoku(
                candles,
                params.window("tenkan_period"),
                params.window("kijun_period"),
                params.window("senkou_b_period"),
            );
            ChannelSet {
                primary: align(candles, out.tenkan),
                signal: Some(align(candles, out.kijun)),
                upper: Some(align(candles, out.senkou_a)),
                lower: Some(align(candles, out.senkou_b)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Rsi => ChannelSet::single(align(candles, rsi::rsi(&closes, period))),
        IndicatorKind::StochRsi => {
            ChannelSet::single(align(candles, rsi::stoch_rsi(&closes, period)))
        }

        IndicatorKind::Stochastic => {
            let out = stochastic::stochastic(candles, period, params.window("smooth_period"));
            ChannelSet {
                primary: align(candles, out.k),
                signal: Some(align(candles, out.d)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Cci => ChannelSet::single(align(candles, oscillators::cci(candles, period))),
        IndicatorKind::Roc => ChannelSet::single(align(candles, oscillators::roc(&closes, period))),
        IndicatorKind::WilliamsR => {
            ChannelSet::single(align(candles, stochastic::williams_r(candles, period)))
        }
        IndicatorKind::Trix => ChannelSet::single(align(candles, oscillators::trix(&closes, period))),
        IndicatorKind::Momentum => {
            ChannelSet::single(align(candles, oscillators::momentum(&closes, period)))
        }

        IndicatorKind::Bollinger => {
            let out = bollinger::bollinger(&closes, period, num(params, "std_dev", 2.0));
            ChannelSet {
                primary: align(candles, out.middle),
                upper: Some(align(candles, out.upper)),
                lower: Some(align(candles, out.lower)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Atr => ChannelSet::single(align(candles, atr::atr(candles, period))),

        IndicatorKind::Keltner => {
            let out = envelopes::keltner(candles, period, num(params, "multiplier", 2.0));
            ChannelSet {
                primary: align(candles, out.middle),
                upper: Some(align(candles, out.upper)),
                lower: Some(align(candles, out.lower)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Donchian => {
            let out = envelopes::donchian(candles, period);
            ChannelSet {
                primary: align(candles, out.middle),
                upper: Some(align(candles, out.upper)),
                lower: Some(align(candles, out.lower)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Obv => ChannelSet::single(align(candles, volume::obv(candles))),
        IndicatorKind::Mfi => ChannelSet::single(align(candles, volume::mfi(candles, period))),
        IndicatorKind::Cmf => ChannelSet::single(align(candles, volume::cmf(candles, period))),
        IndicatorKind::Adl => ChannelSet::single(align(candles, volume::adl(candles))),
        IndicatorKind::Vwma => ChannelSet::single(align(candles, volume::vwma(candles, period))),

        IndicatorKind::VolumeProfile => {
            let out = volume_profile::volume_profile(
                candles,
                params.window("rows"),
                num(params, "value_area_pct", 70.0),
            );
            ChannelSet {
                primary: align(candles, out.poc),
                upper: Some(align(candles, out.value_area_high)),
                lower: Some(align(candles, out.value_area_low)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::Vwap => ChannelSet::single(align(candles, vwap::vwap(candles))),

        IndicatorKind::VwapBands => {
            let out = vwap::vwap_bands(candles, num(params, "std_dev", 2.0));
            ChannelSet {
                primary: align(candles, out.vwap),
                upper: Some(align(candles, out.upper)),
                lower: Some(align(candles, out.lower)),
                ..ChannelSet::default()
            }
        }

        IndicatorKind::AnchoredVwap => {
            let anchor = num(params, "anchor_index", 0.0).max(0.0) as usize;
            ChannelSet::single(align(candles, vwap::anchored_vwap(candles, anchor)))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.45).sin() * 8.0 + (i % 5) as f64;
                Candle::new(
                    i as i64 * 60_000,
                    base,
                    base + 1.5,
                    base - 1.5,
                    base + 0.5,
                    100.0 + (i % 11) as f64 * 10.0,
                )
            })
            .collect()
    }

    fn default_params(kind: IndicatorKind) -> IndicatorParams {
        IndicatorParams::new().complete_for(kind)
    }

    #[test]
    fn every_kind_aligns_with_input_length() {
        let candles = synthetic_candles(120);
        for kind in IndicatorKind::ALL {
            let out = compute(kind, &candles, &default_params(kind));
            assert!(
                out.is_aligned(candles.len()),
                "{kind:?} produced misaligned channels"
            );
        }
    }

    #[test]
    fn every_kind_handles_empty_input() {
        for kind in IndicatorKind::ALL {
            let out = compute(kind, &[], &default_params(kind));
            assert!(out.is_aligned(0), "{kind:?} broke on empty input");
            assert!(out.primary.is_empty());
        }
    }

    #[test]
    fn every_kind_survives_a_single_candle() {
        let candles = synthetic_candles(1);
        for kind in IndicatorKind::ALL {
            let out = compute(kind, &candles, &default_params(kind));
            assert!(out.is_aligned(1), "{kind:?} broke on a single candle");
        }
    }

    #[test]
    fn every_kind_tolerates_zero_period() {
        // The engine rejects period 0 at the boundary, but the calculators
        // themselves must stay total.
        let candles = synthetic_candles(30);
        for kind in IndicatorKind::ALL {
            let params = IndicatorParams::from_period_color(Some(0), None).complete_for(kind);
            let out = compute(kind, &candles, &params);
            assert!(out.is_aligned(30), "{kind:?} broke on period 0");
        }
    }

    #[test]
    fn defined_values_are_finite() {
        let candles = synthetic_candles(150);
        for kind in IndicatorKind::ALL {
            let out = compute(kind, &candles, &default_params(kind));
            for channel in [
                Some(&out.primary),
                out.signal.as_ref(),
                out.histogram.as_ref(),
                out.upper.as_ref(),
                out.lower.as_ref(),
            ]
            .into_iter()
            .flatten()
            {
                for point in channel {
                    if let Some(v) = point.value {
                        assert!(v.is_finite(), "{kind:?} emitted non-finite {v}");
                    }
                }
            }
        }
    }

    #[test]
    fn channel_shapes_match_registry_descriptors() {
        use crate::registry::{descriptor, ChannelRole};
        let candles = synthetic_candles(80);
        for kind in IndicatorKind::ALL {
            let out = compute(kind, &candles, &default_params(kind));
            for ch in descriptor(kind).channels {
                assert!(
                    out.get(ch.role).is_some(),
                    "{kind:?} missing declared channel {:?}",
                    ch.role
                );
            }
            // And nothing undeclared.
            for role in [
                ChannelRole::Signal,
                ChannelRole::Histogram,
                ChannelRole::UpperBand,
                ChannelRole::LowerBand,
            ] {
                let declared = descriptor(kind).channels.iter().any(|c| c.role == role);
                assert_eq!(
                    out.get(role).is_some(),
                    declared,
                    "{kind:?} channel {role:?} disagrees with its descriptor"
                );
            }
        }
    }

    #[test]
    fn timestamps_carry_through() {
        let candles = synthetic_candles(10);
        let out = compute(IndicatorKind::Sma, &candles, &default_params(IndicatorKind::Sma));
        for (p, c) in out.primary.iter().zip(&candles) {
            assert_eq!(p.time, c.time);
        }
    }
}
