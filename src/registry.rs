// =============================================================================
// Indicator Registry — declarative catalog of indicator types
// =============================================================================
//
// Pure data: for every indicator kind, its category, display name, parameter
// schema (with defaults), output-channel shape, and pane placement.  Presets
// are named bundles of (kind, period, color) applied atomically.
//
// Adding a new indicator kind touches two places: a descriptor entry here and
// a compute branch in `indicators::compute`.  The exhaustive matches turn a
// forgotten branch into a compile error.
// =============================================================================

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kinds & categories
// ---------------------------------------------------------------------------

/// Every indicator type the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    // Trend
    Sma,
    Ema,
    Wma,
    Macd,
    Supertrend,
    ParabolicSar,
    Adx,
    Aroon,
    AroonOscillator,
    Ichimoku,
    // Momentum
    Rsi,
    StochRsi,
    Stochastic,
    Cci,
    Roc,
    WilliamsR,
    Trix,
    Momentum,
    // Volatility
    Bollinger,
    Atr,
    Keltner,
    Donchian,
    // Volume
    Obv,
    Mfi,
    Cmf,
    Adl,
    Vwma,
    VolumeProfile,
    // Profile
    Vwap,
    VwapBands,
    AnchoredVwap,
}

impl IndicatorKind {
    /// Every kind, in catalog order.
    pub const ALL: [IndicatorKind; 31] = [
        Self::Sma,
        Self::Ema,
        Self::Wma,
        Self::Macd,
        Self::Supertrend,
        Self::ParabolicSar,
        Self::Adx,
        Self::Aroon,
        Self::AroonOscillator,
        Self::Ichimoku,
        Self::Rsi,
        Self::StochRsi,
        Self::Stochastic,
        Self::Cci,
        Self::Roc,
        Self::WilliamsR,
        Self::Trix,
        Self::Momentum,
        Self::Bollinger,
        Self::Atr,
        Self::Keltner,
        Self::Donchian,
        Self::Obv,
        Self::Mfi,
        Self::Cmf,
        Self::Adl,
        Self::Vwma,
        Self::VolumeProfile,
        Self::Vwap,
        Self::VwapBands,
        Self::AnchoredVwap,
    ];
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", descriptor(*self).display_name)
    }
}

/// Indicator family, used for catalog grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Trend,
    Momentum,
    Volatility,
    Volume,
    Profile,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trend => write!(f, "Trend"),
            Self::Momentum => write!(f, "Momentum"),
            Self::Volatility => write!(f, "Volatility"),
            Self::Volume => write!(f, "Volume"),
            Self::Profile => write!(f, "Profile"),
        }
    }
}

/// Where the indicator is drawn relative to the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanePlacement {
    /// Drawn on top of the candles (shares the price axis).
    Overlay,
    /// Drawn in its own pane below the chart (own axis).
    Separate,
}

// ---------------------------------------------------------------------------
// Parameter schema
// ---------------------------------------------------------------------------

/// Value of one indicator parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Number(f64),
    Color(String),
    Choice(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Color(s) | Self::Choice(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// Declared type of a parameter (drives the settings UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Number,
    Color,
    Select,
}

/// One entry in an indicator's parameter schema.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub default: ParamValue,
}

impl ParamSpec {
    fn number(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: ParamType::Number,
            default: ParamValue::Number(default),
        }
    }

    fn color(name: &'static str, default: &str) -> Self {
        Self {
            name,
            kind: ParamType::Color,
            default: ParamValue::Color(default.to_string()),
        }
    }

    fn select(name: &'static str, default: &str) -> Self {
        Self {
            name,
            kind: ParamType::Select,
            default: ParamValue::Choice(default.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel shape
// ---------------------------------------------------------------------------

/// Role of an output channel within a [`crate::engine::ChannelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelRole {
    Primary,
    Signal,
    Histogram,
    UpperBand,
    LowerBand,
}

/// Descriptor for one output channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDescriptor {
    pub role: ChannelRole,
    pub label: &'static str,
}

impl ChannelDescriptor {
    const fn new(role: ChannelRole, label: &'static str) -> Self {
        Self { role, label }
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Full catalog entry for one indicator kind.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorDescriptor {
    pub kind: IndicatorKind,
    pub category: Category,
    pub display_name: &'static str,
    pub placement: PanePlacement,
    pub params: Vec<ParamSpec>,
    pub channels: Vec<ChannelDescriptor>,
}

use ChannelRole::{Histogram, LowerBand, Primary, Signal, UpperBand};

/// Look up the catalog entry for `kind`.
pub fn descriptor(kind: IndicatorKind) -> IndicatorDescriptor {
    // Shared schema fragments.
    let period = |d: f64| ParamSpec::number("period", d);
    let color = |c: &str| ParamSpec::color("color", c);
    let style = || ParamSpec::select("style", "solid");

    let (category, display_name, placement, params, channels) = match kind {
        IndicatorKind::Sma => (
            Category::Trend,
            "SMA",
            PanePlacement::Overlay,
            vec![period(20.0), color("#2962ff"), style()],
            vec![ChannelDescriptor::new(Primary, "sma")],
        ),
        IndicatorKind::Ema => (
            Category::Trend,
            "EMA",
            PanePlacement::Overlay,
            vec![period(21.0), color("#ff6d00"), style()],
            vec![ChannelDescriptor::new(Primary, "ema")],
        ),
        IndicatorKind::Wma => (
            Category::Trend,
            "WMA",
            PanePlacement::Overlay,
            vec![period(20.0), color("#aa00ff"), style()],
            vec![ChannelDescriptor::new(Primary, "wma")],
        ),
        IndicatorKind::Macd => (
            Category::Trend,
            "MACD",
            PanePlacement::Separate,
            vec![
                ParamSpec::number("fast_period", 12.0),
                ParamSpec::number("slow_period", 26.0),
                ParamSpec::number("signal_period", 9.0),
                color("#2962ff"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "macd"),
                ChannelDescriptor::new(Signal, "signal"),
                ChannelDescriptor::new(Histogram, "histogram"),
            ],
        ),
        IndicatorKind::Supertrend => (
            Category::Trend,
            "Supertrend",
            PanePlacement::Overlay,
            vec![
                period(10.0),
                ParamSpec::number("multiplier", 3.0),
                color("#00c853"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "supertrend"),
                ChannelDescriptor::new(Signal, "direction"),
            ],
        ),
        IndicatorKind::ParabolicSar => (
            Category::Trend,
            "Parabolic SAR",
            PanePlacement::Overlay,
            vec![
                ParamSpec::number("af_start", 0.02),
                ParamSpec::number("af_step", 0.02),
                ParamSpec::number("af_max", 0.2),
                color("#ffab00"),
            ],
            vec![ChannelDescriptor::new(Primary, "psar")],
        ),
        IndicatorKind::Adx => (
            Category::Trend,
            "ADX/DMI",
            PanePlacement::Separate,
            vec![period(14.0), color("#d500f9")],
            vec![
                ChannelDescriptor::new(Primary, "adx"),
                ChannelDescriptor::new(UpperBand, "+di"),
                ChannelDescriptor::new(LowerBand, "-di"),
            ],
        ),
        IndicatorKind::Aroon => (
            Category::Trend,
            "Aroon",
            PanePlacement::Separate,
            vec![period(25.0), color("#00bfa5")],
            vec![
                ChannelDescriptor::new(Primary, "aroon_up"),
                ChannelDescriptor::new(Signal, "aroon_down"),
            ],
        ),
        IndicatorKind::AroonOscillator => (
            Category::Trend,
            "Aroon Oscillator",
            PanePlacement::Separate,
            vec![period(25.0), color("#00bfa5")],
            vec![ChannelDescriptor::new(Primary, "aroon_osc")],
        ),
        IndicatorKind::Ichimoku => (
            Category::Trend,
            "Ichimoku",
            PanePlacement::Overlay,
            vec![
                ParamSpec::number("tenkan_period", 9.0),
                ParamSpec::number("kijun_period", 26.0),
                ParamSpec::number("senkou_b_period", 52.0),
                color("#f44336"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "tenkan"),
                ChannelDescriptor::new(Signal, "kijun"),
                ChannelDescriptor::new(UpperBand, "senkou_a"),
                ChannelDescriptor::new(LowerBand, "senkou_b"),
            ],
        ),
        IndicatorKind::Rsi => (
            Category::Momentum,
            "RSI",
            PanePlacement::Separate,
            vec![period(14.0), color("#7e57c2")],
            vec![ChannelDescriptor::new(Primary, "rsi")],
        ),
        IndicatorKind::StochRsi => (
            Category::Momentum,
            "Stochastic RSI",
            PanePlacement::Separate,
            vec![period(14.0), color("#26a69a")],
            vec![ChannelDescriptor::new(Primary, "stoch_rsi")],
        ),
        IndicatorKind::Stochastic => (
            Category::Momentum,
            "Stochastic",
            PanePlacement::Separate,
            vec![
                period(14.0),
                ParamSpec::number("smooth_period", 3.0),
                color("#42a5f5"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "%k"),
                ChannelDescriptor::new(Signal, "%d"),
            ],
        ),
        IndicatorKind::Cci => (
            Category::Momentum,
            "CCI",
            PanePlacement::Separate,
            vec![period(20.0), color("#ef6c00")],
            vec![ChannelDescriptor::new(Primary, "cci")],
        ),
        IndicatorKind::Roc => (
            Category::Momentum,
            "ROC",
            PanePlacement::Separate,
            vec![period(12.0), color("#5c6bc0")],
            vec![ChannelDescriptor::new(Primary, "roc")],
        ),
        IndicatorKind::WilliamsR => (
            Category::Momentum,
            "Williams %R",
            PanePlacement::Separate,
            vec![period(14.0), color("#8d6e63")],
            vec![ChannelDescriptor::new(Primary, "%r")],
        ),
        IndicatorKind::Trix => (
            Category::Momentum,
            "TRIX",
            PanePlacement::Separate,
            vec![period(15.0), color("#66bb6a")],
            vec![ChannelDescriptor::new(Primary, "trix")],
        ),
        IndicatorKind::Momentum => (
            Category::Momentum,
            "Momentum",
            PanePlacement::Separate,
            vec![period(10.0), color("#ec407a")],
            vec![ChannelDescriptor::new(Primary, "momentum")],
        ),
        IndicatorKind::Bollinger => (
            Category::Volatility,
            "Bollinger Bands",
            PanePlacement::Overlay,
            vec![
                period(20.0),
                ParamSpec::number("std_dev", 2.0),
                color("#29b6f6"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "middle"),
                ChannelDescriptor::new(UpperBand, "upper"),
                ChannelDescriptor::new(LowerBand, "lower"),
            ],
        ),
        IndicatorKind::Atr => (
            Category::Volatility,
            "ATR",
            PanePlacement::Separate,
            vec![period(14.0), color("#ff7043")],
            vec![ChannelDescriptor::new(Primary, "atr")],
        ),
        IndicatorKind::Keltner => (
            Category::Volatility,
            "Keltner Channel",
            PanePlacement::Overlay,
            vec![
                period(20.0),
                ParamSpec::number("multiplier", 2.0),
                color("#9ccc65"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "middle"),
                ChannelDescriptor::new(UpperBand, "upper"),
                ChannelDescriptor::new(LowerBand, "lower"),
            ],
        ),
        IndicatorKind::Donchian => (
            Category::Volatility,
            "Donchian Channel",
            PanePlacement::Overlay,
            vec![period(20.0), color("#26c6da")],
            vec![
                ChannelDescriptor::new(Primary, "middle"),
                ChannelDescriptor::new(UpperBand, "upper"),
                ChannelDescriptor::new(LowerBand, "lower"),
            ],
        ),
        IndicatorKind::Obv => (
            Category::Volume,
            "OBV",
            PanePlacement::Separate,
            vec![color("#78909c")],
            vec![ChannelDescriptor::new(Primary, "obv")],
        ),
        IndicatorKind::Mfi => (
            Category::Volume,
            "MFI",
            PanePlacement::Separate,
            vec![period(14.0), color("#ab47bc")],
            vec![ChannelDescriptor::new(Primary, "mfi")],
        ),
        IndicatorKind::Cmf => (
            Category::Volume,
            "CMF",
            PanePlacement::Separate,
            vec![period(20.0), color("#26a69a")],
            vec![ChannelDescriptor::new(Primary, "cmf")],
        ),
        IndicatorKind::Adl => (
            Category::Volume,
            "A/D Line",
            PanePlacement::Separate,
            vec![color("#8e24aa")],
            vec![ChannelDescriptor::new(Primary, "adl")],
        ),
        IndicatorKind::Vwma => (
            Category::Volume,
            "VWMA",
            PanePlacement::Overlay,
            vec![period(20.0), color("#3949ab")],
            vec![ChannelDescriptor::new(Primary, "vwma")],
        ),
        IndicatorKind::VolumeProfile => (
            Category::Volume,
            "Volume Profile",
            PanePlacement::Overlay,
            vec![
                ParamSpec::number("rows", 24.0),
                ParamSpec::number("value_area_pct", 70.0),
                color("#90a4ae"),
            ],
            vec![
                ChannelDescriptor::new(Primary, "poc"),
                ChannelDescriptor::new(UpperBand, "vah"),
                ChannelDescriptor::new(LowerBand, "val"),
            ],
        ),
        IndicatorKind::Vwap => (
            Category::Profile,
            "VWAP",
            PanePlacement::Overlay,
            vec![color("#fdd835")],
            vec![ChannelDescriptor::new(Primary, "vwap")],
        ),
        IndicatorKind::VwapBands => (
            Category::Profile,
            "VWAP Bands",
            PanePlacement::Overlay,
            vec![ParamSpec::number("std_dev", 2.0), color("#fdd835")],
            vec![
                ChannelDescriptor::new(Primary, "vwap"),
                ChannelDescriptor::new(UpperBand, "upper"),
                ChannelDescriptor::new(LowerBand, "lower"),
            ],
        ),
        IndicatorKind::AnchoredVwap => (
            Category::Profile,
            "Anchored VWAP",
            PanePlacement::Overlay,
            vec![ParamSpec::number("anchor_index", 0.0), color("#ffb300")],
            vec![ChannelDescriptor::new(Primary, "avwap")],
        ),
    };

    IndicatorDescriptor {
        kind,
        category,
        display_name,
        placement,
        params,
        channels,
    }
}

/// Whether the kind's schema includes a `period` number parameter.
pub fn has_period_param(kind: IndicatorKind) -> bool {
    descriptor(kind)
        .params
        .iter()
        .any(|p| p.name == "period" && p.kind == ParamType::Number)
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// One indicator in a preset bundle.
#[derive(Debug, Clone, Serialize)]
pub struct PresetEntry {
    pub kind: IndicatorKind,
    /// Override for the `period` parameter; `None` keeps the schema default.
    pub period: Option<u32>,
    pub color: &'static str,
}

/// A named bundle of indicators applied atomically.
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub entries: Vec<PresetEntry>,
}

/// The built-in presets.
pub fn presets() -> Vec<Preset> {
    let entry = |kind, period, color| PresetEntry {
        kind,
        period,
        color,
    };

    vec![
        Preset {
            name: "trend-following",
            entries: vec![
                entry(IndicatorKind::Ema, Some(21), "#ff6d00"),
                entry(IndicatorKind::Supertrend, Some(10), "#00c853"),
                entry(IndicatorKind::Adx, Some(14), "#d500f9"),
            ],
        },
        Preset {
            name: "momentum-suite",
            entries: vec![
                entry(IndicatorKind::Rsi, Some(14), "#7e57c2"),
                entry(IndicatorKind::Stochastic, Some(14), "#42a5f5"),
                entry(IndicatorKind::Macd, None, "#2962ff"),
            ],
        },
        Preset {
            name: "volatility-bands",
            entries: vec![
                entry(IndicatorKind::Bollinger, Some(20), "#29b6f6"),
                entry(IndicatorKind::Keltner, Some(20), "#9ccc65"),
                entry(IndicatorKind::Atr, Some(14), "#ff7043"),
            ],
        },
        Preset {
            name: "volume-toolkit",
            entries: vec![
                entry(IndicatorKind::Vwap, None, "#fdd835"),
                entry(IndicatorKind::Obv, None, "#78909c"),
                entry(IndicatorKind::Mfi, Some(14), "#ab47bc"),
            ],
        },
    ]
}

/// Look up a preset by name.
pub fn preset(name: &str) -> Option<Preset> {
    presets().into_iter().find(|p| p.name == name)
}
