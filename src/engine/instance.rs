// =============================================================================
// Indicator instances & parameters
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{descriptor, IndicatorKind, ParamValue};

/// Immutable parameter map for one indicator instance.
///
/// Keys come from the registry schema; missing entries are completed from the
/// schema defaults at instance creation, so compute code can rely on every
/// declared parameter being present.  A `BTreeMap` keeps iteration and
/// serialization order stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams(BTreeMap<String, ParamValue>);

impl IndicatorParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// The public-surface constructor: an optional period plus a color.
    pub fn from_period_color(period: Option<u32>, color: Option<&str>) -> Self {
        let mut map = BTreeMap::new();
        if let Some(p) = period {
            map.insert("period".to_string(), ParamValue::Number(p as f64));
        }
        if let Some(c) = color {
            map.insert("color".to_string(), ParamValue::Color(c.to_string()));
        }
        Self(map)
    }

    pub fn set(mut self, name: &str, value: ParamValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    /// Fill every schema parameter of `kind` that the map does not already
    /// carry with its registry default.
    pub fn complete_for(mut self, kind: IndicatorKind) -> Self {
        for spec in descriptor(kind).params {
            self.0
                .entry(spec.name.to_string())
                .or_insert_with(|| spec.default.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Numeric parameter, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_number)
    }

    /// Numeric parameter truncated to a window length.  Non-finite and
    /// negative values map to zero, which calculators treat as warmup-only.
    pub fn window(&self, name: &str) -> usize {
        match self.number(name) {
            Some(n) if n.is_finite() && n >= 1.0 => n as usize,
            _ => 0,
        }
    }

    pub fn color(&self) -> Option<&str> {
        self.get("color").and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// One active indicator on the chart.
///
/// Instances are created by explicit user action and destroyed by explicit
/// removal; only `visible` and `params` ever change afterwards, and a params
/// change triggers a full recompute.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorInstance {
    pub id: Uuid,
    pub kind: IndicatorKind,
    pub params: IndicatorParams,
    pub visible: bool,
}

impl IndicatorInstance {
    pub fn new(kind: IndicatorKind, params: IndicatorParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            params: params.complete_for(kind),
            visible: true,
        }
    }
}
