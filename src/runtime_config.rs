// =============================================================================
// Runtime Configuration — chart engine settings with atomic save
// =============================================================================
//
// Every tunable the engine needs at startup lives here.  Persistence uses an
// atomic tmp + rename pattern to prevent corruption on crash, and every field
// carries a serde default so adding new fields never breaks loading an older
// config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_timeframe() -> String {
    "1m".to_string()
}

fn default_stream_url() -> String {
    "wss://stream.example.com/bars".to_string()
}

fn default_history_url() -> String {
    "https://api.example.com/api/v1".to_string()
}

fn default_history_limit() -> u32 {
    500
}

fn default_max_candles() -> usize {
    1000
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the chart engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Symbol the engine subscribes to on startup.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Bar interval of the subscription (e.g. "1m", "5m", "1h").
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// WebSocket endpoint delivering the candle stream.
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// REST base URL for the historical backfill; empty disables backfill.
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Number of candles to backfill before going live.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Maximum confirmed candles retained in the store.
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,

    /// Fixed delay between reconnect attempts, in seconds.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Preset applied on startup, if any (see `registry::presets`).
    #[serde(default)]
    pub default_preset: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            timeframe: default_timeframe(),
            stream_url: default_stream_url(),
            history_url: default_history_url(),
            history_limit: default_history_limit(),
            max_candles: default_max_candles(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            default_preset: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.timeframe, "1m");
        assert_eq!(cfg.history_limit, 500);
        assert_eq!(cfg.max_candles, 1000);
        assert_eq!(cfg.reconnect_delay_secs, 5);
        assert!(cfg.default_preset.is_none());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.reconnect_delay_secs, 5);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "symbol": "ETHUSDT", "timeframe": "5m" }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.timeframe, "5m");
        assert_eq!(cfg.max_candles, 1000);
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = RuntimeConfig::default();
        cfg.default_preset = Some("trend-following".to_string());
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.symbol, cfg2.symbol);
        assert_eq!(cfg.default_preset, cfg2.default_preset);
    }
}
