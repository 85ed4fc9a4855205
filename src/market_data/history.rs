// =============================================================================
// Historical backfill — REST seed of the candle store
// =============================================================================
//
// Fetches an initial window of confirmed candles over REST so indicators have
// warmup history before the live stream contributes its first bar.  The
// response format is the common exchange array-of-arrays kline shape:
//   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume, ...
// Numeric fields may arrive as JSON strings or numbers.
// =============================================================================

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::market_data::Candle;

/// REST client for the candle history endpoint.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HistoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// GET `{base}/klines?symbol=&interval=&limit=` and parse the response
    /// into candles (oldest first).  Malformed entries are skipped with a
    /// warning rather than failing the whole backfill.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /klines request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("history endpoint returned {}: {}", status, body);
        }

        let raw = body.as_array().context("klines response is not an array")?;

        let mut candles = Vec::with_capacity(raw.len());
        for entry in raw {
            match parse_kline_entry(entry) {
                Ok(candle) => candles.push(candle),
                Err(e) => warn!(error = %e, "skipping malformed kline entry"),
            }
        }

        debug!(symbol, interval, count = candles.len(), "history fetched");
        Ok(candles)
    }
}

/// Parse one `[openTime, open, high, low, close, volume, ...]` entry.
fn parse_kline_entry(entry: &serde_json::Value) -> Result<Candle> {
    let arr = entry.as_array().context("kline entry is not an array")?;
    if arr.len() < 6 {
        anyhow::bail!("kline entry has {} elements, need at least 6", arr.len());
    }

    let time = arr[0].as_i64().context("kline openTime is not an integer")?;
    let open = parse_str_f64(&arr[1])?;
    let high = parse_str_f64(&arr[2])?;
    let low = parse_str_f64(&arr[3])?;
    let close = parse_str_f64(&arr[4])?;
    let volume = parse_str_f64(&arr[5])?;

    Ok(Candle::new(time, open, high, low, close, volume))
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_entry_with_string_numbers() {
        let entry = serde_json::json!([
            1700000000000_i64,
            "37000.00",
            "37050.00",
            "36990.00",
            "37020.00",
            "123.456"
        ]);
        let candle = parse_kline_entry(&entry).unwrap();
        assert_eq!(candle.time, 1_700_000_000_000);
        assert!((candle.open - 37000.0).abs() < f64::EPSILON);
        assert!((candle.volume - 123.456).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_entry_with_plain_numbers() {
        let entry = serde_json::json!([0_i64, 1.0, 2.0, 0.5, 1.5, 10.0]);
        let candle = parse_kline_entry(&entry).unwrap();
        assert!((candle.high - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_entry_too_short() {
        let entry = serde_json::json!([0_i64, "1.0"]);
        assert!(parse_kline_entry(&entry).is_err());
    }

    #[test]
    fn parse_entry_not_an_array() {
        let entry = serde_json::json!({ "open": 1.0 });
        assert!(parse_kline_entry(&entry).is_err());
    }

    #[test]
    fn parse_str_f64_rejects_garbage() {
        assert!(parse_str_f64(&serde_json::json!("abc")).is_err());
        assert!(parse_str_f64(&serde_json::json!(null)).is_err());
        assert!(parse_str_f64(&serde_json::json!(true)).is_err());
    }
}
