use crate::adapter::{ExchangeAdapter, get_json, int_at, parse_interval, price_at};
use async_trait::async_trait;
use kawase_core::common::Interval;
use kawase_core::common::time::utc_from_millis;
use kawase_core::market::entity::{Kline, Ohlc};
use kawase_core::market::error::MarketError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const BASE_URL: &str = "https://data-api.binance.vision";

/// # Summary
/// Binance 现货行情适配器（公开行情域名，无需鉴权）。
///
/// # Invariants
/// - K 线行布局：`[openTime(ms), open, high, low, close, volume, ...]`。
pub struct BinanceAdapter {
    symbols: Vec<String>,
}

impl BinanceAdapter {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BinanceTime {
    server_time: i64,
}

/// Binance `/api/v3/klines` 原始响应，附带请求参数。
#[derive(Debug)]
pub struct BinanceRaw {
    pub symbol: String,
    pub interval_code: String,
    pub rows: Vec<Vec<Value>>,
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    type Raw = BinanceRaw;

    const NAME: &'static str = "Binance";

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn interval_code(&self, interval: Interval) -> &'static str {
        match interval {
            Interval::Minute1 => "1m",
            Interval::Minute3 => "3m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
        }
    }

    async fn get_server_time(&self, client: &Client) -> Result<i64, MarketError> {
        let url = format!("{}/api/v3/time", BASE_URL);
        let time: BinanceTime = get_json(client, &url, &[]).await?;
        Ok(time.server_time)
    }

    /// # Summary
    /// 抓取一根 K 线。
    ///
    /// # Logic
    /// 1. Binance 返回开盘时间不早于 `startTime` 的第一根 K 线，额外回退 1 分钟以命中目标区间。
    /// 2. `limit=1` 只取一根。
    async fn fetch_raw_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval_code: &str,
        start_time_ms: i64,
    ) -> Result<BinanceRaw, MarketError> {
        let url = format!("{}/api/v3/klines", BASE_URL);
        let rows: Vec<Vec<Value>> = get_json(
            client,
            &url,
            &[
                ("symbol", symbol.to_string()),
                ("interval", interval_code.to_string()),
                ("startTime", (start_time_ms - 60_000).to_string()),
                ("limit", "1".to_string()),
            ],
        )
        .await?;

        Ok(BinanceRaw {
            symbol: symbol.to_string(),
            interval_code: interval_code.to_string(),
            rows,
        })
    }

    fn to_kline(&self, raw: BinanceRaw) -> Result<Kline, MarketError> {
        let row = raw
            .rows
            .first()
            .ok_or_else(|| MarketError::Protocol(format!("Binance: no kline for {}", raw.symbol)))?;

        let interval = parse_interval(&raw.interval_code)?;
        let open_time = int_at(row, 0)?;
        let start_time = utc_from_millis(open_time)
            .ok_or_else(|| MarketError::Protocol(format!("Binance: bad open time {}", open_time)))?;

        let ohlc = Ohlc {
            open: price_at(row, 1)?,
            high: price_at(row, 2)?,
            low: price_at(row, 3)?,
            close: price_at(row, 4)?,
        };

        Kline::from_raw(Self::NAME, &raw.symbol, interval, start_time, ohlc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(symbol: &str, row: Value) -> BinanceRaw {
        BinanceRaw {
            symbol: symbol.to_string(),
            interval_code: "5m".to_string(),
            rows: vec![row.as_array().unwrap().clone()],
        }
    }

    #[test]
    fn test_btc_quote_pair() {
        let adapter = BinanceAdapter::new(vec![]);
        let row = json!([
            1727043000000i64, "63050.10000000", "63120.00000000", "62990.55000000",
            "63101.99000000", "12.3", 1727043299999i64, "775000.1", 1200, "6.1", "384000.2", "0"
        ]);
        let kline = adapter.to_kline(raw("BTCUSDT", row)).unwrap();

        assert_eq!(kline.exchange_name, "Binance");
        assert_eq!(kline.symbol, "BTC-USDT");
        assert_eq!(kline.interval_minutes(), 5);
        assert_eq!(kline.start_time.timestamp(), 1_727_043_000);
        assert_eq!(kline.open_price, 63050.1);
        assert_eq!(kline.max_price, 63120.0);
        assert_eq!(kline.min_price, 62990.55);
        assert_eq!(kline.close_price, 63101.99);
    }

    #[test]
    fn test_inverted_pair_swaps_min_max() {
        let adapter = BinanceAdapter::new(vec![]);
        // open 0.05, high 0.056, low 0.049, close 0.055
        let row = json!([1727043000000i64, "0.05000000", "0.05600000", "0.04900000", "0.05500000", "1.0"]);
        let kline = adapter.to_kline(raw("ETHBTC", row)).unwrap();

        assert_eq!(kline.symbol, "BTC-ETH");
        assert_eq!(kline.open_price, 20.0);
        assert_eq!(kline.close_price, 18.18);
        assert_eq!(kline.max_price, 20.41);
        assert_eq!(kline.min_price, 17.86);
        assert!(kline.percent_change < 0.0);
    }

    #[test]
    fn test_empty_response_is_protocol_error() {
        let adapter = BinanceAdapter::new(vec![]);
        let empty = BinanceRaw {
            symbol: "BTCUSDT".to_string(),
            interval_code: "1m".to_string(),
            rows: vec![],
        };
        assert!(matches!(adapter.to_kline(empty), Err(MarketError::Protocol(_))));
    }

    #[test]
    fn test_interval_codes() {
        let adapter = BinanceAdapter::new(vec![]);
        let codes: Vec<&str> = Interval::ALL.iter().map(|i| adapter.interval_code(*i)).collect();
        assert_eq!(codes, ["1m", "3m", "5m", "15m", "30m"]);
    }
}
