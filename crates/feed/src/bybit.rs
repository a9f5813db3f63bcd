use crate::adapter::{ExchangeAdapter, get_json, int_at, parse_interval, price_at};
use async_trait::async_trait;
use kawase_core::common::Interval;
use kawase_core::common::time::utc_from_millis;
use kawase_core::market::entity::{Kline, Ohlc};
use kawase_core::market::error::MarketError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const BASE_URL: &str = "https://api.bybit.com";

/// # Summary
/// Bybit v5 现货行情适配器。
///
/// # Invariants
/// - 所有响应都包裹在 `{retCode, retMsg, result, time}` 中，`retCode != 0` 视为协议错误。
/// - K 线行布局：`[startTime(ms), open, high, low, close, volume, turnover]`，全部为字符串。
pub struct BybitAdapter {
    symbols: Vec<String>,
}

impl BybitAdapter {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BybitEnvelope<T> {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<T>,
    // 服务器时间（毫秒）
    time: Option<i64>,
}

impl<T> BybitEnvelope<T> {
    fn check(&self) -> Result<(), MarketError> {
        if self.ret_code != 0 {
            return Err(MarketError::Protocol(format!(
                "Bybit retCode {}: {}",
                self.ret_code, self.ret_msg
            )));
        }
        Ok(())
    }
}

/// Bybit `/v5/market/kline` 的 `result` 部分。
#[derive(Deserialize, Debug)]
pub struct BybitKlineResult {
    pub symbol: String,
    #[serde(default)]
    pub list: Vec<Vec<Value>>,
}

/// # Summary
/// 解析 K 线响应的 `result`。
///
/// # Logic
/// 1. 先检查 `retCode`，错误响应的 `result` 通常是 `{}`，不能先按 K 线结构解析。
/// 2. 再把 `result` 解析为 `BybitKlineResult`。
fn decode_kline_result(envelope: BybitEnvelope<Value>, symbol: &str) -> Result<BybitKlineResult, MarketError> {
    envelope.check()?;
    let result = envelope
        .result
        .ok_or_else(|| MarketError::Protocol(format!("Bybit: empty result for {}", symbol)))?;
    serde_json::from_value(result)
        .map_err(|e| MarketError::Protocol(format!("Bybit: malformed result for {}: {}", symbol, e)))
}

/// Bybit 原始响应，附带请求时的周期代码。
#[derive(Debug)]
pub struct BybitRaw {
    pub interval_code: String,
    pub result: BybitKlineResult,
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    type Raw = BybitRaw;

    const NAME: &'static str = "Bybit";

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn interval_code(&self, interval: Interval) -> &'static str {
        match interval {
            Interval::Minute1 => "1",
            Interval::Minute3 => "3",
            Interval::Minute5 => "5",
            Interval::Minute15 => "15",
            Interval::Minute30 => "30",
        }
    }

    async fn get_server_time(&self, client: &Client) -> Result<i64, MarketError> {
        let url = format!("{}/v5/market/time", BASE_URL);
        let envelope: BybitEnvelope<Value> = get_json(client, &url, &[]).await?;
        envelope.check()?;
        envelope
            .time
            .ok_or_else(|| MarketError::Protocol("Bybit: missing server time".to_string()))
    }

    async fn fetch_raw_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval_code: &str,
        start_time_ms: i64,
    ) -> Result<BybitRaw, MarketError> {
        let url = format!("{}/v5/market/kline", BASE_URL);
        let envelope: BybitEnvelope<Value> = get_json(
            client,
            &url,
            &[
                ("category", "spot".to_string()),
                ("symbol", symbol.to_string()),
                ("interval", interval_code.to_string()),
                ("start", start_time_ms.to_string()),
                ("limit", "1".to_string()),
            ],
        )
        .await?;
        let result = decode_kline_result(envelope, symbol)?;

        Ok(BybitRaw {
            interval_code: interval_code.to_string(),
            result,
        })
    }

    fn to_kline(&self, raw: BybitRaw) -> Result<Kline, MarketError> {
        let symbol = &raw.result.symbol;
        let row = raw
            .result
            .list
            .first()
            .ok_or_else(|| MarketError::Protocol(format!("Bybit: no kline for {}", symbol)))?;

        let interval = parse_interval(&raw.interval_code)?;
        let open_time = int_at(row, 0)?;
        let start_time = utc_from_millis(open_time)
            .ok_or_else(|| MarketError::Protocol(format!("Bybit: bad start time {}", open_time)))?;

        let ohlc = Ohlc {
            open: price_at(row, 1)?,
            high: price_at(row, 2)?,
            low: price_at(row, 3)?,
            close: price_at(row, 4)?,
        };

        Kline::from_raw(Self::NAME, symbol, interval, start_time, ohlc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from_response(response: Value, interval_code: &str) -> BybitRaw {
        let envelope: BybitEnvelope<Value> = serde_json::from_value(response).unwrap();
        BybitRaw {
            interval_code: interval_code.to_string(),
            result: decode_kline_result(envelope, "TEST").unwrap(),
        }
    }

    #[test]
    fn test_btc_quote_pair() {
        let response = json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "symbol": "BTCUSDT",
                "category": "spot",
                "list": [["1727043000000", "63050.1", "63120", "62990.55", "63101.99", "12.3", "775000.1"]]
            },
            "retExtInfo": {},
            "time": 1727043123456i64
        });
        let kline = BybitAdapter::new(vec![])
            .to_kline(raw_from_response(response, "15"))
            .unwrap();

        assert_eq!(kline.exchange_name, "Bybit");
        assert_eq!(kline.symbol, "BTC-USDT");
        assert_eq!(kline.interval_minutes(), 15);
        assert_eq!(kline.start_time.timestamp(), 1_727_043_000);
        assert_eq!(kline.open_price, 63050.1);
        assert_eq!(kline.max_price, 63120.0);
        assert_eq!(kline.min_price, 62990.55);
        assert_eq!(kline.close_price, 63101.99);
    }

    #[test]
    fn test_inverted_pair_swaps_min_max() {
        let response = json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "symbol": "ETHBTC",
                "category": "spot",
                "list": [["1727043000000", "0.05", "0.056", "0.049", "0.055", "3.1", "0.16"]]
            },
            "time": 1727043123456i64
        });
        let kline = BybitAdapter::new(vec![])
            .to_kline(raw_from_response(response, "1"))
            .unwrap();

        assert_eq!(kline.symbol, "BTC-ETH");
        assert_eq!(kline.open_price, 20.0);
        assert_eq!(kline.close_price, 18.18);
        assert_eq!(kline.max_price, 20.41);
        assert_eq!(kline.min_price, 17.86);
        assert!(kline.min_price <= kline.close_price && kline.close_price <= kline.max_price);
    }

    /// # Summary
    /// 错误响应的 `result` 为 `{}` 时，应得到携带 retCode 的协议错误，而不是结构解析错误。
    #[test]
    fn test_error_reply_with_empty_result() {
        let response = json!({ "retCode": 10001, "result": {} });
        let envelope: BybitEnvelope<Value> = serde_json::from_value(response).unwrap();

        let result = decode_kline_result(envelope, "BTCUSDT");
        assert!(matches!(result, Err(MarketError::Protocol(ref msg)) if msg.contains("retCode 10001")));
    }

    #[test]
    fn test_error_envelope() {
        let response = json!({ "retCode": 10001, "retMsg": "params error: symbol invalid", "result": {}, "time": 1 });
        let envelope: BybitEnvelope<Value> = serde_json::from_value(response).unwrap();
        assert!(matches!(envelope.check(), Err(MarketError::Protocol(_))));
    }

    #[test]
    fn test_empty_list_is_protocol_error() {
        let raw = BybitRaw {
            interval_code: "5".to_string(),
            result: BybitKlineResult {
                symbol: "BTCUSDT".to_string(),
                list: vec![],
            },
        };
        assert!(matches!(
            BybitAdapter::new(vec![]).to_kline(raw),
            Err(MarketError::Protocol(_))
        ));
    }
}
