use crate::adapter::{ExchangeAdapter, get_json, int_at, parse_interval, price_at};
use async_trait::async_trait;
use kawase_core::common::Interval;
use kawase_core::common::time::utc_from_millis;
use kawase_core::market::entity::{Kline, Ohlc};
use kawase_core::market::error::MarketError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const BASE_URL: &str = "https://api.kucoin.com";
const SUCCESS_CODE: &str = "200000";

/// # Summary
/// KuCoin 现货行情适配器。
///
/// # Invariants
/// - 交易对使用连字符格式，例如 `BTC-USDT`。
/// - K 线行布局：`[time(s), open, close, high, low, volume, turnover]`，注意收盘价在最高价之前。
/// - 返回的 K 线按时间倒序排列。
pub struct KucoinAdapter {
    symbols: Vec<String>,
}

impl KucoinAdapter {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

#[derive(Deserialize, Debug)]
struct KucoinEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

impl<T> KucoinEnvelope<T> {
    fn into_data(self) -> Result<T, MarketError> {
        if self.code != SUCCESS_CODE {
            return Err(MarketError::Protocol(format!(
                "KuCoin code {}: {}",
                self.code,
                self.msg.unwrap_or_default()
            )));
        }
        self.data
            .ok_or_else(|| MarketError::Protocol("KuCoin: missing data".to_string()))
    }
}

/// KuCoin `/api/v1/market/candles` 原始响应，附带请求参数。
#[derive(Debug)]
pub struct KucoinRaw {
    pub symbol: String,
    pub interval_code: String,
    pub rows: Vec<Vec<Value>>,
}

#[async_trait]
impl ExchangeAdapter for KucoinAdapter {
    type Raw = KucoinRaw;

    const NAME: &'static str = "Kucoin";

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn interval_code(&self, interval: Interval) -> &'static str {
        match interval {
            Interval::Minute1 => "1min",
            Interval::Minute3 => "3min",
            Interval::Minute5 => "5min",
            Interval::Minute15 => "15min",
            Interval::Minute30 => "30min",
        }
    }

    async fn get_server_time(&self, client: &Client) -> Result<i64, MarketError> {
        let url = format!("{}/api/v1/timestamp", BASE_URL);
        let envelope: KucoinEnvelope<i64> = get_json(client, &url, &[]).await?;
        envelope.into_data()
    }

    /// # Summary
    /// 抓取目标 K 线。
    ///
    /// # Logic
    /// 1. `startAt` 以秒为单位，额外回退 60 秒。
    /// 2. KuCoin 不支持 `limit`，返回从 `startAt` 到现在的所有 K 线，转换时取最早的一根。
    async fn fetch_raw_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval_code: &str,
        start_time_ms: i64,
    ) -> Result<KucoinRaw, MarketError> {
        let url = format!("{}/api/v1/market/candles", BASE_URL);
        let envelope: KucoinEnvelope<Vec<Vec<Value>>> = get_json(
            client,
            &url,
            &[
                ("symbol", symbol.to_string()),
                ("type", interval_code.to_string()),
                ("startAt", (start_time_ms / 1000 - 60).to_string()),
            ],
        )
        .await?;

        Ok(KucoinRaw {
            symbol: symbol.to_string(),
            interval_code: interval_code.to_string(),
            rows: envelope.into_data()?,
        })
    }

    fn to_kline(&self, raw: KucoinRaw) -> Result<Kline, MarketError> {
        // 倒序排列，最后一行是最早的 K 线
        let row = raw
            .rows
            .last()
            .ok_or_else(|| MarketError::Protocol(format!("KuCoin: no kline for {}", raw.symbol)))?;

        let interval = parse_interval(&raw.interval_code)?;
        let open_time_secs = int_at(row, 0)?;
        let start_time = open_time_secs
            .checked_mul(1000)
            .and_then(utc_from_millis)
            .ok_or_else(|| MarketError::Protocol(format!("KuCoin: bad start time {}", open_time_secs)))?;

        let ohlc = Ohlc {
            open: price_at(row, 1)?,
            close: price_at(row, 2)?,
            high: price_at(row, 3)?,
            low: price_at(row, 4)?,
        };

        Kline::from_raw(Self::NAME, &raw.symbol, interval, start_time, ohlc)
    }
}
