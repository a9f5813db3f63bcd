use async_trait::async_trait;
use kawase_core::common::Interval;
use kawase_core::market::entity::Kline;
use kawase_core::market::error::MarketError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// # Summary
/// 单个交易所的能力集合：服务器时间、原始 K 线抓取、原始数据转换。
///
/// # Invariants
/// - 每个交易所自行持有 URL、参数名、响应结构与字段位置，彼此不共享状态。
/// - `interval_code` 是静态映射，覆盖全部 `Interval`。
/// - `to_kline` 是纯函数，不做任何 I/O，便于用固定报文测试。
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// 交易所原生响应（附带请求时的交易对与周期代码）
    type Raw: Send;

    /// 交易所名称，写入 `Kline::exchange_name`
    const NAME: &'static str;

    /// 需要抓取的交易对（交易所原生格式）
    fn symbols(&self) -> &[String];

    /// 周期到交易所周期代码的映射
    fn interval_code(&self, interval: Interval) -> &'static str;

    /// # Summary
    /// 查询交易所服务器时间。
    ///
    /// # Returns
    /// 成功返回毫秒时间戳；传输失败返回 `Network`，响应异常返回 `Protocol`。
    async fn get_server_time(&self, client: &Client) -> Result<i64, MarketError>;

    /// # Summary
    /// 抓取单个交易对覆盖 `[start_time_ms, start_time_ms + interval)` 的一根 K 线。
    ///
    /// # Arguments
    /// * `client`: 本轮共享的 HTTP 客户端。
    /// * `symbol`: 交易所原生交易对。
    /// * `interval_code`: 交易所周期代码。
    /// * `start_time_ms`: 目标 K 线的开始时间（毫秒）。
    async fn fetch_raw_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval_code: &str,
        start_time_ms: i64,
    ) -> Result<Self::Raw, MarketError>;

    /// 将原生响应转换为统一的 K 线
    fn to_kline(&self, raw: Self::Raw) -> Result<Kline, MarketError>;
}

/// # Summary
/// 面向抓取中心的对象安全接口，任何 `ExchangeAdapter` 自动实现。
///
/// # Invariants
/// - 通过 `Arc<dyn Exchange>` 动态分发，抓取中心不感知具体的原生响应类型。
#[async_trait]
pub trait Exchange: Send + Sync {
    fn name(&self) -> &str;

    fn symbols(&self) -> &[String];

    async fn server_time(&self, client: &Client) -> Result<i64, MarketError>;

    /// 抓取并转换单个交易对的 K 线
    async fn fetch_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval: Interval,
        start_time_ms: i64,
    ) -> Result<Kline, MarketError>;
}

#[async_trait]
impl<A> Exchange for A
where
    A: ExchangeAdapter,
{
    fn name(&self) -> &str {
        A::NAME
    }

    fn symbols(&self) -> &[String] {
        ExchangeAdapter::symbols(self)
    }

    async fn server_time(&self, client: &Client) -> Result<i64, MarketError> {
        self.get_server_time(client).await
    }

    async fn fetch_kline(
        &self,
        client: &Client,
        symbol: &str,
        interval: Interval,
        start_time_ms: i64,
    ) -> Result<Kline, MarketError> {
        let code = self.interval_code(interval);
        let raw = self.fetch_raw_kline(client, symbol, code, start_time_ms).await?;
        self.to_kline(raw)
    }
}

/// # Summary
/// 发起 GET 请求并把响应体解析为 JSON。
///
/// # Logic
/// 1. 发送请求，传输失败或超时映射为 `Network`。
/// 2. 非 2xx 状态码映射为 `Network`。
/// 3. 响应体无法解析为目标结构时映射为 `Protocol`。
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, MarketError> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(transport_error)?;

    if !resp.status().is_success() {
        return Err(MarketError::Network(format!(
            "HTTP {} from {}",
            resp.status(),
            url
        )));
    }

    resp.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            MarketError::Protocol(e.to_string())
        } else {
            transport_error(e)
        }
    })
}

fn transport_error(e: reqwest::Error) -> MarketError {
    if e.is_timeout() {
        MarketError::Network(format!("timeout: {}", e))
    } else {
        MarketError::Network(e.to_string())
    }
}

/// 读取行中的价格字段，交易所可能以字符串或数字返回。
pub(crate) fn price_at(row: &[Value], idx: usize) -> Result<f64, MarketError> {
    match row.get(idx) {
        Some(Value::String(s)) => s
            .parse::<f64>()
            .map_err(|e| MarketError::Protocol(format!("field {}: {}", idx, e))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| MarketError::Protocol(format!("field {} is not a float", idx))),
        other => Err(MarketError::Protocol(format!(
            "field {} missing or malformed: {:?}",
            idx, other
        ))),
    }
}

/// 读取行中的整数时间戳字段。
pub(crate) fn int_at(row: &[Value], idx: usize) -> Result<i64, MarketError> {
    match row.get(idx) {
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map_err(|e| MarketError::Protocol(format!("field {}: {}", idx, e))),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| MarketError::Protocol(format!("field {} is not an integer", idx))),
        other => Err(MarketError::Protocol(format!(
            "field {} missing or malformed: {:?}",
            idx, other
        ))),
    }
}

/// 从交易所周期代码中解析周期。
pub(crate) fn parse_interval(code: &str) -> Result<Interval, MarketError> {
    Interval::from_code(code).map_err(|e| MarketError::Protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_readers() {
        let row = json!([1499040000000i64, "0.01634790", 12.5, null]);
        let row = row.as_array().unwrap();
        assert_eq!(int_at(row, 0).unwrap(), 1_499_040_000_000);
        assert_eq!(price_at(row, 1).unwrap(), 0.0163479);
        assert_eq!(price_at(row, 2).unwrap(), 12.5);
        assert!(matches!(price_at(row, 3), Err(MarketError::Protocol(_))));
        assert!(matches!(price_at(row, 9), Err(MarketError::Protocol(_))));
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("5min").unwrap(), Interval::Minute5);
        assert!(matches!(parse_interval("D"), Err(MarketError::Protocol(_))));
        assert_eq!(
            parse_interval("60"),
            Err(MarketError::Protocol("Unsupported interval: 60 minutes".to_string()))
        );
    }
}
