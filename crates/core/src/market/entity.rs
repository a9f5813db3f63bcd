use crate::common::Interval;
use crate::common::pair::{is_btc_based, normalize_pair};
use crate::market::error::MarketError;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// 保留两位小数。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 周期内的涨跌百分比。
pub fn percent_change(open: f64, close: f64) -> f64 {
    (close - open) * 100.0 / open
}

/// # Summary
/// 交易所原始 OHLC 价格，尚未做方向归一化。
///
/// # Invariants
/// - 由各交易所适配器按照自身的字段布局填充：`high` 必须取自交易所的最高价字段，
///   `low` 取自最低价字段。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    /// # Summary
    /// 按交易对方向归一化价格（以 BASE 计价的 QUOTE 数量）。
    ///
    /// # Logic
    /// 1. 拒绝非有限值与非正价格。
    /// 2. BTC 开头的交易对直接保留两位小数。
    /// 3. 否则所有价格取倒数；倒数会反转大小关系，因此最高价取自原始最低价，最低价取自原始最高价。
    /// 4. 舍入后为零的价格视为协议错误，避免后续除零。
    ///
    /// # Arguments
    /// * `btc_based`: 原始交易对是否以 BTC 开头。
    ///
    /// # Returns
    /// 成功返回归一化后的价格，失败返回 `MarketError::Protocol`。
    pub fn normalize(self, btc_based: bool) -> Result<Ohlc, MarketError> {
        let raw = [self.open, self.high, self.low, self.close];
        if raw.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(MarketError::Protocol(format!(
                "Invalid candle prices: {:?}",
                self
            )));
        }

        let normalized = if btc_based {
            Ohlc {
                open: round2(self.open),
                high: round2(self.high),
                low: round2(self.low),
                close: round2(self.close),
            }
        } else {
            Ohlc {
                open: round2(1.0 / self.open),
                high: round2(1.0 / self.low),
                low: round2(1.0 / self.high),
                close: round2(1.0 / self.close),
            }
        };

        if normalized.open <= 0.0 || normalized.close <= 0.0 || normalized.low <= 0.0 {
            return Err(MarketError::Protocol(format!(
                "Prices vanish after rounding: {:?}",
                self
            )));
        }
        Ok(normalized)
    }
}

/// # Summary
/// 统一的 K 线记录，所有交易所适配器的输出格式。
///
/// # Invariants
/// - `min_price <= open_price, close_price <= max_price`。
/// - `symbol` 为大写 `"BASE-QUOTE"`，恰好一个连字符。
/// - `start_time` 精确到秒。
/// - 价格保留两位小数，`percent_change` 由舍入后的开盘价与收盘价计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    // 来源交易所名称
    pub exchange_name: String,
    // 归一化交易对，例如 BTC-USDT
    pub symbol: String,
    // K 线周期
    #[serde(rename = "interval_minutes")]
    pub interval: Interval,
    // K 线开始时间
    pub start_time: DateTime<Utc>,
    pub open_price: f64,
    pub close_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    // 周期内涨跌百分比
    pub percent_change: f64,
}

impl Kline {
    /// # Summary
    /// 由交易所原始数据构造 K 线。
    ///
    /// # Logic
    /// 1. 归一化交易对名称。
    /// 2. 根据原始交易对是否以 BTC 开头决定是否取倒数。
    /// 3. 校验 OHLC 的大小关系。
    /// 4. 截断开始时间到秒并计算涨跌幅。
    ///
    /// # Arguments
    /// * `exchange_name`: 交易所名称。
    /// * `raw_symbol`: 交易所原始交易对，例如 `ETHBTC` 或 `ETH-BTC`。
    /// * `interval`: 周期。
    /// * `start_time`: K 线开始时间。
    /// * `raw`: 按 open/high/low/close 语义整理好的原始价格。
    ///
    /// # Returns
    /// 成功返回 Kline，数据不一致时返回 `MarketError::Protocol`。
    pub fn from_raw(
        exchange_name: &str,
        raw_symbol: &str,
        interval: Interval,
        start_time: DateTime<Utc>,
        raw: Ohlc,
    ) -> Result<Self, MarketError> {
        let symbol = normalize_pair(raw_symbol)?;
        let prices = raw.normalize(is_btc_based(raw_symbol))?;

        if prices.low > prices.open.min(prices.close) || prices.high < prices.open.max(prices.close)
        {
            return Err(MarketError::Protocol(format!(
                "Inconsistent candle for {}: {:?}",
                raw_symbol, prices
            )));
        }

        Ok(Self {
            exchange_name: exchange_name.to_string(),
            symbol,
            interval,
            start_time: start_time.with_nanosecond(0).unwrap_or(start_time),
            open_price: prices.open,
            close_price: prices.close,
            min_price: prices.low,
            max_price: prices.high,
            percent_change: percent_change(prices.open, prices.close),
        })
    }

    /// 周期长度（分钟）。
    pub fn interval_minutes(&self) -> u32 {
        self.interval.minutes()
    }
}
