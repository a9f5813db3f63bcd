use crate::common::Interval;
use crate::market::entity::Kline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// 单个交易对的提醒指标。
///
/// # Invariants
/// - `value_delta = (close - open) * bitcoin_amount`。
/// - `total_value = bitcoin_amount * close`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAlert {
    pub symbol: String,
    // 收盘价
    pub price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub percent_change: f64,
    // 持仓在本周期内的价值变化
    pub value_delta: f64,
    // 持仓按收盘价计算的总价值
    pub total_value: f64,
}

impl PairAlert {
    /// 根据 K 线与持仓数量计算提醒指标。
    pub fn from_kline(kline: &Kline, bitcoin_amount: f64) -> Self {
        Self {
            symbol: kline.symbol.clone(),
            price: kline.close_price,
            min_price: kline.min_price,
            max_price: kline.max_price,
            percent_change: kline.percent_change,
            value_delta: (kline.close_price - kline.open_price) * bitcoin_amount,
            total_value: bitcoin_amount * kline.close_price,
        }
    }
}

/// # Summary
/// 一轮任务的聚合提醒报告，交由通知渠道投递。
///
/// # Invariants
/// - `exchanges` 不为空：没有命中阈值的 K 线时不会生成报告。
/// - 按交易所名称有序分组，输出稳定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    // 报告生成时间
    pub generated_at: DateTime<Utc>,
    // K 线周期
    #[serde(rename = "interval_minutes")]
    pub interval: Interval,
    // 持仓的比特币数量
    pub bitcoin_amount: f64,
    // 交易所 -> 命中的交易对
    pub exchanges: BTreeMap<String, Vec<PairAlert>>,
}

impl AlertReport {
    /// 报告中包含的交易对总数。
    pub fn alert_count(&self) -> usize {
        self.exchanges.values().map(Vec::len).sum()
    }
}
