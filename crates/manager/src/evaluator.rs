use kawase_core::common::Interval;
use kawase_core::common::time::TimeProvider;
use kawase_core::config::{AlertConfig, ThresholdMode};
use kawase_core::market::entity::Kline;
use kawase_core::notify::entity::{AlertReport, PairAlert};
use std::collections::BTreeMap;
use std::sync::Arc;

/// # Summary
/// 提醒评估器：按阈值筛选 K 线，并聚合成一份报告。
///
/// # Invariants
/// - 报告生成时间只从注入的时钟读取。
/// - 没有命中阈值的 K 线时不产生报告。
pub struct NotificationEvaluator {
    bitcoin_amount: f64,
    threshold: f64,
    mode: ThresholdMode,
    clock: Arc<dyn TimeProvider>,
}

impl NotificationEvaluator {
    pub fn new(bitcoin_amount: f64, threshold: f64, mode: ThresholdMode, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            bitcoin_amount,
            threshold,
            mode,
            clock,
        }
    }

    pub fn from_config(config: &AlertConfig, clock: Arc<dyn TimeProvider>) -> Self {
        Self::new(
            config.bitcoin_amount,
            config.notification_threshold,
            config.threshold_mode,
            clock,
        )
    }

    /// # Summary
    /// 评估本轮 K 线。
    ///
    /// # Logic
    /// 1. 按阈值模式筛选涨跌幅。
    /// 2. 为每根命中的 K 线计算持仓价值变化与总价值。
    /// 3. 按交易所名称分组。
    ///
    /// # Returns
    /// 有命中时返回 `Some(AlertReport)`，否则 `None`。
    pub fn evaluate(&self, klines: &[Kline], interval: Interval) -> Option<AlertReport> {
        let mut exchanges: BTreeMap<String, Vec<PairAlert>> = BTreeMap::new();

        for kline in klines
            .iter()
            .filter(|k| self.mode.exceeds(k.percent_change, self.threshold))
        {
            exchanges
                .entry(kline.exchange_name.clone())
                .or_default()
                .push(PairAlert::from_kline(kline, self.bitcoin_amount));
        }

        if exchanges.is_empty() {
            return None;
        }

        // 交易所内按交易对排序，报告内容与抓取完成顺序无关
        for alerts in exchanges.values_mut() {
            alerts.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        }

        Some(AlertReport {
            generated_at: self.clock.now(),
            interval,
            bitcoin_amount: self.bitcoin_amount,
            exchanges,
        })
    }
}
