use crate::common::Interval;
use crate::market::entity::Kline;
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// K 线数据源契约：每次调用抓取一批所有已启用交易所、所有交易对的最新 K 线。
///
/// # Invariants
/// - 单个交易对或单个交易所的失败不得中断整批数据，失败项直接从结果中省略。
/// - 返回结果的顺序没有意义。
/// - 丢弃返回的 Future 必须取消所有进行中的请求。
#[async_trait]
pub trait KlineFeed: Send + Sync {
    /// # Summary
    /// 抓取指定周期下最近一根已收盘的 K 线。
    ///
    /// # Logic
    /// 1. 并发驱动所有交易所适配器。
    /// 2. 各适配器内部并发抓取所有交易对。
    /// 3. 汇总所有成功的结果。
    ///
    /// # Arguments
    /// * `interval`: K 线周期。
    ///
    /// # Returns
    /// 成功返回 K 线列表（可能为空）；所有交易所均不可用时返回 `MarketError::Unavailable`。
    async fn fetch_klines(&self, interval: Interval) -> Result<Vec<Kline>, MarketError>;
}
