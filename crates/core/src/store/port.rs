use super::error::StoreError;
use crate::market::entity::Kline;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// K 线持久化接口。核心只追加写入，不做更新与删除。
///
/// # Invariants
/// - `save_klines` 对一批数据是原子的：要么全部写入，要么全部失败。
#[async_trait]
pub trait KlineStore: Send + Sync {
    /// # Summary
    /// 批量保存 K 线。
    ///
    /// # Logic
    /// 1. 开启事务。
    /// 2. 逐条插入并提交。
    ///
    /// # Arguments
    /// * `klines`: 本轮抓取到的 K 线。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `StoreError`。
    async fn save_klines(&self, klines: &[Kline]) -> Result<(), StoreError>;

    /// # Summary
    /// 按交易所、交易对与开始时间区间读取 K 线，按开始时间升序。
    ///
    /// # Arguments
    /// * `exchange_name`: 交易所名称。
    /// * `symbol`: 归一化交易对。
    /// * `start`: 开始时间（含）。
    /// * `end`: 结束时间（含）。
    ///
    /// # Returns
    /// 返回 K 线列表或 `StoreError`。
    async fn load_klines(
        &self,
        exchange_name: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, StoreError>;
}
