use kawase_core::market::error::MarketError;
use kawase_core::store::error::StoreError;
use std::time::Duration;
use thiserror::Error;

/// # Summary
/// 单轮任务的致命错误。记录日志后交还调度器，调度器继续下一次触发。
#[derive(Error, Debug)]
pub enum CycleError {
    /// 所有交易所都不可用
    #[error("Fetch failed: {0}")]
    Fetch(#[from] MarketError),

    /// 整轮任务超时，已取消所有在途请求且未写入任何数据
    #[error("Cycle timed out after {0:?}")]
    Timeout(Duration),

    /// 持久化失败
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
