use crate::notify::entity::AlertReport;
use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// # Summary
/// 通知渠道接口，负责把提醒报告投递到外部系统。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 投递失败只需返回错误，调用方不会重试。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Summary
    /// 投递一份提醒报告。
    ///
    /// # Logic
    /// 1. 根据目标平台要求渲染报告。
    /// 2. 通过底层传输协议发送消息。
    ///
    /// # Arguments
    /// * `report` - 本轮任务的聚合提醒报告。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 失败返回 `Err(NotifyError)`。
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError>;
}
