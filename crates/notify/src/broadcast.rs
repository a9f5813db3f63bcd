use async_trait::async_trait;
use futures::future::join_all;
use kawase_core::notify::entity::AlertReport;
use kawase_core::notify::error::NotifyError;
use kawase_core::notify::port::Notifier;
use std::sync::Arc;
use tracing::warn;

/// # Summary
/// 把同一份报告并发投递到多个渠道。
///
/// # Invariants
/// - 单个渠道失败不影响其余渠道。
/// - 任一渠道失败时返回第一个错误，调用方据此记录投递失败。
pub struct BroadcastNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl BroadcastNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError> {
        let results = join_all(self.notifiers.iter().map(|n| n.notify(report))).await;

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                warn!("Notification channel failed: {}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
