use async_trait::async_trait;
use kawase_core::notify::entity::AlertReport;
use kawase_core::notify::error::NotifyError;
use kawase_core::notify::port::Notifier;
use tracing::info;

/// 只写日志的通知渠道，未配置邮件或 Telegram 时使用。
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError> {
        info!(
            "{} (position: {} BTC)",
            crate::render::subject(report),
            report.bitcoin_amount
        );
        for (exchange, alerts) in &report.exchanges {
            for alert in alerts {
                info!(
                    "{}: {} changed by {:.4}% (price {:.2}, total {:.2})",
                    exchange, alert.symbol, alert.percent_change, alert.price, alert.total_value
                );
            }
        }
        Ok(())
    }
}
