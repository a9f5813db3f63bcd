mod logging;
mod settings;

use kawase_core::common::time::RealTimeProvider;
use kawase_core::config::NotifyConfig;
use kawase_core::notify::error::NotifyError;
use kawase_core::notify::port::Notifier;
use kawase_feed::hub::ExchangeHub;
use kawase_manager::evaluator::NotificationEvaluator;
use kawase_manager::job::KlineJob;
use kawase_manager::scheduler::Scheduler;
use kawase_notify::broadcast::BroadcastNotifier;
use kawase_notify::email::EmailNotifier;
use kawase_notify::log::LogNotifier;
use kawase_notify::telegram::TelegramNotifier;
use kawase_store::kline::SqliteKlineStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 根据配置组装通知渠道；未配置任何外部渠道时只写日志。
fn build_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();
    if let Some(email) = &config.email {
        channels.push(Arc::new(EmailNotifier::from_config(email)?));
        info!("Email notifications enabled");
    }
    if let Some(telegram) = &config.telegram {
        channels.push(Arc::new(TelegramNotifier::from_config(telegram)?));
        info!("Telegram notifications enabled");
    }

    if channels.is_empty() {
        info!("No notification channel configured, alerts go to the log only");
        return Ok(Arc::new(LogNotifier));
    }
    Ok(Arc::new(BroadcastNotifier::new(channels)))
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 KlineJob。
///
/// # Logic
/// 1. 初始化全局日志。
/// 2. 加载并校验配置，非法配置直接退出。
/// 3. 实例化基础设施层（交易所抓取中心、SQLite 存储、通知渠道）。
/// 4. 构造任务并交给调度器，直到收到 Ctrl-C。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 初始化日志
    let log_dir = std::env::var("KAWASE_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let _log_guard = logging::init(&log_dir)?;
    info!("Kawase starting...");

    // 2. 配置
    let config = settings::load().inspect_err(|e| error!("Invalid configuration: {}", e))?;
    let interval = config.job.interval()?;

    // 3. 基础设施层
    let hub = ExchangeHub::from_config(&config);
    info!("Polling {} exchanges every {}", hub.exchange_count(), interval);
    let store = SqliteKlineStore::open(Path::new(&config.database.data_dir)).await?;
    let notifier = build_notifier(&config.notify)?;
    let evaluator = NotificationEvaluator::from_config(&config.alert, Arc::new(RealTimeProvider));

    // 4. 任务与调度
    let job = Arc::new(KlineJob::new(
        Arc::new(hub),
        Arc::new(store),
        notifier,
        evaluator,
        interval,
        Duration::from_secs(config.job.cycle_timeout_secs),
    ));
    let every = Duration::from_secs(u64::from(interval.minutes()) * 60);

    Scheduler::run(job, every, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await;

    info!("Shutdown complete");
    Ok(())
}
