use crate::error::CycleError;
use crate::evaluator::NotificationEvaluator;
use kawase_core::common::Interval;
use kawase_core::market::port::KlineFeed;
use kawase_core::notify::port::Notifier;
use kawase_core::store::port::KlineStore;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// 任务当前所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Fetching,
    Evaluating,
    Persisting,
}

/// 一轮完成的任务摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    // 本轮抓取到的 K 线数量
    pub fetched: usize,
    // 命中阈值的交易对数量
    pub alerts: usize,
    // 报告是否投递成功
    pub notified: bool,
    // 报告投递是否失败
    pub notify_failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// 上一轮仍在执行，本次触发被跳过
    Skipped,
}

/// # Summary
/// 周期性任务：抓取 -> 评估并通知 -> 持久化。
///
/// # Invariants
/// - 同一时刻最多只有一轮在执行，重叠的触发直接跳过。
/// - 整轮在超时保护下执行；超时即丢弃整轮 Future，在途请求全部取消，不写入任何数据。
/// - 通知失败只记录在摘要中，不影响持久化。
pub struct KlineJob {
    feed: Arc<dyn KlineFeed>,
    store: Arc<dyn KlineStore>,
    notifier: Arc<dyn Notifier>,
    evaluator: NotificationEvaluator,
    interval: Interval,
    cycle_timeout: Duration,
    state: RwLock<JobState>,
    running: Mutex<()>,
}

impl KlineJob {
    pub fn new(
        feed: Arc<dyn KlineFeed>,
        store: Arc<dyn KlineStore>,
        notifier: Arc<dyn Notifier>,
        evaluator: NotificationEvaluator,
        interval: Interval,
        cycle_timeout: Duration,
    ) -> Self {
        Self {
            feed,
            store,
            notifier,
            evaluator,
            interval,
            cycle_timeout,
            state: RwLock::new(JobState::Idle),
            running: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn state(&self) -> JobState {
        *self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: JobState) {
        let mut current = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = state;
    }

    /// # Summary
    /// 执行一轮任务。
    ///
    /// # Logic
    /// 1. 非阻塞获取运行锁，失败说明上一轮未结束，返回 `Skipped`。
    /// 2. 在超时保护下执行抓取、通知与持久化。
    /// 3. 无论结果如何都回到 `Idle`。
    ///
    /// # Returns
    /// * `Ok(CycleOutcome)` - 完成或跳过。
    /// * `Err(CycleError)` - 抓取全部失败、超时或持久化失败。
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous {} cycle still running, skipping this tick", self.interval);
            return Ok(CycleOutcome::Skipped);
        };

        let result = tokio::time::timeout(self.cycle_timeout, self.cycle()).await;
        self.set_state(JobState::Idle);

        match result {
            Ok(Ok(report)) => {
                info!(
                    "Cycle done: {} klines, {} alerts, notified={}",
                    report.fetched, report.alerts, report.notified
                );
                Ok(CycleOutcome::Completed(report))
            }
            Ok(Err(e)) => {
                error!("Cycle failed: {}", e);
                Err(e)
            }
            Err(_) => {
                error!("Cycle timed out after {:?}, nothing persisted", self.cycle_timeout);
                Err(CycleError::Timeout(self.cycle_timeout))
            }
        }
    }

    async fn cycle(&self) -> Result<CycleReport, CycleError> {
        self.set_state(JobState::Fetching);
        let klines = self.feed.fetch_klines(self.interval).await?;

        self.set_state(JobState::Evaluating);
        let mut report = CycleReport {
            fetched: klines.len(),
            alerts: 0,
            notified: false,
            notify_failed: false,
        };
        if let Some(alert_report) = self.evaluator.evaluate(&klines, self.interval) {
            report.alerts = alert_report.alert_count();
            match self.notifier.notify(&alert_report).await {
                Ok(()) => report.notified = true,
                Err(e) => {
                    warn!("Notification delivery failed: {}", e);
                    report.notify_failed = true;
                }
            }
        }

        self.set_state(JobState::Persisting);
        self.store.save_klines(&klines).await?;

        Ok(report)
    }
}
