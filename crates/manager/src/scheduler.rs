use crate::job::{CycleOutcome, KlineJob};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// # Summary
/// 按固定间隔驱动 `KlineJob`。
///
/// # Invariants
/// - 首次触发立即执行，之后每隔 `every` 触发一次，错过的触发直接丢弃。
/// - 每轮在独立任务中执行，定时器不会被慢速的一轮阻塞；重叠由任务自身跳过。
/// - 轮次任务异常结束（panic）不会终止调度，回收时记录错误。
/// - 收到关闭信号后取消所有在途的轮次。
pub struct Scheduler;

impl Scheduler {
    /// # Summary
    /// 运行调度循环，直到 `shutdown` 完成。
    ///
    /// # Arguments
    /// * `job` - 要驱动的任务。
    /// * `every` - 触发间隔。
    /// * `shutdown` - 关闭信号，例如 `tokio::signal::ctrl_c()`。
    pub async fn run<F>(job: Arc<KlineJob>, every: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = JoinSet::new();
        tokio::pin!(shutdown);

        info!("Scheduler started, running every {:?}", every);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    // 回收已结束的轮次；业务错误已在任务内部记录，这里只剩 panic
                    while let Some(joined) = cycles.try_join_next() {
                        if let Err(e) = joined {
                            error!("Cycle task ended abnormally: {}", e);
                        }
                    }

                    let job = job.clone();
                    cycles.spawn(async move {
                        if let Ok(CycleOutcome::Skipped) = job.run_cycle().await {
                            debug!("Tick skipped");
                        }
                    });
                }
            }
        }

        cycles.shutdown().await;
    }
}
