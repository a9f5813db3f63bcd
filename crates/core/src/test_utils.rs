//! 测试用的端口实现：内存存储、记录型通知渠道与固定数据源。

use crate::common::Interval;
use crate::market::entity::Kline;
use crate::market::error::MarketError;
use crate::market::port::KlineFeed;
use crate::notify::entity::AlertReport;
use crate::notify::error::NotifyError;
use crate::notify::port::Notifier;
use crate::store::error::StoreError;
use crate::store::port::KlineStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// 基于内存的 K 线存储。
#[derive(Default)]
pub struct MemKlineStore {
    klines: Mutex<Vec<Kline>>,
    fail: AtomicBool,
}

impl MemKlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让后续写入全部失败。
    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<Kline> {
        self.klines.lock().await.clone()
    }
}

#[async_trait]
impl KlineStore for MemKlineStore {
    async fn save_klines(&self, klines: &[Kline]) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Database("mock write failure".to_string()));
        }
        self.klines.lock().await.extend_from_slice(klines);
        Ok(())
    }

    async fn load_klines(
        &self,
        exchange_name: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, StoreError> {
        let mut found: Vec<Kline> = self
            .klines
            .lock()
            .await
            .iter()
            .filter(|k| {
                k.exchange_name == exchange_name
                    && k.symbol == symbol
                    && k.start_time >= start
                    && k.start_time <= end
            })
            .cloned()
            .collect();
        found.sort_by_key(|k| k.start_time);
        Ok(found)
    }
}

/// 记录收到的所有报告，可配置为投递失败。
#[derive(Default)]
pub struct RecordingNotifier {
    reports: Mutex<Vec<AlertReport>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub async fn reports(&self) -> Vec<AlertReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Network("mock delivery failure".to_string()));
        }
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

/// 返回预设结果的数据源，可选延迟以模拟慢请求。
pub struct StaticFeed {
    result: Result<Vec<Kline>, MarketError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticFeed {
    pub fn new(klines: Vec<Kline>) -> Self {
        Self {
            result: Ok(klines),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: MarketError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 被调用的次数。
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KlineFeed for StaticFeed {
    async fn fetch_klines(&self, _interval: Interval) -> Result<Vec<Kline>, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
