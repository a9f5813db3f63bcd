use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use kawase_core::common::Interval;
use kawase_core::common::time::{FakeClockProvider, utc_from_millis};
use kawase_core::config::ThresholdMode;
use kawase_core::market::entity::{Kline, Ohlc};
use kawase_core::market::error::MarketError;
use kawase_core::store::port::KlineStore;
use kawase_core::test_utils::RecordingNotifier;
use kawase_feed::adapter::{Exchange, ExchangeAdapter};
use kawase_feed::hub::ExchangeHub;
use kawase_manager::evaluator::NotificationEvaluator;
use kawase_manager::job::{CycleOutcome, KlineJob};
use kawase_store::kline::SqliteKlineStore;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const SERVER_TIME: i64 = 1_727_043_300_000;

/// 不访问网络的交易所：BTCEUR 几乎不动，其余交易对上涨 0.5%，`failing` 中的交易对返回网络错误。
struct ScriptedExchange {
    name: &'static str,
    symbols: Vec<String>,
    failing: String,
}

struct ScriptedRaw {
    name: &'static str,
    symbol: String,
    start_time_ms: i64,
}

struct Alpha(ScriptedExchange);
struct Beta(ScriptedExchange);

macro_rules! scripted_adapter {
    ($ty:ident, $label:literal) => {
        #[async_trait]
        impl ExchangeAdapter for $ty {
            type Raw = ScriptedRaw;

            const NAME: &'static str = $label;

            fn symbols(&self) -> &[String] {
                &self.0.symbols
            }

            fn interval_code(&self, _interval: Interval) -> &'static str {
                "1m"
            }

            async fn get_server_time(&self, _client: &Client) -> Result<i64, MarketError> {
                Ok(SERVER_TIME)
            }

            async fn fetch_raw_kline(
                &self,
                _client: &Client,
                symbol: &str,
                _interval_code: &str,
                start_time_ms: i64,
            ) -> Result<ScriptedRaw, MarketError> {
                if symbol == self.0.failing {
                    return Err(MarketError::Network(format!("{} timed out", symbol)));
                }
                Ok(ScriptedRaw {
                    name: self.0.name,
                    symbol: symbol.to_string(),
                    start_time_ms,
                })
            }

            fn to_kline(&self, raw: ScriptedRaw) -> Result<Kline, MarketError> {
                let start = utc_from_millis(raw.start_time_ms)
                    .ok_or_else(|| MarketError::Protocol("bad time".to_string()))?;
                let close = if raw.symbol == "BTCEUR" { 100.01 } else { 100.5 };
                Kline::from_raw(
                    raw.name,
                    &raw.symbol,
                    Interval::Minute5,
                    start,
                    Ohlc {
                        open: 100.0,
                        high: 101.0,
                        low: 99.5,
                        close,
                    },
                )
            }
        }
    };
}

scripted_adapter!(Alpha, "Alpha");
scripted_adapter!(Beta, "Beta");

fn exchange(name: &'static str, failing: &str) -> ScriptedExchange {
    ScriptedExchange {
        name,
        symbols: vec!["BTCUSDT".to_string(), "BTCEUR".to_string()],
        failing: failing.to_string(),
    }
}

/// # Summary
/// 两个交易所各两个交易对，其中一次抓取失败：写入 3 根 K 线，报告只包含超过阈值的 2 个交易对。
///
/// # Logic
/// 1. 使用真实的 `ExchangeHub`、SQLite 存储与记录型通知渠道组装任务。
/// 2. 执行一轮并检查摘要、报告与数据库内容。
#[tokio::test]
async fn test_partial_failure_end_to_end() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = Arc::new(SqliteKlineStore::open(tmp_dir.path()).await?);
    let notifier = Arc::new(RecordingNotifier::new());

    let exchanges: Vec<Arc<dyn Exchange>> = vec![
        Arc::new(Alpha(exchange("Alpha", "BTCEUR"))),
        Arc::new(Beta(exchange("Beta", ""))),
    ];
    let hub = ExchangeHub::new(exchanges, Duration::from_secs(5));

    let clock = Arc::new(FakeClockProvider::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
    let job = KlineJob::new(
        Arc::new(hub),
        store.clone(),
        notifier.clone(),
        NotificationEvaluator::new(3.0, 0.03, ThresholdMode::Rising, clock),
        Interval::Minute5,
        Duration::from_secs(10),
    );

    let outcome = job.run_cycle().await?;
    let CycleOutcome::Completed(report) = outcome else {
        anyhow::bail!("cycle unexpectedly skipped");
    };
    assert_eq!(report.fetched, 3);
    assert_eq!(report.alerts, 2);
    assert!(report.notified);

    let reports = notifier.reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].alert_count(), 2);
    assert_eq!(reports[0].exchanges["Alpha"].len(), 1);
    assert_eq!(reports[0].exchanges["Beta"].len(), 1);
    assert_eq!(reports[0].exchanges["Beta"][0].symbol, "BTC-USDT");
    for alert in reports[0].exchanges.values().flatten() {
        assert_eq!(alert.total_value, 3.0 * 100.5);
        assert_eq!(alert.value_delta, 1.5);
    }

    let start = utc_from_millis(SERVER_TIME - 300_000).unwrap();
    let alpha = store.load_klines("Alpha", "BTC-USDT", start, start).await?;
    let beta_eur = store.load_klines("Beta", "BTC-EUR", start, start).await?;
    let beta_usdt = store.load_klines("Beta", "BTC-USDT", start, start).await?;
    let alpha_eur = store.load_klines("Alpha", "BTC-EUR", start, start).await?;
    assert_eq!((alpha.len(), beta_eur.len(), beta_usdt.len(), alpha_eur.len()), (1, 1, 1, 0));
    assert_eq!(alpha[0].percent_change, 0.5);
    Ok(())
}
