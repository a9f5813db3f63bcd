use chrono::{DateTime, Duration, TimeZone, Utc};
use kawase_core::common::Interval;
use kawase_core::market::entity::{Kline, Ohlc};
use kawase_core::store::port::KlineStore;
use kawase_store::kline::{DB_FILE, SqliteKlineStore};
use tempfile::tempdir;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn kline(exchange: &str, symbol: &str, minutes_after: i64, close: f64) -> Kline {
    Kline::from_raw(
        exchange,
        symbol,
        Interval::Minute5,
        base_time() + Duration::minutes(minutes_after),
        Ohlc {
            open: 100.0,
            high: close.max(101.0),
            low: 99.0,
            close,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_and_load_round_trip() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = SqliteKlineStore::open(tmp_dir.path()).await?;
    assert!(tmp_dir.path().join(DB_FILE).exists());

    let batch = vec![
        kline("Binance", "BTCUSDT", 5, 100.5),
        kline("Binance", "BTCUSDT", 0, 100.2),
        kline("Bybit", "BTCUSDT", 0, 100.7),
    ];
    store.save_klines(&batch).await?;

    let loaded = store
        .load_klines("Binance", "BTC-USDT", base_time(), base_time() + Duration::hours(1))
        .await?;

    assert_eq!(loaded.len(), 2);
    // 按开始时间升序
    assert_eq!(loaded[0], batch[1]);
    assert_eq!(loaded[1], batch[0]);
    assert_eq!(loaded[0].interval, Interval::Minute5);
    Ok(())
}

#[tokio::test]
async fn test_load_respects_time_range() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = SqliteKlineStore::open(tmp_dir.path()).await?;

    store
        .save_klines(&[
            kline("Kucoin", "BTC-USDT", 0, 100.1),
            kline("Kucoin", "BTC-USDT", 30, 100.2),
            kline("Kucoin", "BTC-USDT", 90, 100.3),
        ])
        .await?;

    let loaded = store
        .load_klines("Kucoin", "BTC-USDT", base_time() + Duration::minutes(30), base_time() + Duration::hours(1))
        .await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].close_price, 100.2);
    Ok(())
}

/// # Summary
/// 存储只追加：同一根 K 线保存两次会得到两行。
#[tokio::test]
async fn test_save_is_append_only() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = SqliteKlineStore::open(tmp_dir.path()).await?;
    let k = kline("Binance", "ETHBTC", 0, 100.0);

    store.save_klines(std::slice::from_ref(&k)).await?;
    store.save_klines(std::slice::from_ref(&k)).await?;
    store.save_klines(&[]).await?;

    let loaded = store
        .load_klines("Binance", "BTC-ETH", base_time(), base_time())
        .await?;
    assert_eq!(loaded.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_reopen_keeps_data() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let data_dir = tmp_dir.path().join("nested").join("data");

    {
        let store = SqliteKlineStore::open(&data_dir).await?;
        store.save_klines(&[kline("Bybit", "BTCUSDT", 0, 100.4)]).await?;
    }

    let store = SqliteKlineStore::open(&data_dir).await?;
    let loaded = store
        .load_klines("Bybit", "BTC-USDT", base_time(), base_time())
        .await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(store.db_path(), data_dir.join(DB_FILE));
    Ok(())
}
