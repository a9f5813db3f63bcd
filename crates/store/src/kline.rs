use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kawase_core::common::Interval;
use kawase_core::market::entity::Kline;
use kawase_core::store::error::StoreError;
use kawase_core::store::port::KlineStore;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DB_FILE: &str = "klines.db";

type KlineRow = (String, String, i64, DateTime<Utc>, f64, f64, f64, f64, f64);

/// KlineStore 的 SQLite 实现。
///
/// # Summary
/// 所有交易所与交易对共用一个 `klines` 表，只追加写入。
///
/// # Invariants
/// * 数据库文件位于 `<data_dir>/klines.db`。
/// * 每批写入在同一个事务内完成。
pub struct SqliteKlineStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteKlineStore {
    /// 打开（必要时创建）K 线数据库。
    ///
    /// # Logic
    /// 1. 确保数据目录存在。
    /// 2. 配置 SQLite 连接选项，开启 `create_if_missing`。
    /// 3. 建表与索引。
    ///
    /// # Arguments
    /// * `data_dir` - 数据根目录。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例或错误。
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir).map_err(|e| {
                StoreError::InitError(format!("Cannot create {}: {}", data_dir.display(), e))
            })?;
        }
        let db_path = data_dir.join(DB_FILE);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS klines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exchange TEXT NOT NULL,
                symbol TEXT NOT NULL,
                interval_minutes INTEGER NOT NULL,
                start_time DATETIME NOT NULL,
                open_price REAL NOT NULL,
                close_price REAL NOT NULL,
                min_price REAL NOT NULL,
                max_price REAL NOT NULL,
                percent_change REAL NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_klines_pair_time ON klines (exchange, symbol, start_time);",
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!("Kline store ready at {}", db_path.display());
        Ok(Self { pool, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn row_to_kline(row: KlineRow) -> Result<Kline, StoreError> {
    let (exchange_name, symbol, minutes, start_time, open, close, min, max, change) = row;
    let interval = u32::try_from(minutes)
        .ok()
        .and_then(|m| Interval::try_from(m).ok())
        .ok_or_else(|| StoreError::Database(format!("Unsupported interval in row: {}", minutes)))?;

    Ok(Kline {
        exchange_name,
        symbol,
        interval,
        start_time,
        open_price: open,
        close_price: close,
        min_price: min,
        max_price: max,
        percent_change: change,
    })
}

#[async_trait]
impl KlineStore for SqliteKlineStore {
    /// # Summary
    /// 在一个事务内追加一批 K 线。
    ///
    /// # Logic
    /// 1. 空批次直接返回。
    /// 2. 开启事务，逐条 `INSERT`，任何一条失败则整批回滚。
    async fn save_klines(&self, klines: &[Kline]) -> Result<(), StoreError> {
        if klines.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for kline in klines {
            sqlx::query(
                r#"
                INSERT INTO klines (exchange, symbol, interval_minutes, start_time, open_price, close_price, min_price, max_price, percent_change)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&kline.exchange_name)
            .bind(&kline.symbol)
            .bind(i64::from(kline.interval_minutes()))
            .bind(kline.start_time)
            .bind(kline.open_price)
            .bind(kline.close_price)
            .bind(kline.min_price)
            .bind(kline.max_price)
            .bind(kline.percent_change)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!("Persisted {} klines", klines.len());
        Ok(())
    }

    async fn load_klines(
        &self,
        exchange_name: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, StoreError> {
        let records = sqlx::query_as::<_, KlineRow>(
            r#"
            SELECT exchange, symbol, interval_minutes, start_time, open_price, close_price, min_price, max_price, percent_change
            FROM klines
            WHERE exchange = ? AND symbol = ? AND start_time >= ? AND start_time <= ?
            ORDER BY start_time ASC, id ASC
            "#,
        )
        .bind(exchange_name)
        .bind(symbol)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        records.into_iter().map(row_to_kline).collect()
    }
}
