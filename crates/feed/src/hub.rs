use crate::adapter::Exchange;
use crate::binance::BinanceAdapter;
use crate::bybit::BybitAdapter;
use crate::kucoin::KucoinAdapter;
use async_trait::async_trait;
use futures::future::join_all;
use kawase_core::common::Interval;
use kawase_core::common::tls::ensure_crypto_provider;
use kawase_core::config::{AppConfig, ExchangeConfig, ExchangeKind};
use kawase_core::market::entity::Kline;
use kawase_core::market::error::MarketError;
use kawase_core::market::port::KlineFeed;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// # Summary
/// 根据配置构造交易所适配器。
pub fn build_exchange(config: &ExchangeConfig) -> Arc<dyn Exchange> {
    let symbols = config.symbols.clone();
    match config.kind {
        ExchangeKind::Binance => Arc::new(BinanceAdapter::new(symbols)),
        ExchangeKind::Bybit => Arc::new(BybitAdapter::new(symbols)),
        ExchangeKind::Kucoin => Arc::new(KucoinAdapter::new(symbols)),
    }
}

/// # Summary
/// 交易所抓取中心：并发驱动所有交易所，汇总本轮的 K 线。
///
/// # Invariants
/// - 每轮创建一个 HTTP 客户端，所有请求共享其连接池，本轮结束即释放。
/// - 单个交易对失败只记录日志并省略；服务器时间失败或全部交易对失败，则该交易所本轮视为失败。
/// - 所有交易所都失败时整轮返回 `Unavailable`。
/// - 所有请求都在同一个 Future 内并发执行，丢弃该 Future 即取消全部请求。
pub struct ExchangeHub {
    exchanges: Vec<Arc<dyn Exchange>>,
    request_timeout: Duration,
}

impl ExchangeHub {
    pub fn new(exchanges: Vec<Arc<dyn Exchange>>, request_timeout: Duration) -> Self {
        Self {
            exchanges,
            request_timeout,
        }
    }

    /// 使用配置中已启用的交易所构造抓取中心。
    pub fn from_config(config: &AppConfig) -> Self {
        let exchanges = config.enabled_exchanges().map(build_exchange).collect();
        Self::new(
            exchanges,
            Duration::from_secs(config.http.request_timeout_secs),
        )
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    fn build_client(&self) -> Result<Client, MarketError> {
        ensure_crypto_provider();
        Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))
    }
}

/// # Summary
/// 抓取单个交易所的所有交易对。
///
/// # Logic
/// 1. 查询服务器时间作为本轮基准，失败则整个交易所返回错误。
/// 2. 目标 K 线开始时间为 `server_time - interval`。
/// 3. 并发抓取所有交易对，失败的交易对记录日志后丢弃。
/// 4. 配置了交易对却一根 K 线都没拿到时，整个交易所返回 `Unavailable`。
async fn fetch_exchange(
    client: &Client,
    exchange: &dyn Exchange,
    interval: Interval,
) -> Result<Vec<Kline>, MarketError> {
    let server_time = exchange.server_time(client).await?;
    let start_time_ms = server_time - interval.as_millis();

    let fetches = exchange.symbols().iter().map(|symbol| async move {
        let result = exchange
            .fetch_kline(client, symbol, interval, start_time_ms)
            .await;
        (symbol, result)
    });

    let mut klines = Vec::new();
    for (symbol, result) in join_all(fetches).await {
        match result {
            Ok(kline) => klines.push(kline),
            Err(e) => warn!("{}: dropping {} for this cycle: {}", exchange.name(), symbol, e),
        }
    }
    debug!(
        "{}: fetched {}/{} symbols",
        exchange.name(),
        klines.len(),
        exchange.symbols().len()
    );
    if klines.is_empty() && !exchange.symbols().is_empty() {
        return Err(MarketError::Unavailable(format!(
            "{}: all {} symbols failed",
            exchange.name(),
            exchange.symbols().len()
        )));
    }
    Ok(klines)
}

#[async_trait]
impl KlineFeed for ExchangeHub {
    /// # Summary
    /// 并发抓取所有交易所的最新 K 线。
    ///
    /// # Logic
    /// 1. 构造本轮共享的 HTTP 客户端。
    /// 2. 并发执行每个交易所的抓取（交易所内部再按交易对并发）。
    /// 3. 汇总成功的结果；若所有交易所都失败（服务器时间失败或没有任何交易对成功），返回 `Unavailable`。
    ///
    /// # Arguments
    /// * `interval`: K 线周期。
    ///
    /// # Returns
    /// 成功返回本轮 K 线（顺序无意义）。
    async fn fetch_klines(&self, interval: Interval) -> Result<Vec<Kline>, MarketError> {
        let client = self.build_client()?;

        let results = join_all(
            self.exchanges
                .iter()
                .map(|exchange| fetch_exchange(&client, exchange.as_ref(), interval)),
        )
        .await;

        let mut klines = Vec::new();
        let mut failed = Vec::new();
        for (exchange, result) in self.exchanges.iter().zip(results) {
            match result {
                Ok(batch) => klines.extend(batch),
                Err(e) => {
                    warn!("{}: no klines this cycle, skipping exchange: {}", exchange.name(), e);
                    failed.push(exchange.name().to_string());
                }
            }
        }

        if !self.exchanges.is_empty() && failed.len() == self.exchanges.len() {
            return Err(MarketError::Unavailable(failed.join(", ")));
        }

        info!(
            "Fetched {} klines from {} exchanges ({} failed)",
            klines.len(),
            self.exchanges.len() - failed.len(),
            failed.len()
        );
        Ok(klines)
    }
}
