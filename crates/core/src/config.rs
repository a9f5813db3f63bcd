use crate::common::Interval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// # Summary
/// 配置校验错误，启动阶段发现即终止进程。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid interval: {0} minutes, expected one of 1, 3, 5, 15, 30")]
    InvalidInterval(u32),
    #[error("Invalid bitcoin amount: {0}, must be a positive number")]
    InvalidAmount(f64),
    #[error("Invalid notification threshold: {0}")]
    InvalidThreshold(f64),
    #[error("No exchange enabled")]
    NoExchanges,
    #[error("Exchange {0} has no symbols configured")]
    EmptySymbols(ExchangeKind),
    #[error("Invalid timeout for {0}: must be greater than zero")]
    InvalidTimeout(&'static str),
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub job: JobConfig,
    pub alert: AlertConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<ExchangeConfig>,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    // 任务执行间隔，同时也是 K 线周期
    pub interval_minutes: u32,
    // 单轮任务的超时时间
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,
}

impl JobConfig {
    pub fn interval(&self) -> Result<Interval, ConfigError> {
        Interval::try_from(self.interval_minutes)
            .map_err(|e| ConfigError::InvalidInterval(e.0))
    }
}

/// # Summary
/// 阈值比较方式。
///
/// # Invariants
/// - `Rising`：仅上涨幅度超过阈值时提醒（`change > threshold`）。
/// - `Absolute`：涨跌幅绝对值超过阈值时提醒（`|change| > threshold`）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    #[default]
    Rising,
    Absolute,
}

impl ThresholdMode {
    /// 给定涨跌幅是否超过阈值。
    pub fn exceeds(self, percent_change: f64, threshold: f64) -> bool {
        match self {
            ThresholdMode::Rising => percent_change > threshold,
            ThresholdMode::Absolute => percent_change.abs() > threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    // 持仓的比特币数量，用于计算价值变化
    pub bitcoin_amount: f64,
    // 提醒阈值（百分比）
    pub notification_threshold: f64,
    #[serde(default)]
    pub threshold_mode: ThresholdMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    // 单个 HTTP 请求的超时时间
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub data_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// 支持的交易所。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Binance,
    Bybit,
    Kucoin,
}

impl std::fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeKind::Binance => write!(f, "Binance"),
            ExchangeKind::Bybit => write!(f, "Bybit"),
            ExchangeKind::Kucoin => write!(f, "Kucoin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub kind: ExchangeKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    // 交易所原生格式的交易对，例如 BTCUSDT / BTC-USDT
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub email: Option<EmailConfig>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

fn default_cycle_timeout_secs() -> u64 {
    60
}

fn default_enabled() -> bool {
    true
}

fn default_exchanges() -> Vec<ExchangeConfig> {
    let exchange = |kind, symbols: [&str; 2]| ExchangeConfig {
        kind,
        enabled: true,
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        exchange(ExchangeKind::Binance, ["BTCUSDT", "ETHBTC"]),
        exchange(ExchangeKind::Bybit, ["BTCUSDT", "ETHBTC"]),
        exchange(ExchangeKind::Kucoin, ["BTC-USDT", "ETH-BTC"]),
    ]
}

impl AppConfig {
    /// # Summary
    /// 启动时校验配置。
    ///
    /// # Logic
    /// 1. 周期必须属于支持集合。
    /// 2. 比特币数量必须为有限正数，阈值必须为有限数。
    /// 3. 单轮超时与 HTTP 请求超时必须大于零。
    /// 4. 至少启用一个交易所，且每个启用的交易所至少配置一个交易对。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回第一个发现的 `ConfigError`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.job.interval()?;

        let amount = self.alert.bitcoin_amount;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ConfigError::InvalidAmount(amount));
        }

        let threshold = self.alert.notification_threshold;
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        // 零超时会让每一轮或每个请求立即失败
        if self.job.cycle_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("job.cycle_timeout_secs"));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("http.request_timeout_secs"));
        }

        let mut enabled = self.enabled_exchanges().peekable();
        if enabled.peek().is_none() {
            return Err(ConfigError::NoExchanges);
        }
        if let Some(empty) = enabled.find(|e| e.symbols.is_empty()) {
            return Err(ConfigError::EmptySymbols(empty.kind));
        }
        Ok(())
    }

    /// 已启用的交易所配置。
    pub fn enabled_exchanges(&self) -> impl Iterator<Item = &ExchangeConfig> {
        self.exchanges.iter().filter(|e| e.enabled)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            job: JobConfig {
                interval_minutes: 5,
                cycle_timeout_secs: default_cycle_timeout_secs(),
            },
            alert: AlertConfig {
                bitcoin_amount: 1.0,
                notification_threshold: 0.03,
                threshold_mode: ThresholdMode::Rising,
            },
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            exchanges: default_exchanges(),
            notify: NotifyConfig::default(),
        }
    }
}
