use config::{Config, Environment, File};
use kawase_core::config::{AppConfig, ConfigError};

/// 配置文件默认位置（不含扩展名），可通过 `KAWASE_CONFIG` 覆盖。
pub const DEFAULT_CONFIG_PATH: &str = "config/kawase";
const ENV_PREFIX: &str = "KAWASE";

/// # Summary
/// 加载并校验应用配置。
///
/// # Logic
/// 1. 写入内置默认值。
/// 2. 叠加配置文件（可选，缺失时使用默认值）。
/// 3. 叠加 `KAWASE__SECTION__KEY` 形式的环境变量。
/// 4. 反序列化并校验。
pub fn load() -> Result<AppConfig, ConfigError> {
    let path = std::env::var("KAWASE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(&path)
}

pub fn load_from(path: &str) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();
    let settings = Config::builder()
        .set_default("job.interval_minutes", defaults.job.interval_minutes)
        .and_then(|b| b.set_default("job.cycle_timeout_secs", defaults.job.cycle_timeout_secs))
        .and_then(|b| b.set_default("alert.bitcoin_amount", defaults.alert.bitcoin_amount))
        .and_then(|b| {
            b.set_default(
                "alert.notification_threshold",
                defaults.alert.notification_threshold,
            )
        })
        .map_err(|e| ConfigError::Load(e.to_string()))?
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let config: AppConfig = settings
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kawase_core::config::{ExchangeKind, ThresholdMode};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        let config = load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.job.interval_minutes, 5);
        assert_eq!(config.alert.notification_threshold, 0.03);
        assert_eq!(config.exchanges.len(), 3);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kawase.toml");
        fs::write(
            &path,
            r#"
[job]
interval_minutes = 15

[alert]
bitcoin_amount = 2.5
notification_threshold = 0.5
threshold_mode = "absolute"

[database]
data_dir = "/var/lib/kawase"

[[exchanges]]
kind = "bybit"
symbols = ["BTCUSDT"]

[notify.telegram]
bot_token = "token"
chat_id = "42"
"#,
        )
        .unwrap();

        let config = load_from(dir.path().join("kawase").to_str().unwrap()).unwrap();
        assert_eq!(config.job.interval_minutes, 15);
        assert_eq!(config.job.cycle_timeout_secs, 60);
        assert_eq!(config.alert.threshold_mode, ThresholdMode::Absolute);
        assert_eq!(config.database.data_dir, "/var/lib/kawase");
        assert_eq!(config.exchanges.len(), 1);
        assert_eq!(config.exchanges[0].kind, ExchangeKind::Bybit);
        assert_eq!(config.notify.telegram.unwrap().chat_id, "42");
        assert!(config.notify.email.is_none());
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kawase.toml");
        fs::write(&path, "[job]\ninterval_minutes = 7\n").unwrap();

        let result = load_from(dir.path().join("kawase").to_str().unwrap());
        assert_eq!(result.unwrap_err(), ConfigError::InvalidInterval(7));
    }
}
