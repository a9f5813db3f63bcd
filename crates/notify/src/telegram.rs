use crate::render;
use async_trait::async_trait;
use kawase_core::common::tls::ensure_crypto_provider;
use kawase_core::config::TelegramConfig;
use kawase_core::notify::entity::AlertReport;
use kawase_core::notify::error::NotifyError;
use kawase_core::notify::port::Notifier;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// # Summary
/// 通过 Telegram Bot API 发送提醒报告。
///
/// # Invariants
/// * `bot_token` 必须有效，且机器人能访问 `chat_id`。
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: Client,
}

/// `sendMessage` 请求体。
#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, NotifyError> {
        ensure_crypto_provider();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        Self::new(config.bot_token.clone(), config.chat_id.clone())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// # Summary
    /// 以 Markdown 格式把报告发送到配置的会话。
    ///
    /// # Returns
    /// * 非 2xx 响应返回 `NotifyError::Platform`，附带响应正文。
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", API_BASE, self.bot_token);
        let payload = TelegramMessage {
            chat_id: &self.chat_id,
            text: render::render_markdown(report),
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "Telegram API error {}: {}",
                status, error_text
            )));
        }

        info!("Report sent to Telegram chat {}", self.chat_id);
        Ok(())
    }
}
