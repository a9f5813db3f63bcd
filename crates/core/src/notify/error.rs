use thiserror::Error;

/// # Summary
/// 通知投递错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 网络连接或 SMTP 传输错误
    #[error("Network error: {0}")]
    Network(String),

    /// 渠道配置错误 (如邮箱地址非法)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 推送平台返回的错误 (如 Telegram API Error)
    #[error("Platform error: {0}")]
    Platform(String),

    /// 报告渲染失败
    #[error("Render error: {0}")]
    Render(String),
}
