use thiserror::Error;

/// # Summary
/// 行情抓取域错误枚举，区分传输失败与响应格式异常。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 超时属于 `Network`。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    // 网络层错误（连接失败、超时、非 2xx 状态码）
    #[error("Network error: {0}")]
    Network(String),
    // 响应结构不符合交易所约定，或数据无法归一化
    #[error("Protocol error: {0}")]
    Protocol(String),
    // 本轮所有交易所都无法提供数据
    #[error("All exchanges unavailable: {0}")]
    Unavailable(String),
}
