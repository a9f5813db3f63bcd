use tracing::debug;

/// # Summary
/// 安装进程级 rustls 加密提供者（ring）。
///
/// # Logic
/// 1. reqwest 与 lettre 均以 `no-provider` 方式编译，首次建立 TLS 连接前必须安装提供者。
/// 2. 重复调用是安全的，已安装时仅记录调试日志。
pub fn ensure_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}
