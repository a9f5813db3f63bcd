//! kawase 的领域核心：实体、错误与端口（trait）定义。
//!
//! 具体的交易所、存储与通知实现位于各自的适配器 crate 中，
//! 它们只依赖本 crate 暴露的抽象。

pub mod common;
pub mod config;
pub mod market;
pub mod notify;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;
