//! 交易所 K 线适配器与并发抓取中心。

pub mod adapter;
pub mod binance;
pub mod bybit;
pub mod hub;
pub mod kucoin;
