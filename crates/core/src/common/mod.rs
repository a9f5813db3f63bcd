pub mod pair;
pub mod time;
pub mod tls;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// 不在支持集合 {1,3,5,15,30} 内的周期分钟数。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unsupported interval: {0} minutes")]
pub struct UnsupportedInterval(pub u32);

/// 交易所周期代码解析失败。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalCodeError {
    #[error("Interval code without minutes: {0:?}")]
    NoMinutes(String),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedInterval),
}

/// # Summary
/// K 线周期枚举，对应系统支持的固定分钟数集合。
///
/// # Invariants
/// - 只能取 1、3、5、15、30 分钟之一，序列化为分钟整数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u32", into = "u32")]
pub enum Interval {
    // 1分钟
    Minute1,
    // 3分钟
    Minute3,
    // 5分钟
    Minute5,
    // 15分钟
    Minute15,
    // 30分钟
    Minute30,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::Minute1,
        Interval::Minute3,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
    ];

    /// 周期长度（分钟）。
    pub fn minutes(self) -> u32 {
        match self {
            Interval::Minute1 => 1,
            Interval::Minute3 => 3,
            Interval::Minute5 => 5,
            Interval::Minute15 => 15,
            Interval::Minute30 => 30,
        }
    }

    /// 周期长度（毫秒）。
    pub fn as_millis(self) -> i64 {
        i64::from(self.minutes()) * 60_000
    }

    /// # Summary
    /// 从交易所的周期代码中解析周期，例如 `"15m"`、`"15"`、`"15min"`。
    ///
    /// # Logic
    /// 1. 只保留代码中的数字字符。
    /// 2. 解析为分钟数并校验是否属于支持集合。
    ///
    /// # Returns
    /// 成功返回 Interval；代码中没有数字时返回 `NoMinutes`，分钟数不受支持时返回 `Unsupported`。
    pub fn from_code(code: &str) -> Result<Self, IntervalCodeError> {
        let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
        let minutes: u32 = digits
            .parse()
            .map_err(|_| IntervalCodeError::NoMinutes(code.to_string()))?;
        Ok(Interval::try_from(minutes)?)
    }
}

impl TryFrom<u32> for Interval {
    type Error = UnsupportedInterval;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            1 => Ok(Interval::Minute1),
            3 => Ok(Interval::Minute3),
            5 => Ok(Interval::Minute5),
            15 => Ok(Interval::Minute15),
            30 => Ok(Interval::Minute30),
            other => Err(UnsupportedInterval(other)),
        }
    }
}

impl From<Interval> for u32 {
    fn from(interval: Interval) -> Self {
        interval.minutes()
    }
}

impl FromStr for Interval {
    type Err = IntervalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::from_code(s.trim())
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}
