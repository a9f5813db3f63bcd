use chrono::{DateTime, TimeZone, Utc};
use std::sync::RwLock;

/// K 线开始时间的固定文本格式。
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 通知报告的生成时间必须通过此接口获取。
pub trait TimeProvider: Send + Sync {
    /// 获取当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动设置当前时间。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程安全的读写。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// # Summary
/// 将毫秒时间戳转换为精确到秒的 UTC 时间。
///
/// # Logic
/// 1. 毫秒向下取整到秒（与 `ms // 1000` 一致）。
/// 2. 超出 chrono 可表示范围时返回 None。
pub fn utc_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ms.div_euclid(1000), 0).single()
}

/// 以 `YYYY-MM-DD HH:MM:SS` 形式输出时间。
pub fn format_start_time(time: &DateTime<Utc>) -> String {
    time.format(START_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_from_millis_truncates_to_seconds() {
        let t = utc_from_millis(1_727_043_000_063).unwrap();
        assert_eq!(t.timestamp(), 1_727_043_000);
        assert_eq!(t.timestamp_subsec_millis(), 0);
        assert_eq!(format_start_time(&t), "2024-09-22 22:10:00");
    }

    #[test]
    fn test_fake_clock() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = FakeClockProvider::new(start);
        assert_eq!(clock.now(), start);
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
        clock.set_time(later);
        assert_eq!(clock.now(), later);
    }
}
