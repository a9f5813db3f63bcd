//! 提醒报告的渲染与投递渠道。

pub mod broadcast;
pub mod email;
pub mod log;
pub mod render;
pub mod telegram;
