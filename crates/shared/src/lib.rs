//! 共享库
//!
//! 包含客户端各 crate 共用的配置加载、日志初始化与调用方重试策略。

pub mod config;
pub mod observability;
pub mod retry;
