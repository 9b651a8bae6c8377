//! 规则控制台
//!
//! 规则同步客户端的命令行前端：子命令与交互式会话。

pub mod cli;
pub mod render;
pub mod shell;

/// 服务名，用于加载 config/{service}.toml
pub const SERVICE_NAME: &str = "rule-console";
