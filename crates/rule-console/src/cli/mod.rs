//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `list` / `create` / `delete` / `toggle` / `update` - 规则管理
//! - `evaluate` - 使用 JSON 用户数据评估规则
//! - `combine` - 合并多条规则
//! - `shell` - 交互式会话
//!
//! # 使用示例
//!
//! ```bash
//! # 创建规则
//! rule-console create "age > 30 AND department == 'Sales'"
//!
//! # 评估规则
//! rule-console evaluate 652f1c '{"age": 35, "department": "Sales"}'
//!
//! # 指定服务地址进入交互式会话
//! rule-console --base-url http://192.168.1.10:5001 shell
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
