//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。
//! 每个子命令执行前都会先从远程服务加载规则集合。

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console_shared::config::AppConfig;

/// 规则控制台命令行工具
///
/// 管理远程规则服务中的规则并发起评估。
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "rule-console")]
#[command(version, about = "规则同步与评估控制台")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 规则服务地址（覆盖配置文件中的 api.base_url）
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// 配置文件目录（默认读取 CONFIG_DIR 或 ./config）
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// 子命令枚举
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// 列出全部规则
    List,

    /// 创建规则
    Create {
        /// 规则内容，如 "age > 30 AND department == 'Sales'"
        rule: String,
    },

    /// 删除规则
    Delete {
        /// 规则 ID
        id: String,

        /// 跳过确认提示
        #[arg(short, long)]
        yes: bool,
    },

    /// 切换规则启用状态
    Toggle {
        /// 规则 ID
        id: String,
    },

    /// 更新规则内容
    Update {
        /// 规则 ID
        id: String,

        /// 新的规则内容
        rule: String,
    },

    /// 使用 JSON 用户数据评估规则
    Evaluate {
        /// 规则 ID
        id: String,

        /// 用户数据（JSON），如 '{"age": 35, "department": "Sales"}'
        data: String,
    },

    /// 合并多条规则并输出合并后的 AST
    Combine {
        /// 规则 ID 列表
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// 进入交互式会话
    Shell,
}

// ============================================================================
// 单元测试
// ============================================================================
