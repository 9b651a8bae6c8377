//! Rule Console CLI
//!
//! 规则控制台的命令行入口点。

use anyhow::Context;
use clap::Parser;
use console_shared::config::AppConfig;
use console_shared::observability::init_logging;
use rule_console::SERVICE_NAME;
use rule_console::cli::{Cli, CommandRunner};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_with_dir(SERVICE_NAME, cli.config_dir.as_deref())
        .context("加载配置失败")?;
    cli.apply_overrides(&mut config);

    // 日志输出到 stderr，stdout 只保留命令结果
    init_logging(&config.observability)?;
    debug!(
        environment = %config.environment,
        base_url = %config.api.base_url,
        guard = config.sync.guard_concurrent_mutations,
        "配置已加载"
    );

    let runner = CommandRunner::connect(&config).await?;
    runner.run(cli.command).await
}
