//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑。
//! 启动时加载规则集合（按配置的重试策略），之后把子命令转化为 RuleStore 调用。

use std::sync::Arc;

use anyhow::{Context, Result};
use console_shared::config::AppConfig;
use console_shared::retry::{RetryPolicy, retry_with_policy};
use rule_client::{ClientError, EvaluationController, HttpRuleApi, RuleId, RuleStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::cli::Commands;
use crate::render::{render_combined, render_outcome, render_rules, status_label};
use crate::shell::{Shell, confirm};

/// 把客户端错误转换为带用户提示的 anyhow 错误
fn notice(err: ClientError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

/// 命令执行器
///
/// 持有共享的 RuleStore，作为 CLI 与规则客户端之间的桥梁。
pub struct CommandRunner {
    store: Arc<RuleStore>,
}

impl CommandRunner {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    /// 按配置创建 HTTP 客户端与规则存储，并完成首次加载
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let api = HttpRuleApi::new(&config.api).map_err(notice)?;
        info!(base_url = %api.base_url(), "连接规则服务");

        let store = Arc::new(RuleStore::with_config(Arc::new(api), &config.sync));
        let runner = Self::new(store);
        runner.load(&RetryPolicy::from(&config.retry)).await?;
        Ok(runner)
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// 加载规则集合，瞬时故障按策略重试
    pub async fn load(&self, policy: &RetryPolicy) -> Result<usize> {
        let store = &self.store;
        retry_with_policy(policy, "load_rules", ClientError::is_retryable, move || {
            store.load()
        })
        .await
        .map_err(notice)
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::List => self.run_list(),
            Commands::Create { rule } => self.run_create(&rule).await,
            Commands::Delete { id, yes } => self.run_delete(RuleId::from(id), yes).await,
            Commands::Toggle { id } => self.run_toggle(RuleId::from(id)).await,
            Commands::Update { id, rule } => self.run_update(RuleId::from(id), &rule).await,
            Commands::Evaluate { id, data } => self.run_evaluate(RuleId::from(id), &data).await,
            Commands::Combine { ids } => {
                let ids: Vec<RuleId> = ids.into_iter().map(RuleId::from).collect();
                self.run_combine(&ids).await
            }
            Commands::Shell => self.run_shell().await,
        }
    }

    fn run_list(&self) -> Result<()> {
        println!("{}", render_rules(&self.store.rules(), None));
        Ok(())
    }

    async fn run_create(&self, rule: &str) -> Result<()> {
        let created = self.store.create(rule).await.map_err(notice)?;
        println!("已添加规则: {}", created.id);
        Ok(())
    }

    /// 执行 delete 命令
    ///
    /// 未指定 `--yes` 时先在终端确认。
    async fn run_delete(&self, rule_id: RuleId, yes: bool) -> Result<()> {
        if !yes {
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let mut output = tokio::io::stdout();
            let prompt = format!("确认删除规则 {rule_id}? [y/N] ");
            let confirmed = confirm(&mut input, &mut output, &prompt)
                .await
                .context("读取确认输入失败")?;
            if !confirmed {
                println!("已取消删除");
                return Ok(());
            }
        }

        self.store.delete(&rule_id).await.map_err(notice)?;
        println!("已删除规则: {rule_id}");
        Ok(())
    }

    async fn run_toggle(&self, rule_id: RuleId) -> Result<()> {
        let status = self.store.toggle_status(&rule_id).await.map_err(notice)?;
        println!("规则 {rule_id} 当前状态: {}", status_label(status));
        Ok(())
    }

    async fn run_update(&self, rule_id: RuleId, rule: &str) -> Result<()> {
        self.store.update(&rule_id, rule).await.map_err(notice)?;
        println!("已更新规则: {rule_id}");
        Ok(())
    }

    async fn run_evaluate(&self, rule_id: RuleId, data: &str) -> Result<()> {
        let mut controller = EvaluationController::new(self.store.clone());
        let outcome = controller
            .evaluate(Some(&rule_id), data)
            .await
            .map_err(notice)?;
        println!("{}", render_outcome(&outcome));
        Ok(())
    }

    async fn run_combine(&self, rule_ids: &[RuleId]) -> Result<()> {
        let ast = self.store.combine(rule_ids).await.map_err(notice)?;
        println!("{}", render_combined(&ast));
        Ok(())
    }

    async fn run_shell(&self) -> Result<()> {
        let mut shell = Shell::new(
            self.store.clone(),
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        );
        shell.run().await.context("交互式会话异常退出")
    }
}
