//! 交互式会话
//!
//! 逐行读取命令并驱动 RuleStore、EditSession 与 EvaluationController。
//! 规则集合发布新快照后自动重新渲染列表。

use std::io;
use std::sync::Arc;

use rule_client::{
    ClientError, EditSession, EvaluationController, RuleId, RuleSnapshot, RuleStore,
};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::watch;
use tracing::debug;

use crate::render::{render_combined, render_notice, render_outcome, render_rules, status_label};

pub const HELP_TEXT: &str = "\
可用命令:
  list                 列出全部规则
  add <规则>           创建规则
  edit <ID>            开始编辑规则
  draft <规则>         修改编辑中的草稿
  save                 保存草稿
  cancel               放弃编辑
  toggle <ID>          切换启用状态
  delete <ID>          删除规则（需确认）
  select <ID>          选择要评估的规则
  data <JSON>          设置评估用户数据
  eval                 评估所选规则
  combine <ID>...      合并多条规则
  reload               重新加载规则列表
  help                 显示帮助
  quit                 退出";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("未知命令: {0}，输入 help 查看可用命令")]
    UnknownCommand(String),

    #[error("命令 {command} 缺少参数: {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// 会话命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    List,
    Add(String),
    Edit(RuleId),
    Draft(String),
    Save,
    Cancel,
    Toggle(RuleId),
    Delete(RuleId),
    Select(RuleId),
    Data(String),
    Eval,
    Combine(Vec<RuleId>),
    Reload,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, ShellError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "" => Self::Empty,
            "list" | "ls" => Self::List,
            "add" => Self::Add(required("add", "规则内容", rest)?.to_string()),
            "edit" => Self::Edit(RuleId::from(required("edit", "规则 ID", rest)?)),
            // 允许空草稿，保存时再给出校验提示
            "draft" => Self::Draft(rest.to_string()),
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "toggle" => Self::Toggle(RuleId::from(required("toggle", "规则 ID", rest)?)),
            "delete" | "rm" => Self::Delete(RuleId::from(required("delete", "规则 ID", rest)?)),
            "select" => Self::Select(RuleId::from(required("select", "规则 ID", rest)?)),
            "data" => Self::Data(rest.to_string()),
            "eval" => Self::Eval,
            "combine" => {
                required("combine", "规则 ID 列表", rest)?;
                Self::Combine(rest.split_whitespace().map(RuleId::from).collect())
            }
            "reload" => Self::Reload,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    value: &'a str,
) -> Result<&'a str, ShellError> {
    if value.is_empty() {
        Err(ShellError::MissingArgument { command, argument })
    } else {
        Ok(value)
    }
}

/// 输出提示并读取一行回答，只有 y/yes 视为确认
pub async fn confirm<R, W>(input: &mut Lines<R>, output: &mut W, prompt: &str) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(prompt.as_bytes()).await?;
    output.flush().await?;

    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<R, W> {
    store: Arc<RuleStore>,
    session: EditSession,
    controller: EvaluationController,
    snapshots: watch::Receiver<RuleSnapshot>,
    input: Lines<R>,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(store: Arc<RuleStore>, input: R, output: W) -> Self {
        Self {
            snapshots: store.subscribe(),
            controller: EvaluationController::new(store.clone()),
            session: EditSession::new(),
            store,
            input: input.lines(),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// 运行会话直到 quit 或输入结束
    pub async fn run(&mut self) -> io::Result<()> {
        let snapshot = self.snapshots.borrow_and_update().clone();
        self.emit(&render_rules(&snapshot, None)).await?;
        self.emit("输入 help 查看可用命令").await?;

        loop {
            self.output.write_all(b"> ").await?;
            self.output.flush().await?;

            let Some(line) = self.input.next_line().await? else {
                break;
            };

            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    self.emit(&format!("错误: {err}")).await?;
                    continue;
                }
            };
            debug!(?command, "执行会话命令");

            if let Flow::Quit = self.execute(command).await? {
                break;
            }

            if self.snapshots.has_changed().unwrap_or(false) {
                let snapshot = self.snapshots.borrow_and_update().clone();
                let text = render_rules(&snapshot, self.session.active_rule_id());
                self.emit(&text).await?;
            }
        }

        Ok(())
    }

    async fn execute(&mut self, command: ShellCommand) -> io::Result<Flow> {
        let message = match command {
            ShellCommand::Empty => return Ok(Flow::Continue),
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Help => HELP_TEXT.to_string(),
            ShellCommand::List => {
                render_rules(&self.store.rules(), self.session.active_rule_id())
            }
            ShellCommand::Add(text) => match self.store.create(&text).await {
                Ok(rule) => format!("已添加规则: {}", rule.id),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Edit(rule_id) => match self.store.get(&rule_id) {
                Some(rule) => {
                    let message = format!("正在编辑规则 {rule_id}: {}", rule.rule_string);
                    self.session.begin_edit(rule_id, rule.rule_string);
                    message
                }
                None => render_notice(&ClientError::RuleNotFound { rule_id }),
            },
            ShellCommand::Draft(text) => match self.session.set_draft(text) {
                Ok(()) => "草稿已更新，输入 save 保存".to_string(),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Save => match self.session.commit(&self.store).await {
                Ok(rule_id) => format!("已保存规则: {rule_id}"),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Cancel => {
                self.session.cancel();
                "已放弃编辑".to_string()
            }
            ShellCommand::Toggle(rule_id) => match self.store.toggle_status(&rule_id).await {
                Ok(status) => format!("规则 {rule_id} 当前状态: {}", status_label(status)),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Delete(rule_id) => self.delete(rule_id).await?,
            ShellCommand::Select(rule_id) => {
                let message = format!("已选择规则: {rule_id}");
                self.controller.select(rule_id);
                message
            }
            ShellCommand::Data(text) => {
                self.controller.set_user_data(text);
                "用户数据已更新".to_string()
            }
            ShellCommand::Eval => match self.controller.submit().await {
                Ok(outcome) => render_outcome(&outcome),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Combine(rule_ids) => match self.store.combine(&rule_ids).await {
                Ok(ast) => render_combined(&ast),
                Err(err) => render_notice(&err),
            },
            ShellCommand::Reload => match self.store.load().await {
                Ok(count) => format!("已重新加载 {count} 条规则"),
                Err(err) => render_notice(&err),
            },
        };

        self.emit(&message).await?;
        Ok(Flow::Continue)
    }

    async fn delete(&mut self, rule_id: RuleId) -> io::Result<String> {
        let prompt = format!("确认删除规则 {rule_id}? [y/N] ");
        if !confirm(&mut self.input, &mut self.output, &prompt).await? {
            return Ok("已取消删除".to_string());
        }

        Ok(match self.store.delete(&rule_id).await {
            Ok(()) => {
                if self.session.is_editing(&rule_id) {
                    self.session.cancel();
                }
                if self.controller.selected() == Some(&rule_id) {
                    self.controller.clear_selection();
                }
                format!("已删除规则: {rule_id}")
            }
            Err(err) => render_notice(&err),
        })
    }

    async fn emit(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}
