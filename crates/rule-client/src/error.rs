//! 规则客户端错误类型
//!
//! 错误按来源分层：
//! - `ValidationError`: 本地输入校验失败，绝不发起网络请求
//! - `NetworkError`: 远程调用失败或返回非 2xx，本地状态保持不变
//! - `Busy`: 同一规则已有变更请求在途（可选的并发保护）
//! - `RuleNotFound`: 操作引用的规则不在本地集合中

use std::fmt;

use thiserror::Error;
use tracing::error;

use crate::models::RuleId;

/// 远程操作类型，用于错误归因、日志与用户提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadRules,
    CreateRule,
    DeleteRule,
    ToggleStatus,
    UpdateRule,
    EvaluateRule,
    CombineRules,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadRules => "load_rules",
            Self::CreateRule => "create_rule",
            Self::DeleteRule => "delete_rule",
            Self::ToggleStatus => "toggle_status",
            Self::UpdateRule => "update_rule",
            Self::EvaluateRule => "evaluate_rule",
            Self::CombineRules => "combine_rules",
        }
    }

    /// 失败时展示给用户的提示
    pub fn failure_notice(&self) -> &'static str {
        match self {
            Self::LoadRules => "加载规则失败，请稍后重试",
            Self::CreateRule => "添加规则失败，请重试",
            Self::DeleteRule => "删除规则失败，请重试",
            Self::ToggleStatus => "更新状态失败，请重试",
            Self::UpdateRule => "更新规则失败，请重试",
            Self::EvaluateRule => "评估规则失败，请稍后重试",
            Self::CombineRules => "合并规则失败，请重试",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 本地输入校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("规则内容不能为空")]
    EmptyRuleText,

    /// 未选择规则或用户数据为空，不区分具体缺失项
    #[error("请选择规则并提供用户数据")]
    MissingInput,

    #[error("用户数据格式无效，请提供合法的 JSON: {message}")]
    InvalidFormat { message: String },

    #[error("当前没有正在编辑的规则")]
    NoActiveEdit,

    #[error("请至少选择一条规则")]
    EmptySelection,
}

/// 远程调用错误
///
/// 保留原始响应体用于诊断，但不解析其中的结构化错误码。
#[derive(Debug, Clone, Error)]
#[error("{operation} 调用失败: {message}")]
pub struct NetworkError {
    pub operation: Operation,
    /// HTTP 状态码，传输层失败时为 None
    pub status: Option<u16>,
    pub message: String,
    /// 服务端返回的原始错误内容
    pub body: Option<String>,
    /// 请求是否已发出，本地拒绝的请求为 false
    pub sent: bool,
}

impl NetworkError {
    /// 连接失败、超时等未拿到响应的错误
    pub fn transport(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
            body: None,
            sent: true,
        }
    }

    /// 请求地址无法表示目标资源，请求未发出
    pub fn unroutable(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
            body: None,
            sent: false,
        }
    }

    /// 服务端返回非 2xx
    pub fn http_status(operation: Operation, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            operation,
            status: Some(status),
            message: format!("HTTP {status}"),
            body: (!body.is_empty()).then_some(body),
            sent: true,
        }
    }

    /// 2xx 响应但内容无法解析为预期结构
    pub fn decode(
        operation: Operation,
        status: u16,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            status: Some(status),
            message: format!("响应解析失败: {}", message.into()),
            body: Some(body.into()),
            sent: true,
        }
    }

    /// 传输失败、5xx、408、429 视为瞬时故障
    pub fn is_retryable(&self) -> bool {
        if !self.sent {
            return false;
        }
        match self.status {
            None => true,
            Some(status) => status >= 500 || status == 408 || status == 429,
        }
    }
}

/// 规则客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("规则不存在: rule_id={rule_id}")]
    RuleNotFound { rule_id: RuleId },

    #[error("规则正在处理中: rule_id={rule_id}, 在途操作={operation}")]
    Busy { rule_id: RuleId, operation: Operation },

    #[error("客户端配置无效: {0}")]
    InvalidConfig(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::EmptyRuleText) => "EMPTY_RULE_TEXT",
            Self::Validation(ValidationError::MissingInput) => "MISSING_INPUT",
            Self::Validation(ValidationError::InvalidFormat { .. }) => "INVALID_FORMAT",
            Self::Validation(ValidationError::NoActiveEdit) => "NO_ACTIVE_EDIT",
            Self::Validation(ValidationError::EmptySelection) => "EMPTY_SELECTION",
            Self::Network(_) => "NETWORK_ERROR",
            Self::RuleNotFound { .. } => "RULE_NOT_FOUND",
            Self::Busy { .. } => "BUSY",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// 是否为可重试错误（仅供调用方重试策略使用，本层从不自动重试）
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// 面向用户的单条提示
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Network(err) => err.operation.failure_notice().to_string(),
            Self::RuleNotFound { .. } => "所选规则已不存在，请刷新后重试".to_string(),
            Self::Busy { .. } => "该规则有操作正在处理中，请稍候".to_string(),
            Self::InvalidConfig(message) => format!("客户端配置无效: {message}"),
        }
    }
}

/// 记录远程调用失败并转换为 ClientError
pub(crate) fn report(err: NetworkError) -> ClientError {
    error!(
        operation = %err.operation,
        status = ?err.status,
        body = err.body.as_deref().unwrap_or(""),
        error = %err.message,
        "远程调用失败"
    );
    ClientError::Network(err)
}
