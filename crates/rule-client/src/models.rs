//! 数据契约
//!
//! 规则实体、评估请求与评估结果。字段名与远程服务的 JSON 线格式保持一致。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// 规则标识，由远程服务分配，客户端视为不透明字符串
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for RuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_status() -> bool {
    true
}

/// 规则实体
///
/// 只能由远程服务的创建响应产生，客户端从不自行生成 id。
/// 线格式中的其他字段（如服务端保存的 AST）被忽略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntity {
    #[serde(rename = "_id", alias = "id")]
    pub id: RuleId,
    pub rule_string: String,
    /// 启用状态，服务端缺省时视为启用
    #[serde(default = "default_status")]
    pub status: bool,
}

impl RuleEntity {
    pub fn new(id: impl Into<RuleId>, rule_string: impl Into<String>, status: bool) -> Self {
        Self {
            id: id.into(),
            rule_string: rule_string.into(),
            status,
        }
    }
}

/// 校验规则文本：去除首尾空白后不能为空
///
/// 校验通过时原样提交，不做裁剪。
pub fn validate_rule_string(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyRuleText);
    }
    Ok(())
}

/// 评估请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    pub rule_id: RuleId,
    /// 任意 JSON 值，由用户输入文本解码而来
    pub user_data: Value,
}

/// 评估结果
///
/// 客户端只解释 `result`，其余字段原样透传用于展示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub result: bool,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl EvaluationOutcome {
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}
