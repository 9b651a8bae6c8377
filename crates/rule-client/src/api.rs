//! 远程规则服务接口抽象
//!
//! RuleStore 与 EvaluationController 只依赖此 trait，
//! 生产环境使用 `HttpRuleApi`，测试时注入 mock 实现。

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NetworkError;
use crate::models::{EvaluationOutcome, EvaluationRequest, RuleEntity, RuleId};

/// 远程规则服务的 CRUD + 评估接口
///
/// 任何非 2xx 响应或传输失败都统一表现为 `NetworkError`。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleApi: Send + Sync {
    /// 拉取全部规则
    async fn list_rules(&self) -> Result<Vec<RuleEntity>, NetworkError>;

    /// 创建规则，返回带服务端 id 的实体
    async fn create_rule(&self, rule_string: &str) -> Result<RuleEntity, NetworkError>;

    async fn delete_rule(&self, rule_id: &RuleId) -> Result<(), NetworkError>;

    /// 切换启用状态，返回服务端确认后的新状态
    async fn toggle_status(&self, rule_id: &RuleId) -> Result<bool, NetworkError>;

    async fn update_rule(&self, rule_id: &RuleId, rule_string: &str) -> Result<(), NetworkError>;

    async fn evaluate_rule(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationOutcome, NetworkError>;

    /// 合并多条规则，返回服务端生成的合并 AST（不透明）
    async fn combine_rules(&self, rule_ids: &[RuleId]) -> Result<Value, NetworkError>;
}
