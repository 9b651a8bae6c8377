//! 规则评估控制器
//!
//! 持有当前选中的规则与用户数据文本，校验通过后向远程服务发起评估，
//! 并保存最近一次成功的评估结果。

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::codec::UserDataCodec;
use crate::error::{ClientError, Result, ValidationError, report};
use crate::models::{EvaluationOutcome, EvaluationRequest, RuleId};
use crate::store::RuleStore;

pub struct EvaluationController {
    store: Arc<RuleStore>,
    selected: Option<RuleId>,
    user_data_text: String,
    last_outcome: Option<EvaluationOutcome>,
}

impl EvaluationController {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self {
            store,
            selected: None,
            user_data_text: String::new(),
            last_outcome: None,
        }
    }

    pub fn select(&mut self, rule_id: RuleId) {
        self.selected = Some(rule_id);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&RuleId> {
        self.selected.as_ref()
    }

    pub fn set_user_data(&mut self, text: impl Into<String>) {
        self.user_data_text = text.into();
    }

    pub fn user_data_text(&self) -> &str {
        &self.user_data_text
    }

    /// 最近一次成功的评估结果
    pub fn last_outcome(&self) -> Option<&EvaluationOutcome> {
        self.last_outcome.as_ref()
    }

    /// 用当前选择与用户数据发起评估
    pub async fn submit(&mut self) -> Result<EvaluationOutcome> {
        let rule_id = self.selected.clone();
        let text = self.user_data_text.clone();
        self.evaluate(rule_id.as_ref(), &text).await
    }

    /// 评估规则
    ///
    /// 本地检查依次为：缺少输入、规则不存在、用户数据格式，任一失败都不发起网络请求。
    /// 失败时保留上一次的评估结果。
    #[instrument(skip(self, user_data_text))]
    pub async fn evaluate(
        &mut self,
        rule_id: Option<&RuleId>,
        user_data_text: &str,
    ) -> Result<EvaluationOutcome> {
        let rule_id = match rule_id {
            Some(id) if !user_data_text.is_empty() => id.clone(),
            _ => return Err(ValidationError::MissingInput.into()),
        };

        if !self.store.contains(&rule_id) {
            return Err(ClientError::RuleNotFound { rule_id });
        }

        let user_data = UserDataCodec::decode(user_data_text)?;
        let request = EvaluationRequest { rule_id, user_data };

        debug!(rule_id = %request.rule_id, "发起规则评估");
        let outcome = self
            .store
            .api()
            .evaluate_rule(&request)
            .await
            .map_err(report)?;

        info!(rule_id = %request.rule_id, result = outcome.result, "规则评估完成");
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}
