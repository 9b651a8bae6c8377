//! 单槽编辑会话
//!
//! 同一时刻最多编辑一条规则。状态机：
//! - `Idle`
//! - `Editing { rule_id, draft }`
//!
//! 开始编辑另一条规则会直接丢弃未保存的草稿，不做提示。

use tracing::debug;

use crate::error::{ClientError, Result, ValidationError};
use crate::models::{RuleId, validate_rule_string};
use crate::store::RuleStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        rule_id: RuleId,
        draft: String,
    },
}

#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
    validation_error: Option<ValidationError>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始编辑规则，丢弃之前未保存的草稿并清除校验错误
    pub fn begin_edit(&mut self, rule_id: RuleId, current_text: impl Into<String>) {
        if let EditState::Editing {
            rule_id: previous, ..
        } = &self.state
        {
            if previous != &rule_id {
                debug!(discarded = %previous, rule_id = %rule_id, "丢弃未保存的草稿");
            }
        }

        self.state = EditState::Editing {
            rule_id,
            draft: current_text.into(),
        };
        self.validation_error = None;
    }

    /// 修改草稿内容
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<()> {
        match &mut self.state {
            EditState::Editing { draft, .. } => {
                *draft = text.into();
                if self.validation_error.is_some() && validate_rule_string(draft).is_ok() {
                    self.validation_error = None;
                }
                Ok(())
            }
            EditState::Idle => Err(ValidationError::NoActiveEdit.into()),
        }
    }

    /// 放弃编辑
    pub fn cancel(&mut self) {
        self.state = EditState::Idle;
        self.validation_error = None;
    }

    /// 保存草稿
    ///
    /// 草稿为空时不调用存储，保持编辑状态并记录校验错误；
    /// 远程更新失败时同样保持编辑状态，草稿不丢失。
    pub async fn commit(&mut self, store: &RuleStore) -> Result<RuleId> {
        let (rule_id, draft) = match &self.state {
            EditState::Editing { rule_id, draft } => (rule_id.clone(), draft.clone()),
            EditState::Idle => return Err(ValidationError::NoActiveEdit.into()),
        };

        if let Err(err) = validate_rule_string(&draft) {
            self.validation_error = Some(err.clone());
            return Err(ClientError::Validation(err));
        }

        store.update(&rule_id, &draft).await?;

        self.state = EditState::Idle;
        self.validation_error = None;
        Ok(rule_id)
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn active_rule_id(&self) -> Option<&RuleId> {
        match &self.state {
            EditState::Editing { rule_id, .. } => Some(rule_id),
            EditState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Idle => None,
        }
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    pub fn is_editing(&self, rule_id: &RuleId) -> bool {
        self.active_rule_id() == Some(rule_id)
    }
}
