//! 规则存储
//!
//! 本地规则集合的唯一来源。所有变更都是"先确认、后应用"：
//! 只有远程服务返回成功后才修改本地集合，失败时集合保持原样。
//! 每次集合变化都会通过 watch 通道发布一个不可变快照。

use std::sync::Arc;

use console_shared::config::SyncConfig;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::RuleApi;
use crate::error::{ClientError, Operation, Result, ValidationError, report};
use crate::inflight::{InFlightPermit, InFlightRegistry};
use crate::models::{RuleEntity, RuleId, validate_rule_string};

/// 规则集合的不可变快照
pub type RuleSnapshot = Arc<Vec<RuleEntity>>;

pub struct RuleStore {
    api: Arc<dyn RuleApi>,
    rules: RwLock<Vec<RuleEntity>>,
    snapshots: watch::Sender<RuleSnapshot>,
    /// 启用并发保护时存在
    in_flight: Option<InFlightRegistry>,
}

impl RuleStore {
    /// 创建规则存储，不启用在途保护
    pub fn new(api: Arc<dyn RuleApi>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            api,
            rules: RwLock::new(Vec::new()),
            snapshots,
            in_flight: None,
        }
    }

    /// 按同步配置创建规则存储
    pub fn with_config(api: Arc<dyn RuleApi>, config: &SyncConfig) -> Self {
        let mut store = Self::new(api);
        if config.guard_concurrent_mutations {
            store.in_flight = Some(InFlightRegistry::new());
        }
        store
    }

    pub fn api(&self) -> &Arc<dyn RuleApi> {
        &self.api
    }

    /// 订阅集合快照，每次变更应用后收到新值
    pub fn subscribe(&self) -> watch::Receiver<RuleSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> RuleSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn rules(&self) -> Vec<RuleEntity> {
        self.rules.read().clone()
    }

    pub fn get(&self, rule_id: &RuleId) -> Option<RuleEntity> {
        self.rules.read().iter().find(|r| &r.id == rule_id).cloned()
    }

    pub fn contains(&self, rule_id: &RuleId) -> bool {
        self.rules.read().iter().any(|r| &r.id == rule_id)
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    pub fn is_guarded(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 拉取全部规则并整体替换本地集合，返回规则数量
    ///
    /// 服务端返回重复 id 时保留第一条。
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize> {
        debug!("拉取规则列表");
        let fetched = self.api.list_rules().await.map_err(report)?;

        let mut rules: Vec<RuleEntity> = Vec::with_capacity(fetched.len());
        for rule in fetched {
            if rules.iter().any(|r| r.id == rule.id) {
                warn!(rule_id = %rule.id, "服务端返回重复规则，已忽略");
                continue;
            }
            rules.push(rule);
        }

        let count = rules.len();
        self.apply(|current| {
            *current = rules;
            true
        });

        info!(count, "规则列表已加载");
        Ok(count)
    }

    /// 创建规则，成功后追加服务端返回的实体
    #[instrument(skip(self, rule_string))]
    pub async fn create(&self, rule_string: &str) -> Result<RuleEntity> {
        validate_rule_string(rule_string)?;

        let created = self.api.create_rule(rule_string).await.map_err(report)?;

        let entity = created.clone();
        self.apply(|rules| {
            match rules.iter_mut().find(|r| r.id == entity.id) {
                Some(existing) => {
                    warn!(rule_id = %entity.id, "创建返回已存在的规则 id，覆盖本地记录");
                    *existing = entity;
                }
                None => rules.push(entity),
            }
            true
        });

        info!(rule_id = %created.id, "规则已创建");
        Ok(created)
    }

    /// 删除规则
    ///
    /// 不假设调用方已做过确认提示。
    #[instrument(skip(self))]
    pub async fn delete(&self, rule_id: &RuleId) -> Result<()> {
        self.ensure_present(rule_id)?;
        let _permit = self.acquire(rule_id, Operation::DeleteRule)?;

        self.api.delete_rule(rule_id).await.map_err(report)?;

        let removed = self.apply(|rules| {
            let before = rules.len();
            rules.retain(|r| &r.id != rule_id);
            rules.len() != before
        });

        if removed {
            info!(rule_id = %rule_id, "规则已删除");
        } else {
            warn!(rule_id = %rule_id, "删除成功但本地已无该规则");
        }
        Ok(())
    }

    /// 切换启用状态，应用服务端返回的值而非本地取反
    #[instrument(skip(self))]
    pub async fn toggle_status(&self, rule_id: &RuleId) -> Result<bool> {
        self.ensure_present(rule_id)?;
        let _permit = self.acquire(rule_id, Operation::ToggleStatus)?;

        let new_status = self.api.toggle_status(rule_id).await.map_err(report)?;

        let applied = self.apply(|rules| match rules.iter_mut().find(|r| &r.id == rule_id) {
            Some(rule) => {
                rule.status = new_status;
                true
            }
            None => false,
        });

        if applied {
            info!(rule_id = %rule_id, new_status, "规则状态已更新");
        } else {
            warn!(rule_id = %rule_id, new_status, "状态切换成功但本地已无该规则，忽略");
        }
        Ok(new_status)
    }

    /// 更新规则文本
    ///
    /// 成功后直接写入提交的文本，不重新拉取服务端规范化后的版本。
    #[instrument(skip(self, rule_string))]
    pub async fn update(&self, rule_id: &RuleId, rule_string: &str) -> Result<()> {
        validate_rule_string(rule_string)?;
        self.ensure_present(rule_id)?;
        let _permit = self.acquire(rule_id, Operation::UpdateRule)?;

        self.api
            .update_rule(rule_id, rule_string)
            .await
            .map_err(report)?;

        let applied = self.apply(|rules| match rules.iter_mut().find(|r| &r.id == rule_id) {
            Some(rule) => {
                rule.rule_string = rule_string.to_string();
                true
            }
            None => false,
        });

        if applied {
            info!(rule_id = %rule_id, "规则已更新");
        } else {
            warn!(rule_id = %rule_id, "更新成功但本地已无该规则，忽略");
        }
        Ok(())
    }

    /// 合并多条规则，返回服务端生成的合并 AST，不修改本地集合
    #[instrument(skip(self))]
    pub async fn combine(&self, rule_ids: &[RuleId]) -> Result<Value> {
        if rule_ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        for rule_id in rule_ids {
            self.ensure_present(rule_id)?;
        }

        let combined = self.api.combine_rules(rule_ids).await.map_err(report)?;
        info!(rule_count = rule_ids.len(), "规则已合并");
        Ok(combined)
    }

    fn ensure_present(&self, rule_id: &RuleId) -> Result<()> {
        if self.contains(rule_id) {
            Ok(())
        } else {
            warn!(rule_id = %rule_id, "操作引用的规则不在本地集合中");
            Err(ClientError::RuleNotFound {
                rule_id: rule_id.clone(),
            })
        }
    }

    fn acquire(&self, rule_id: &RuleId, operation: Operation) -> Result<Option<InFlightPermit>> {
        match &self.in_flight {
            Some(registry) => registry.try_acquire(rule_id, operation).map(Some),
            None => Ok(None),
        }
    }

    /// 在写锁内修改集合，有变化时发布新快照
    fn apply<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut Vec<RuleEntity>) -> bool,
    {
        let mut rules = self.rules.write();
        let changed = mutate(&mut rules);
        if changed {
            self.snapshots.send_replace(Arc::new(rules.clone()));
        }
        changed
    }
}
