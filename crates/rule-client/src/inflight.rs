//! 在途变更登记
//!
//! 同一条规则同时只允许一个变更请求在途。许可在 drop 时自动释放，
//! 因此无论请求成功、失败还是被取消，登记都会被清理。

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{ClientError, Operation};
use crate::models::RuleId;

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    entries: Arc<DashMap<RuleId, Operation>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为规则登记一个在途操作，已有在途操作时返回 `Busy`
    pub fn try_acquire(
        &self,
        rule_id: &RuleId,
        operation: Operation,
    ) -> Result<InFlightPermit, ClientError> {
        match self.entries.entry(rule_id.clone()) {
            Entry::Occupied(existing) => Err(ClientError::Busy {
                rule_id: rule_id.clone(),
                operation: *existing.get(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(operation);
                debug!(rule_id = %rule_id, operation = %operation, "登记在途操作");
                Ok(InFlightPermit {
                    entries: Arc::clone(&self.entries),
                    rule_id: rule_id.clone(),
                })
            }
        }
    }

    pub fn is_in_flight(&self, rule_id: &RuleId) -> bool {
        self.entries.contains_key(rule_id)
    }

    /// 当前在途的操作类型
    pub fn operation_for(&self, rule_id: &RuleId) -> Option<Operation> {
        self.entries.get(rule_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 在途许可，drop 时释放登记
#[derive(Debug)]
pub struct InFlightPermit {
    entries: Arc<DashMap<RuleId, Operation>>,
    rule_id: RuleId,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.entries.remove(&self.rule_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let registry = InFlightRegistry::new();
        let r1 = RuleId::from("r1");

        let _permit = registry.try_acquire(&r1, Operation::ToggleStatus).unwrap();
        assert!(registry.is_in_flight(&r1));

        let err = registry
            .try_acquire(&r1, Operation::DeleteRule)
            .unwrap_err();
        match err {
            ClientError::Busy { rule_id, operation } => {
                assert_eq!(rule_id, r1);
                assert_eq!(operation, Operation::ToggleStatus);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_different_rules_independent() {
        let registry = InFlightRegistry::new();
        let _a = registry
            .try_acquire(&RuleId::from("a"), Operation::UpdateRule)
            .unwrap();
        let _b = registry
            .try_acquire(&RuleId::from("b"), Operation::UpdateRule)
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_permit_drop_releases() {
        let registry = InFlightRegistry::new();
        let r1 = RuleId::from("r1");

        {
            let _permit = registry.try_acquire(&r1, Operation::UpdateRule).unwrap();
            assert_eq!(registry.operation_for(&r1), Some(Operation::UpdateRule));
        }

        assert!(!registry.is_in_flight(&r1));
        assert!(registry.is_empty());
        assert!(registry.try_acquire(&r1, Operation::DeleteRule).is_ok());
    }
}
