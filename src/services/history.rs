//! History service: audit queries and reversal of pending lending steps

use std::sync::Arc;

use crate::{
    audit::{AuditDraft, AuditExtra},
    error::{AppError, AppResult},
    models::{
        history::{History, HistoryQuery},
        item::{Assignment, LendingChange},
        user::Operator,
        Operation,
    },
    repository::{HistoryStore, ItemStore},
    services::items::{ensure_active, lending_transition, reversal_of},
};

#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryStore>,
    items: Arc<dyn ItemStore>,
}

impl HistoryService {
    pub fn new(history: Arc<dyn HistoryStore>, items: Arc<dyn ItemStore>) -> Self {
        Self { history, items }
    }

    /// Newest first
    pub async fn list(&self, query: &HistoryQuery) -> AppResult<Vec<History>> {
        self.history.list_history(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<History> {
        self.history.get_history(id).await
    }

    pub async fn for_item(&self, item_id: i32) -> AppResult<Vec<History>> {
        self.history.list_history(&HistoryQuery::for_item(item_id)).await
    }

    /// Undo a loan or return that was not confirmed yet
    pub async fn reverse(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<History> {
        let target = self.history.get_history(id).await?;
        if target.is_reversed {
            return Err(AppError::BusinessRule(format!(
                "History entry {} was already reversed",
                id
            )));
        }
        let (pending, restored) = reversal_of(target.operation).ok_or_else(|| {
            AppError::BusinessRule(format!("'{}' entries cannot be reversed", target.operation))
        })?;
        let item_id = target.item_id.ok_or_else(|| {
            AppError::BusinessRule(format!("History entry {} no longer refers to an item", id))
        })?;

        let item = ensure_active(self.items.get_item(item_id).await?)?;
        if item.status != pending {
            return Err(AppError::BusinessRule(format!(
                "Item {} is '{}', only a '{}' item can be reversed",
                item_id, item.status, pending
            )));
        }

        // A later lending step or reversal supersedes the target
        let latest = self
            .history
            .list_history(&HistoryQuery::for_item(item_id))
            .await?
            .into_iter()
            .find(|h| lending_transition(h.operation).is_some() || h.operation == Operation::Estorno);
        if latest.map(|h| h.id) != Some(id) {
            return Err(AppError::BusinessRule(format!(
                "History entry {} is not the latest lending step of item {}",
                id, item_id
            )));
        }

        let change = LendingChange {
            status: restored,
            assignment: (target.operation == Operation::Emprestimo).then(Assignment::cleared),
        };
        let draft = AuditDraft::new(Operation::Estorno, operator, extra);
        let history = self
            .history
            .reverse_history(id, item_id, pending, &change, &draft)
            .await?;
        tracing::info!(
            history_id = id,
            item_id,
            reversed = %target.operation,
            status = %restored,
            "Lending step reversed"
        );
        Ok(history)
    }
}
