//! Peripheral service: registration and attachment to items

use std::sync::Arc;

use validator::Validate;

use crate::{
    audit::{AuditDraft, AuditExtra},
    error::{AppError, AppResult},
    models::{
        history::History,
        peripheral::{CreatePeripheral, Peripheral, ReplacePeripheral},
        user::Operator,
        Operation,
    },
    repository::PeripheralStore,
};

#[derive(Clone)]
pub struct PeripheralsService {
    store: Arc<dyn PeripheralStore>,
}

impl PeripheralsService {
    pub fn new(store: Arc<dyn PeripheralStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Peripheral>> {
        self.store.list_peripherals().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Peripheral> {
        let peripheral = self.store.get_peripheral(id).await?;
        if !peripheral.is_active {
            return Err(AppError::NotFound(format!("Peripheral {} not found", id)));
        }
        Ok(peripheral)
    }

    pub async fn create(&self, data: CreatePeripheral, operator: Operator) -> AppResult<(Peripheral, History)> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let extra = data
            .details
            .clone()
            .map(AuditExtra::details)
            .unwrap_or_default();
        let draft = AuditDraft::new(Operation::CadastroPeriferico, operator, extra);
        let (peripheral, history) = self.store.create_peripheral(&data, &draft).await?;
        tracing::info!(peripheral_id = peripheral.id, tipo = %peripheral.tipo, "Peripheral registered");
        Ok((peripheral, history))
    }

    /// Link a peripheral to an item
    pub async fn attach(
        &self,
        item_id: i32,
        peripheral_id: i32,
        extra: AuditExtra,
        operator: Operator,
    ) -> AppResult<History> {
        let linked = self.store.items_linked_to(peripheral_id).await?;
        if linked.contains(&item_id) {
            return Err(AppError::Conflict(format!(
                "Peripheral {} is already attached to item {}",
                peripheral_id, item_id
            )));
        }
        if !linked.is_empty() {
            tracing::warn!(
                peripheral_id,
                item_id,
                linked_items = ?linked,
                "Peripheral attached to more than one item"
            );
        }

        let draft = AuditDraft::new(Operation::VinculoPeriferico, operator, extra);
        let history = self
            .store
            .attach_peripheral(item_id, peripheral_id, &draft)
            .await?;
        tracing::info!(item_id, peripheral_id, "Peripheral attached");
        Ok(history)
    }

    pub async fn detach(
        &self,
        item_id: i32,
        peripheral_id: i32,
        extra: AuditExtra,
        operator: Operator,
    ) -> AppResult<History> {
        let draft = AuditDraft::new(Operation::DesvinculoPeriferico, operator, extra);
        let history = self
            .store
            .detach_peripheral(item_id, peripheral_id, &draft)
            .await?;
        tracing::info!(item_id, peripheral_id, "Peripheral detached");
        Ok(history)
    }

    /// Retire `peripheral_id` from the item and attach the replacement
    pub async fn replace(
        &self,
        item_id: i32,
        peripheral_id: i32,
        request: ReplacePeripheral,
        operator: Operator,
    ) -> AppResult<History> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if request.replacement_id == peripheral_id {
            return Err(AppError::BadRequest(
                "A peripheral cannot replace itself".to_string(),
            ));
        }

        let extra = request
            .details
            .clone()
            .map(AuditExtra::details)
            .unwrap_or_default();
        let draft = AuditDraft::new(Operation::SubstituicaoPeriferico, operator, extra);
        let history = self
            .store
            .replace_peripheral(
                item_id,
                peripheral_id,
                request.replacement_id,
                request.motivo.trim(),
                &draft,
            )
            .await?;
        tracing::info!(
            item_id,
            replaced = peripheral_id,
            replacement = request.replacement_id,
            "Peripheral replaced"
        );
        Ok(history)
    }

    /// Soft delete
    pub async fn delete(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<History> {
        let draft = AuditDraft::new(Operation::Exclusao, operator, extra);
        let history = self.store.deactivate_peripheral(id, &draft).await?;
        tracing::info!(peripheral_id = id, "Peripheral deactivated");
        Ok(history)
    }
}
