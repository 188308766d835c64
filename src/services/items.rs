//! Item service: validation, edits, soft delete and the lending lifecycle

use std::sync::Arc;

use chrono::Utc;

use crate::{
    audit::{AuditDraft, AuditExtra},
    error::{AppError, AppResult},
    models::{
        history::History,
        item::{non_blank, Assignment, Item, ItemDetails, ItemForm, LendingChange, LoanRequest},
        user::Operator,
        ItemStatus, Operation,
    },
    repository::{ItemStore, PeripheralStore},
    validation::{self, FieldErrors, REQUIRED_MESSAGE},
};

/// Status an item must have for a lending step, and the status it moves to
pub fn lending_transition(operation: Operation) -> Option<(ItemStatus, ItemStatus)> {
    match operation {
        Operation::Emprestimo => Some((ItemStatus::Disponivel, ItemStatus::Pendente)),
        Operation::ConfirmacaoEmprestimo => Some((ItemStatus::Pendente, ItemStatus::Indisponivel)),
        Operation::Devolucao => Some((ItemStatus::Indisponivel, ItemStatus::PendenteDevolucao)),
        Operation::ConfirmacaoDevolucao => {
            Some((ItemStatus::PendenteDevolucao, ItemStatus::Disponivel))
        }
        _ => None,
    }
}

/// For a reversible operation: the pending status it left the item in, and
/// the status a reversal restores
pub fn reversal_of(operation: Operation) -> Option<(ItemStatus, ItemStatus)> {
    match operation {
        Operation::Emprestimo => Some((ItemStatus::Pendente, ItemStatus::Disponivel)),
        Operation::Devolucao => Some((ItemStatus::PendenteDevolucao, ItemStatus::Indisponivel)),
        _ => None,
    }
}

/// Item must exist and not be soft-deleted
pub(crate) fn ensure_active(item: Item) -> AppResult<Item> {
    if item.is_active {
        Ok(item)
    } else {
        Err(AppError::NotFound(format!("Item {} not found", item.id)))
    }
}

#[derive(Clone)]
pub struct ItemsService {
    items: Arc<dyn ItemStore>,
    peripherals: Arc<dyn PeripheralStore>,
}

impl ItemsService {
    pub fn new(items: Arc<dyn ItemStore>, peripherals: Arc<dyn PeripheralStore>) -> Self {
        Self { items, peripherals }
    }

    /// Active items, id ascending
    pub async fn list(&self) -> AppResult<Vec<Item>> {
        self.items.list_items().await
    }

    pub async fn get(&self, id: i32) -> AppResult<ItemDetails> {
        let item = ensure_active(self.items.get_item(id).await?)?;
        let peripherals = self.peripherals.peripherals_of_item(id).await?;
        Ok(ItemDetails { item, peripherals })
    }

    /// Validate, insert and record `Cadastro` in one transaction
    pub async fn create(&self, form: ItemForm, operator: Operator) -> AppResult<(Item, History)> {
        let new_item = validation::validated(form).map_err(AppError::InvalidFields)?;
        let draft = AuditDraft::new(Operation::Cadastro, operator, AuditExtra::default());

        let (item, history) = self.items.create_item(&new_item, &draft).await?;
        tracing::info!(item_id = item.id, tipo = %new_item.tipo, "Item registered");
        Ok((item, history))
    }

    pub async fn update(&self, id: i32, form: ItemForm, operator: Operator) -> AppResult<(Item, History)> {
        ensure_active(self.items.get_item(id).await?)?;
        let new_item = validation::validated(form).map_err(AppError::InvalidFields)?;
        let draft = AuditDraft::new(Operation::Edicao, operator, AuditExtra::default());

        let (item, history) = self.items.update_item(id, &new_item, &draft).await?;
        tracing::info!(item_id = id, "Item updated");
        Ok((item, history))
    }

    /// Soft delete; items out on loan must come back first
    pub async fn delete(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<History> {
        let item = ensure_active(self.items.get_item(id).await?)?;
        if item.status != ItemStatus::Disponivel {
            return Err(AppError::BusinessRule(format!(
                "Item {} is '{}' and cannot be deleted",
                id, item.status
            )));
        }

        let draft = AuditDraft::new(Operation::Exclusao, operator, extra);
        self.items.deactivate_item(id, &draft).await
    }

    /// Hard delete, keeping history rows with a cleared item reference
    pub async fn purge(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<History> {
        let draft = AuditDraft::new(Operation::Exclusao, operator, extra);
        self.items.purge_item(id, &draft).await
    }

    /// Hand an item to a borrower; it stays `Pendente` until confirmed
    pub async fn lend(&self, id: i32, request: LoanRequest, operator: Operator) -> AppResult<(Item, History)> {
        let mut errors = FieldErrors::default();
        if non_blank(&request.usuario).is_none() {
            errors.add("usuario", REQUIRED_MESSAGE);
        }
        if non_blank(&request.cpf).is_none() {
            errors.add("cpf", REQUIRED_MESSAGE);
        }
        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        let assignment = Assignment {
            assigned_to: non_blank(&request.usuario).map(str::to_string),
            cpf: non_blank(&request.cpf).map(str::to_string),
            date_issued: Some(Utc::now()),
        };
        let extra = AuditExtra::from(&request);
        self.step(id, Operation::Emprestimo, Some(assignment), extra, operator)
            .await
    }

    pub async fn confirm_loan(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<(Item, History)> {
        self.step(id, Operation::ConfirmacaoEmprestimo, None, extra, operator)
            .await
    }

    pub async fn give_back(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<(Item, History)> {
        self.step(id, Operation::Devolucao, None, extra, operator).await
    }

    pub async fn confirm_return(&self, id: i32, extra: AuditExtra, operator: Operator) -> AppResult<(Item, History)> {
        self.step(
            id,
            Operation::ConfirmacaoDevolucao,
            Some(Assignment::cleared()),
            extra,
            operator,
        )
        .await
    }

    async fn step(
        &self,
        id: i32,
        operation: Operation,
        assignment: Option<Assignment>,
        extra: AuditExtra,
        operator: Operator,
    ) -> AppResult<(Item, History)> {
        let (from, to) = lending_transition(operation).ok_or_else(|| {
            AppError::Internal(format!("'{}' is not a lending operation", operation))
        })?;

        let item = ensure_active(self.items.get_item(id).await?)?;
        if item.status != from {
            return Err(AppError::BusinessRule(format!(
                "{} requires item {} to be '{}', it is '{}'",
                operation, id, from, item.status
            )));
        }

        let change = LendingChange {
            status: to,
            assignment,
        };
        let draft = AuditDraft::new(operation, operator, extra);
        let (item, history) = self.items.apply_lending(id, from, &change, &draft).await?;
        tracing::info!(item_id = id, operation = %operation, status = %item.status, "Lending step recorded");
        Ok((item, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::fixtures;
    use crate::repository::{items::MockItemStore, peripherals::MockPeripheralStore};
    use mockall::predicate::eq;

    fn service(items: MockItemStore) -> ItemsService {
        ItemsService::new(Arc::new(items), Arc::new(MockPeripheralStore::new()))
    }

    fn history_for(draft: &AuditDraft, item: &Item) -> History {
        fixtures::recorded(100, draft.entry(Some(item), None))
    }

    fn valid_form() -> ItemForm {
        ItemForm {
            tipo: Some("HD".to_string()),
            brand: Some("Seagate".to_string()),
            model: Some("Barracuda".to_string()),
            nota_fiscal: Some("NF-9".to_string()),
            revenda: Some("Revalle Serrinha".to_string()),
            fornecedor: Some("Kabum".to_string()),
            date_registered: Some(Utc::now()),
            storage: Some("2TB".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_records_one_cadastro_by_operator() {
        let mut items = MockItemStore::new();
        items
            .expect_create_item()
            .withf(|new_item, draft| {
                new_item.form.value(crate::models::ItemField::Storage) == Some("2TB")
                    && draft.operation == Operation::Cadastro
                    && draft.operator == fixtures::operator()
            })
            .times(1)
            .returning(|_, draft| {
                let item = fixtures::item(1);
                let history = history_for(draft, &item);
                Ok((item, history))
            });

        let (item, history) = service(items)
            .create(valid_form(), fixtures::operator())
            .await
            .unwrap();
        assert_eq!(history.operation, Operation::Cadastro);
        assert_eq!(history.operator_id, Some(fixtures::operator().id));
        assert_eq!(history.item_id, Some(item.id));
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_the_store() {
        let mut items = MockItemStore::new();
        items.expect_create_item().never();

        let mut form = valid_form();
        form.storage = None;
        form.brand = Some(String::new());
        let err = service(items)
            .create(form, fixtures::operator())
            .await
            .unwrap_err();
        match err {
            AppError::InvalidFields(errors) => {
                assert_eq!(errors.field_names(), vec!["brand", "storage"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut items = MockItemStore::new();
        items
            .expect_create_item()
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let result = service(items).create(valid_form(), fixtures::operator()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_inactive_item_is_not_found() {
        let mut items = MockItemStore::new();
        items.expect_get_item().with(eq(5)).returning(|id| {
            let mut item = fixtures::item(id);
            item.is_active = false;
            Ok(item)
        });
        items.expect_update_item().never();

        let result = service(items)
            .update(5, valid_form(), fixtures::operator())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_refuses_items_on_loan() {
        let mut items = MockItemStore::new();
        items.expect_get_item().returning(|id| {
            let mut item = fixtures::item(id);
            item.status = ItemStatus::Indisponivel;
            Ok(item)
        });
        items.expect_deactivate_item().never();

        let result = service(items)
            .delete(2, AuditExtra::default(), fixtures::operator())
            .await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_lend_requires_borrower() {
        let items = MockItemStore::new();
        let err = service(items)
            .lend(1, LoanRequest::default(), fixtures::operator())
            .await
            .unwrap_err();
        match err {
            AppError::InvalidFields(errors) => assert_eq!(errors.field_names(), vec!["cpf", "usuario"]),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lend_moves_available_item_to_pending() {
        let mut items = MockItemStore::new();
        items.expect_get_item().returning(|id| Ok(fixtures::item(id)));
        items
            .expect_apply_lending()
            .withf(|id, expected, change, draft| {
                let assignment = change.assignment.as_ref().expect("loan sets the borrower");
                *id == 1
                    && *expected == ItemStatus::Disponivel
                    && change.status == ItemStatus::Pendente
                    && assignment.assigned_to.as_deref() == Some("Ana")
                    && assignment.date_issued.is_some()
                    && draft.operation == Operation::Emprestimo
                    && draft.extra.center_cost.as_deref() == Some("401 - Vendas")
            })
            .times(1)
            .returning(|id, _, change, draft| {
                let mut item = fixtures::item(id);
                item.status = change.status;
                let history = history_for(draft, &item);
                Ok((item, history))
            });

        let request = LoanRequest {
            usuario: Some("Ana".to_string()),
            cpf: Some("123.456.789-00".to_string()),
            center_cost: Some("401 - Vendas".to_string()),
            ..Default::default()
        };
        let (item, history) = service(items)
            .lend(1, request, fixtures::operator())
            .await
            .unwrap();
        assert_eq!(item.status, ItemStatus::Pendente);
        assert_eq!(history.operation, Operation::Emprestimo);
    }

    #[tokio::test]
    async fn test_wrong_status_is_a_business_rule() {
        let mut items = MockItemStore::new();
        items.expect_get_item().returning(|id| Ok(fixtures::item(id)));
        items.expect_apply_lending().never();

        let result = service(items)
            .confirm_return(1, AuditExtra::default(), fixtures::operator())
            .await;
        assert!(matches!(result, Err(AppError::BusinessRule(_))));
    }

    #[test]
    fn test_lending_cycle_is_closed() {
        let mut status = ItemStatus::Disponivel;
        for op in [
            Operation::Emprestimo,
            Operation::ConfirmacaoEmprestimo,
            Operation::Devolucao,
            Operation::ConfirmacaoDevolucao,
        ] {
            let (from, to) = lending_transition(op).unwrap();
            assert_eq!(from, status, "{}", op);
            status = to;
        }
        assert_eq!(status, ItemStatus::Disponivel);
        assert!(lending_transition(Operation::Cadastro).is_none());
    }

    #[test]
    fn test_reversals_undo_pending_steps() {
        for op in [Operation::Emprestimo, Operation::Devolucao] {
            let (from, to) = lending_transition(op).unwrap();
            let (pending, restored) = reversal_of(op).unwrap();
            assert_eq!(pending, to);
            assert_eq!(restored, from);
        }
        assert!(reversal_of(Operation::ConfirmacaoEmprestimo).is_none());
        assert!(reversal_of(Operation::Estorno).is_none());
    }
}
