//! History repository: insertion helper shared by every mutation, queries and reversal

use async_trait::async_trait;
use sqlx::PgConnection;

use super::{items::update_lending, Repository};
use crate::{
    audit::AuditDraft,
    error::{AppError, AppResult},
    models::{
        history::{History, HistoryQuery, NewHistory},
        item::LendingChange,
        ItemStatus,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Newest first
    async fn list_history(&self, query: &HistoryQuery) -> AppResult<Vec<History>>;

    async fn get_history(&self, id: i32) -> AppResult<History>;

    /// Flag `target_id` as reversed, move its item from `expected` back through
    /// `change`, and record the reversal entry.
    async fn reverse_history(
        &self,
        target_id: i32,
        item_id: i32,
        expected: ItemStatus,
        change: &LendingChange,
        audit: &AuditDraft,
    ) -> AppResult<History>;
}

/// Insert one history row on the given connection (usually a transaction)
pub(crate) async fn insert_history(conn: &mut PgConnection, entry: &NewHistory) -> AppResult<History> {
    let row = sqlx::query_as::<_, History>(
        r#"
        INSERT INTO history (
            item_id, peripheral_id, operator_id, operator_login,
            usuario, cpf, cargo, center_cost, setor, fornecedor, revenda,
            data_operacao, operation, is_reversed, details,
            tipo, brand, model, identificador, nota_fiscal, poe, quantidade_portas,
            operacao_anexo, termo_assinado_anexo
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23)
        RETURNING *
        "#,
    )
    .bind(entry.item_id)
    .bind(entry.peripheral_id)
    .bind(entry.operator_id)
    .bind(&entry.operator_login)
    .bind(&entry.usuario)
    .bind(&entry.cpf)
    .bind(&entry.cargo)
    .bind(&entry.center_cost)
    .bind(&entry.setor)
    .bind(&entry.fornecedor)
    .bind(&entry.revenda)
    .bind(entry.data_operacao)
    .bind(entry.operation)
    .bind(&entry.details)
    .bind(&entry.snapshot.tipo)
    .bind(&entry.snapshot.brand)
    .bind(&entry.snapshot.model)
    .bind(&entry.snapshot.identificador)
    .bind(&entry.snapshot.nota_fiscal)
    .bind(&entry.snapshot.poe)
    .bind(&entry.snapshot.quantidade_portas)
    .bind(&entry.operacao_anexo)
    .bind(&entry.termo_assinado_anexo)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(
        history_id = row.id,
        operation = %row.operation,
        item_id = ?row.item_id,
        peripheral_id = ?row.peripheral_id,
        "History recorded"
    );
    Ok(row)
}

#[async_trait]
impl HistoryStore for Repository {
    async fn list_history(&self, query: &HistoryQuery) -> AppResult<Vec<History>> {
        let rows = sqlx::query_as::<_, History>(
            r#"
            SELECT * FROM history
            WHERE ($1::int IS NULL OR item_id = $1)
              AND ($2::int IS NULL OR peripheral_id = $2)
              AND ($3::text IS NULL OR operation = $3)
            ORDER BY data_operacao DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(query.item_id)
        .bind(query.peripheral_id)
        .bind(query.operation)
        .bind(query.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_history(&self, id: i32) -> AppResult<History> {
        sqlx::query_as::<_, History>("SELECT * FROM history WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("History entry {} not found", id)))
    }

    async fn reverse_history(
        &self,
        target_id: i32,
        item_id: i32,
        expected: ItemStatus,
        change: &LendingChange,
        audit: &AuditDraft,
    ) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        let flagged: Option<i32> = sqlx::query_scalar(
            "UPDATE history SET is_reversed = TRUE WHERE id = $1 AND is_reversed = FALSE RETURNING id",
        )
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;
        if flagged.is_none() {
            return Err(AppError::BusinessRule(format!(
                "History entry {} was already reversed",
                target_id
            )));
        }

        let item = update_lending(&mut tx, item_id, expected, change).await?;

        let mut entry = audit.entry(Some(&item), None);
        if entry.details.is_none() {
            entry.details = Some(format!("Estorno do registro #{}", target_id));
        }
        let history = insert_history(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(history)
    }
}
