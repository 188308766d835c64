//! Items repository for database operations

use async_trait::async_trait;
use sqlx::PgConnection;

use super::{history::insert_history, peripherals::release_item_peripherals, Repository};
use crate::{
    audit::AuditDraft,
    error::{AppError, AppResult},
    models::{
        history::History,
        item::{Item, ItemField, LendingChange, NewItem},
        ItemStatus,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Active items, id ascending
    async fn list_items(&self) -> AppResult<Vec<Item>>;

    /// Item by id, whatever its `is_active` flag
    async fn get_item(&self, id: i32) -> AppResult<Item>;

    async fn create_item(&self, item: &NewItem, audit: &AuditDraft) -> AppResult<(Item, History)>;

    async fn update_item(&self, id: i32, item: &NewItem, audit: &AuditDraft) -> AppResult<(Item, History)>;

    /// Move an active item from `expected` through `change`; fails if another
    /// request changed its status first
    async fn apply_lending(
        &self,
        id: i32,
        expected: ItemStatus,
        change: &LendingChange,
        audit: &AuditDraft,
    ) -> AppResult<(Item, History)>;

    /// Soft delete
    async fn deactivate_item(&self, id: i32, audit: &AuditDraft) -> AppResult<History>;

    async fn purge_item(&self, id: i32, audit: &AuditDraft) -> AppResult<History>;
}

/// Free-text columns written from the form, in bind order
const TEXT_COLUMNS: &[ItemField] = &[
    ItemField::Brand,
    ItemField::Model,
    ItemField::Identificador,
    ItemField::NotaFiscal,
    ItemField::Revenda,
    ItemField::Fornecedor,
    ItemField::Dominio,
    ItemField::Host,
    ItemField::EnderecoFisico,
    ItemField::Cpu,
    ItemField::Ram,
    ItemField::Storage,
    ItemField::Sistema,
    ItemField::Licenca,
    ItemField::Anydesk,
    ItemField::Setor,
    ItemField::Ip,
    ItemField::Mac,
    ItemField::PotenciaNominal,
    ItemField::AutonomiaEstimada,
    ItemField::IpSnmp,
    ItemField::CodigoPatrimonial,
    ItemField::Responsavel,
    ItemField::LocalInstalacao,
    ItemField::QuantidadePortas,
];

/// Leading typed columns, bound before `TEXT_COLUMNS`
const TYPED_COLUMNS: &[&str] = &["tipo", "poe", "date_registered"];

fn column_names() -> impl Iterator<Item = &'static str> {
    TYPED_COLUMNS
        .iter()
        .copied()
        .chain(TEXT_COLUMNS.iter().map(|f| f.name()))
}

fn insert_sql() -> String {
    let columns: Vec<&str> = column_names().collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO items ({}) VALUES ({}) RETURNING *",
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `$1` is the item id
fn update_sql() -> String {
    let sets: Vec<String> = column_names()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 2))
        .collect();
    format!(
        "UPDATE items SET {} WHERE id = $1 AND is_active = TRUE RETURNING *",
        sets.join(", ")
    )
}

macro_rules! bind_item {
    ($query:expr, $item:expr) => {{
        let mut query = $query
            .bind($item.tipo)
            .bind($item.poe)
            .bind($item.date_registered);
        for field in TEXT_COLUMNS {
            query = query.bind($item.form.owned(*field));
        }
        query
    }};
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Item {} not found", id))
}

/// Lock an active item row for the rest of the transaction
pub(crate) async fn lock_active_item(conn: &mut PgConnection, id: i32) -> AppResult<Item> {
    sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 AND is_active = TRUE FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Apply a lending step guarded by the expected current status
pub(crate) async fn update_lending(
    conn: &mut PgConnection,
    id: i32,
    expected: ItemStatus,
    change: &LendingChange,
) -> AppResult<Item> {
    let updated = match &change.assignment {
        Some(assignment) => {
            sqlx::query_as::<_, Item>(
                r#"
                UPDATE items
                SET status = $3, assigned_to = $4, cpf = $5, date_issued = $6
                WHERE id = $1 AND status = $2 AND is_active = TRUE
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(change.status)
            .bind(&assignment.assigned_to)
            .bind(&assignment.cpf)
            .bind(assignment.date_issued)
            .fetch_optional(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, Item>(
                r#"
                UPDATE items SET status = $3
                WHERE id = $1 AND status = $2 AND is_active = TRUE
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(change.status)
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    updated.ok_or_else(|| {
        AppError::BusinessRule(format!(
            "Item {} is no longer '{}'",
            id, expected
        ))
    })
}

#[async_trait]
impl ItemStore for Repository {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE is_active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_item(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn create_item(&self, item: &NewItem, audit: &AuditDraft) -> AppResult<(Item, History)> {
        let sql = insert_sql();
        let mut tx = self.pool.begin().await?;

        let created = bind_item!(sqlx::query_as::<_, Item>(&sql), item)
            .fetch_one(&mut *tx)
            .await?;
        let history = insert_history(&mut tx, &audit.entry(Some(&created), None)).await?;

        tx.commit().await?;
        Ok((created, history))
    }

    async fn update_item(&self, id: i32, item: &NewItem, audit: &AuditDraft) -> AppResult<(Item, History)> {
        let sql = update_sql();
        let mut tx = self.pool.begin().await?;

        let updated = bind_item!(sqlx::query_as::<_, Item>(&sql).bind(id), item)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;
        let history = insert_history(&mut tx, &audit.entry(Some(&updated), None)).await?;

        tx.commit().await?;
        Ok((updated, history))
    }

    async fn apply_lending(
        &self,
        id: i32,
        expected: ItemStatus,
        change: &LendingChange,
        audit: &AuditDraft,
    ) -> AppResult<(Item, History)> {
        let mut tx = self.pool.begin().await?;

        let item = update_lending(&mut tx, id, expected, change).await?;
        let history = insert_history(&mut tx, &audit.entry(Some(&item), None)).await?;

        tx.commit().await?;
        Ok((item, history))
    }

    async fn deactivate_item(&self, id: i32, audit: &AuditDraft) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        let item = lock_active_item(&mut tx, id).await?;
        let released = release_item_peripherals(&mut tx, &item, audit).await?;

        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET is_active = FALSE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let history = insert_history(&mut tx, &audit.entry(Some(&item), None)).await?;

        tx.commit().await?;
        tracing::info!(item_id = id, released_peripherals = released.len(), "Item deactivated");
        Ok(history)
    }

    async fn purge_item(&self, id: i32, audit: &AuditDraft) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;
        let released = release_item_peripherals(&mut tx, &item, audit).await?;

        let cleared = sqlx::query("UPDATE history SET item_id = NULL WHERE item_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut entry = audit.entry(Some(&item), None);
        entry.item_id = None;
        let history = insert_history(&mut tx, &entry).await?;

        tx.commit().await?;
        tracing::info!(
            item_id = id,
            cleared_history = cleared,
            released_peripherals = released.len(),
            "Item purged"
        );
        Ok(history)
    }
}
