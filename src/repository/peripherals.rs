//! Peripherals repository: records, item links and their history

use async_trait::async_trait;
use sqlx::PgConnection;

use super::{history::insert_history, items::lock_active_item, Repository};
use crate::{
    audit::AuditDraft,
    error::{AppError, AppResult},
    models::{
        history::History,
        item::Item,
        peripheral::{CreatePeripheral, Peripheral},
        Operation, PeripheralStatus,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeripheralStore: Send + Sync {
    async fn list_peripherals(&self) -> AppResult<Vec<Peripheral>>;

    async fn get_peripheral(&self, id: i32) -> AppResult<Peripheral>;

    async fn create_peripheral(
        &self,
        data: &CreatePeripheral,
        audit: &AuditDraft,
    ) -> AppResult<(Peripheral, History)>;

    /// Peripherals currently linked to an item
    async fn peripherals_of_item(&self, item_id: i32) -> AppResult<Vec<Peripheral>>;

    /// Ids of the items a peripheral is linked to
    async fn items_linked_to(&self, peripheral_id: i32) -> AppResult<Vec<i32>>;

    async fn attach_peripheral(
        &self,
        item_id: i32,
        peripheral_id: i32,
        audit: &AuditDraft,
    ) -> AppResult<History>;

    async fn detach_peripheral(
        &self,
        item_id: i32,
        peripheral_id: i32,
        audit: &AuditDraft,
    ) -> AppResult<History>;

    /// Unlink `old_id` from the item as replaced, link `new_id` in its place
    async fn replace_peripheral(
        &self,
        item_id: i32,
        old_id: i32,
        new_id: i32,
        motivo: &str,
        audit: &AuditDraft,
    ) -> AppResult<History>;

    /// Soft delete of an unlinked peripheral
    async fn deactivate_peripheral(&self, id: i32, audit: &AuditDraft) -> AppResult<History>;
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Peripheral {} not found", id))
}

async fn lock_active_peripheral(conn: &mut PgConnection, id: i32) -> AppResult<Peripheral> {
    sqlx::query_as::<_, Peripheral>(
        "SELECT * FROM peripherals WHERE id = $1 AND is_active = TRUE FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| not_found(id))
}

async fn set_status(
    conn: &mut PgConnection,
    id: i32,
    status: PeripheralStatus,
    motivo: Option<&str>,
) -> AppResult<Peripheral> {
    let row = sqlx::query_as::<_, Peripheral>(
        r#"
        UPDATE peripherals
        SET status = $2, motivo_substituicao = COALESCE($3, motivo_substituicao)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(motivo)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

async fn link(conn: &mut PgConnection, item_id: i32, peripheral_id: i32) -> AppResult<()> {
    let inserted = sqlx::query(
        "INSERT INTO item_peripherals (item_id, peripheral_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(item_id)
    .bind(peripheral_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if inserted == 0 {
        return Err(AppError::Conflict(format!(
            "Peripheral {} is already attached to item {}",
            peripheral_id, item_id
        )));
    }
    Ok(())
}

async fn unlink(conn: &mut PgConnection, item_id: i32, peripheral_id: i32) -> AppResult<()> {
    let removed = sqlx::query("DELETE FROM item_peripherals WHERE item_id = $1 AND peripheral_id = $2")
        .bind(item_id)
        .bind(peripheral_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::NotFound(format!(
            "Peripheral {} is not attached to item {}",
            peripheral_id, item_id
        )));
    }
    Ok(())
}

async fn remaining_links(conn: &mut PgConnection, peripheral_id: i32) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_peripherals WHERE peripheral_id = $1")
        .bind(peripheral_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Unlink every peripheral from an item that is being deleted. Peripherals
/// left without any link return to `Disponível`; each one gets a
/// `Desvínculo Periférico` row.
pub(crate) async fn release_item_peripherals(
    conn: &mut PgConnection,
    item: &Item,
    audit: &AuditDraft,
) -> AppResult<Vec<History>> {
    let attached = sqlx::query_as::<_, Peripheral>(
        r#"
        SELECT p.* FROM peripherals p
        JOIN item_peripherals ip ON ip.peripheral_id = p.id
        WHERE ip.item_id = $1
        ORDER BY p.id
        FOR UPDATE OF p
        "#,
    )
    .bind(item.id)
    .fetch_all(&mut *conn)
    .await?;

    let draft = AuditDraft::new(
        Operation::DesvinculoPeriferico,
        audit.operator.clone(),
        audit.extra.clone(),
    );
    let mut entries = Vec::with_capacity(attached.len());
    for mut peripheral in attached {
        unlink(&mut *conn, item.id, peripheral.id).await?;
        if remaining_links(&mut *conn, peripheral.id).await? == 0 {
            peripheral =
                set_status(&mut *conn, peripheral.id, PeripheralStatus::Disponivel, None).await?;
        }
        let entry = draft.entry(Some(item), Some(&peripheral));
        entries.push(insert_history(&mut *conn, &entry).await?);
    }
    Ok(entries)
}

fn ensure_usable(peripheral: &Peripheral) -> AppResult<()> {
    if peripheral.status == PeripheralStatus::Substituido {
        return Err(AppError::BusinessRule(format!(
            "Peripheral {} was replaced and cannot be attached",
            peripheral.id
        )));
    }
    Ok(())
}

#[async_trait]
impl PeripheralStore for Repository {
    async fn list_peripherals(&self) -> AppResult<Vec<Peripheral>> {
        let rows = sqlx::query_as::<_, Peripheral>(
            "SELECT * FROM peripherals WHERE is_active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_peripheral(&self, id: i32) -> AppResult<Peripheral> {
        sqlx::query_as::<_, Peripheral>("SELECT * FROM peripherals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn create_peripheral(
        &self,
        data: &CreatePeripheral,
        audit: &AuditDraft,
    ) -> AppResult<(Peripheral, History)> {
        let identificador = data.identificador();
        let mut tx = self.pool.begin().await?;

        let peripheral = sqlx::query_as::<_, Peripheral>(
            r#"
            INSERT INTO peripherals (tipo, brand, model, identificador)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.tipo.trim())
        .bind(&data.brand)
        .bind(&data.model)
        .bind(&identificador)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                format!(
                    "A peripheral with identificador '{}' already exists",
                    identificador.as_deref().unwrap_or_default()
                ),
            )
        })?;
        let history = insert_history(&mut tx, &audit.entry(None, Some(&peripheral))).await?;

        tx.commit().await?;
        Ok((peripheral, history))
    }

    async fn peripherals_of_item(&self, item_id: i32) -> AppResult<Vec<Peripheral>> {
        let rows = sqlx::query_as::<_, Peripheral>(
            r#"
            SELECT p.* FROM peripherals p
            JOIN item_peripherals ip ON ip.peripheral_id = p.id
            WHERE ip.item_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn items_linked_to(&self, peripheral_id: i32) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT item_id FROM item_peripherals WHERE peripheral_id = $1 ORDER BY item_id",
        )
        .bind(peripheral_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn attach_peripheral(
        &self,
        item_id: i32,
        peripheral_id: i32,
        audit: &AuditDraft,
    ) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        let item = lock_active_item(&mut tx, item_id).await?;
        let peripheral = lock_active_peripheral(&mut tx, peripheral_id).await?;
        ensure_usable(&peripheral)?;

        link(&mut tx, item_id, peripheral_id).await?;
        let peripheral = set_status(&mut tx, peripheral_id, PeripheralStatus::EmUso, None).await?;
        let history = insert_history(&mut tx, &audit.entry(Some(&item), Some(&peripheral))).await?;

        tx.commit().await?;
        Ok(history)
    }

    async fn detach_peripheral(
        &self,
        item_id: i32,
        peripheral_id: i32,
        audit: &AuditDraft,
    ) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        let item = lock_active_item(&mut tx, item_id).await?;
        let mut peripheral = lock_active_peripheral(&mut tx, peripheral_id).await?;

        unlink(&mut tx, item_id, peripheral_id).await?;
        if remaining_links(&mut tx, peripheral_id).await? == 0 {
            peripheral = set_status(&mut tx, peripheral_id, PeripheralStatus::Disponivel, None).await?;
        }
        let history = insert_history(&mut tx, &audit.entry(Some(&item), Some(&peripheral))).await?;

        tx.commit().await?;
        Ok(history)
    }

    async fn replace_peripheral(
        &self,
        item_id: i32,
        old_id: i32,
        new_id: i32,
        motivo: &str,
        audit: &AuditDraft,
    ) -> AppResult<History> {
        if old_id == new_id {
            return Err(AppError::BadRequest(
                "A peripheral cannot replace itself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let item = lock_active_item(&mut tx, item_id).await?;
        lock_active_peripheral(&mut tx, old_id).await?;
        let replacement = lock_active_peripheral(&mut tx, new_id).await?;
        ensure_usable(&replacement)?;

        unlink(&mut tx, item_id, old_id).await?;
        // A replaced peripheral leaves every item it was still linked to
        sqlx::query("DELETE FROM item_peripherals WHERE peripheral_id = $1")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
        let replaced = set_status(&mut tx, old_id, PeripheralStatus::Substituido, Some(motivo)).await?;

        link(&mut tx, item_id, new_id).await?;
        set_status(&mut tx, new_id, PeripheralStatus::EmUso, None).await?;

        let mut entry = audit.entry(Some(&item), Some(&replaced));
        let note = format!("Substituído pelo periférico #{}: {}", new_id, motivo);
        entry.details = Some(match entry.details.take() {
            Some(details) => format!("{} ({})", note, details),
            None => note,
        });
        let history = insert_history(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(history)
    }

    async fn deactivate_peripheral(&self, id: i32, audit: &AuditDraft) -> AppResult<History> {
        let mut tx = self.pool.begin().await?;

        lock_active_peripheral(&mut tx, id).await?;
        if remaining_links(&mut tx, id).await? > 0 {
            return Err(AppError::BusinessRule(format!(
                "Peripheral {} is attached to an item; detach it first",
                id
            )));
        }
        let peripheral = sqlx::query_as::<_, Peripheral>(
            "UPDATE peripherals SET is_active = FALSE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let history = insert_history(&mut tx, &audit.entry(None, Some(&peripheral))).await?;

        tx.commit().await?;
        Ok(history)
    }
}
