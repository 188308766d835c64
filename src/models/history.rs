//! History (audit log) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::Operation;

/// Persisted history row.
///
/// `item_id` and `peripheral_id` are cleared when the referenced record is
/// purged; the snapshot columns keep describing what it was.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct History {
    pub id: i32,
    pub item_id: Option<i32>,
    pub peripheral_id: Option<i32>,
    pub operator_id: Option<i32>,
    /// Login of the operator, kept for display after the user is removed
    pub operator_login: Option<String>,

    pub usuario: Option<String>,
    pub cpf: Option<String>,
    pub cargo: Option<String>,
    pub center_cost: Option<String>,
    pub setor: Option<String>,
    pub fornecedor: Option<String>,
    pub revenda: Option<String>,
    pub data_operacao: DateTime<Utc>,
    pub operation: Operation,
    pub is_reversed: bool,
    pub details: Option<String>,

    pub tipo: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub identificador: Option<String>,
    pub nota_fiscal: Option<String>,
    pub poe: Option<String>,
    pub quantidade_portas: Option<String>,

    pub operacao_anexo: Option<String>,
    pub termo_assinado_anexo: Option<String>,
}

/// History row ready to insert (everything but id)
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub item_id: Option<i32>,
    pub peripheral_id: Option<i32>,
    pub operator_id: Option<i32>,
    pub operator_login: Option<String>,
    pub usuario: Option<String>,
    pub cpf: Option<String>,
    pub cargo: Option<String>,
    pub center_cost: Option<String>,
    pub setor: Option<String>,
    pub fornecedor: Option<String>,
    pub revenda: Option<String>,
    pub data_operacao: DateTime<Utc>,
    pub operation: Operation,
    pub details: Option<String>,
    pub snapshot: Snapshot,
    pub operacao_anexo: Option<String>,
    pub termo_assinado_anexo: Option<String>,
}

/// Identifying fields copied from the item or peripheral at operation time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tipo: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub identificador: Option<String>,
    pub nota_fiscal: Option<String>,
    pub poe: Option<String>,
    pub quantidade_portas: Option<String>,
}

/// History list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub item_id: Option<i32>,
    pub peripheral_id: Option<i32>,
    pub operation: Option<Operation>,
    /// Maximum number of rows (default 200)
    pub limit: Option<i64>,
}

impl HistoryQuery {
    pub fn for_item(item_id: i32) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(200).clamp(1, 1000)
    }
}
