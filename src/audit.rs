//! Construction of history rows.
//!
//! Building an entry is pure: it copies identifying fields out of the item or
//! peripheral as they are at operation time. Persisting it is the repository's
//! job and always happens in the transaction that changed the record.

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{
    history::{NewHistory, Snapshot},
    item::{non_blank, Item, LoanRequest, OperationNote},
    peripheral::Peripheral,
    user::Operator,
    Operation,
};

/// Caller-supplied fields of a history row
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct AuditExtra {
    pub usuario: Option<String>,
    pub cpf: Option<String>,
    pub cargo: Option<String>,
    pub center_cost: Option<String>,
    pub setor: Option<String>,
    pub fornecedor: Option<String>,
    pub revenda: Option<String>,
    pub details: Option<String>,
    pub operacao_anexo: Option<String>,
    pub termo_assinado_anexo: Option<String>,
}

impl AuditExtra {
    pub fn details(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Default::default()
        }
    }
}

impl From<&LoanRequest> for AuditExtra {
    fn from(req: &LoanRequest) -> Self {
        Self {
            usuario: req.usuario.clone(),
            cpf: req.cpf.clone(),
            cargo: req.cargo.clone(),
            center_cost: req.center_cost.clone(),
            setor: req.setor.clone(),
            details: req.details.clone(),
            operacao_anexo: req.operacao_anexo.clone(),
            termo_assinado_anexo: req.termo_assinado_anexo.clone(),
            ..Default::default()
        }
    }
}

impl From<OperationNote> for AuditExtra {
    fn from(note: OperationNote) -> Self {
        Self {
            details: note.details,
            operacao_anexo: note.operacao_anexo,
            termo_assinado_anexo: note.termo_assinado_anexo,
            ..Default::default()
        }
    }
}

impl From<&Item> for Snapshot {
    fn from(item: &Item) -> Self {
        Self {
            tipo: item.tipo.map(|t| t.to_string()),
            brand: item.brand.clone(),
            model: item.model.clone(),
            identificador: item.identificador.clone(),
            nota_fiscal: item.nota_fiscal.clone(),
            poe: item.poe.map(|p| p.to_string()),
            quantidade_portas: item.quantidade_portas.clone(),
        }
    }
}

impl From<&Peripheral> for Snapshot {
    fn from(peripheral: &Peripheral) -> Self {
        Self {
            tipo: Some(peripheral.tipo.clone()),
            brand: peripheral.brand.clone(),
            model: peripheral.model.clone(),
            identificador: peripheral.identificador.clone(),
            ..Default::default()
        }
    }
}

fn pick(explicit: Option<String>, fallback: Option<&String>) -> Option<String> {
    non_blank(&explicit)
        .map(str::to_string)
        .or_else(|| fallback.cloned())
}

/// Build one history row for `operation`.
///
/// The snapshot describes the peripheral when one is involved, the item
/// otherwise. Subject fields left empty in `extra` fall back to the item's
/// current borrower, sector, supplier and branch.
pub fn build_audit_entry(
    operation: Operation,
    operator: &Operator,
    item: Option<&Item>,
    peripheral: Option<&Peripheral>,
    extra: AuditExtra,
) -> NewHistory {
    let snapshot = match (peripheral, item) {
        (Some(peripheral), _) => Snapshot::from(peripheral),
        (None, Some(item)) => Snapshot::from(item),
        (None, None) => Snapshot::default(),
    };

    NewHistory {
        item_id: item.map(|i| i.id),
        peripheral_id: peripheral.map(|p| p.id),
        operator_id: Some(operator.id),
        operator_login: Some(operator.login.clone()),
        usuario: pick(extra.usuario, item.and_then(|i| i.assigned_to.as_ref())),
        cpf: pick(extra.cpf, item.and_then(|i| i.cpf.as_ref())),
        cargo: extra.cargo,
        center_cost: extra.center_cost,
        setor: pick(extra.setor, item.and_then(|i| i.setor.as_ref())),
        fornecedor: pick(extra.fornecedor, item.and_then(|i| i.fornecedor.as_ref())),
        revenda: pick(extra.revenda, item.and_then(|i| i.revenda.as_ref())),
        data_operacao: Utc::now(),
        operation,
        details: extra.details,
        snapshot,
        operacao_anexo: extra.operacao_anexo,
        termo_assinado_anexo: extra.termo_assinado_anexo,
    }
}

/// Operation, actor and extra fields decided by a service before the
/// repository knows the final state of the record
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub operation: Operation,
    pub operator: Operator,
    pub extra: AuditExtra,
}

impl AuditDraft {
    pub fn new(operation: Operation, operator: Operator, extra: AuditExtra) -> Self {
        Self {
            operation,
            operator,
            extra,
        }
    }

    pub fn entry(&self, item: Option<&Item>, peripheral: Option<&Peripheral>) -> NewHistory {
        build_audit_entry(
            self.operation,
            &self.operator,
            item,
            peripheral,
            self.extra.clone(),
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::models::{
        enums::{EquipmentType, ItemStatus, PeripheralStatus, Poe},
        history::{History, NewHistory},
        item::Item,
        peripheral::Peripheral,
        user::Operator,
    };

    /// What the repository returns after inserting `entry`
    pub fn recorded(id: i32, entry: NewHistory) -> History {
        History {
            id,
            item_id: entry.item_id,
            peripheral_id: entry.peripheral_id,
            operator_id: entry.operator_id,
            operator_login: entry.operator_login,
            usuario: entry.usuario,
            cpf: entry.cpf,
            cargo: entry.cargo,
            center_cost: entry.center_cost,
            setor: entry.setor,
            fornecedor: entry.fornecedor,
            revenda: entry.revenda,
            data_operacao: entry.data_operacao,
            operation: entry.operation,
            is_reversed: false,
            details: entry.details,
            tipo: entry.snapshot.tipo,
            brand: entry.snapshot.brand,
            model: entry.snapshot.model,
            identificador: entry.snapshot.identificador,
            nota_fiscal: entry.snapshot.nota_fiscal,
            poe: entry.snapshot.poe,
            quantidade_portas: entry.snapshot.quantidade_portas,
            operacao_anexo: entry.operacao_anexo,
            termo_assinado_anexo: entry.termo_assinado_anexo,
        }
    }

    pub fn operator() -> Operator {
        Operator {
            id: 3,
            login: "joao".to_string(),
        }
    }

    pub fn item(id: i32) -> Item {
        Item {
            id,
            tipo: Some(EquipmentType::Switch),
            brand: Some("TP-Link".to_string()),
            model: Some("TL-SG1024".to_string()),
            identificador: Some("SN-001".to_string()),
            nota_fiscal: Some("NF-77".to_string()),
            status: ItemStatus::Disponivel,
            assigned_to: None,
            cpf: None,
            revenda: Some("Revalle Bonfim".to_string()),
            dominio: None,
            host: None,
            endereco_fisico: None,
            cpu: None,
            ram: None,
            storage: None,
            sistema: None,
            licenca: None,
            anydesk: None,
            setor: Some("TI".to_string()),
            ip: None,
            mac: None,
            fornecedor: Some("Distribuidora X".to_string()),
            potencia_nominal: None,
            autonomia_estimada: None,
            ip_snmp: None,
            codigo_patrimonial: None,
            responsavel: None,
            local_instalacao: None,
            poe: Some(Poe::Sim),
            quantidade_portas: Some("24".to_string()),
            date_registered: Utc::now(),
            date_issued: None,
            is_active: true,
        }
    }

    pub fn peripheral(id: i32) -> Peripheral {
        Peripheral {
            id,
            tipo: "Mouse".to_string(),
            brand: Some("Logitech".to_string()),
            model: Some("M90".to_string()),
            identificador: Some("LG-9".to_string()),
            status: PeripheralStatus::Disponivel,
            motivo_substituicao: None,
            date_registered: Utc::now(),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{item, operator, peripheral};
    use super::*;

    #[test]
    fn test_item_snapshot() {
        let item = item(10);
        let entry = build_audit_entry(
            Operation::Cadastro,
            &operator(),
            Some(&item),
            None,
            AuditExtra::default(),
        );
        assert_eq!(entry.operation, Operation::Cadastro);
        assert_eq!(entry.item_id, Some(10));
        assert_eq!(entry.peripheral_id, None);
        assert_eq!(entry.operator_id, Some(3));
        assert_eq!(entry.operator_login.as_deref(), Some("joao"));
        assert_eq!(entry.snapshot.tipo.as_deref(), Some("Switch"));
        assert_eq!(entry.snapshot.poe.as_deref(), Some("Sim"));
        assert_eq!(entry.snapshot.quantidade_portas.as_deref(), Some("24"));
        assert_eq!(entry.snapshot.nota_fiscal.as_deref(), Some("NF-77"));
        assert_eq!(entry.revenda.as_deref(), Some("Revalle Bonfim"));
        assert_eq!(entry.fornecedor.as_deref(), Some("Distribuidora X"));
    }

    #[test]
    fn test_snapshot_is_independent_of_later_edits() {
        let mut item = item(10);
        let entry = build_audit_entry(
            Operation::Edicao,
            &operator(),
            Some(&item),
            None,
            AuditExtra::default(),
        );
        item.brand = Some("Cisco".to_string());
        item.identificador = None;
        assert_eq!(entry.snapshot.brand.as_deref(), Some("TP-Link"));
        assert_eq!(entry.snapshot.identificador.as_deref(), Some("SN-001"));
    }

    #[test]
    fn test_peripheral_operations_snapshot_the_peripheral() {
        let item = item(10);
        let peripheral = peripheral(4);
        let entry = build_audit_entry(
            Operation::VinculoPeriferico,
            &operator(),
            Some(&item),
            Some(&peripheral),
            AuditExtra::default(),
        );
        assert_eq!(entry.item_id, Some(10));
        assert_eq!(entry.peripheral_id, Some(4));
        assert_eq!(entry.snapshot.tipo.as_deref(), Some("Mouse"));
        assert_eq!(entry.snapshot.identificador.as_deref(), Some("LG-9"));
        assert_eq!(entry.snapshot.nota_fiscal, None);
    }

    #[test]
    fn test_extra_overrides_item_subject() {
        let mut item = item(10);
        item.assigned_to = Some("Ana".to_string());
        item.cpf = Some("111.111.111-11".to_string());
        let extra = AuditExtra {
            usuario: Some("Carlos".to_string()),
            cargo: Some("Vendedor".to_string()),
            center_cost: Some("401 - Vendas".to_string()),
            setor: Some("  ".to_string()),
            ..Default::default()
        };
        let entry = build_audit_entry(Operation::Emprestimo, &operator(), Some(&item), None, extra);
        assert_eq!(entry.usuario.as_deref(), Some("Carlos"));
        assert_eq!(entry.cpf.as_deref(), Some("111.111.111-11"));
        assert_eq!(entry.cargo.as_deref(), Some("Vendedor"));
        assert_eq!(entry.center_cost.as_deref(), Some("401 - Vendas"));
        // blank falls back to the item's sector
        assert_eq!(entry.setor.as_deref(), Some("TI"));
    }

    #[test]
    fn test_draft_builds_same_entry() {
        let item = item(1);
        let draft = AuditDraft::new(Operation::Exclusao, operator(), AuditExtra::details("baixa"));
        let entry = draft.entry(Some(&item), None);
        assert_eq!(entry.operation, Operation::Exclusao);
        assert_eq!(entry.details.as_deref(), Some("baixa"));
        assert_eq!(entry.item_id, Some(1));
    }
}
