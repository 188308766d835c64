//! Item (tracked equipment asset) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{EquipmentType, ItemStatus, Poe};
use super::peripheral::Peripheral;

/// Item row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub tipo: Option<EquipmentType>,
    pub brand: Option<String>,
    pub model: Option<String>,
    /// Serial number or IMEI
    pub identificador: Option<String>,
    pub nota_fiscal: Option<String>,
    pub status: ItemStatus,

    // Lending
    pub assigned_to: Option<String>,
    pub cpf: Option<String>,
    pub revenda: Option<String>,

    // Technical data
    pub dominio: Option<String>,
    pub host: Option<String>,
    pub endereco_fisico: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub sistema: Option<String>,
    pub licenca: Option<String>,
    pub anydesk: Option<String>,
    pub setor: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub fornecedor: Option<String>,
    pub potencia_nominal: Option<String>,
    pub autonomia_estimada: Option<String>,
    pub ip_snmp: Option<String>,
    pub codigo_patrimonial: Option<String>,
    pub responsavel: Option<String>,
    pub local_instalacao: Option<String>,
    pub poe: Option<Poe>,
    pub quantidade_portas: Option<String>,

    pub date_registered: DateTime<Utc>,
    pub date_issued: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Item with its attached peripherals
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDetails {
    #[serde(flatten)]
    pub item: Item,
    pub peripherals: Vec<Peripheral>,
}

/// Candidate item submitted for creation or edition.
///
/// Everything is optional and kept as raw text here; [`crate::validation::validate`]
/// decides what is required for the given `tipo`. Lending state is not part
/// of the form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ItemForm {
    pub tipo: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub identificador: Option<String>,
    pub nota_fiscal: Option<String>,
    pub revenda: Option<String>,
    pub fornecedor: Option<String>,
    pub date_registered: Option<DateTime<Utc>>,
    pub dominio: Option<String>,
    pub host: Option<String>,
    pub endereco_fisico: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub sistema: Option<String>,
    pub licenca: Option<String>,
    pub anydesk: Option<String>,
    pub setor: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub potencia_nominal: Option<String>,
    pub autonomia_estimada: Option<String>,
    pub ip_snmp: Option<String>,
    pub codigo_patrimonial: Option<String>,
    pub responsavel: Option<String>,
    pub local_instalacao: Option<String>,
    pub poe: Option<String>,
    pub quantidade_portas: Option<String>,
}

/// Free-text form fields, addressed by their wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Tipo,
    Brand,
    Model,
    Identificador,
    NotaFiscal,
    Revenda,
    Fornecedor,
    Dominio,
    Host,
    EnderecoFisico,
    Cpu,
    Ram,
    Storage,
    Sistema,
    Licenca,
    Anydesk,
    Setor,
    Ip,
    Mac,
    PotenciaNominal,
    AutonomiaEstimada,
    IpSnmp,
    CodigoPatrimonial,
    Responsavel,
    LocalInstalacao,
    Poe,
    QuantidadePortas,
}

impl ItemField {
    pub fn name(&self) -> &'static str {
        match self {
            ItemField::Tipo => "tipo",
            ItemField::Brand => "brand",
            ItemField::Model => "model",
            ItemField::Identificador => "identificador",
            ItemField::NotaFiscal => "nota_fiscal",
            ItemField::Revenda => "revenda",
            ItemField::Fornecedor => "fornecedor",
            ItemField::Dominio => "dominio",
            ItemField::Host => "host",
            ItemField::EnderecoFisico => "endereco_fisico",
            ItemField::Cpu => "cpu",
            ItemField::Ram => "ram",
            ItemField::Storage => "storage",
            ItemField::Sistema => "sistema",
            ItemField::Licenca => "licenca",
            ItemField::Anydesk => "anydesk",
            ItemField::Setor => "setor",
            ItemField::Ip => "ip",
            ItemField::Mac => "mac",
            ItemField::PotenciaNominal => "potencia_nominal",
            ItemField::AutonomiaEstimada => "autonomia_estimada",
            ItemField::IpSnmp => "ip_snmp",
            ItemField::CodigoPatrimonial => "codigo_patrimonial",
            ItemField::Responsavel => "responsavel",
            ItemField::LocalInstalacao => "local_instalacao",
            ItemField::Poe => "poe",
            ItemField::QuantidadePortas => "quantidade_portas",
        }
    }
}

/// Trim a submitted value, treating blank input as absent
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ItemForm {
    /// Raw value of a text field
    pub fn get(&self, field: ItemField) -> &Option<String> {
        match field {
            ItemField::Tipo => &self.tipo,
            ItemField::Brand => &self.brand,
            ItemField::Model => &self.model,
            ItemField::Identificador => &self.identificador,
            ItemField::NotaFiscal => &self.nota_fiscal,
            ItemField::Revenda => &self.revenda,
            ItemField::Fornecedor => &self.fornecedor,
            ItemField::Dominio => &self.dominio,
            ItemField::Host => &self.host,
            ItemField::EnderecoFisico => &self.endereco_fisico,
            ItemField::Cpu => &self.cpu,
            ItemField::Ram => &self.ram,
            ItemField::Storage => &self.storage,
            ItemField::Sistema => &self.sistema,
            ItemField::Licenca => &self.licenca,
            ItemField::Anydesk => &self.anydesk,
            ItemField::Setor => &self.setor,
            ItemField::Ip => &self.ip,
            ItemField::Mac => &self.mac,
            ItemField::PotenciaNominal => &self.potencia_nominal,
            ItemField::AutonomiaEstimada => &self.autonomia_estimada,
            ItemField::IpSnmp => &self.ip_snmp,
            ItemField::CodigoPatrimonial => &self.codigo_patrimonial,
            ItemField::Responsavel => &self.responsavel,
            ItemField::LocalInstalacao => &self.local_instalacao,
            ItemField::Poe => &self.poe,
            ItemField::QuantidadePortas => &self.quantidade_portas,
        }
    }

    /// Trimmed, non-blank value of a text field
    pub fn value(&self, field: ItemField) -> Option<&str> {
        non_blank(self.get(field))
    }

    /// Owned trimmed value, ready to bind into a query
    pub fn owned(&self, field: ItemField) -> Option<String> {
        self.value(field).map(str::to_string)
    }
}

/// Item row as it will be written, built from a form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub tipo: EquipmentType,
    pub date_registered: DateTime<Utc>,
    pub poe: Option<Poe>,
    pub form: ItemForm,
}

/// Borrower data submitted with a loan
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoanRequest {
    pub usuario: Option<String>,
    pub cpf: Option<String>,
    pub cargo: Option<String>,
    pub center_cost: Option<String>,
    pub setor: Option<String>,
    pub details: Option<String>,
    /// Reference to the stored operation-proof document
    pub operacao_anexo: Option<String>,
    /// Reference to the stored signed term
    pub termo_assinado_anexo: Option<String>,
}

/// Payload for confirmations, returns and reversals
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OperationNote {
    pub details: Option<String>,
    pub operacao_anexo: Option<String>,
    pub termo_assinado_anexo: Option<String>,
}

/// Lending fields written by a loan lifecycle step
#[derive(Debug, Clone, PartialEq)]
pub struct LendingChange {
    pub status: ItemStatus,
    /// `Some(..)` overwrites assignment, `None` leaves it alone
    pub assignment: Option<Assignment>,
}

/// Borrower assignment; `Assignment::cleared()` empties all three fields
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub assigned_to: Option<String>,
    pub cpf: Option<String>,
    pub date_issued: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn cleared() -> Self {
        Self {
            assigned_to: None,
            cpf: None,
            date_issued: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let form = ItemForm {
            brand: Some("  Dell ".to_string()),
            model: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(form.value(ItemField::Brand), Some("Dell"));
        assert_eq!(form.value(ItemField::Model), None);
        assert_eq!(form.value(ItemField::Host), None);
    }
}
