//! Required-field validation for item forms.
//!
//! Five descriptive fields and the registration date are always required.
//! On top of that, exactly one rule set applies, chosen by the literal `tipo`.
//! Every failing field is reported; nothing short-circuits. Only presence and
//! choice membership are checked, never the shape of values such as IPs or MACs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{
    enums::{EquipmentType, Poe, REVENDAS},
    item::{ItemField, ItemForm, NewItem},
};

pub const REQUIRED_MESSAGE: &str = "Este campo é obrigatório.";

/// Field name -> human readable messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Required whatever the equipment type
const ALWAYS_REQUIRED: &[ItemField] = &[
    ItemField::Brand,
    ItemField::Model,
    ItemField::Revenda,
    ItemField::NotaFiscal,
    ItemField::Fornecedor,
];

const CELULAR: &[(ItemField, &str)] = &[(ItemField::Identificador, "IMEI")];

const COMPUTADOR: &[(ItemField, &str)] = &[
    (ItemField::Dominio, "Domínio"),
    (ItemField::Host, "Host"),
    (ItemField::EnderecoFisico, "Endereço Físico"),
    (ItemField::Storage, "Armazenamento"),
    (ItemField::Sistema, "Sistema Operacional"),
    (ItemField::Cpu, "Processador"),
    (ItemField::Ram, "Memória RAM"),
    (ItemField::Licenca, "Licença Windows"),
    (ItemField::Anydesk, "AnyDesk"),
];

const IMPRESSORA: &[(ItemField, &str)] = &[
    (ItemField::Setor, "Setor"),
    (ItemField::Ip, "IP"),
    (ItemField::Mac, "MAC"),
];

const TABLET: &[(ItemField, &str)] = &[
    (ItemField::Identificador, "Nº de Série"),
    (ItemField::Storage, "Armazenamento"),
];

const SWITCH: &[(ItemField, &str)] = &[
    (ItemField::Poe, "POE"),
    (ItemField::QuantidadePortas, "Quantidade de Portas"),
];

const HD: &[(ItemField, &str)] = &[(ItemField::Storage, "Armazenamento")];

const NOBREAK: &[(ItemField, &str)] = &[
    (ItemField::Identificador, "Número de Série"),
    (ItemField::CodigoPatrimonial, "Código Patrimonial"),
    (ItemField::Responsavel, "Responsável"),
    (ItemField::PotenciaNominal, "Potência Nominal"),
    (ItemField::AutonomiaEstimada, "Autonomia Estimada"),
];

const ACCESS_POINT: &[(ItemField, &str)] = &[
    (ItemField::Identificador, "Número de Série"),
    (ItemField::CodigoPatrimonial, "Código Patrimonial"),
    (ItemField::LocalInstalacao, "Local da Instalação"),
    (ItemField::Setor, "Setor"),
    (ItemField::Ip, "IP"),
    (ItemField::Mac, "MAC"),
];

/// Type-specific required fields with their display labels
pub fn required_fields(tipo: EquipmentType) -> &'static [(ItemField, &'static str)] {
    match tipo {
        EquipmentType::Celular => CELULAR,
        EquipmentType::Notebook | EquipmentType::Desktop => COMPUTADOR,
        EquipmentType::Impressora => IMPRESSORA,
        EquipmentType::Tablet => TABLET,
        EquipmentType::Switch => SWITCH,
        EquipmentType::Hd => HD,
        EquipmentType::Nobreak => NOBREAK,
        EquipmentType::AccessPoint => ACCESS_POINT,
    }
}

/// Name used in messages; notebooks and desktops share one rule set
fn rule_group(tipo: EquipmentType) -> &'static str {
    match tipo {
        EquipmentType::Notebook | EquipmentType::Desktop => "Notebook/Desktop",
        other => other.as_str(),
    }
}

fn invalid_choice(value: &str) -> String {
    format!("Faça uma escolha válida. {} não é uma das escolhas disponíveis.", value)
}

/// Check a candidate item and collect every problem
pub fn validate(form: &ItemForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    for field in ALWAYS_REQUIRED {
        if form.value(*field).is_none() {
            errors.add(field.name(), REQUIRED_MESSAGE);
        }
    }
    if form.date_registered.is_none() {
        errors.add("date_registered", REQUIRED_MESSAGE);
    }

    if let Some(revenda) = form.value(ItemField::Revenda) {
        if !REVENDAS.contains(&revenda) {
            errors.add(ItemField::Revenda.name(), invalid_choice(revenda));
        }
    }
    if let Some(poe) = form.value(ItemField::Poe) {
        if poe.parse::<Poe>().is_err() {
            errors.add(ItemField::Poe.name(), invalid_choice(poe));
        }
    }

    let tipo = match form.value(ItemField::Tipo) {
        None => {
            errors.add(ItemField::Tipo.name(), REQUIRED_MESSAGE);
            return errors;
        }
        Some(raw) => match raw.parse::<EquipmentType>() {
            Ok(tipo) => tipo,
            Err(_) => {
                errors.add(ItemField::Tipo.name(), invalid_choice(raw));
                return errors;
            }
        },
    };

    for (field, label) in required_fields(tipo) {
        if form.value(*field).is_none() {
            errors.add(
                field.name(),
                format!("{} é obrigatório para {}.", label, rule_group(tipo)),
            );
        }
    }

    errors
}

/// Validate and, when clean, produce the typed row to persist
pub fn validated(form: ItemForm) -> Result<NewItem, FieldErrors> {
    let errors = validate(&form);
    if !errors.is_empty() {
        return Err(errors);
    }

    let tipo = form.value(ItemField::Tipo).and_then(|t| t.parse().ok());
    match (tipo, form.date_registered) {
        (Some(tipo), Some(date_registered)) => {
            let poe = form.value(ItemField::Poe).and_then(|p| p.parse().ok());
            Ok(NewItem {
                tipo,
                date_registered,
                poe,
                form,
            })
        }
        _ => {
            let mut missing = FieldErrors::default();
            missing.add(ItemField::Tipo.name(), REQUIRED_MESSAGE);
            Err(missing)
        }
    }
}
