//! Shared domain enums and choice lists.
//!
//! Every enum here is stored as its display label (TEXT column) and travels
//! over JSON with the same label, so `"Access Point"` or `"Pendente Devolução"`
//! round-trip unchanged between the database, the API and the audit log.

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgTypeInfo, Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Declares a label-backed enum with `as_str`, `FromStr`, `Display`, `ALL`
/// and TEXT (de)serialization for sqlx.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

labeled_enum! {
    /// Equipment type (`tipo`), drives the conditional validation rules
    pub enum EquipmentType {
        Celular => "Celular",
        Notebook => "Notebook",
        Desktop => "Desktop",
        Impressora => "Impressora",
        Tablet => "Tablet",
        Switch => "Switch",
        Hd => "HD",
        Nobreak => "Nobreak",
        AccessPoint => "Access Point",
    }
}

labeled_enum! {
    /// Lending state of an item
    pub enum ItemStatus {
        Disponivel => "Disponível",
        Indisponivel => "Indisponível",
        Pendente => "Pendente",
        PendenteDevolucao => "Pendente Devolução",
    }
}

labeled_enum! {
    /// Peripheral usage state
    pub enum PeripheralStatus {
        Disponivel => "Disponível",
        EmUso => "Em Uso",
        Substituido => "Substituido",
    }
}

labeled_enum! {
    /// Kind of operation recorded in the history log
    pub enum Operation {
        Cadastro => "Cadastro",
        Emprestimo => "Empréstimo",
        Devolucao => "Devolução",
        Edicao => "Edição",
        Exclusao => "Exclusão",
        Estorno => "Estorno",
        ConfirmacaoEmprestimo => "Confirmação Empréstimo",
        ConfirmacaoDevolucao => "Confirmação Devolução",
        CadastroPeriferico => "Cadastro Periférico",
        VinculoPeriferico => "Vínculo Periférico",
        DesvinculoPeriferico => "Desvínculo Periférico",
        SubstituicaoPeriferico => "Substituição Periférico",
    }
}

labeled_enum! {
    /// Power over Ethernet support (switches)
    pub enum Poe {
        Sim => "Sim",
        Nao => "Não",
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Disponivel
    }
}

impl Default for PeripheralStatus {
    fn default() -> Self {
        PeripheralStatus::Disponivel
    }
}

/// Branches (`revenda`) an item can belong to
pub const REVENDAS: &[&str] = &[
    "Revalle Juazeiro",
    "Revalle Bonfim",
    "Revalle Petrolina",
    "Revalle Ribeira",
    "Revalle Paulo Afonso",
    "Revalle Alagoinhas",
    "Revalle Serrinha",
];

/// Cost centers recorded on loans
pub const CENTER_COSTS: &[&str] = &[
    "101 - Puxada",
    "202 - Armazém",
    "301 - Administrativo",
    "401 - Vendas",
    "501 - Entrega",
    "601 - CSC",
];
