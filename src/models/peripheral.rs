//! Peripheral (detachable accessory) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::PeripheralStatus;
use super::item::non_blank;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Peripheral {
    pub id: i32,
    pub tipo: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    /// Unique when present
    pub identificador: Option<String>,
    pub status: PeripheralStatus,
    pub motivo_substituicao: Option<String>,
    pub date_registered: DateTime<Utc>,
    pub is_active: bool,
}

/// Create peripheral request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePeripheral {
    #[validate(length(min = 1, max = 50, message = "tipo is required (max 50 characters)"))]
    pub tipo: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub identificador: Option<String>,
    pub details: Option<String>,
}

impl CreatePeripheral {
    /// Blank identifiers are stored as NULL so they never collide on the unique index
    pub fn identificador(&self) -> Option<String> {
        non_blank(&self.identificador).map(str::to_string)
    }
}

/// Replace an attached peripheral by another one
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplacePeripheral {
    /// Peripheral taking the place of the replaced one
    pub replacement_id: i32,
    #[validate(length(min = 1, max = 255, message = "A replacement reason is required"))]
    pub motivo: String,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identificador_is_null() {
        let data = CreatePeripheral {
            tipo: "Mouse".to_string(),
            identificador: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(data.identificador(), None);
    }

    #[test]
    fn test_tipo_required() {
        let data = CreatePeripheral::default();
        assert!(data.validate().is_err());
    }
}
