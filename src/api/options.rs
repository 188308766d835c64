//! Choice lists used by client forms

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::enums::{
        EquipmentType, ItemStatus, Operation, PeripheralStatus, Poe, CENTER_COSTS, REVENDAS,
    },
    validation,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TypeRules {
    pub tipo: EquipmentType,
    /// Fields required for this type on top of the common ones
    pub required_fields: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptionsResponse {
    pub tipos: Vec<TypeRules>,
    pub revendas: Vec<String>,
    pub center_costs: Vec<String>,
    pub poe: Vec<Poe>,
    pub item_statuses: Vec<ItemStatus>,
    pub peripheral_statuses: Vec<PeripheralStatus>,
    pub operations: Vec<Operation>,
}

pub fn build_options() -> OptionsResponse {
    let tipos = EquipmentType::ALL
        .iter()
        .map(|tipo| TypeRules {
            tipo: *tipo,
            required_fields: validation::required_fields(*tipo)
                .iter()
                .map(|(field, _)| field.name().to_string())
                .collect(),
        })
        .collect();

    OptionsResponse {
        tipos,
        revendas: REVENDAS.iter().map(|r| r.to_string()).collect(),
        center_costs: CENTER_COSTS.iter().map(|c| c.to_string()).collect(),
        poe: Poe::ALL.to_vec(),
        item_statuses: ItemStatus::ALL.to_vec(),
        peripheral_statuses: PeripheralStatus::ALL.to_vec(),
        operations: Operation::ALL.to_vec(),
    }
}

/// Choice lists and per-type required fields
#[utoipa::path(
    get,
    path = "/options",
    tag = "options",
    responses(
        (status = 200, description = "Choice lists", body = OptionsResponse)
    )
)]
pub async fn get_options() -> Json<OptionsResponse> {
    Json(build_options())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_cover_every_choice() {
        let options = build_options();
        assert_eq!(options.tipos.len(), EquipmentType::ALL.len());
        assert_eq!(options.revendas.len(), 7);
        assert_eq!(options.center_costs.len(), 6);

        let hd = options
            .tipos
            .iter()
            .find(|rules| rules.tipo == EquipmentType::Hd)
            .unwrap();
        assert_eq!(hd.required_fields, vec!["storage"]);
    }

    #[test]
    fn test_options_serialize_labels() {
        let json = serde_json::to_value(build_options()).unwrap();
        assert_eq!(json["tipos"][8]["tipo"], "Access Point");
        assert!(json["item_statuses"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("Pendente Devolução")));
    }
}
