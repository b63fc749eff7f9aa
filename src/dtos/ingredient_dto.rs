use serde::{Deserialize, Serialize};

use crate::models::ingredient;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngredientDTO {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientDTO {
    fn from(model: ingredient::Model) -> Self {
        IngredientDTO {
            id: model.id,
            name: model.name,
            measurement_unit: model.measurement_unit,
        }
    }
}

/// Row of the bulk-load file: `[{"name": "...", "measurement_unit": "..."}]`
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientImportDTO {
    pub name: String,
    pub measurement_unit: String,
}

/// Ingredient as listed inside a recipe
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeIngredientDTO {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Ingredient line as submitted when writing a recipe
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct IngredientLineDTO {
    pub id: i32,
    pub amount: i32,
}
