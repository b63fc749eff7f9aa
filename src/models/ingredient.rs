use sea_orm::entity::prelude::*;

/// Reference data; `(name, measurement_unit)` is unique. `search_name` is
/// the lowercased name the prefix search runs against.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub search_name: String,
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Case-folded form of an ingredient name. SQLite `LIKE` only folds ASCII,
/// so the folding happens here instead.
pub fn search_name(name: &str) -> String {
    name.to_lowercase()
}
