use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

use crate::error::{AppError, AppResult};
use crate::models::{ingredient, recipe_ingredient, shopping_cart};

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";

/// One merged line of the shopping list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sums the line items of every recipe in the user's cart, grouped by
/// ingredient name and unit, ordered by name
pub async fn aggregate(db: &DatabaseConnection, user_id: i32) -> AppResult<Vec<ShoppingListItem>> {
    let in_cart = shopping_cart::Entity::find()
        .filter(shopping_cart::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if in_cart == 0 {
        return Err(AppError::EmptyCollection("shopping cart"));
    }

    let rows = recipe_ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column_as(Expr::col((recipe_ingredient::Entity, recipe_ingredient::Column::Amount)).sum(), "total")
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(
            recipe_ingredient::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .into_tuple::<(String, String, i64)>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect())
}

pub fn render(items: &[ShoppingListItem]) -> String {
    let mut out = format!("{SHOPPING_LIST_HEADER}\n\n");
    for item in items {
        out.push_str(&format!("• {} ({}) — {}\n", item.name, item.measurement_unit, item.amount));
    }
    out
}

pub async fn render_shopping_list(db: &DatabaseConnection, user_id: i32) -> AppResult<String> {
    let items = aggregate(db, user_id).await?;
    Ok(render(&items))
}
