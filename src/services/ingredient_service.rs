use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{info, warn};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::config::{INGREDIENT_MAX_LENGTH, MEASUREMENT_UNIT_MAX_LENGTH};
use crate::dtos::ingredient_dto::{IngredientImportDTO, RecipeIngredientDTO};
use crate::dtos::recipe_dto::IngredientLine;
use crate::error::{AppError, AppResult};
use crate::models::{ingredient, recipe_ingredient};

const LIKE_ESCAPE: char = '\\';

/// `LIKE` pattern matching values that start with `prefix` literally
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ingredients whose name starts with `name_prefix`, ignoring case,
/// ordered by name
pub async fn find_all<C: ConnectionTrait>(
    db: &C,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = ingredient::Entity::find();

    if let Some(prefix) = name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = like_prefix(&ingredient::search_name(prefix));
        query = query.filter(
            ingredient::Column::SearchName.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
        );
    }

    query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .all(db)
        .await
}

pub async fn create_ingredient<C: ConnectionTrait>(
    db: &C,
    name: &str,
    measurement_unit: &str,
) -> Result<ingredient::Model, DbErr> {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        search_name: Set(ingredient::search_name(name)),
        measurement_unit: Set(measurement_unit.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<ingredient::Model> {
    ingredient::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "ingredient", id })
}

/// First id in `ingredient_ids` with no matching ingredient row
pub async fn first_missing<C: ConnectionTrait>(
    db: &C,
    ingredient_ids: &[i32],
) -> Result<Option<i32>, DbErr> {
    let existing: HashSet<i32> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ingredient_ids.to_vec()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(ingredient_ids.iter().copied().find(|id| !existing.contains(id)))
}

/// Line items of each recipe in `recipe_ids`, ordered by ingredient name
pub async fn get_lines_for_recipes<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<RecipeIngredientDTO>>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = recipe_ingredient::Entity::find()
        .select_only()
        .column(recipe_ingredient::Column::RecipeId)
        .column(ingredient::Column::Id)
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column(recipe_ingredient::Column::Amount)
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(ingredient::Column::Name)
        .into_tuple::<(i32, i32, String, String, i32)>()
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<RecipeIngredientDTO>> = HashMap::new();
    for (recipe_id, id, name, measurement_unit, amount) in rows {
        map.entry(recipe_id).or_default().push(RecipeIngredientDTO {
            id,
            name,
            measurement_unit,
            amount,
        });
    }

    Ok(map)
}

/// Drops every line item of the recipe and bulk-inserts `lines`
pub async fn replace_lines<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    lines: &[IngredientLine],
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }

    let rows = lines.iter().map(|line| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(line.ingredient_id),
        amount: Set(line.amount),
        ..Default::default()
    });

    recipe_ingredient::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Loads a JSON array of `{name, measurement_unit}` into the reference
/// table. Existing pairs are skipped. Returns `(created, skipped)`.
pub async fn load_ingredients(db: &DatabaseConnection, path: &Path) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let rows: Vec<IngredientImportDTO> = serde_json::from_str(&content)?;

    let mut created = 0;
    let mut skipped = 0;

    for row in rows {
        let name = row.name.trim();
        let unit = row.measurement_unit.trim();

        if name.is_empty()
            || unit.is_empty()
            || name.chars().count() > INGREDIENT_MAX_LENGTH
            || unit.chars().count() > MEASUREMENT_UNIT_MAX_LENGTH
        {
            warn!("Skipping invalid ingredient row: {:?}", row);
            skipped += 1;
            continue;
        }

        let exists = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(name))
            .filter(ingredient::Column::MeasurementUnit.eq(unit))
            .one(db)
            .await?
            .is_some();

        if exists {
            skipped += 1;
            continue;
        }

        create_ingredient(db, name, unit).await?;
        created += 1;
    }

    info!("Ingredients loaded: {} created, {} skipped", created, skipped);
    Ok((created, skipped))
}
