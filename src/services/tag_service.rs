use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

use crate::error::{AppError, AppResult};
use crate::models::{recipe_tag, tag};

pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<tag::Model> {
    tag::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "tag", id })
}

/// First id in `tag_ids` with no matching tag row
pub async fn first_missing<C: ConnectionTrait>(db: &C, tag_ids: &[i32]) -> Result<Option<i32>, DbErr> {
    let existing: HashSet<i32> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(tag_ids.iter().copied().find(|id| !existing.contains(id)))
}

/// Tags of each recipe in `recipe_ids`, ordered by name
pub async fn get_tags_for_recipes<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<tag::Model>>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = recipe_tag::Entity::find()
        .select_only()
        .column(recipe_tag::Column::RecipeId)
        .column(tag::Column::Id)
        .column(tag::Column::Name)
        .column(tag::Column::Slug)
        .join(JoinType::InnerJoin, recipe_tag::Relation::Tag.def())
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(tag::Column::Name)
        .into_tuple::<(i32, i32, String, String)>()
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    for (recipe_id, id, name, slug) in rows {
        map.entry(recipe_id)
            .or_default()
            .push(tag::Model { id, name, slug });
    }

    Ok(map)
}

/// Replaces the whole tag set of a recipe
pub async fn update_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let links = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });

    recipe_tag::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;

    Ok(())
}
