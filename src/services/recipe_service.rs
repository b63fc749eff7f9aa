//! Recipe aggregate: a recipe row together with its tag set and its
//! ingredient line items, always written as one unit inside a transaction.

use std::collections::{HashMap, HashSet};

use log::info;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::config::{MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT, RECIPE_MAX_LENGTH};
use crate::dtos::recipe_dto::{IngredientLine, RecipeDTO, RecipeWrite, ViewerFlags, to_read_model};
use crate::dtos::tag_dto::TagDTO;
use crate::dtos::user_dto::UserDTO;
use crate::error::{AppError, AppResult};
use crate::models::filter::RecipeFilter;
use crate::models::page::PageRequest;
use crate::models::{favorite, recipe, recipe_tag, shopping_cart, tag, user};
use crate::services::membership_service::{self, RecipeCollection};
use crate::services::{ingredient_service, tag_service, user_service};
use crate::utils::non_blank;

const REQUIRED: &str = "This field is required.";

/// Field values that passed validation, ready to be persisted
#[derive(Debug)]
struct ValidatedFields {
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
    image: Option<String>,
    tags: Vec<i32>,
    ingredients: Vec<IngredientLine>,
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = non_blank(name).ok_or_else(|| AppError::validation("name", "Recipe name may not be blank."))?;
    if name.chars().count() > RECIPE_MAX_LENGTH {
        return Err(AppError::validation(
            "name",
            format!("Ensure this field has no more than {RECIPE_MAX_LENGTH} characters."),
        ));
    }
    Ok(name)
}

fn validate_text(text: &str) -> AppResult<String> {
    non_blank(text).ok_or_else(|| AppError::validation("text", "Recipe description may not be blank."))
}

fn validate_cooking_time(cooking_time: i32) -> AppResult<i32> {
    if cooking_time < MIN_COOKING_TIME {
        return Err(AppError::validation(
            "cooking_time",
            format!("Cooking time must be at least {MIN_COOKING_TIME}."),
        ));
    }
    Ok(cooking_time)
}

fn validate_image(image: &str) -> AppResult<String> {
    non_blank(image).ok_or_else(|| AppError::validation("image", "Recipe image is required."))
}

fn validate_tags(tags: Option<Vec<i32>>) -> AppResult<Vec<i32>> {
    let tags = tags.ok_or_else(|| AppError::validation("tags", REQUIRED))?;
    if tags.is_empty() {
        return Err(AppError::validation("tags", "At least one tag is required."));
    }

    let unique: HashSet<i32> = tags.iter().copied().collect();
    if unique.len() != tags.len() {
        return Err(AppError::validation("tags", "Tags must not repeat."));
    }

    Ok(tags)
}

fn validate_ingredients(lines: Option<Vec<IngredientLine>>) -> AppResult<Vec<IngredientLine>> {
    let lines = lines.ok_or_else(|| AppError::validation("ingredients", REQUIRED))?;
    if lines.is_empty() {
        return Err(AppError::validation("ingredients", "At least one ingredient is required."));
    }

    let unique: HashSet<i32> = lines.iter().map(|l| l.ingredient_id).collect();
    if unique.len() != lines.len() {
        return Err(AppError::validation("ingredients", "Ingredients must not repeat."));
    }

    if lines.iter().any(|l| l.amount < MIN_INGREDIENT_AMOUNT) {
        return Err(AppError::validation(
            "ingredients",
            format!("Ingredient amount must be at least {MIN_INGREDIENT_AMOUNT}."),
        ));
    }

    Ok(lines)
}

/// Checks that every referenced tag and ingredient exists, inside the
/// caller's transaction
async fn check_references<C: ConnectionTrait>(db: &C, fields: &ValidatedFields) -> AppResult<()> {
    if let Some(id) = tag_service::first_missing(db, &fields.tags).await? {
        return Err(AppError::ReferenceNotFound { kind: "tag", id });
    }

    let ingredient_ids: Vec<i32> = fields.ingredients.iter().map(|l| l.ingredient_id).collect();
    if let Some(id) = ingredient_service::first_missing(db, &ingredient_ids).await? {
        return Err(AppError::validation(
            "ingredients",
            format!("Ingredient with id {id} does not exist."),
        ));
    }

    Ok(())
}

fn validate_for_create(input: RecipeWrite) -> AppResult<ValidatedFields> {
    let name = validate_name(input.name.as_deref().ok_or_else(|| AppError::validation("name", REQUIRED))?)?;
    let text = validate_text(input.text.as_deref().ok_or_else(|| AppError::validation("text", REQUIRED))?)?;
    let cooking_time =
        validate_cooking_time(input.cooking_time.ok_or_else(|| AppError::validation("cooking_time", REQUIRED))?)?;
    let image = validate_image(input.image.as_deref().unwrap_or_default())?;

    Ok(ValidatedFields {
        name: Some(name),
        text: Some(text),
        cooking_time: Some(cooking_time),
        image: Some(image),
        tags: validate_tags(input.tags)?,
        ingredients: validate_ingredients(input.ingredients)?,
    })
}

/// Partial update: scalar fields are optional, `tags` and `ingredients`
/// must always be sent. An image is only demanded when the stored recipe
/// has none.
fn validate_for_update(input: RecipeWrite, existing: &recipe::Model) -> AppResult<ValidatedFields> {
    let image = match input.image.as_deref() {
        Some(image) => Some(validate_image(image)?),
        None if existing.image.is_none() => return Err(AppError::validation("image", "Recipe image is required.")),
        None => None,
    };

    Ok(ValidatedFields {
        name: input.name.as_deref().map(validate_name).transpose()?,
        text: input.text.as_deref().map(validate_text).transpose()?,
        cooking_time: input.cooking_time.map(validate_cooking_time).transpose()?,
        image,
        tags: validate_tags(input.tags)?,
        ingredients: validate_ingredients(input.ingredients)?,
    })
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    author: &user::Model,
    input: RecipeWrite,
) -> AppResult<recipe::Model> {
    let fields = validate_for_create(input)?;

    let txn = db.begin().await?;

    check_references(&txn, &fields).await?;

    let new_recipe = recipe::ActiveModel {
        author_id: Set(author.id),
        name: Set(fields.name.clone().unwrap_or_default()),
        image: Set(fields.image.clone()),
        text: Set(fields.text.clone().unwrap_or_default()),
        cooking_time: Set(fields.cooking_time.unwrap_or(MIN_COOKING_TIME)),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let created = new_recipe.insert(&txn).await?;

    tag_service::update_tags(&txn, created.id, &fields.tags).await?;
    ingredient_service::replace_lines(&txn, created.id, &fields.ingredients).await?;

    txn.commit().await?;

    info!("Recipe {} created by user {}", created.id, author.id);
    Ok(created)
}

pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    caller: &user::Model,
    input: RecipeWrite,
) -> AppResult<recipe::Model> {
    let txn = db.begin().await?;

    let existing = recipe::Entity::find_by_id(recipe_id)
        .one(&txn)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "recipe", id: recipe_id })?;

    if existing.author_id != caller.id {
        return Err(AppError::Forbidden);
    }

    let fields = validate_for_update(input, &existing)?;
    check_references(&txn, &fields).await?;

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(name) = fields.name.clone() {
        active.name = Set(name);
    }
    if let Some(text) = fields.text.clone() {
        active.text = Set(text);
    }
    if let Some(cooking_time) = fields.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    if let Some(image) = fields.image.clone() {
        active.image = Set(Some(image));
    }
    let updated = active.update(&txn).await?;

    tag_service::update_tags(&txn, recipe_id, &fields.tags).await?;
    ingredient_service::replace_lines(&txn, recipe_id, &fields.ingredients).await?;

    txn.commit().await?;

    info!("Recipe {} updated by user {}", recipe_id, caller.id);
    Ok(updated)
}

/// Deletes a recipe owned by `caller`; line items, tag links and
/// memberships go with it. Returns the deleted row.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    caller: &user::Model,
) -> AppResult<recipe::Model> {
    let existing = find_by_id(db, recipe_id).await?;
    if existing.author_id != caller.id {
        return Err(AppError::Forbidden);
    }

    recipe::Entity::delete_by_id(recipe_id).exec(db).await?;

    info!("Recipe {} deleted by user {}", recipe_id, caller.id);
    Ok(existing)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<recipe::Model> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "recipe", id })
}

/// Newest recipes first, narrowed by `filter`
pub async fn find_all(
    db: &DatabaseConnection,
    filter: &RecipeFilter,
    page: PageRequest,
    viewer: Option<&user::Model>,
) -> AppResult<(Vec<recipe::Model>, u64)> {
    let mut query = recipe::Entity::find();

    if let Some(author) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author));
    }

    if !filter.tags.is_empty() {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .inner_join(
                        tag::Entity,
                        Expr::col((tag::Entity, tag::Column::Id))
                            .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
                    )
                    .and_where(tag::Column::Slug.is_in(filter.tags.clone()))
                    .to_owned(),
            ),
        );
    }

    if let Some(viewer) = viewer {
        if filter.is_favorited {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::RecipeId)
                        .from(favorite::Entity)
                        .and_where(favorite::Column::UserId.eq(viewer.id))
                        .to_owned(),
                ),
            );
        }
        if filter.is_in_shopping_cart {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(viewer.id))
                        .to_owned(),
                ),
            );
        }
    }

    let total_count = query.clone().count(db).await?;

    let recipes = query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .offset(page.offset()?)
        .limit(page.limit)
        .all(db)
        .await?;

    Ok((recipes, total_count))
}

/// Read projections for `recipes`, relative to `viewer`
pub async fn to_read_models(
    db: &DatabaseConnection,
    recipes: &[recipe::Model],
    viewer: Option<&user::Model>,
) -> AppResult<Vec<RecipeDTO>> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut tags = tag_service::get_tags_for_recipes(db, &recipe_ids).await?;
    let mut lines = ingredient_service::get_lines_for_recipes(db, &recipe_ids).await?;

    let author_ids: Vec<i32> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let followed = user_service::followed_among(db, viewer, &author_ids).await?;

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            membership_service::recipes_among(db, RecipeCollection::Favorites, viewer.id, &recipe_ids).await?,
            membership_service::recipes_among(db, RecipeCollection::ShoppingCart, viewer.id, &recipe_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    recipes
        .iter()
        .map(|recipe| -> AppResult<RecipeDTO> {
            let author = authors
                .get(&recipe.author_id)
                .ok_or(AppError::ObjectNotFound { kind: "user", id: recipe.author_id })?;

            Ok(to_read_model(
                recipe,
                UserDTO::from_model(author, followed.contains(&author.id)),
                tags.remove(&recipe.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(TagDTO::from)
                    .collect(),
                lines.remove(&recipe.id).unwrap_or_default(),
                ViewerFlags {
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                },
            ))
        })
        .collect()
}

pub async fn to_read_model_one(
    db: &DatabaseConnection,
    recipe: &recipe::Model,
    viewer: Option<&user::Model>,
) -> AppResult<RecipeDTO> {
    let mut models = to_read_models(db, std::slice::from_ref(recipe), viewer).await?;
    models
        .pop()
        .ok_or(AppError::ObjectNotFound { kind: "recipe", id: recipe.id })
}
