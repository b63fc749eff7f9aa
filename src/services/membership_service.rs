use std::collections::HashSet;

use log::info;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::dtos::recipe_dto::RecipeShortDTO;
use crate::dtos::user_dto::{SubscriptionDTO, UserDTO};
use crate::error::{AppError, AppResult};
use crate::models::page::PageRequest;
use crate::models::{favorite, follow, recipe, shopping_cart, user};
use crate::services::recipe_service;

/// Per-user recipe sets with add/remove toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    pub fn label(&self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "favorite",
            RecipeCollection::ShoppingCart => "shopping cart entry",
        }
    }
}

pub async fn contains(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> AppResult<bool> {
    let found = match collection {
        RecipeCollection::Favorites => favorite::Entity::find_by_id((user_id, recipe_id))
            .one(db)
            .await?
            .is_some(),
        RecipeCollection::ShoppingCart => shopping_cart::Entity::find_by_id((user_id, recipe_id))
            .one(db)
            .await?
            .is_some(),
    };
    Ok(found)
}

/// Ids among `recipe_ids` that are in the user's collection
pub async fn recipes_among(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_ids: &[i32],
) -> AppResult<HashSet<i32>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = match collection {
        RecipeCollection::Favorites => {
            favorite::Entity::find()
                .select_only()
                .column(favorite::Column::RecipeId)
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.to_vec()))
                .into_tuple()
                .all(db)
                .await?
        }
        RecipeCollection::ShoppingCart => {
            shopping_cart::Entity::find()
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
                .into_tuple()
                .all(db)
                .await?
        }
    };

    Ok(ids.into_iter().collect())
}

/// absent -> present. A repeat add is rejected with `AlreadyExists`, also
/// when a concurrent add wins the race on the primary key.
pub async fn add_recipe(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> AppResult<recipe::Model> {
    let recipe = recipe_service::find_by_id(db, recipe_id).await?;

    if contains(db, collection, user_id, recipe_id).await? {
        return Err(AppError::AlreadyExists(collection.label()));
    }

    let inserted = match collection {
        RecipeCollection::Favorites => {
            favorite::Entity::insert(favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            })
            .exec_without_returning(db)
            .await
        }
        RecipeCollection::ShoppingCart => {
            shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            })
            .exec_without_returning(db)
            .await
        }
    };
    inserted.map_err(|e| AppError::from_insert(e, collection.label()))?;

    info!("User {} added recipe {} to {:?}", user_id, recipe_id, collection);
    Ok(recipe)
}

/// present -> absent, as a hard delete
pub async fn remove_recipe(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> AppResult<()> {
    recipe_service::find_by_id(db, recipe_id).await?;

    let result = match collection {
        RecipeCollection::Favorites => {
            favorite::Entity::delete_by_id((user_id, recipe_id)).exec(db).await?
        }
        RecipeCollection::ShoppingCart => {
            shopping_cart::Entity::delete_by_id((user_id, recipe_id)).exec(db).await?
        }
    };

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(collection.label()));
    }

    info!("User {} removed recipe {} from {:?}", user_id, recipe_id, collection);
    Ok(())
}

pub async fn follow_author(
    db: &DatabaseConnection,
    follower: &user::Model,
    author_id: i32,
) -> AppResult<user::Model> {
    if follower.id == author_id {
        return Err(AppError::SelfReferenceNotAllowed);
    }

    let author = user::Entity::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "user", id: author_id })?;

    if follow::Entity::find_by_id((follower.id, author_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("subscription"));
    }

    follow::Entity::insert(follow::ActiveModel {
        user_id: Set(follower.id),
        author_id: Set(author_id),
    })
    .exec_without_returning(db)
    .await
    .map_err(|e| AppError::from_insert(e, "subscription"))?;

    info!("User {} now follows {}", follower.id, author_id);
    Ok(author)
}

pub async fn unfollow_author(db: &DatabaseConnection, follower: &user::Model, author_id: i32) -> AppResult<()> {
    if follower.id == author_id {
        return Err(AppError::SelfReferenceNotAllowed);
    }

    user::Entity::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "user", id: author_id })?;

    let result = follow::Entity::delete_by_id((follower.id, author_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("subscription"));
    }

    info!("User {} unfollowed {}", follower.id, author_id);
    Ok(())
}

/// Subscription card of one author: profile, newest recipes (up to
/// `recipes_limit`) and the total recipe count
pub async fn subscription_card(
    db: &DatabaseConnection,
    author: &user::Model,
    is_subscribed: bool,
    recipes_limit: Option<u64>,
) -> AppResult<SubscriptionDTO> {
    let query = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id);

    let recipes_count = query.clone().count(db).await?;
    let recipes = match recipes_limit {
        Some(limit) => query.limit(limit).all(db).await?,
        None => query.all(db).await?,
    };

    Ok(SubscriptionDTO {
        user: UserDTO::from_model(author, is_subscribed),
        recipes: recipes.iter().map(RecipeShortDTO::from).collect(),
        recipes_count,
    })
}

/// Authors `follower` follows, ordered by username
pub async fn subscriptions(
    db: &DatabaseConnection,
    follower: &user::Model,
    page: PageRequest,
    recipes_limit: Option<u64>,
) -> AppResult<(Vec<SubscriptionDTO>, u64)> {
    let author_ids: Vec<i32> = follow::Entity::find()
        .select_only()
        .column(follow::Column::AuthorId)
        .filter(follow::Column::UserId.eq(follower.id))
        .into_tuple()
        .all(db)
        .await?;

    let query = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .order_by_asc(user::Column::Username);

    let count = query.clone().count(db).await?;
    let authors = query.offset(page.offset()?).limit(page.limit).all(db).await?;

    let mut cards = Vec::with_capacity(authors.len());
    for author in &authors {
        cards.push(subscription_card(db, author, true, recipes_limit).await?);
    }

    Ok((cards, count))
}
