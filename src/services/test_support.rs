use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::dtos::user_dto::UserCreateDTO;
use crate::models::{ingredient, tag, user};
use crate::services::database_service::prepare_database;
use crate::services::{ingredient_service, user_service};

pub async fn test_db() -> DatabaseConnection {
    prepare_database("sqlite::memory:")
        .await
        .expect("in-memory database")
}

/// Registers `<username>@example.com` with password `secret123`
pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user_service::register(
        db,
        UserCreateDTO {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "secret123".to_string(),
        },
    )
    .await
    .expect("register user")
}

pub async fn create_ingredient(db: &DatabaseConnection, name: &str, unit: &str) -> ingredient::Model {
    ingredient_service::create_ingredient(db, name, unit)
        .await
        .expect("insert ingredient")
}

/// One of the tags seeded by the migrations
pub async fn seeded_tag(db: &DatabaseConnection, slug: &str) -> tag::Model {
    tag::Entity::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await
        .expect("query tag")
        .expect("seeded tag")
}
