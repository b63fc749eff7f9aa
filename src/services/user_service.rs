use std::collections::HashSet;

use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::config::{EMAIL_MAX_LENGTH, NAME_MAX_LENGTH, USERNAME_MAX_LENGTH};
use crate::dtos::user_dto::{UserCreateDTO, UserDTO};
use crate::error::{AppError, AppResult};
use crate::models::page::PageRequest;
use crate::models::{auth_token, follow, user};
use crate::utils::{hash_password, is_valid_username, non_blank, verify_password};

fn required(field: &str, value: &str, max_len: usize) -> AppResult<String> {
    let value = non_blank(value).ok_or_else(|| AppError::validation(field, "This field may not be blank."))?;
    if value.chars().count() > max_len {
        return Err(AppError::validation(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(value)
}

pub async fn register(db: &DatabaseConnection, dto: UserCreateDTO) -> AppResult<user::Model> {
    let email = required("email", &dto.email, EMAIL_MAX_LENGTH)?;
    let username = required("username", &dto.username, USERNAME_MAX_LENGTH)?;
    let first_name = required("first_name", &dto.first_name, NAME_MAX_LENGTH)?;
    let last_name = required("last_name", &dto.last_name, NAME_MAX_LENGTH)?;

    if !email.contains('@') {
        return Err(AppError::validation("email", "Enter a valid email address."));
    }
    if !is_valid_username(&username) {
        return Err(AppError::validation("username", "Username contains invalid characters."));
    }
    if dto.password.is_empty() {
        return Err(AppError::validation("password", "This field may not be blank."));
    }

    if user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
        .is_some()
    {
        return Err(AppError::validation("email", "A user with that email already exists."));
    }
    if user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await?
        .is_some()
    {
        return Err(AppError::validation("username", "A user with that username already exists."));
    }

    let new_user = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        first_name: Set(first_name),
        last_name: Set(last_name),
        password_hash: Set(hash_password(&dto.password)?),
        avatar: Set(None),
        ..Default::default()
    };

    let created = new_user.insert(db).await?;
    info!("Registered user {} ({})", created.username, created.id);
    Ok(created)
}

/// Returns the user's token, issuing one on first login
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> AppResult<String> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim()))
        .one(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    if let Some(existing) = auth_token::Entity::find()
        .filter(auth_token::Column::UserId.eq(user.id))
        .one(db)
        .await?
    {
        return Ok(existing.key);
    }

    let token = auth_token::ActiveModel {
        key: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(user.id),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };
    let token = token.insert(db).await?;

    info!("Issued token for user {}", user.id);
    Ok(token.key)
}

pub async fn logout(db: &DatabaseConnection, user: &user::Model) -> AppResult<()> {
    auth_token::Entity::delete_many()
        .filter(auth_token::Column::UserId.eq(user.id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn authenticate(db: &DatabaseConnection, token: &str) -> AppResult<user::Model> {
    let found = auth_token::Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    match found {
        Some((_, Some(user))) => Ok(user),
        _ => Err(AppError::Unauthorized),
    }
}

pub async fn set_password(
    db: &DatabaseConnection,
    user: &user::Model,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    if !verify_password(current_password, &user.password_hash) {
        return Err(AppError::validation("current_password", "Invalid password."));
    }
    if new_password.is_empty() {
        return Err(AppError::validation("new_password", "This field may not be blank."));
    }

    let mut active: user::ActiveModel = user.clone().into();
    active.password_hash = Set(hash_password(new_password)?);
    active.update(db).await?;

    Ok(())
}

/// Stores a new avatar reference (or clears it) and returns the previous one
pub async fn set_avatar(
    db: &DatabaseConnection,
    user: &user::Model,
    avatar: Option<String>,
) -> AppResult<(user::Model, Option<String>)> {
    let previous = user.avatar.clone();
    let mut active: user::ActiveModel = user.clone().into();
    active.avatar = Set(avatar);
    let updated = active.update(db).await?;
    Ok((updated, previous))
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::ObjectNotFound { kind: "user", id })
}

pub async fn list_users(
    db: &DatabaseConnection,
    page: PageRequest,
) -> AppResult<(Vec<user::Model>, u64)> {
    let query = user::Entity::find().order_by_asc(user::Column::Id);
    let count = query.clone().count(db).await?;
    let users = query.offset(page.offset()?).limit(page.limit).all(db).await?;
    Ok((users, count))
}

/// Ids among `author_ids` that `viewer` follows
pub async fn followed_among(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    author_ids: &[i32],
) -> AppResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids = follow::Entity::find()
        .select_only()
        .column(follow::Column::AuthorId)
        .filter(follow::Column::UserId.eq(viewer.id))
        .filter(follow::Column::AuthorId.is_in(author_ids.to_vec()))
        .into_tuple::<i32>()
        .all(db)
        .await?;

    Ok(ids.into_iter().collect())
}

pub async fn to_user_dto(
    db: &DatabaseConnection,
    user: &user::Model,
    viewer: Option<&user::Model>,
) -> AppResult<UserDTO> {
    let followed = followed_among(db, viewer, &[user.id]).await?;
    Ok(UserDTO::from_model(user, followed.contains(&user.id)))
}

pub async fn to_user_dtos(
    db: &DatabaseConnection,
    users: &[user::Model],
    viewer: Option<&user::Model>,
) -> AppResult<Vec<UserDTO>> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_among(db, viewer, &ids).await?;

    Ok(users
        .iter()
        .map(|u| UserDTO::from_model(u, followed.contains(&u.id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{create_user, test_db};

    fn dto(email: &str, username: &str) -> UserCreateDTO {
        UserCreateDTO {
            email: email.into(),
            username: username.into(),
            first_name: "Anna".into(),
            last_name: "Cook".into(),
            password: "secret123".into(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_and_username() {
        let db = test_db().await;
        register(&db, dto("anna@example.com", "anna")).await.expect("first user");

        let err = register(&db, dto("anna@example.com", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { ref field, .. } if field == "email"));

        let err = register(&db, dto("other@example.com", "anna")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn register_rejects_bad_username() {
        let db = test_db().await;
        let err = register(&db, dto("x@example.com", "no spaces")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn login_issues_stable_token_and_logout_revokes_it() {
        let db = test_db().await;
        let user = create_user(&db, "anna").await;

        assert!(user.password_hash.starts_with("$argon2id$"));
        let token = login(&db, &user.email, "secret123").await.expect("login");
        assert_eq!(login(&db, &user.email, "secret123").await.expect("again"), token);
        assert_eq!(authenticate(&db, &token).await.expect("auth").id, user.id);

        logout(&db, &user).await.expect("logout");
        assert!(matches!(authenticate(&db, &token).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let db = test_db().await;
        let user = create_user(&db, "anna").await;
        let err = login(&db, &user.email, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn set_password_requires_current_one() {
        let db = test_db().await;
        let user = create_user(&db, "anna").await;

        let err = set_password(&db, &user, "wrong", "new-secret").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { .. }));

        set_password(&db, &user, "secret123", "new-secret").await.expect("changed");
        assert!(login(&db, &user.email, "new-secret").await.is_ok());
        assert!(login(&db, &user.email, "secret123").await.is_err());
    }
}
