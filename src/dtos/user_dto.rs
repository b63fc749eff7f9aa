use serde::{Deserialize, Serialize};

use crate::dtos::recipe_dto::RecipeShortDTO;
use crate::models::user;
use crate::utils::media_url;

/// Missing fields deserialize as empty strings and are rejected by the
/// service with a per-field message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserCreateDTO {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Response to registration; never carries the password
#[derive(Debug, Clone, Serialize)]
pub struct UserCreatedDTO {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserCreatedDTO {
    fn from(model: user::Model) -> Self {
        UserCreatedDTO {
            email: model.email,
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserDTO {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserDTO {
    pub fn from_model(model: &user::Model, is_subscribed: bool) -> Self {
        UserDTO {
            email: model.email.clone(),
            id: model.id,
            username: model.username.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            is_subscribed,
            avatar: model.avatar.as_deref().map(media_url),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDTO {
    #[serde(flatten)]
    pub user: UserDTO,
    pub recipes: Vec<RecipeShortDTO>,
    pub recipes_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenDTO {
    pub auth_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordDTO {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvatarDTO {
    pub avatar: Option<String>,
}
