use serde::{Deserialize, Serialize};

use crate::dtos::ingredient_dto::{IngredientLineDTO, RecipeIngredientDTO};
use crate::dtos::tag_dto::TagDTO;
use crate::dtos::user_dto::UserDTO;
use crate::models::recipe;
use crate::utils::media_url;

/// Recipe body as it arrives over HTTP. Every field is optional so that
/// "absent" can be told apart from "present but empty".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Option<Vec<IngredientLineDTO>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientLine {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Input of the recipe writer. `None` means the field was not sent;
/// `image` is the already stored file reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeWrite {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientLine>>,
}

/// Projects a request body onto the writer input. `stored_image` replaces
/// the raw upload once the storage layer has accepted it.
pub fn to_write_model(payload: RecipePayload, stored_image: Option<String>) -> RecipeWrite {
    RecipeWrite {
        name: payload.name,
        text: payload.text,
        cooking_time: payload.cooking_time,
        image: stored_image,
        tags: payload.tags,
        ingredients: payload.ingredients.map(|lines| {
            lines
                .into_iter()
                .map(|line| IngredientLine {
                    ingredient_id: line.id,
                    amount: line.amount,
                })
                .collect()
        }),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeDTO {
    pub id: i32,
    pub tags: Vec<TagDTO>,
    pub author: UserDTO,
    pub ingredients: Vec<RecipeIngredientDTO>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

/// Viewer-relative flags of a recipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerFlags {
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Builds the read projection. Tags and ingredients are displayed by name,
/// whatever order they were submitted in.
pub fn to_read_model(
    model: &recipe::Model,
    author: UserDTO,
    mut tags: Vec<TagDTO>,
    mut ingredients: Vec<RecipeIngredientDTO>,
    flags: ViewerFlags,
) -> RecipeDTO {
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    ingredients.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });

    RecipeDTO {
        id: model.id,
        tags,
        author,
        ingredients,
        is_favorited: flags.is_favorited,
        is_in_shopping_cart: flags.is_in_shopping_cart,
        name: model.name.clone(),
        image: model.image.as_deref().map(media_url),
        text: model.text.clone(),
        cooking_time: model.cooking_time,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeShortDTO {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<&recipe::Model> for RecipeShortDTO {
    fn from(model: &recipe::Model) -> Self {
        RecipeShortDTO {
            id: model.id,
            name: model.name.clone(),
            image: model.image.as_deref().map(media_url),
            cooking_time: model.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortLinkDTO {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
