pub mod ingredient_dto;
pub mod recipe_dto;
pub mod tag_dto;
pub mod user_dto;
