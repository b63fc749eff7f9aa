pub mod connection_db;
pub mod database_service;
pub mod image_service;
pub mod ingredient_service;
pub mod logger_service;
pub mod membership_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod tag_service;
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support;
