pub mod auth_token;
pub mod favorite;
pub mod filter;
pub mod follow;
pub mod ingredient;
pub mod page;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod tag;
pub mod user;
