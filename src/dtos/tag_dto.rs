use serde::Serialize;

use crate::models::tag;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct TagDTO {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagDTO {
    fn from(model: tag::Model) -> Self {
        TagDTO {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}
