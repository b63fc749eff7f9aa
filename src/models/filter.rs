/// Listing filter for recipes. `is_favorited` and `is_in_shopping_cart`
/// only narrow the result for an authenticated viewer.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percent-encoded query string that reproduces this filter, used for
    /// page links
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        if let Some(author) = self.author {
            query.append_pair("author", &author.to_string());
        }
        for tag in &self.tags {
            query.append_pair("tags", tag);
        }
        if self.is_favorited {
            query.append_pair("is_favorited", "1");
        }
        if self.is_in_shopping_cart {
            query.append_pair("is_in_shopping_cart", "1");
        }

        query.finish()
    }
}
