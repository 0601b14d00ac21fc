use super::{Cuisine, DietaryTag, Recipe};

/// Filter chip selection for the recommendation list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecipeFilter {
    #[default]
    All,
    Cuisine(Cuisine),
    Tag(DietaryTag),
    /// A label that is neither a cuisine nor a tag; matches nothing.
    Unknown(String),
}

impl RecipeFilter {
    pub fn parse(label: &str) -> RecipeFilter {
        let label = label.trim().to_lowercase();
        if label.is_empty() || label == "all" {
            return RecipeFilter::All;
        }
        if let Some(cuisine) = Cuisine::from_id(&label) {
            return RecipeFilter::Cuisine(cuisine);
        }
        if let Some(tag) = DietaryTag::from_id(&label) {
            return RecipeFilter::Tag(tag);
        }
        RecipeFilter::Unknown(label)
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            RecipeFilter::All => true,
            RecipeFilter::Cuisine(cuisine) => recipe.cuisine == *cuisine,
            RecipeFilter::Tag(tag) => recipe.has_tag(*tag),
            RecipeFilter::Unknown(_) => false,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RecipeFilter::All => "all",
            RecipeFilter::Cuisine(cuisine) => cuisine.id(),
            RecipeFilter::Tag(tag) => tag.id(),
            RecipeFilter::Unknown(label) => label,
        }
    }
}
