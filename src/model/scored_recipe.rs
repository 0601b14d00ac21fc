use std::rc::Rc;

use super::Recipe;

/// A recipe with its match against the owned ingredients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRecipe {
    pub recipe: Rc<Recipe>,
    pub matching_required: usize,
    /// Match score; the ranking key.
    pub matching_all: usize,
    pub has_all_required: bool,
    pub match_percent: u8,
    pub is_favorite: bool,
}

impl ScoredRecipe {
    pub fn id(&self) -> u32 {
        self.recipe.id
    }

    /// Worth highlighting in the list once the majority of ingredients are on hand.
    pub fn is_strong_match(&self) -> bool {
        self.match_percent > 50
    }
}
