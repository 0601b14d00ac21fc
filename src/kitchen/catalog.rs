use log::info;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

use crate::model::{Cuisine, DietaryTag, IngredientInfo, Recipe};

const BUILTIN_RECIPES: &str = include_str!("../../data/recipes.json");
const BUILTIN_INGREDIENTS: &str = include_str!("../../data/ingredients.json");

/// Recipes at or under this many minutes count as quick.
pub const QUICK_RECIPE_MINUTES: u32 = 15;
pub const FALLBACK_INGREDIENT_EMOJI: &str = "🥗";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("recipe id {0} appears more than once")]
    DuplicateId(u32),
    #[error("recipe {0} has no steps")]
    NoSteps(u32),
    #[error("recipe {0} needs a positive id and cooking time")]
    NotPositive(u32),
    #[error("recipe {id} requires {ingredient:?} which is not among its ingredients")]
    RequiredNotListed { id: u32, ingredient: String },
}

/// Read-only recipe corpus, in catalog order.
#[derive(Debug, Clone)]
pub struct RecipeCatalog {
    recipes: Vec<Rc<Recipe>>,
}

impl RecipeCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog = Self::from_json(BUILTIN_RECIPES)?;
        info!(target: "catalog", "Recipe database loaded: {} recipes", catalog.len());
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let recipes: Vec<Recipe> = serde_json::from_str(json)?;
        Self::new(recipes)
    }

    pub fn new(recipes: Vec<Recipe>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for recipe in &recipes {
            if !seen.insert(recipe.id) {
                return Err(CatalogError::DuplicateId(recipe.id));
            }
            if recipe.steps.is_empty() {
                return Err(CatalogError::NoSteps(recipe.id));
            }
            if recipe.id == 0 || recipe.time == 0 {
                return Err(CatalogError::NotPositive(recipe.id));
            }
            if let Some(missing) = recipe
                .required_ingredients
                .iter()
                .find(|required| !recipe.ingredients.contains(required))
            {
                return Err(CatalogError::RequiredNotListed {
                    id: recipe.id,
                    ingredient: missing.clone(),
                });
            }
        }
        Ok(Self {
            recipes: recipes.into_iter().map(Rc::new).collect(),
        })
    }

    pub fn all(&self) -> &[Rc<Recipe>] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn by_id(&self, id: u32) -> Option<Rc<Recipe>> {
        self.recipes.iter().find(|r| r.id == id).cloned()
    }

    pub fn by_cuisine(&self, cuisine: Cuisine) -> Vec<Rc<Recipe>> {
        self.recipes
            .iter()
            .filter(|r| r.cuisine == cuisine)
            .cloned()
            .collect()
    }

    pub fn by_tag(&self, tag: DietaryTag) -> Vec<Rc<Recipe>> {
        self.recipes
            .iter()
            .filter(|r| r.has_tag(tag))
            .cloned()
            .collect()
    }

    pub fn quick(&self) -> Vec<Rc<Recipe>> {
        self.recipes
            .iter()
            .filter(|r| r.time <= QUICK_RECIPE_MINUTES)
            .cloned()
            .collect()
    }
}

/// Known ingredient names and their display metadata.
#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    entries: Vec<IngredientInfo>,
}

impl IngredientCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_INGREDIENTS)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            entries: serde_json::from_str(json)?,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&IngredientInfo> {
        self.entries.iter().find(|info| info.answers_to(name))
    }

    pub fn emoji_for(&self, name: &str) -> &str {
        self.lookup(name)
            .map(|info| info.emoji.as_str())
            .unwrap_or(FALLBACK_INGREDIENT_EMOJI)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
