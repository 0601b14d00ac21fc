use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::rc::Rc;

use crate::model::{Recipe, RecipeFilter, ScoredRecipe};

/// Asymmetric substring rule: an owned "cherry tomato" covers a recipe's "tomato".
/// This also lets "popcorn" cover "corn".
pub fn is_covered<S: AsRef<str>>(ingredient: &str, owned: &[S]) -> bool {
    let ingredient = ingredient.to_lowercase();
    owned
        .iter()
        .any(|have| have.as_ref().to_lowercase().contains(&ingredient))
}

fn count_covered<S: AsRef<str>>(ingredients: &[String], owned: &[S]) -> usize {
    ingredients
        .iter()
        .filter(|ingredient| is_covered(ingredient, owned))
        .count()
}

fn matches_search(recipe: &Recipe, search: &str) -> bool {
    search.is_empty()
        || recipe.name.to_lowercase().contains(search)
        || recipe
            .ingredients
            .iter()
            .any(|ingredient| ingredient.to_lowercase().contains(search))
}

pub fn score<S: AsRef<str>>(recipe: &Rc<Recipe>, owned: &[S]) -> ScoredRecipe {
    let matching_required = count_covered(&recipe.required_ingredients, owned);
    let matching_all = count_covered(&recipe.ingredients, owned);
    let match_percent = if recipe.ingredients.is_empty() {
        0
    } else {
        (100.0 * matching_all as f64 / recipe.ingredients.len() as f64).round() as u8
    };

    ScoredRecipe {
        recipe: Rc::clone(recipe),
        matching_required,
        matching_all,
        has_all_required: matching_required == recipe.required_ingredients.len(),
        match_percent,
        is_favorite: false,
    }
}

/// Filter, then score and order by match count. Ties keep catalog order.
pub fn rank<S: AsRef<str>>(
    recipes: &[Rc<Recipe>],
    owned: &[S],
    filter: &RecipeFilter,
    search: &str,
) -> Vec<ScoredRecipe> {
    let search = search.trim().to_lowercase();
    recipes
        .iter()
        .filter(|recipe| filter.matches(recipe))
        .filter(|recipe| matches_search(recipe, &search))
        .map(|recipe| score(recipe, owned))
        .sorted_by_key(|scored| Reverse(scored.matching_all))
        .collect()
}

/// Same as `rank`, flagging favorites for display.
pub fn rank_with_favorites<S: AsRef<str>>(
    recipes: &[Rc<Recipe>],
    owned: &[S],
    filter: &RecipeFilter,
    search: &str,
    favorites: &HashSet<u32>,
) -> Vec<ScoredRecipe> {
    let mut ranked = rank(recipes, owned, filter, search);
    for scored in &mut ranked {
        scored.is_favorite = favorites.contains(&scored.recipe.id);
    }
    ranked
}

/// Ingredients of `recipe` not covered by anything owned, in recipe order.
pub fn shopping_list<S: AsRef<str>>(recipe: &Recipe, owned: &[S]) -> Vec<String> {
    recipe
        .ingredients
        .iter()
        .filter(|ingredient| !is_covered(ingredient, owned))
        .cloned()
        .collect()
}
