use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CookingStage, Difficulty};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Cuisine {
    Indian,
    Chinese,
    Italian,
    Continental,
    Mexican,
}

impl Cuisine {
    pub fn all() -> [Cuisine; 5] {
        [
            Cuisine::Indian,
            Cuisine::Chinese,
            Cuisine::Italian,
            Cuisine::Continental,
            Cuisine::Mexican,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Cuisine::Indian => "indian",
            Cuisine::Chinese => "chinese",
            Cuisine::Italian => "italian",
            Cuisine::Continental => "continental",
            Cuisine::Mexican => "mexican",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cuisine::Indian => "Indian",
            Cuisine::Chinese => "Chinese",
            Cuisine::Italian => "Italian",
            Cuisine::Continental => "Continental",
            Cuisine::Mexican => "Mexican",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Cuisine::Indian => "🇮🇳",
            Cuisine::Chinese => "🥡",
            Cuisine::Italian => "🇮🇹",
            Cuisine::Continental => "🍽️",
            Cuisine::Mexican => "🌮",
        }
    }

    pub fn from_id(id: &str) -> Option<Cuisine> {
        Cuisine::all().into_iter().find(|c| c.id() == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryTag {
    Vegan,
    Vegetarian,
    NonVeg,
    GlutenFree,
    Keto,
    Quick,
}

impl DietaryTag {
    pub fn all() -> [DietaryTag; 6] {
        [
            DietaryTag::Vegan,
            DietaryTag::Vegetarian,
            DietaryTag::NonVeg,
            DietaryTag::GlutenFree,
            DietaryTag::Keto,
            DietaryTag::Quick,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            DietaryTag::Vegan => "vegan",
            DietaryTag::Vegetarian => "vegetarian",
            DietaryTag::NonVeg => "non-veg",
            DietaryTag::GlutenFree => "gluten-free",
            DietaryTag::Keto => "keto",
            DietaryTag::Quick => "quick",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DietaryTag::Vegan => "Vegan",
            DietaryTag::Vegetarian => "Vegetarian",
            DietaryTag::NonVeg => "Non-Veg",
            DietaryTag::GlutenFree => "Gluten-Free",
            DietaryTag::Keto => "Keto",
            DietaryTag::Quick => "Quick",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            DietaryTag::Vegan => "🌱",
            DietaryTag::Vegetarian => "🥗",
            DietaryTag::NonVeg => "🍖",
            DietaryTag::GlutenFree => "🌾",
            DietaryTag::Keto => "🥑",
            DietaryTag::Quick => "⚡",
        }
    }

    pub fn from_id(id: &str) -> Option<DietaryTag> {
        DietaryTag::all().into_iter().find(|t| t.id() == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Nutrition {
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

/// One instruction. `time` is the suggested duration in seconds; 0 means no timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub text: String,
    pub time: u32,
    pub stage: CookingStage,
}

impl Step {
    pub fn has_timer(&self) -> bool {
        self.time > 0
    }
}

/// Immutable catalog entry. Shared as `Rc<Recipe>` once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipe {
    pub id: u32,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub tags: BTreeSet<DietaryTag>,
    pub difficulty: Difficulty,
    /// Expected total minutes.
    pub time: u32,
    pub servings: u32,
    pub calories: u32,
    pub ingredients: Vec<String>,
    pub required_ingredients: Vec<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn has_tag(&self, tag: DietaryTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn expected_seconds(&self) -> u64 {
        u64::from(self.time) * 60
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        id: u32,
        name: &str,
        ingredients: &[&str],
        required_ingredients: &[&str],
        steps: Vec<Step>,
    ) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            emoji: "🍽️".to_string(),
            description: String::new(),
            cuisine: Cuisine::Continental,
            tags: BTreeSet::new(),
            difficulty: Difficulty::Easy,
            time: 10,
            servings: 1,
            calories: 100,
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            required_ingredients: required_ingredients.iter().map(|s| s.to_string()).collect(),
            nutrition: Nutrition::default(),
            steps,
        }
    }
}

#[cfg(test)]
impl Step {
    pub(crate) fn timed(text: &str, time: u32, stage: CookingStage) -> Step {
        Step {
            text: text.to_string(),
            time,
            stage,
        }
    }
}
