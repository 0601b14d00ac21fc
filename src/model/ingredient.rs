use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Vegetable,
    Fruit,
    Protein,
    Grain,
    Dairy,
    Spice,
    Other,
}

/// Display metadata for a known ingredient name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngredientInfo {
    pub name: String,
    pub emoji: String,
    pub category: IngredientCategory,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl IngredientInfo {
    /// Case-insensitive match against the name or any alias.
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.name == name || self.aliases.iter().any(|alias| *alias == name)
    }
}
