use serde::{Deserialize, Serialize};

/// Coarse visual state of the food in the pan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CookingStage {
    #[default]
    Raw,
    Cooking,
    Done,
    Burnt,
}

impl CookingStage {
    pub fn id(&self) -> &'static str {
        match self {
            CookingStage::Raw => "raw",
            CookingStage::Cooking => "cooking",
            CookingStage::Done => "done",
            CookingStage::Burnt => "burnt",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CookingStage::Raw => "Raw",
            CookingStage::Cooking => "Cooking",
            CookingStage::Done => "Done",
            CookingStage::Burnt => "Burnt",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            CookingStage::Raw => "🥩",
            CookingStage::Cooking => "🍳",
            CookingStage::Done => "✅",
            CookingStage::Burnt => "🔥",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CookingStage::Raw => "Ingredients not yet cooked",
            CookingStage::Cooking => "Food is being cooked, color changing",
            CookingStage::Done => "Food is properly cooked, golden brown",
            CookingStage::Burnt => "Food is overcooked or burning",
        }
    }

    pub fn is_warning(&self) -> bool {
        *self == CookingStage::Burnt
    }
}
