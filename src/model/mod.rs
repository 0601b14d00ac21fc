mod achievement;
mod color_summary;
mod cooking_stats;
mod difficulty;
mod engine_command;
mod engine_event;
mod ingredient;
mod notification;
mod quick_action;
mod recipe;
mod recipe_filter;
mod scored_recipe;
mod sound_cue;
mod stage;

pub use achievement::Achievement;
pub use color_summary::ColorSummary;
pub use cooking_stats::{CookingStats, HistoryEntry};
pub use difficulty::Difficulty;
pub use engine_command::{EngineCommand, TimerCommand};
pub use engine_event::{DetectionStatus, EngineEvent};
pub use ingredient::{IngredientCategory, IngredientInfo};
pub use notification::{Notification, NotificationLevel};
pub use quick_action::QuickAction;
pub use recipe::{Cuisine, DietaryTag, Nutrition, Recipe, Step};
pub use recipe_filter::RecipeFilter;
pub use scored_recipe::ScoredRecipe;
pub use sound_cue::SoundCue;
pub use stage::CookingStage;
