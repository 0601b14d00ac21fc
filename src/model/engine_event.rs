use super::{Achievement, CookingStage, CookingStats, Notification, ScoredRecipe, SoundCue};
use crate::kitchen::{CompletedMeal, SessionSnapshot, Settings, TimerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    Unconfigured,
    Idle,
    Analyzing,
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    IngredientsChanged(Vec<String>),
    RecommendationsUpdated(Vec<ScoredRecipe>),
    SessionChanged(Option<SessionSnapshot>),
    StageChanged(CookingStage),
    TimerChanged(TimerSnapshot),
    Narration {
        text: String,
        priority: bool,
    },
    Sound(SoundCue),
    Notification(Notification),
    AchievementUnlocked(Achievement),
    RecipeCompleted {
        meal: CompletedMeal,
        stats: CookingStats,
    },
    ShoppingListUpdated {
        recipe_id: u32,
        items: Vec<String>,
    },
    FavoritesChanged(Vec<u32>),
    DetectionStatusChanged(DetectionStatus),
    SettingsChanged(Settings),
}
