mod catalog;
mod detection;
mod engine;
mod ingredient_set;
pub mod recommender;
mod session;
mod settings;
mod stage_classifier;
mod store;
mod timer;
mod voice_command;

pub use catalog::{
    CatalogError, IngredientCatalog, RecipeCatalog, FALLBACK_INGREDIENT_EMOJI,
    QUICK_RECIPE_MINUTES,
};
pub use detection::{
    parse_ingredients, DetectionError, DetectionImage, DetectionTask, HttpDetector,
    IngredientDetector, TaskPoll,
};
pub use engine::CookingEngine;
pub use ingredient_set::{IngredientSet, ADMISSION_DEBOUNCE};
pub use session::{CompletedMeal, CookingSession, SessionPhase, SessionSnapshot, StepOutcome};
pub use settings::{normalize_endpoint, Settings, SettingsChange};
pub use stage_classifier::{classify, StageSampler, StageThresholds, DEFAULT_SAMPLE_INTERVAL};
pub use store::{StorageKey, Store, HISTORY_LIMIT};
pub use timer::{
    Timer, TimerEvent, TimerPhase, TimerSnapshot, CRITICAL_THRESHOLD, WARNING_THRESHOLD,
};
pub use voice_command::{VoiceIntent, HELP_TEXT, UNKNOWN_TEXT};
