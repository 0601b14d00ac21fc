use super::{ColorSummary, QuickAction};
use crate::kitchen::{DetectionImage, SettingsChange};

#[derive(Debug, Clone, PartialEq)]
pub enum TimerCommand {
    Set(u32), // seconds
    Start,
    Pause,
    Reset,
    AddTime(u32), // seconds
    Quick(u32),   // minutes; set and start in one go
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    AddIngredient(String),
    AddIngredients(Vec<String>),
    AddManual(String), // comma-separated
    RemoveIngredient(String),
    ClearIngredients,
    SetFilter(String),
    SetSearch(String),
    SelectRecipe(u32),
    CompleteStep,
    GoBack,
    ExitSession,
    SpeakStep(Option<usize>), // current step when None
    Timer(TimerCommand),
    QuickAction(QuickAction),
    Voice(String), // recognised speech transcript
    ToggleFavorite(u32),
    ShowShoppingList(u32),
    AnalyzeFrame(ColorSummary),
    Detect(DetectionImage),
    PingDetector,
    SetDetectionUrl(String),
    ChangeSettings(SettingsChange),
    ClearAllData,
    Refresh,
}
