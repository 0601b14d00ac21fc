use super::{Notification, NotificationLevel};

/// One-tap reminders offered while cooking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Stir,
    Flip,
    Check,
    Taste,
    ReduceHeat,
    Cover,
}

impl QuickAction {
    pub fn all() -> [QuickAction; 6] {
        [
            QuickAction::Stir,
            QuickAction::Flip,
            QuickAction::Check,
            QuickAction::Taste,
            QuickAction::ReduceHeat,
            QuickAction::Cover,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            QuickAction::Stir => "stir",
            QuickAction::Flip => "flip",
            QuickAction::Check => "check",
            QuickAction::Taste => "taste",
            QuickAction::ReduceHeat => "reduce-heat",
            QuickAction::Cover => "cover",
        }
    }

    pub fn from_id(id: &str) -> Option<QuickAction> {
        let id = id.trim().to_lowercase().replace([' ', '_'], "-");
        if id == "reduce" {
            return Some(QuickAction::ReduceHeat);
        }
        QuickAction::all().into_iter().find(|a| a.id() == id)
    }

    pub fn narration(&self) -> &'static str {
        match self {
            QuickAction::Stir => "Remember to stir the food to ensure even cooking.",
            QuickAction::Flip => "Time to flip or turn the food over.",
            QuickAction::Check => {
                "Check if the food is cooked properly. Look for golden color and test tenderness."
            }
            QuickAction::Taste => "Time for a taste test. Adjust seasoning if needed.",
            QuickAction::ReduceHeat => "Reduce the heat to prevent burning.",
            QuickAction::Cover => "Cover the pan to trap steam and cook evenly.",
        }
    }

    pub fn notification(&self) -> Notification {
        match self {
            QuickAction::Stir => Notification::new(NotificationLevel::Info, "🥄 Time to stir!"),
            QuickAction::Flip => Notification::new(NotificationLevel::Info, "🔄 Flip the food!"),
            QuickAction::Check => Notification::new(NotificationLevel::Info, "🔍 Check the food!"),
            QuickAction::Taste => {
                Notification::new(NotificationLevel::Info, "👅 Taste and adjust!")
            }
            QuickAction::ReduceHeat => {
                Notification::new(NotificationLevel::Warning, "🔥 Lower the heat!")
            }
            QuickAction::Cover => Notification::new(NotificationLevel::Info, "🍲 Cover the pan!"),
        }
    }
}
