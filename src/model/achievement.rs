use serde::{Deserialize, Serialize};

use super::CookingStats;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstMeal,
    FiveRecipes,
    MasterChef,
    WeekStreak,
    SpeedCook,
    Perfectionist,
}

impl Achievement {
    pub fn all() -> [Achievement; 6] {
        [
            Achievement::FirstMeal,
            Achievement::FiveRecipes,
            Achievement::MasterChef,
            Achievement::WeekStreak,
            Achievement::SpeedCook,
            Achievement::Perfectionist,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Achievement::FirstMeal => "first_meal",
            Achievement::FiveRecipes => "five_recipes",
            Achievement::MasterChef => "master_chef",
            Achievement::WeekStreak => "week_streak",
            Achievement::SpeedCook => "speed_cook",
            Achievement::Perfectionist => "perfectionist",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstMeal => "🥉 First Meal",
            Achievement::FiveRecipes => "🥈 5 Recipes",
            Achievement::MasterChef => "🥇 Master Chef",
            Achievement::WeekStreak => "🔥 Week Streak",
            Achievement::SpeedCook => "⚡ Speed Cook",
            Achievement::Perfectionist => "✨ Perfectionist",
        }
    }

    pub fn requirement(&self) -> u32 {
        match self {
            Achievement::FirstMeal => 1,
            Achievement::FiveRecipes => 5,
            Achievement::MasterChef => 20,
            Achievement::WeekStreak => 7,
            Achievement::SpeedCook => 1,
            Achievement::Perfectionist => 5,
        }
    }

    /// Whether the achievement's condition holds. `beat_expected_time` reports whether the
    /// meal that just finished came in under the recipe's expected time.
    pub fn is_earned(&self, stats: &CookingStats, beat_expected_time: bool) -> bool {
        let requirement = self.requirement();
        match self {
            Achievement::FirstMeal | Achievement::MasterChef => stats.meals_cooked >= requirement,
            Achievement::FiveRecipes => stats.recipes_tried() >= requirement as usize,
            Achievement::WeekStreak => stats.streak >= requirement,
            Achievement::SpeedCook => beat_expected_time,
            Achievement::Perfectionist => stats.perfect_meals >= requirement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_serialized_form() {
        for achievement in Achievement::all() {
            let json = serde_json::to_string(&achievement).unwrap();
            assert_eq!(json, format!("\"{}\"", achievement.id()));
        }
    }

    #[test]
    fn test_is_earned() {
        let mut stats = CookingStats {
            meals_cooked: 1,
            ..Default::default()
        };
        stats.recipes_tried_ids.insert(4);

        assert!(Achievement::FirstMeal.is_earned(&stats, false));
        assert!(!Achievement::MasterChef.is_earned(&stats, false));
        assert!(!Achievement::FiveRecipes.is_earned(&stats, false));
        assert!(!Achievement::SpeedCook.is_earned(&stats, false));
        assert!(Achievement::SpeedCook.is_earned(&stats, true));

        stats.recipes_tried_ids.extend([1, 2, 3, 5]);
        stats.streak = 7;
        assert!(Achievement::FiveRecipes.is_earned(&stats, false));
        assert!(Achievement::WeekStreak.is_earned(&stats, false));
    }
}
