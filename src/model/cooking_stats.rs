use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DurationSeconds;
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// One completed cooking session, newest first in the persisted history.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub recipe_id: u32,
    pub step_count: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(recipe_id: u32, step_count: usize, elapsed: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            step_count,
            elapsed,
            timestamp: now,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CookingStats {
    pub meals_cooked: u32,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub total_time: Duration,
    pub recipes_tried_ids: BTreeSet<u32>,
    pub streak: u32,
    pub last_cook_date: Option<DateTime<Utc>>,
    pub perfect_meals: u32,
}

impl CookingStats {
    /// Fold one completed meal into the counters. Streak days are local calendar days.
    pub fn record_meal(
        &mut self,
        recipe_id: u32,
        elapsed: Duration,
        perfect: bool,
        now: DateTime<Local>,
    ) {
        self.meals_cooked += 1;
        self.total_time += elapsed;
        self.recipes_tried_ids.insert(recipe_id);

        let today = now.date_naive();
        let last_cook = self
            .last_cook_date
            .map(|date| date.with_timezone(&Local).date_naive());
        match last_cook {
            Some(day) if Some(day) == today.pred_opt() => self.streak += 1,
            Some(day) if day == today => (),
            _ => self.streak = 1,
        }
        self.last_cook_date = Some(now.with_timezone(&Utc));

        if perfect {
            self.perfect_meals += 1;
        }
    }

    pub fn recipes_tried(&self) -> usize {
        self.recipes_tried_ids.len()
    }
}
