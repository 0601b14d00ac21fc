use chrono::Utc;
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::session::CompletedMeal;
use crate::model::{Achievement, CookingStats, HistoryEntry};

pub const HISTORY_LIMIT: usize = 50;
const DATA_DIR_ENV: &str = "COOKMATE_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Ingredients,
    Favorites,
    History,
    Stats,
    Settings,
    Achievements,
}

impl StorageKey {
    pub fn all() -> [StorageKey; 6] {
        [
            StorageKey::Ingredients,
            StorageKey::Favorites,
            StorageKey::History,
            StorageKey::Stats,
            StorageKey::Settings,
            StorageKey::Achievements,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::Ingredients => "cookmate_ingredients",
            StorageKey::Favorites => "cookmate_favorites",
            StorageKey::History => "cookmate_history",
            StorageKey::Stats => "cookmate_stats",
            StorageKey::Settings => "cookmate_settings",
            StorageKey::Achievements => "cookmate_achievements",
        }
    }
}

/// Key-value blobs, one JSON file per key. Reads fall back to the default on a
/// missing or corrupt blob; writes overwrite the whole value and never fail the caller.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        if !data_dir.exists() {
            if let Err(err) = fs::create_dir_all(&data_dir) {
                warn!(target: "storage", "cannot create {}: {}", data_dir.display(), err);
            }
        }
        Self { data_dir }
    }

    /// `$COOKMATE_DATA_DIR`, else the platform data directory.
    pub fn default_location() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("cookmate")))
            .unwrap_or_else(|| PathBuf::from(".cookmate"));
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(format!("{}.json", key.name()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let contents = fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(target: "storage", "corrupt {}: {}", key.name(), err);
                None
            }
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: StorageKey) -> T {
        self.get(key).unwrap_or_default()
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> bool {
        let contents = match serde_json::to_string_pretty(value) {
            Ok(contents) => contents,
            Err(err) => {
                error!(target: "storage", "cannot serialize {}: {}", key.name(), err);
                return false;
            }
        };
        match fs::write(self.path(key), contents) {
            Ok(()) => true,
            Err(err) => {
                error!(target: "storage", "cannot write {}: {}", key.name(), err);
                false
            }
        }
    }

    pub fn remove(&self, key: StorageKey) {
        let path = self.path(key);
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(target: "storage", "cannot remove {}: {}", path.display(), err);
            }
        }
    }

    /// Drop every blob so the next reads see defaults.
    pub fn clear_all(&self) {
        for key in StorageKey::all() {
            self.remove(key);
        }
    }

    pub fn ingredients(&self) -> Vec<String> {
        self.get_or_default(StorageKey::Ingredients)
    }

    pub fn save_ingredients(&self, names: &[String]) -> bool {
        self.set(StorageKey::Ingredients, names)
    }

    pub fn favorites(&self) -> Vec<u32> {
        self.get_or_default(StorageKey::Favorites)
    }

    /// Returns the new favorite state.
    pub fn toggle_favorite(&self, recipe_id: u32) -> bool {
        let mut favorites = self.favorites();
        let now_favorite = if let Some(pos) = favorites.iter().position(|id| *id == recipe_id) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(recipe_id);
            true
        };
        self.set(StorageKey::Favorites, &favorites);
        now_favorite
    }

    /// Newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.get_or_default(StorageKey::History)
    }

    pub fn stats(&self) -> CookingStats {
        self.get_or_default(StorageKey::Stats)
    }

    pub fn achievements(&self) -> BTreeSet<Achievement> {
        self.get_or_default(StorageKey::Achievements)
    }

    /// Commit a finished meal: stats, history and any newly earned achievements.
    pub fn record_meal(&self, meal: &CompletedMeal) -> (CookingStats, Vec<Achievement>) {
        let mut stats = self.stats();
        stats.record_meal(meal.recipe_id, meal.elapsed, meal.perfect, meal.finished_at);
        self.set(StorageKey::Stats, &stats);

        let mut history = self.history();
        history.insert(
            0,
            HistoryEntry::new(
                meal.recipe_id,
                meal.step_count,
                meal.elapsed,
                meal.finished_at.with_timezone(&Utc),
            ),
        );
        history.truncate(HISTORY_LIMIT);
        self.set(StorageKey::History, &history);

        let unlocked = self.unlock_earned(&stats, meal.beat_expected_time);
        (stats, unlocked)
    }

    fn unlock_earned(&self, stats: &CookingStats, beat_expected_time: bool) -> Vec<Achievement> {
        let mut achievements = self.achievements();
        let unlocked: Vec<Achievement> = Achievement::all()
            .into_iter()
            .filter(|a| !achievements.contains(a) && a.is_earned(stats, beat_expected_time))
            .collect();
        if !unlocked.is_empty() {
            achievements.extend(unlocked.iter().copied());
            self.set(StorageKey::Achievements, &achievements);
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::time::Duration;

    fn meal(recipe_id: u32) -> CompletedMeal {
        CompletedMeal {
            recipe_id,
            recipe_name: format!("Recipe {}", recipe_id),
            step_count: 4,
            elapsed: Duration::from_secs(300),
            perfect: true,
            beat_expected_time: false,
            finished_at: Local::now(),
        }
    }

    #[test]
    fn test_missing_and_corrupt_blobs_read_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.ingredients().is_empty());
        assert_eq!(store.stats(), CookingStats::default());

        fs::write(dir.path().join("cookmate_stats.json"), "{{{ nope").unwrap();
        assert_eq!(store.stats(), CookingStats::default());
    }

    #[test]
    fn test_ingredients_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let names = vec!["onion".to_string(), "rice".to_string()];
        assert!(store.save_ingredients(&names));
        assert_eq!(store.ingredients(), names);
    }

    #[test]
    fn test_toggle_favorite() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.toggle_favorite(3));
        assert_eq!(store.favorites(), vec![3]);
        assert!(!store.toggle_favorite(3));
        assert!(store.favorites().is_empty());
    }

    #[test]
    fn test_record_meal_updates_stats_history_and_achievements() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let (stats, unlocked) = store.record_meal(&meal(1));
        assert_eq!(stats.meals_cooked, 1);
        assert_eq!(unlocked, vec![Achievement::FirstMeal]);

        let (_, unlocked) = store.record_meal(&meal(1));
        assert!(unlocked.is_empty());

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].recipe_id, 1);
        assert_eq!(history[0].step_count, 4);
        assert_eq!(history[0].elapsed, Duration::from_secs(300));
        assert_eq!(store.stats().total_time, Duration::from_secs(600));
    }

    #[test]
    fn test_history_is_capped_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        for id in 0..(HISTORY_LIMIT as u32 + 5) {
            store.record_meal(&meal(id));
        }
        let history = store.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].recipe_id, HISTORY_LIMIT as u32 + 4);
        assert!(store.achievements().contains(&Achievement::MasterChef));
        assert!(store.achievements().contains(&Achievement::FiveRecipes));
    }

    #[test]
    fn test_clear_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.toggle_favorite(9);
        store.record_meal(&meal(9));
        store.clear_all();
        assert!(store.favorites().is_empty());
        assert!(store.history().is_empty());
        assert!(store.achievements().is_empty());
    }
}
