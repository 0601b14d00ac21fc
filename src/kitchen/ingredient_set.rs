use log::{debug, trace};
use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

/// Quiet period before queued names are committed.
pub const ADMISSION_DEBOUNCE: Duration = Duration::from_millis(100);

/// Ingredients the cook has on hand. Additions are batched behind a debounce
/// window so that a detection returning many names commits them all at once.
#[derive(Debug)]
pub struct IngredientSet {
    owned: HashSet<String>,
    pending: BTreeSet<String>,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl Default for IngredientSet {
    fn default() -> Self {
        Self::new(ADMISSION_DEBOUNCE)
    }
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

impl IngredientSet {
    pub fn new(debounce: Duration) -> Self {
        Self {
            owned: HashSet::new(),
            pending: BTreeSet::new(),
            deadline: None,
            debounce,
        }
    }

    /// Seed from persisted names without going through the debounce.
    pub fn restore<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.owned
            .extend(names.into_iter().filter_map(|n| normalize(n.as_ref())));
    }

    /// Queue `name` for admission. Returns false for blanks and names already owned.
    pub fn add(&mut self, name: &str, now: Instant) -> bool {
        let Some(name) = normalize(name) else {
            return false;
        };
        if self.owned.contains(&name) {
            trace!(target: "ingredients", "already have {}", name);
            return false;
        }
        self.pending.insert(name);
        self.deadline = Some(now + self.debounce);
        true
    }

    /// Split comma-separated manual input and queue each entry.
    pub fn add_manual(&mut self, input: &str, now: Instant) -> usize {
        input
            .split(',')
            .filter(|part| self.add(part, now))
            .count()
    }

    /// Commit the queue once its quiet period has elapsed. Returns true if
    /// the owned set changed.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => false,
        }
    }

    /// Commit the queue immediately.
    pub fn flush(&mut self) -> bool {
        self.deadline = None;
        if self.pending.is_empty() {
            return false;
        }
        let before = self.owned.len();
        let pending = std::mem::take(&mut self.pending);
        debug!(target: "ingredients", "admitting {:?}", pending);
        self.owned.extend(pending);
        self.owned.len() != before
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let Some(name) = normalize(name) else {
            return false;
        };
        self.pending.remove(&name);
        self.owned.remove(&name)
    }

    /// Drops owned and queued names alike.
    pub fn clear(&mut self) -> bool {
        let changed = !self.owned.is_empty();
        self.owned.clear();
        self.pending.clear();
        self.deadline = None;
        changed
    }

    pub fn contains(&self, name: &str) -> bool {
        normalize(name).is_some_and(|n| self.owned.contains(&n))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Owned names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.owned.iter().cloned().collect();
        names.sort();
        names
    }
}
