use chrono::{DateTime, Local};
use log::{debug, info};
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

use super::timer::Timer;
use crate::model::{CookingStage, Recipe, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active { step: usize },
    Complete,
}

/// Everything the cooking-history and stats layers need once a recipe is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMeal {
    pub recipe_id: u32,
    pub recipe_name: String,
    pub step_count: usize,
    pub elapsed: Duration,
    pub perfect: bool,
    pub beat_expected_time: bool,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced { step: usize, narration: String },
    Completed(CompletedMeal),
    /// The session had already finished; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub recipe_id: u32,
    pub recipe_name: String,
    pub current_step: usize,
    pub step_count: usize,
    pub phase: SessionPhase,
    pub stage: CookingStage,
}

impl SessionSnapshot {
    pub fn progress_percent(&self) -> u8 {
        if self.step_count == 0 {
            return 0;
        }
        (self.current_step * 100 / self.step_count) as u8
    }

    pub fn progress_label(&self) -> String {
        match self.phase {
            SessionPhase::Complete => "Complete!".to_string(),
            SessionPhase::Active { step } => format!("Step {}/{}", step + 1, self.step_count),
        }
    }
}

/// Guided progress through one recipe's steps. `current_step == steps.len()` means complete.
#[derive(Debug)]
pub struct CookingSession {
    id: Uuid,
    recipe: Rc<Recipe>,
    current_step: usize,
    started_at: DateTime<Local>,
    burnt_seen: bool,
}

fn arm_for(step: &Step, timer: &mut Timer) {
    timer.reset();
    if step.has_timer() {
        timer.set(step.time);
    }
}

impl CookingSession {
    /// Begin at step 0 and arm the timer for it. Recipes always have at least one step.
    pub fn start(recipe: Rc<Recipe>, timer: &mut Timer, now: DateTime<Local>) -> Self {
        info!(target: "session", "Recipe selected: {}", recipe.name);
        match recipe.steps.first() {
            Some(first) => arm_for(first, timer),
            None => timer.reset(),
        }
        Self {
            id: Uuid::new_v4(),
            recipe,
            current_step: 0,
            started_at: now,
            burnt_seen: false,
        }
    }

    pub fn recipe(&self) -> &Rc<Recipe> {
        &self.recipe
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn phase(&self) -> SessionPhase {
        if self.current_step >= self.recipe.steps.len() {
            SessionPhase::Complete
        } else {
            SessionPhase::Active {
                step: self.current_step,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SessionPhase::Complete
    }

    pub fn step(&self) -> Option<&Step> {
        self.recipe.steps.get(self.current_step)
    }

    /// Stage to display: the current step's, or done once finished.
    pub fn stage(&self) -> CookingStage {
        self.step()
            .map(|step| step.stage)
            .unwrap_or(CookingStage::Done)
    }

    pub fn intro_narration(&self) -> String {
        format!(
            "Starting {}. {} steps. Let's cook!",
            self.recipe.name,
            self.recipe.steps.len()
        )
    }

    /// Burnt food anywhere in the session rules out a perfect meal.
    pub fn note_stage(&mut self, stage: CookingStage) {
        if stage == CookingStage::Burnt {
            self.burnt_seen = true;
        }
    }

    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        let seconds = (now - self.started_at).num_seconds().max(0);
        Duration::from_secs(seconds as u64)
    }

    pub fn complete_step(&mut self, timer: &mut Timer, now: DateTime<Local>) -> StepOutcome {
        if self.is_complete() {
            debug!(target: "session", "complete_step ignored; {} already finished", self.recipe.name);
            return StepOutcome::Ignored;
        }

        self.current_step += 1;

        match self.recipe.steps.get(self.current_step) {
            Some(step) => {
                arm_for(step, timer);
                StepOutcome::Advanced {
                    step: self.current_step,
                    narration: step.text.clone(),
                }
            }
            None => {
                timer.reset();
                let elapsed = self.elapsed(now);
                info!(
                    target: "session",
                    "{} complete in {}s", self.recipe.name, elapsed.as_secs()
                );
                StepOutcome::Completed(CompletedMeal {
                    recipe_id: self.recipe.id,
                    recipe_name: self.recipe.name.clone(),
                    step_count: self.recipe.steps.len(),
                    elapsed,
                    perfect: !self.burnt_seen,
                    beat_expected_time: elapsed.as_secs() < self.recipe.expected_seconds(),
                    finished_at: now,
                })
            }
        }
    }

    /// Step back one, never below zero. Leaves the timer alone.
    pub fn go_back(&mut self) -> bool {
        if self.is_complete() || self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        true
    }

    pub fn step_text(&self, index: usize) -> Option<&str> {
        self.recipe.steps.get(index).map(|step| step.text.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            recipe_id: self.recipe.id,
            recipe_name: self.recipe.name.clone(),
            current_step: self.current_step,
            step_count: self.recipe.steps.len(),
            phase: self.phase(),
            stage: self.stage(),
        }
    }
}
