use chrono::Local;
use log::{debug, error, info, trace, warn};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use super::catalog::{IngredientCatalog, RecipeCatalog};
use super::detection::{
    DetectionError, DetectionImage, DetectionTask, HttpDetector, IngredientDetector, TaskPoll,
};
use super::ingredient_set::IngredientSet;
use super::recommender;
use super::session::{CompletedMeal, CookingSession, SessionSnapshot, StepOutcome};
use super::settings::{Settings, SettingsChange};
use super::stage_classifier::StageSampler;
use super::store::Store;
use super::timer::{Timer, TimerEvent, TimerSnapshot, CRITICAL_THRESHOLD};
use super::voice_command::{VoiceIntent, HELP_TEXT, UNKNOWN_TEXT};
use crate::destroyable::Destroyable;
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::model::{
    ColorSummary, CookingStage, DetectionStatus, EngineCommand, EngineEvent, Notification,
    NotificationLevel, QuickAction, RecipeFilter, ScoredRecipe, SoundCue, TimerCommand,
};

const BURNT_WARNING: &str = "Warning! The food may be burning. Please check immediately.";
const DETECTION_FAILED: &str = "Detection failed. Please check your AI connection.";

/// Application state for one cook. Commands arrive through the command channel;
/// time moves forward only through `tick`.
pub struct CookingEngine {
    recipes: RecipeCatalog,
    ingredient_catalog: IngredientCatalog,
    ingredients: IngredientSet,
    session: Option<CookingSession>,
    timer: Timer,
    store: Store,
    settings: Settings,
    debug_mode: bool,
    filter: RecipeFilter,
    search: String,
    recommendations: Vec<ScoredRecipe>,
    shopping_list: Vec<String>,
    detector: Option<Arc<dyn IngredientDetector>>,
    detection: Option<DetectionTask>,
    sampler: StageSampler,
    last_stage: Option<CookingStage>,
    subscription: Option<Unsubscriber<EngineCommand>>,
    event_emitter: EventEmitter<EngineEvent>,
}

impl Destroyable for CookingEngine {
    fn destroy(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl CookingEngine {
    pub fn new(
        command_observer: EventObserver<EngineCommand>,
        event_emitter: EventEmitter<EngineEvent>,
        store: Store,
        recipes: RecipeCatalog,
        ingredient_catalog: IngredientCatalog,
    ) -> Rc<RefCell<Self>> {
        let settings = Settings::load(&store);
        let detector = settings
            .detection_url
            .as_deref()
            .and_then(|url| match HttpDetector::new(url) {
                Ok(detector) => Some(Arc::new(detector) as Arc<dyn IngredientDetector>),
                Err(err) => {
                    warn!(target: "engine", "ignoring stored endpoint: {}", err);
                    None
                }
            });

        let mut ingredients = IngredientSet::default();
        ingredients.restore(store.ingredients());

        let mut engine = Self {
            recipes,
            ingredient_catalog,
            ingredients,
            session: None,
            timer: Timer::new(),
            store,
            settings,
            debug_mode: Settings::is_debug_mode(),
            filter: RecipeFilter::All,
            search: String::new(),
            recommendations: Vec::new(),
            shopping_list: Vec::new(),
            detector,
            detection: None,
            sampler: StageSampler::default(),
            last_stage: None,
            subscription: None,
            event_emitter,
        };
        engine.recommendations = engine.rank();
        info!(
            target: "engine",
            "ready: {} recipes, {} ingredients on hand",
            engine.recipes.len(),
            engine.ingredients.len()
        );

        let refcell = Rc::new(RefCell::new(engine));
        CookingEngine::wire_subscription(refcell.clone(), command_observer);
        refcell
    }

    fn wire_subscription(
        engine: Rc<RefCell<Self>>,
        command_observer: EventObserver<EngineCommand>,
    ) {
        let engine_handler = engine.clone();
        let subscription = command_observer.subscribe(move |command| {
            let mut engine = engine_handler.borrow_mut();
            engine.handle_command(command.clone());
        });
        engine.borrow_mut().subscription = Some(subscription);
    }

    /// Replace the detection backend, e.g. with one that is not HTTP.
    pub fn set_detector(&mut self, detector: Arc<dyn IngredientDetector>) {
        self.detector = Some(detector);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ingredients(&self) -> Vec<String> {
        self.ingredients.names()
    }

    pub fn ingredient_catalog(&self) -> &IngredientCatalog {
        &self.ingredient_catalog
    }

    pub fn recipes(&self) -> &RecipeCatalog {
        &self.recipes
    }

    pub fn recommendations(&self) -> &[ScoredRecipe] {
        &self.recommendations
    }

    pub fn shopping_list(&self) -> &[String] {
        &self.shopping_list
    }

    pub fn session(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|session| session.snapshot())
    }

    pub fn timer(&self) -> TimerSnapshot {
        self.timer.snapshot()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_detecting(&self) -> bool {
        self.detection.is_some()
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Drive time-based work: the admission debounce, timer seconds and any
    /// outstanding detection call.
    pub fn tick(&mut self, now: Instant) {
        self.poll_detection(now);

        if self.ingredients.flush_due(now) {
            self.commit_ingredients();
        }

        for event in self.timer.advance(now) {
            self.handle_timer_event(event);
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        trace!(target: "engine", "Handling command: {:?}", command);
        let now = Instant::now();
        match command {
            EngineCommand::AddIngredient(name) => {
                self.ingredients.add(&name, now);
            }
            EngineCommand::AddIngredients(names) => {
                for name in names {
                    self.ingredients.add(&name, now);
                }
            }
            EngineCommand::AddManual(input) => self.add_manual(&input, now),
            EngineCommand::RemoveIngredient(name) => {
                if self.ingredients.remove(&name) {
                    self.commit_ingredients();
                }
            }
            EngineCommand::ClearIngredients => {
                if self.ingredients.clear() {
                    self.commit_ingredients();
                }
            }
            EngineCommand::SetFilter(label) => {
                self.filter = RecipeFilter::parse(&label);
                self.recompute();
            }
            EngineCommand::SetSearch(text) => {
                self.search = text;
                self.recompute();
            }
            EngineCommand::SelectRecipe(id) => self.select_recipe(id),
            EngineCommand::CompleteStep => {
                self.complete_step();
            }
            EngineCommand::GoBack => self.go_back(),
            EngineCommand::ExitSession => self.exit_session(),
            EngineCommand::SpeakStep(index) => self.speak_step(index),
            EngineCommand::Timer(timer_command) => self.handle_timer_command(timer_command, now),
            EngineCommand::QuickAction(action) => self.quick_action(action),
            EngineCommand::Voice(transcript) => self.handle_voice(&transcript, now),
            EngineCommand::ToggleFavorite(id) => self.toggle_favorite(id),
            EngineCommand::ShowShoppingList(id) => self.show_shopping_list(id),
            EngineCommand::AnalyzeFrame(colors) => self.analyze_frame(&colors, now),
            EngineCommand::Detect(image) => {
                if let Err(err) = self.start_detection(image) {
                    self.report_detection_error(&err);
                }
            }
            EngineCommand::PingDetector => self.ping_detector(),
            EngineCommand::SetDetectionUrl(url) => self.set_detection_url(&url),
            EngineCommand::ChangeSettings(change) => self.change_settings(&change),
            EngineCommand::ClearAllData => self.clear_all_data(),
            EngineCommand::Refresh => self.sync_display(),
        }
    }

    fn emit(&self, event: EngineEvent) {
        self.event_emitter.emit(event);
    }

    fn narrate(&self, text: impl Into<String>, priority: bool) {
        if self.settings.voice {
            self.emit(EngineEvent::Narration {
                text: text.into(),
                priority,
            });
        }
    }

    fn play(&self, cue: SoundCue) {
        if self.settings.sounds {
            self.emit(EngineEvent::Sound(cue));
        }
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(EngineEvent::Notification(Notification::new(level, message)));
    }

    fn favorites(&self) -> HashSet<u32> {
        self.store.favorites().into_iter().collect()
    }

    fn rank(&self) -> Vec<ScoredRecipe> {
        recommender::rank_with_favorites(
            self.recipes.all(),
            &self.ingredients.names(),
            &self.filter,
            &self.search,
            &self.favorites(),
        )
    }

    fn recompute(&mut self) {
        self.recommendations = self.rank();
        self.emit(EngineEvent::RecommendationsUpdated(
            self.recommendations.clone(),
        ));
    }

    /// Persist the owned set once, announce it and re-rank.
    fn commit_ingredients(&mut self) {
        let names = self.ingredients.names();
        self.store.save_ingredients(&names);
        debug!(target: "engine", "ingredients now {:?}", names);
        self.emit(EngineEvent::IngredientsChanged(names));
        self.recompute();
    }

    fn add_manual(&mut self, input: &str, now: Instant) {
        let added = self.ingredients.add_manual(input, now);
        if added == 0 {
            self.notify(NotificationLevel::Info, "Nothing new to add.");
        } else {
            self.notify(
                NotificationLevel::Success,
                format!("Added {} ingredient{}", added, if added == 1 { "" } else { "s" }),
            );
        }
    }

    fn sync_display(&self) {
        self.emit(EngineEvent::SettingsChanged(self.settings.clone()));
        self.emit(EngineEvent::IngredientsChanged(self.ingredients.names()));
        self.emit(EngineEvent::RecommendationsUpdated(
            self.recommendations.clone(),
        ));
        self.emit(EngineEvent::FavoritesChanged(self.store.favorites()));
        self.emit(EngineEvent::SessionChanged(self.session()));
        if let Some(session) = &self.session {
            self.emit(EngineEvent::StageChanged(session.stage()));
        }
        self.emit(EngineEvent::TimerChanged(self.timer.snapshot()));
        self.emit(EngineEvent::DetectionStatusChanged(self.detection_status()));
    }

    fn sync_session(&self) {
        self.emit(EngineEvent::SessionChanged(self.session()));
        self.emit(EngineEvent::TimerChanged(self.timer.snapshot()));
    }

    /// Show a stage. Burnt always gets a spoken warning and an alarm.
    fn show_stage(&mut self, stage: CookingStage) {
        self.last_stage = Some(stage);
        if let Some(session) = self.session.as_mut() {
            session.note_stage(stage);
        }
        self.emit(EngineEvent::StageChanged(stage));
        if stage.is_warning() {
            self.narrate(BURNT_WARNING, true);
            self.play(SoundCue::Error);
        }
    }

    fn show_session_stage(&mut self) {
        if let Some(stage) = self.session.as_ref().map(|session| session.stage()) {
            self.show_stage(stage);
        }
    }

    fn select_recipe(&mut self, id: u32) {
        let Some(recipe) = self.recipes.by_id(id) else {
            warn!(target: "engine", "select ignored; unknown recipe id {}", id);
            self.notify(NotificationLevel::Warning, format!("Recipe {} not found", id));
            return;
        };
        let session = CookingSession::start(recipe, &mut self.timer, Local::now());
        let intro = session.intro_narration();
        self.session = Some(session);
        self.last_stage = None;
        self.sync_session();
        self.show_session_stage();
        self.narrate(intro, false);
    }

    /// True only when the cursor moved to another step.
    fn complete_step(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            debug!(target: "engine", "complete_step ignored; no active session");
            return false;
        };
        match session.complete_step(&mut self.timer, Local::now()) {
            StepOutcome::Advanced { narration, .. } => {
                self.play(SoundCue::StepComplete);
                self.sync_session();
                self.show_session_stage();
                self.narrate(narration, false);
                true
            }
            StepOutcome::Completed(meal) => {
                self.finish_recipe(meal);
                false
            }
            StepOutcome::Ignored => false,
        }
    }

    fn finish_recipe(&mut self, meal: CompletedMeal) {
        let (stats, unlocked) = self.store.record_meal(&meal);
        self.sync_session();
        self.show_session_stage();
        self.play(SoundCue::StepComplete);
        self.narrate(
            format!(
                "Congratulations! {} is complete. Enjoy your meal!",
                meal.recipe_name
            ),
            true,
        );
        self.notify(
            NotificationLevel::Success,
            format!("🎉 {} completed! Great job!", meal.recipe_name),
        );
        self.emit(EngineEvent::RecipeCompleted { meal, stats });
        for achievement in unlocked {
            info!(target: "engine", "achievement unlocked: {}", achievement.id());
            self.emit(EngineEvent::AchievementUnlocked(achievement));
            self.notify(
                NotificationLevel::Success,
                format!("🏆 Achievement Unlocked: {}!", achievement.name()),
            );
        }
    }

    fn go_back(&mut self) {
        let moved = self
            .session
            .as_mut()
            .is_some_and(|session| session.go_back());
        if moved {
            self.sync_session();
            self.show_session_stage();
        }
    }

    fn exit_session(&mut self) {
        if self.session.take().is_some() {
            info!(target: "engine", "session exited");
        }
        self.timer.reset();
        self.last_stage = None;
        self.sync_session();
    }

    fn speak_step(&self, index: Option<usize>) {
        let Some(session) = &self.session else {
            self.narrate("No recipe selected", false);
            return;
        };
        let index = index.unwrap_or(session.current_step());
        if let Some(text) = session.step_text(index) {
            self.narrate(text.to_string(), false);
        }
    }

    fn handle_timer_command(&mut self, command: TimerCommand, now: Instant) {
        match command {
            TimerCommand::Set(seconds) => self.timer.set(seconds),
            TimerCommand::Start => {
                self.timer.start(now);
            }
            TimerCommand::Pause => self.timer.pause(),
            TimerCommand::Reset => self.timer.reset(),
            TimerCommand::AddTime(seconds) => self.timer.add_time(seconds),
            TimerCommand::Quick(minutes) => {
                self.timer.reset();
                self.timer.set(minutes.saturating_mul(60));
                self.timer.start(now);
                self.narrate(format!("{} minute timer started", minutes), false);
            }
        }
        self.emit(EngineEvent::TimerChanged(self.timer.snapshot()));
    }

    fn handle_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick { remaining } => {
                if remaining > 0 && remaining <= CRITICAL_THRESHOLD {
                    self.play(SoundCue::TimerTick);
                }
                self.emit(EngineEvent::TimerChanged(self.timer.snapshot()));
            }
            TimerEvent::Warning => {
                self.narrate("30 seconds remaining", false);
                self.play(SoundCue::TimerWarning);
            }
            // visual only; the snapshot already carries the flag
            TimerEvent::Critical => (),
            TimerEvent::Complete => {
                self.narrate("Timer complete! Check your food.", true);
                self.play(SoundCue::TimerComplete);
                self.notify(NotificationLevel::Success, "⏰ Timer Complete!");
            }
        }
    }

    fn quick_action(&self, action: QuickAction) {
        self.narrate(action.narration(), false);
        self.emit(EngineEvent::Notification(action.notification()));
    }

    fn handle_voice(&mut self, transcript: &str, now: Instant) {
        let intent = VoiceIntent::parse(transcript);
        debug!(target: "engine", "voice {:?} -> {:?}", transcript, intent);
        match intent {
            VoiceIntent::NextStep => {
                if self.session.is_some() {
                    if self.complete_step() {
                        self.narrate("Moving to next step", false);
                    }
                } else {
                    self.narrate("No recipe selected", false);
                }
            }
            VoiceIntent::PreviousStep => {
                let can_go_back = self
                    .session
                    .as_ref()
                    .is_some_and(|session| session.current_step() > 0 && !session.is_complete());
                if can_go_back {
                    self.go_back();
                    self.narrate("Going back to previous step", false);
                }
            }
            VoiceIntent::RepeatStep => {
                if self.session.is_some() {
                    self.speak_step(None);
                }
            }
            VoiceIntent::StartTimer => {
                self.handle_timer_command(TimerCommand::Start, now);
                self.narrate("Timer started", false);
            }
            VoiceIntent::PauseTimer => {
                self.handle_timer_command(TimerCommand::Pause, now);
                self.narrate("Timer paused", false);
            }
            VoiceIntent::ResetTimer => {
                self.handle_timer_command(TimerCommand::Reset, now);
                self.narrate("Timer reset", false);
            }
            VoiceIntent::SetTimer { seconds, spoken } => {
                self.timer.set(seconds);
                self.timer.start(now);
                self.emit(EngineEvent::TimerChanged(self.timer.snapshot()));
                self.narrate(format!("{} timer started", spoken), false);
            }
            VoiceIntent::Help => self.narrate(HELP_TEXT, false),
            VoiceIntent::Unknown => self.narrate(UNKNOWN_TEXT, false),
        }
    }

    fn toggle_favorite(&mut self, id: u32) {
        let Some(recipe) = self.recipes.by_id(id) else {
            warn!(target: "engine", "favorite ignored; unknown recipe id {}", id);
            return;
        };
        let favorite = self.store.toggle_favorite(id);
        let message = if favorite {
            format!("❤️ {} added to favorites", recipe.name)
        } else {
            format!("{} removed from favorites", recipe.name)
        };
        self.notify(NotificationLevel::Info, message);
        self.emit(EngineEvent::FavoritesChanged(self.store.favorites()));
        self.recompute();
    }

    fn show_shopping_list(&mut self, id: u32) {
        let Some(recipe) = self.recipes.by_id(id) else {
            warn!(target: "engine", "shopping list ignored; unknown recipe id {}", id);
            return;
        };
        self.shopping_list = recommender::shopping_list(&recipe, &self.ingredients.names());
        if self.shopping_list.is_empty() {
            self.notify(
                NotificationLevel::Success,
                format!("You have everything for {}!", recipe.name),
            );
        }
        self.emit(EngineEvent::ShoppingListUpdated {
            recipe_id: id,
            items: self.shopping_list.clone(),
        });
    }

    /// Classify a camera frame while cooking. Throttled; only a change of
    /// stage is shown.
    fn analyze_frame(&mut self, colors: &ColorSummary, now: Instant) {
        if !self.settings.auto_stage || self.session.is_none() {
            return;
        }
        let Some(stage) = self
            .sampler
            .sample(colors, &self.settings.stage_thresholds, now)
        else {
            return;
        };
        if self.last_stage != Some(stage) {
            debug!(target: "engine", "frame classified as {}", stage.id());
            self.show_stage(stage);
        }
    }

    fn detection_status(&self) -> DetectionStatus {
        if self.detection.is_some() {
            DetectionStatus::Analyzing
        } else if self.detector.is_some() {
            DetectionStatus::Idle
        } else {
            DetectionStatus::Unconfigured
        }
    }

    /// Hand an image to the detector on a worker thread. At most one call
    /// is in flight; the result is picked up by `tick`.
    pub fn start_detection(&mut self, image: DetectionImage) -> Result<(), DetectionError> {
        if self.detection.is_some() {
            return Err(DetectionError::Busy);
        }
        let detector = self.detector.clone().ok_or(DetectionError::NotConfigured)?;
        info!(target: "engine", "detecting via {}", detector.endpoint());
        self.detection = Some(DetectionTask::spawn(detector, image));
        self.emit(EngineEvent::DetectionStatusChanged(DetectionStatus::Analyzing));
        self.notify(NotificationLevel::Info, "AI is identifying your ingredients...");
        Ok(())
    }

    fn report_detection_error(&self, err: &DetectionError) {
        match err {
            DetectionError::NotConfigured => {
                self.notify(
                    NotificationLevel::Error,
                    "Please set the AI API URL in settings first.",
                );
                self.emit(EngineEvent::DetectionStatusChanged(
                    DetectionStatus::Unconfigured,
                ));
            }
            DetectionError::Busy => {
                self.notify(NotificationLevel::Warning, "Still analyzing the last photo.");
            }
            _ => {
                error!(target: "engine", "detection failed: {}", err);
                self.play(SoundCue::Error);
                self.notify(NotificationLevel::Error, DETECTION_FAILED);
            }
        }
    }

    fn poll_detection(&mut self, now: Instant) {
        let result = match self.detection.as_ref().map(|task| task.poll()) {
            None | Some(TaskPoll::Pending) => return,
            Some(TaskPoll::Finished(result)) => result,
        };
        self.detection = None;
        self.emit(EngineEvent::DetectionStatusChanged(self.detection_status()));

        match result {
            Ok(names) if names.is_empty() => {
                self.notify(NotificationLevel::Info, "No ingredients detected.");
            }
            Ok(names) => {
                for name in &names {
                    self.ingredients.add(name, now);
                }
                self.play(SoundCue::Detection);
                self.notify(
                    NotificationLevel::Success,
                    format!("Detected: {}", names.join(", ")),
                );
            }
            Err(err) => self.report_detection_error(&err),
        }
    }

    fn ping_detector(&self) {
        let Some(detector) = &self.detector else {
            self.report_detection_error(&DetectionError::NotConfigured);
            return;
        };
        if detector.ping() {
            self.emit(EngineEvent::DetectionStatusChanged(DetectionStatus::Online));
            self.notify(NotificationLevel::Success, "AI server is reachable.");
        } else {
            self.emit(EngineEvent::DetectionStatusChanged(DetectionStatus::Offline));
            self.notify(NotificationLevel::Error, "Failed to connect to AI server.");
        }
    }

    fn set_detection_url(&mut self, url: &str) {
        match HttpDetector::new(url) {
            Ok(detector) => {
                self.settings.detection_url = Some(detector.endpoint().to_string());
                self.settings.save(&self.store);
                self.detector = Some(Arc::new(detector));
                self.notify(NotificationLevel::Success, "AI endpoint saved.");
                self.emit(EngineEvent::SettingsChanged(self.settings.clone()));
                self.emit(EngineEvent::DetectionStatusChanged(self.detection_status()));
            }
            Err(err) => {
                warn!(target: "engine", "{}", err);
                self.notify(NotificationLevel::Error, err.to_string());
            }
        }
    }

    fn change_settings(&mut self, change: &SettingsChange) {
        self.settings.apply(change);
        self.settings.save(&self.store);
        self.emit(EngineEvent::SettingsChanged(self.settings.clone()));
    }

    fn clear_all_data(&mut self) {
        self.store.clear_all();
        self.ingredients.clear();
        self.session = None;
        self.timer.reset();
        self.last_stage = None;
        self.shopping_list.clear();
        self.settings = Settings::load(&self.store);
        self.recommendations = self.rank();
        self.sync_display();
        self.notify(NotificationLevel::Warning, "All data cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Channel;
    use crate::kitchen::detection::tests::FixedDetector;
    use crate::kitchen::{StorageKey, ADMISSION_DEBOUNCE};
    use crate::model::{Achievement, CookingStats};
    use crate::tests::UsingLogger;
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::test_context;

    struct Harness {
        engine: Rc<RefCell<CookingEngine>>,
        commands: EventEmitter<EngineCommand>,
        events: Rc<RefCell<Vec<EngineEvent>>>,
        _listener: Unsubscriber<EngineEvent>,
        _dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self::in_dir(dir)
        }

        fn in_dir(dir: TempDir) -> Self {
            let (commands, command_observer) = Channel::<EngineCommand>::new();
            let (event_emitter, event_observer) = Channel::<EngineEvent>::new();
            let events = Rc::new(RefCell::new(Vec::new()));
            let events_clone = events.clone();
            let listener = event_observer.subscribe(move |event: &EngineEvent| {
                events_clone.borrow_mut().push(event.clone());
            });
            let engine = CookingEngine::new(
                command_observer,
                event_emitter,
                Store::new(dir.path()),
                RecipeCatalog::builtin().unwrap(),
                IngredientCatalog::builtin().unwrap(),
            );
            Self {
                engine,
                commands,
                events,
                _listener: listener,
                _dir: dir,
            }
        }

        fn send(&self, command: EngineCommand) {
            self.commands.emit(command);
        }

        fn tick_after(&self, delay: Duration) {
            self.engine.borrow_mut().tick(Instant::now() + delay);
        }

        fn take_events(&self) -> Vec<EngineEvent> {
            std::mem::take(&mut *self.events.borrow_mut())
        }

        fn count(&self, pred: impl Fn(&EngineEvent) -> bool) -> usize {
            self.events.borrow().iter().filter(|e| pred(e)).count()
        }

        fn narrations(&self) -> Vec<String> {
            self.events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    EngineEvent::Narration { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_unknown_recipe_is_a_noop_with_warning(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::SelectRecipe(9999));
        assert!(h.engine.borrow().session().is_none());
        let events = h.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            EngineEvent::Notification(n) if n.level == NotificationLevel::Warning
        ));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_complete_step_without_session_does_nothing(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::CompleteStep);
        h.send(EngineCommand::GoBack);
        assert!(h.take_events().is_empty());
        assert_eq!(h.engine.borrow().store().stats(), CookingStats::default());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_detected_batch_commits_once_after_debounce(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::AddIngredients(vec![
            "Potato".to_string(),
            "cauliflower".to_string(),
            "potato".to_string(),
        ]));
        h.send(EngineCommand::AddIngredient("onion".to_string()));
        // nothing happens inside the quiet period
        h.engine.borrow_mut().tick(Instant::now());
        assert_eq!(h.count(|e| matches!(e, EngineEvent::IngredientsChanged(_))), 0);

        h.tick_after(ADMISSION_DEBOUNCE * 2);
        assert_eq!(h.count(|e| matches!(e, EngineEvent::IngredientsChanged(_))), 1);
        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::RecommendationsUpdated(_))),
            1
        );
        let engine = h.engine.borrow();
        assert_eq!(engine.ingredients(), vec!["cauliflower", "onion", "potato"]);
        assert_eq!(engine.store().ingredients(), engine.ingredients());
        assert_eq!(engine.recommendations()[0].recipe.name, "Aloo Gobi");
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_remove_and_clear_are_immediate(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::AddManual("rice, egg ,, ".to_string()));
        h.tick_after(ADMISSION_DEBOUNCE * 2);
        assert_eq!(h.engine.borrow().ingredients(), vec!["egg", "rice"]);
        h.take_events();

        h.send(EngineCommand::RemoveIngredient("RICE".to_string()));
        assert_eq!(h.count(|e| matches!(e, EngineEvent::IngredientsChanged(_))), 1);
        assert_eq!(h.engine.borrow().ingredients(), vec!["egg"]);

        h.send(EngineCommand::ClearIngredients);
        assert!(h.engine.borrow().ingredients().is_empty());
        assert!(h.engine.borrow().store().ingredients().is_empty());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_ingredients_restored_on_startup(_: &mut UsingLogger) {
        let dir = tempfile::tempdir().unwrap();
        Store::new(dir.path()).save_ingredients(&["potato".to_string(), "cauliflower".to_string()]);
        let h = Harness::in_dir(dir);
        let engine = h.engine.borrow();
        assert_eq!(engine.ingredients(), vec!["cauliflower", "potato"]);
        assert_eq!(engine.recommendations()[0].recipe.name, "Aloo Gobi");
        assert!(engine.recommendations()[0].has_all_required);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_full_session_commits_stats_and_history(_: &mut UsingLogger) {
        let h = Harness::new();
        let recipe = h.engine.borrow().recipes().by_id(1).unwrap();
        h.send(EngineCommand::SelectRecipe(1));
        assert_eq!(
            h.narrations()[0],
            format!(
                "Starting {}. {} steps. Let's cook!",
                recipe.name,
                recipe.steps.len()
            )
        );

        for _ in 0..recipe.steps.len() {
            h.send(EngineCommand::CompleteStep);
        }
        // already complete; must not record a second meal
        h.send(EngineCommand::CompleteStep);

        let engine = h.engine.borrow();
        let snapshot = engine.session().unwrap();
        assert_eq!(snapshot.current_step, recipe.steps.len());
        assert_eq!(snapshot.progress_label(), "Complete!");

        let stats = engine.store().stats();
        assert_eq!(stats.meals_cooked, 1);
        assert_eq!(stats.perfect_meals, 1);
        assert!(stats.recipes_tried_ids.contains(&1));
        assert_eq!(engine.store().history().len(), 1);
        assert_eq!(engine.store().history()[0].step_count, recipe.steps.len());
        assert!(engine.store().achievements().contains(&Achievement::FirstMeal));
        assert!(!engine.timer().running);
        drop(engine);

        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::RecipeCompleted { .. })),
            1
        );
        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::AchievementUnlocked(Achievement::FirstMeal))),
            1
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_exit_clears_timer_and_leaves_stats(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::SelectRecipe(1));
        h.send(EngineCommand::Timer(TimerCommand::Set(5)));
        h.send(EngineCommand::Timer(TimerCommand::Start));
        h.send(EngineCommand::CompleteStep);
        h.send(EngineCommand::ExitSession);
        assert!(h.engine.borrow().session().is_none());
        assert_eq!(h.engine.borrow().timer(), TimerSnapshot::default());

        h.take_events();
        h.tick_after(Duration::from_secs(10));
        // no stray completion after exit
        assert!(h.take_events().is_empty());
        assert_eq!(h.engine.borrow().store().stats(), CookingStats::default());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_timer_runs_to_completion_on_ticks(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::Timer(TimerCommand::Set(3)));
        h.send(EngineCommand::Timer(TimerCommand::Start));
        h.tick_after(Duration::from_millis(3500));
        assert!(h.narrations().contains(&"Timer complete! Check your food.".to_string()));
        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::Sound(SoundCue::TimerComplete))),
            1
        );
        assert_eq!(h.count(|e| matches!(e, EngineEvent::Sound(SoundCue::TimerWarning))), 0);
        assert_eq!(h.engine.borrow().timer().remaining, 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_quick_timer_narrates_and_runs(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::Timer(TimerCommand::Quick(5)));
        let timer = h.engine.borrow().timer();
        assert_eq!(timer.remaining, 300);
        assert!(timer.running);
        assert_eq!(h.narrations(), vec!["5 minute timer started"]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_muted_settings_suppress_voice_and_sound(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::ChangeSettings(SettingsChange {
            voice: Some(false),
            sounds: Some(false),
            ..Default::default()
        }));
        h.send(EngineCommand::QuickAction(QuickAction::Stir));
        assert!(h.narrations().is_empty());
        assert_eq!(h.count(|e| matches!(e, EngineEvent::Notification(_))), 1);
        assert!(!h.engine.borrow().store().get::<Settings>(StorageKey::Settings).unwrap().voice);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_burnt_frame_warns_and_spoils_perfect_meal(_: &mut UsingLogger) {
        let h = Harness::new();
        // not cooking yet, frames are ignored
        h.send(EngineCommand::AnalyzeFrame(ColorSummary {
            dark_ratio: 1.0,
            ..Default::default()
        }));
        assert!(h.take_events().is_empty());

        h.send(EngineCommand::SelectRecipe(1));
        h.send(EngineCommand::AnalyzeFrame(ColorSummary {
            dark_ratio: 1.0,
            ..Default::default()
        }));
        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::StageChanged(CookingStage::Burnt))),
            1
        );
        assert!(h.narrations().contains(&BURNT_WARNING.to_string()));
        assert_eq!(h.count(|e| matches!(e, EngineEvent::Sound(SoundCue::Error))), 1);

        let steps = h.engine.borrow().recipes().by_id(1).unwrap().steps.len();
        for _ in 0..steps {
            h.send(EngineCommand::CompleteStep);
        }
        assert_eq!(h.engine.borrow().store().stats().perfect_meals, 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_favorites_and_shopping_list(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::ToggleFavorite(1));
        assert_eq!(h.engine.borrow().store().favorites(), vec![1]);
        assert!(h
            .engine
            .borrow()
            .recommendations()
            .iter()
            .find(|s| s.id() == 1)
            .unwrap()
            .is_favorite);

        h.send(EngineCommand::AddIngredient("potato".to_string()));
        h.tick_after(ADMISSION_DEBOUNCE * 2);
        h.send(EngineCommand::ShowShoppingList(1));
        let engine = h.engine.borrow();
        let list = engine.shopping_list();
        assert!(list.contains(&"cauliflower".to_string()));
        assert!(!list.contains(&"potato".to_string()));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_detection_without_endpoint_is_reported(_: &mut UsingLogger) {
        let h = Harness::new();
        h.engine.borrow_mut().detector = None;
        h.send(EngineCommand::Detect(DetectionImage::Bytes(vec![0])));
        assert!(!h.engine.borrow().is_detecting());
        assert_eq!(
            h.count(|e| matches!(
                e,
                EngineEvent::DetectionStatusChanged(DetectionStatus::Unconfigured)
            )),
            1
        );
    }

    fn wait_for_detection(h: &Harness) {
        for _ in 0..200 {
            h.engine.borrow_mut().tick(Instant::now());
            if !h.engine.borrow().is_detecting() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("detection never finished");
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_detection_result_feeds_ingredients(_: &mut UsingLogger) {
        let h = Harness::new();
        h.engine
            .borrow_mut()
            .set_detector(Arc::new(FixedDetector::returning(&["tomato", "onion"])));
        h.send(EngineCommand::Detect(DetectionImage::Bytes(vec![1, 2])));
        assert!(h.engine.borrow().is_detecting());

        // a second request while busy is refused
        assert!(matches!(
            h.engine
                .borrow_mut()
                .start_detection(DetectionImage::Bytes(vec![])),
            Err(DetectionError::Busy)
        ));

        wait_for_detection(&h);
        h.tick_after(ADMISSION_DEBOUNCE * 2);
        assert_eq!(h.engine.borrow().ingredients(), vec!["onion", "tomato"]);
        assert_eq!(h.count(|e| matches!(e, EngineEvent::Sound(SoundCue::Detection))), 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_failed_detection_clears_busy_flag(_: &mut UsingLogger) {
        let h = Harness::new();
        h.engine
            .borrow_mut()
            .set_detector(Arc::new(FixedDetector::failing(DetectionError::Status(500))));
        h.send(EngineCommand::Detect(DetectionImage::Bytes(vec![1])));
        wait_for_detection(&h);
        assert!(h.count(|e| matches!(
            e,
            EngineEvent::Notification(n) if n.message == DETECTION_FAILED
        )) == 1);
        // the next call is accepted again
        assert!(h
            .engine
            .borrow_mut()
            .start_detection(DetectionImage::Bytes(vec![]))
            .is_ok());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_voice_commands_drive_session(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::Voice("next step".to_string()));
        assert_eq!(h.narrations(), vec!["No recipe selected"]);
        h.take_events();

        h.send(EngineCommand::SelectRecipe(1));
        h.send(EngineCommand::Voice("okay next".to_string()));
        assert_eq!(h.engine.borrow().session().unwrap().current_step, 1);
        h.send(EngineCommand::Voice("go back".to_string()));
        assert_eq!(h.engine.borrow().session().unwrap().current_step, 0);
        h.send(EngineCommand::Voice("2 minutes".to_string()));
        assert_eq!(h.engine.borrow().timer().remaining, 120);
        assert!(h.engine.borrow().timer().running);
        assert!(h.narrations().contains(&"2 minute timer started".to_string()));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_voice_next_is_quiet_once_complete(_: &mut UsingLogger) {
        let h = Harness::new();
        let steps = h.engine.borrow().recipes().by_id(1).unwrap().steps.len();
        h.send(EngineCommand::SelectRecipe(1));
        for _ in 0..steps - 1 {
            h.send(EngineCommand::CompleteStep);
        }
        h.take_events();

        h.send(EngineCommand::Voice("done".to_string()));
        assert_eq!(h.engine.borrow().session().unwrap().current_step, steps);
        h.send(EngineCommand::Voice("next".to_string()));
        let narrations = h.narrations();
        assert!(!narrations.contains(&"Moving to next step".to_string()));
        assert_eq!(
            narrations
                .iter()
                .filter(|text| text.starts_with("Congratulations!"))
                .count(),
            1
        );
        assert_eq!(h.engine.borrow().store().stats().meals_cooked, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_reselect_discards_session_without_stats(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::SelectRecipe(1));
        h.send(EngineCommand::CompleteStep);
        h.send(EngineCommand::CompleteStep);
        assert_eq!(h.engine.borrow().session().unwrap().current_step, 2);

        h.send(EngineCommand::SelectRecipe(2));
        let engine = h.engine.borrow();
        let snapshot = engine.session().unwrap();
        assert_eq!(snapshot.current_step, 0);
        assert_eq!(snapshot.recipe_id, 2);
        assert_eq!(engine.store().stats(), CookingStats::default());
        assert!(engine.store().history().is_empty());
        drop(engine);
        assert_eq!(
            h.count(|e| matches!(e, EngineEvent::RecipeCompleted { .. })),
            0
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_clear_all_data(_: &mut UsingLogger) {
        let h = Harness::new();
        h.send(EngineCommand::ToggleFavorite(2));
        h.send(EngineCommand::AddIngredient("rice".to_string()));
        h.tick_after(ADMISSION_DEBOUNCE * 2);
        h.send(EngineCommand::ClearAllData);
        let engine = h.engine.borrow();
        assert!(engine.ingredients().is_empty());
        assert!(engine.store().favorites().is_empty());
        assert!(engine.session().is_none());
    }

    #[test]
    fn test_destroy_stops_listening() {
        let h = Harness::new();
        h.engine.borrow_mut().destroy();
        h.send(EngineCommand::SelectRecipe(1));
        assert!(h.engine.borrow().session().is_none());
    }
}
