use std::cell::RefCell;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use cookmate::destroyable::Destroyable;
use cookmate::events::{Channel, EventHandler};
use cookmate::helpers::{format_clock, format_duration, Capitalize};
use cookmate::kitchen::{
    CookingEngine, DetectionImage, IngredientCatalog, RecipeCatalog, SessionPhase,
    SettingsChange, Store,
};
use cookmate::model::{
    ColorSummary, EngineCommand, EngineEvent, QuickAction, TimerCommand,
};

const LOOP_INTERVAL: Duration = Duration::from_millis(100);
const SHOWN_RECOMMENDATIONS: usize = 5;

const HELP: &str = "\
commands:
  add <a, b, ...>      add ingredients        remove <name> | clear
  filter <label>       all, a cuisine or a tag
  search <text>        list                   fav <id> | shop <id>
  cook <id>            next | back | repeat [n] | exit
  timer set <secs> | start | pause | reset | add <secs> | quick <min>
  do <stir|flip|check|taste|reduce|cover>     say <phrase>
  frame <r> <g> <b>    classify a solid-colour frame
  detect <file>        url <http://...> | ping
  set <voice|sounds|auto-stage|gestures> <on|off> | set <speed|sensitivity> <n>
  reset-data           help | quit";

enum Input {
    Command(EngineCommand),
    Help,
    Quit,
    Nothing,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(format!("expected on/off, got {:?}", other)),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {:?}", value))
}

fn parse_settings(rest: &str) -> Result<SettingsChange, String> {
    let (key, value) = rest
        .split_once(' ')
        .ok_or_else(|| "usage: set <key> <value>".to_string())?;
    let value = value.trim();
    let mut change = SettingsChange::default();
    match key {
        "voice" => change.voice = Some(parse_switch(value)?),
        "sounds" => change.sounds = Some(parse_switch(value)?),
        "auto-stage" => change.auto_stage = Some(parse_switch(value)?),
        "gestures" => change.gestures = Some(parse_switch(value)?),
        "speed" => change.voice_speed = Some(parse_number(value)?),
        "sensitivity" => change.sensitivity = Some(parse_number(value)?),
        other => return Err(format!("unknown setting {:?}", other)),
    }
    Ok(change)
}

fn parse_timer(rest: &str) -> Result<TimerCommand, String> {
    let (action, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    Ok(match action {
        "set" => TimerCommand::Set(parse_number(arg)?),
        "start" => TimerCommand::Start,
        "pause" | "stop" => TimerCommand::Pause,
        "reset" => TimerCommand::Reset,
        "add" => TimerCommand::AddTime(parse_number(arg)?),
        "quick" => TimerCommand::Quick(parse_number(arg)?),
        other => return Err(format!("unknown timer action {:?}", other)),
    })
}

fn solid_frame(rest: &str) -> Result<ColorSummary, String> {
    let channels: Vec<u8> = rest
        .split_whitespace()
        .map(parse_number)
        .collect::<Result<_, _>>()?;
    let [r, g, b] = channels[..] else {
        return Err("usage: frame <r> <g> <b>".to_string());
    };
    let pixels: Vec<u8> = [r, g, b, 255].repeat(64);
    Ok(ColorSummary::from_rgba(&pixels))
}

fn load_image(rest: &str) -> Result<DetectionImage, String> {
    if rest.starts_with("data:") {
        return Ok(DetectionImage::Base64(rest.to_string()));
    }
    std::fs::read(rest)
        .map(DetectionImage::Bytes)
        .map_err(|err| format!("cannot read {}: {}", rest, err))
}

fn parse_line(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let command = match word {
        "" => return Ok(Input::Nothing),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "q" => return Ok(Input::Quit),
        "add" => EngineCommand::AddManual(rest.to_string()),
        "remove" => EngineCommand::RemoveIngredient(rest.to_string()),
        "clear" => EngineCommand::ClearIngredients,
        "filter" => EngineCommand::SetFilter(rest.to_string()),
        "search" => EngineCommand::SetSearch(rest.to_string()),
        "list" => EngineCommand::Refresh,
        "cook" => EngineCommand::SelectRecipe(parse_number(rest)?),
        "next" => EngineCommand::CompleteStep,
        "back" => EngineCommand::GoBack,
        "exit" => EngineCommand::ExitSession,
        "repeat" if rest.is_empty() => EngineCommand::SpeakStep(None),
        "repeat" => EngineCommand::SpeakStep(Some(parse_number::<usize>(rest)?.saturating_sub(1))),
        "timer" => EngineCommand::Timer(parse_timer(rest)?),
        "do" => EngineCommand::QuickAction(
            QuickAction::from_id(rest).ok_or_else(|| format!("unknown action {:?}", rest))?,
        ),
        "say" => EngineCommand::Voice(rest.to_string()),
        "fav" => EngineCommand::ToggleFavorite(parse_number(rest)?),
        "shop" => EngineCommand::ShowShoppingList(parse_number(rest)?),
        "frame" => EngineCommand::AnalyzeFrame(solid_frame(rest)?),
        "detect" => EngineCommand::Detect(load_image(rest)?),
        "url" => EngineCommand::SetDetectionUrl(rest.to_string()),
        "ping" => EngineCommand::PingDetector,
        "set" => EngineCommand::ChangeSettings(parse_settings(rest)?),
        "reset-data" => EngineCommand::ClearAllData,
        other => return Err(format!("unknown command {:?}; try help", other)),
    };
    Ok(Input::Command(command))
}

/// Prints engine events; stands in for a real display.
struct ConsolePrinter {
    ingredient_catalog: IngredientCatalog,
}

impl EventHandler<EngineEvent> for ConsolePrinter {
    fn handle_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::IngredientsChanged(names) => {
                let shown: Vec<String> = names
                    .iter()
                    .map(|name| {
                        format!(
                            "{} {}",
                            self.ingredient_catalog.emoji_for(name),
                            name.capitalize()
                        )
                    })
                    .collect();
                println!("🧺 {} ingredients: {}", names.len(), shown.join(", "));
            }
            EngineEvent::RecommendationsUpdated(ranked) => {
                for scored in ranked.iter().take(SHOWN_RECOMMENDATIONS) {
                    println!(
                        "  [{:>2}] {} {} ({}, {} min) {}% {}{}",
                        scored.id(),
                        scored.recipe.emoji,
                        scored.recipe.name,
                        scored.recipe.difficulty,
                        scored.recipe.time,
                        scored.match_percent,
                        if scored.has_all_required { "✓" } else { "" },
                        if scored.is_favorite { " ❤️" } else { "" },
                    );
                }
            }
            EngineEvent::SessionChanged(Some(snapshot)) => match snapshot.phase {
                SessionPhase::Active { .. } => println!(
                    "👨‍🍳 {} {} ({}%)",
                    snapshot.recipe_name,
                    snapshot.progress_label(),
                    snapshot.progress_percent()
                ),
                SessionPhase::Complete => println!("👨‍🍳 {} Complete!", snapshot.recipe_name),
            },
            EngineEvent::SessionChanged(None) => println!("👨‍🍳 no recipe selected"),
            EngineEvent::StageChanged(stage) => {
                println!("   stage: {} {} ({})", stage.emoji(), stage.name(), stage.description())
            }
            EngineEvent::TimerChanged(timer) => {
                if timer.running || timer.remaining > 0 {
                    let flag = if timer.critical {
                        " !!"
                    } else if timer.warning {
                        " !"
                    } else {
                        ""
                    };
                    println!("⏱  {}{}", format_clock(timer.remaining), flag);
                }
            }
            EngineEvent::Narration { text, priority } => {
                println!("🔊 {}{}", if *priority { "[!] " } else { "" }, text)
            }
            EngineEvent::Sound(cue) => log::debug!(
                target: "console",
                "beep {:?} {}Hz {}ms",
                cue,
                cue.frequency(),
                cue.duration_ms()
            ),
            EngineEvent::Notification(notification) => {
                println!("{} {}", notification.level.emoji(), notification.message)
            }
            EngineEvent::AchievementUnlocked(achievement) => {
                println!("🏆 {} ({})", achievement.name(), achievement.requirement())
            }
            EngineEvent::RecipeCompleted { meal, stats } => println!(
                "🍽️  {} in {}; {} meals, {} recipes tried, {} cooking, streak {}",
                meal.recipe_name,
                format_duration(meal.elapsed),
                stats.meals_cooked,
                stats.recipes_tried(),
                format_duration(stats.total_time),
                stats.streak
            ),
            EngineEvent::ShoppingListUpdated { items, .. } => {
                for item in items {
                    println!(
                        "  🛒 {} {}",
                        self.ingredient_catalog.emoji_for(item),
                        item.capitalize()
                    );
                }
            }
            EngineEvent::FavoritesChanged(ids) => println!("❤️  favorites: {:?}", ids),
            EngineEvent::DetectionStatusChanged(status) => println!("📷 detection: {:?}", status),
            EngineEvent::SettingsChanged(settings) => log::info!(
                target: "console",
                "settings: voice {}, sounds {}, auto stage {}, endpoint {:?}",
                settings.voice,
                settings.sounds,
                settings.auto_stage,
                settings.detection_url
            ),
        }
    }
}

fn init_logging() {
    env_logger::init();
}

fn main() {
    init_logging();

    let store = Store::default_location();
    log::info!(target: "console", "data directory {}", store.data_dir().display());
    let recipes = RecipeCatalog::builtin().expect("built-in recipes are valid");
    let ingredient_catalog = IngredientCatalog::builtin().expect("built-in ingredients are valid");

    let (command_emitter, command_observer) = Channel::<EngineCommand>::new();
    let (event_emitter, event_observer) = Channel::<EngineEvent>::new();

    let printer = Rc::new(RefCell::new(ConsolePrinter {
        ingredient_catalog: ingredient_catalog.clone(),
    }));
    let printer_handle = printer.clone();
    let printer_subscription = event_observer.subscribe(move |event| {
        printer_handle.borrow_mut().handle_event(event);
    });

    let engine = CookingEngine::new(
        command_observer,
        event_emitter,
        store,
        recipes,
        ingredient_catalog,
    );
    if engine.borrow().is_debug_mode() {
        log::info!(target: "console", "debug mode");
    }

    println!("CookMate. Type help for commands.");
    command_emitter.emit(EngineCommand::Refresh);

    let (line_sender, lines) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_sender.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        match lines.recv_timeout(LOOP_INTERVAL) {
            Ok(line) => match parse_line(&line) {
                Ok(Input::Command(command)) => command_emitter.emit(command),
                Ok(Input::Help) => println!("{}", HELP),
                Ok(Input::Quit) => break,
                Ok(Input::Nothing) => (),
                Err(message) => println!("{}", message),
            },
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => break,
        }
        engine.borrow_mut().tick(Instant::now());
    }

    engine.borrow_mut().destroy();
    printer_subscription.unsubscribe();
}
