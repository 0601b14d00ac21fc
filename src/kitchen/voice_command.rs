use once_cell::sync::Lazy;
use regex::Regex;

/// What a spoken phrase asks for. Matching is keyword based and the first
/// rule that fits wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceIntent {
    NextStep,
    PreviousStep,
    RepeatStep,
    StartTimer,
    PauseTimer,
    ResetTimer,
    SetTimer { seconds: u32, spoken: String },
    Help,
    Unknown,
}

pub const HELP_TEXT: &str =
    "You can say: next step, repeat, start timer, stop timer, or a time like 5 minutes";
pub const UNKNOWN_TEXT: &str = "I didn't understand. Try saying next step, repeat, or start timer.";

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(minute|min|second|sec)").expect("duration pattern is valid")
});

/// First "<digits> <unit>" in the text; oversized amounts saturate.
fn parse_duration(text: &str) -> Option<(u32, String)> {
    let caps = DURATION.captures(text)?;
    let amount = caps[1]
        .parse::<u64>()
        .map_or(u32::MAX, |n| u32::try_from(n).unwrap_or(u32::MAX));
    let unit = &caps[2];
    let scale = if unit.starts_with("min") { 60 } else { 1 };
    Some((amount.saturating_mul(scale), format!("{} {}", amount, unit)))
}

impl VoiceIntent {
    pub fn parse(transcript: &str) -> VoiceIntent {
        let text = transcript.trim().to_lowercase();
        if contains_any(&text, &["next", "continue", "done"]) {
            VoiceIntent::NextStep
        } else if contains_any(&text, &["previous", "back"]) {
            VoiceIntent::PreviousStep
        } else if contains_any(&text, &["repeat", "again", "what"]) {
            VoiceIntent::RepeatStep
        } else if contains_any(&text, &["start timer", "begin timer"]) {
            VoiceIntent::StartTimer
        } else if contains_any(&text, &["stop timer", "pause timer"]) {
            VoiceIntent::PauseTimer
        } else if text.contains("reset timer") {
            VoiceIntent::ResetTimer
        } else if let Some((seconds, spoken)) = parse_duration(&text) {
            VoiceIntent::SetTimer { seconds, spoken }
        } else if contains_any(&text, &["help", "commands"]) {
            VoiceIntent::Help
        } else {
            VoiceIntent::Unknown
        }
    }
}
