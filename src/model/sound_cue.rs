use serde::{Deserialize, Serialize};

/// Short synthesized tones. The host decides how to play them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    TimerTick,
    TimerWarning,
    TimerComplete,
    StepComplete,
    Detection,
    Error,
}

impl SoundCue {
    /// Tone frequency in hertz.
    pub fn frequency(&self) -> u32 {
        match self {
            SoundCue::TimerTick => 800,
            SoundCue::TimerWarning => 600,
            SoundCue::TimerComplete => 1000,
            SoundCue::StepComplete => 880,
            SoundCue::Detection => 440,
            SoundCue::Error => 200,
        }
    }

    /// Tone length in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        match self {
            SoundCue::TimerTick => 50,
            SoundCue::TimerWarning => 200,
            SoundCue::TimerComplete => 500,
            SoundCue::StepComplete => 150,
            SoundCue::Detection => 100,
            SoundCue::Error => 300,
        }
    }
}
