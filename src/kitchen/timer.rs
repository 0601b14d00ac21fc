use log::{debug, trace};
use std::time::{Duration, Instant};

pub const WARNING_THRESHOLD: u32 = 30;
pub const CRITICAL_THRESHOLD: u32 = 10;
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Armed,
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed.
    Tick { remaining: u32 },
    /// Crossed into the last thirty seconds; once per arm cycle.
    Warning,
    /// Crossed into the last ten seconds.
    Critical,
    Complete,
}

/// What a display needs to draw the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSnapshot {
    pub remaining: u32,
    pub running: bool,
    pub warning: bool,
    pub critical: bool,
}

/// Countdown clock for the current step. Ticks are driven by `advance(now)`
/// from the host loop; nothing fires between calls.
#[derive(Debug, Default)]
pub struct Timer {
    remaining: u32,
    running: bool,
    expired: bool,
    warning: bool,
    critical: bool,
    warned_this_cycle: bool,
    next_tick_at: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.remaining > 0 {
            TimerPhase::Armed
        } else if self.expired {
            TimerPhase::Expired
        } else {
            TimerPhase::Idle
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining: self.remaining,
            running: self.running,
            warning: self.warning,
            critical: self.critical,
        }
    }

    /// Arm with `seconds` without starting. Zero leaves the timer idle.
    pub fn set(&mut self, seconds: u32) {
        self.halt();
        self.remaining = seconds;
        self.expired = false;
        self.warned_this_cycle = false;
        self.clear_flags();
        trace!(target: "timer", "armed with {}s", seconds);
    }

    /// Returns false when already running or nothing is left to count.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.running || self.remaining == 0 {
            debug!(target: "timer", "start ignored; running: {}, remaining: {}", self.running, self.remaining);
            return false;
        }
        self.running = true;
        self.next_tick_at = Some(now + TICK);
        true
    }

    pub fn pause(&mut self) {
        self.halt();
    }

    pub fn reset(&mut self) {
        self.halt();
        self.remaining = 0;
        self.expired = false;
        self.warned_this_cycle = false;
        self.clear_flags();
    }

    pub fn add_time(&mut self, seconds: u32) {
        self.remaining = self.remaining.saturating_add(seconds);
        if self.remaining > 0 {
            self.expired = false;
        }
        if self.remaining > WARNING_THRESHOLD {
            self.clear_flags();
        }
    }

    /// Apply every whole second that elapsed up to `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Some(due) = self.next_tick_at {
            if due > now {
                break;
            }
            self.next_tick_at = Some(due + TICK);
            events.extend(self.tick());
        }
        events
    }

    /// A single one-second step.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if !self.running || self.remaining == 0 {
            return Vec::new();
        }
        self.remaining -= 1;
        let mut events = vec![TimerEvent::Tick {
            remaining: self.remaining,
        }];

        match self.remaining {
            WARNING_THRESHOLD if !self.warned_this_cycle => {
                self.warned_this_cycle = true;
                self.warning = true;
                events.push(TimerEvent::Warning);
            }
            CRITICAL_THRESHOLD => {
                self.critical = true;
                self.warning = false;
                events.push(TimerEvent::Critical);
            }
            0 => {
                self.halt();
                self.expired = true;
                self.clear_flags();
                debug!(target: "timer", "countdown complete");
                events.push(TimerEvent::Complete);
            }
            _ => (),
        }
        events
    }

    fn halt(&mut self) {
        self.running = false;
        self.next_tick_at = None;
    }

    fn clear_flags(&mut self) {
        self.warning = false;
        self.critical = false;
    }
}
