//! Key-repeat state machine.
//!
//! ```text
//!            press(k)                  deadline reached
//!  Idle ─────────────► PendingInitialDelay ─────────────► Repeating ─┐
//!   ▲                        │                               │  ▲    │ every
//!   │      release / cancel  │          release / cancel     │  └────┘ interval
//!   └────────────────────────┴───────────────────────────────┘
//! ```
//!
//! The machine is pure: it is driven by explicit `now` instants and never
//! sleeps. The owner asks for [`KeyRepeat::deadline`] and calls
//! [`KeyRepeat::fire`] once that instant has passed.
//!
//! Emission rules:
//! - Pressing a key emits nothing by itself.
//! - Each expired deadline yields one [`RepeatTick`]; the first tick of a
//!   sequence is flagged `initial`.
//! - Without repeat enabled the machine goes idle after the initial tick.
//! - Releasing while a deadline is armed yields the key once more (the
//!   terminal press), since the press itself was never reported.

use std::time::{Duration, Instant};

/// Upper bound on ticks produced by a single [`KeyRepeat::fire`] call.
///
/// A loop that wakes up late (suspend, heavy load) would otherwise flush a
/// burst of presses; past this many the schedule restarts from `now`.
const MAX_TICKS_PER_FIRE: usize = 16;

/// Timing and enable flag for key repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSettings {
    /// Whether to keep repeating after the initial delay.
    pub enabled: bool,
    /// Time from press to the first repeat.
    pub delay: Duration,
    /// Time between subsequent repeats.
    pub interval: Duration,
}

impl RepeatSettings {
    pub fn new(enabled: bool, delay: Duration, interval: Duration) -> Self {
        Self {
            enabled,
            delay,
            // A zero interval would never let the schedule advance.
            interval: interval.max(Duration::from_millis(1)),
        }
    }
}

impl Default for RepeatSettings {
    fn default() -> Self {
        Self::new(true, Duration::from_millis(500), Duration::from_millis(50))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatState {
    Idle,
    PendingInitialDelay { keycode: u32, deadline: Instant },
    Repeating { keycode: u32, deadline: Instant },
}

/// One expired deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTick {
    pub keycode: u32,
    /// `true` for the tick that ends the initial delay.
    pub initial: bool,
}

#[derive(Debug, Clone)]
pub struct KeyRepeat {
    settings: RepeatSettings,
    state: RepeatState,
}

impl KeyRepeat {
    pub fn new(settings: RepeatSettings) -> Self {
        Self {
            settings,
            state: RepeatState::Idle,
        }
    }

    pub fn settings(&self) -> RepeatSettings {
        self.settings
    }

    pub fn state(&self) -> RepeatState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RepeatState::Idle
    }

    /// The key currently being repeated, if any.
    pub fn key(&self) -> Option<u32> {
        match self.state {
            RepeatState::Idle => None,
            RepeatState::PendingInitialDelay { keycode, .. }
            | RepeatState::Repeating { keycode, .. } => Some(keycode),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            RepeatState::Idle => None,
            RepeatState::PendingInitialDelay { deadline, .. }
            | RepeatState::Repeating { deadline, .. } => Some(deadline),
        }
    }

    /// Arms the initial delay for `keycode`, silently dropping any repeat
    /// still running for a previous key.
    pub fn press(&mut self, keycode: u32, now: Instant) {
        self.state = RepeatState::PendingInitialDelay {
            keycode,
            deadline: now + self.settings.delay,
        };
    }

    /// Stops repeating.
    ///
    /// Returns the key to report once more if a deadline was armed.
    pub fn release(&mut self) -> Option<u32> {
        let key = self.key();
        self.state = RepeatState::Idle;
        key
    }

    /// Stops repeating without reporting anything.
    pub fn cancel(&mut self) {
        self.state = RepeatState::Idle;
    }

    /// Processes every deadline that is due at `now`.
    pub fn fire(&mut self, now: Instant) -> Vec<RepeatTick> {
        let mut ticks = Vec::new();
        loop {
            match self.state {
                RepeatState::PendingInitialDelay { keycode, deadline } if deadline <= now => {
                    ticks.push(RepeatTick {
                        keycode,
                        initial: true,
                    });
                    self.state = if self.settings.enabled {
                        RepeatState::Repeating {
                            keycode,
                            deadline: deadline + self.settings.interval,
                        }
                    } else {
                        RepeatState::Idle
                    };
                }
                RepeatState::Repeating { keycode, deadline } if deadline <= now => {
                    ticks.push(RepeatTick {
                        keycode,
                        initial: false,
                    });
                    self.state = RepeatState::Repeating {
                        keycode,
                        deadline: deadline + self.settings.interval,
                    };
                }
                _ => break,
            }

            if ticks.len() >= MAX_TICKS_PER_FIRE {
                if let RepeatState::Repeating { keycode, .. } = self.state {
                    self.state = RepeatState::Repeating {
                        keycode,
                        deadline: now + self.settings.interval,
                    };
                }
                break;
            }
        }
        ticks
    }
}
