//! Game phase and the simulation clock

use serde::{Deserialize, Serialize};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first flap
    Ready,
    /// Active gameplay
    Playing,
    /// Run ended; restart allowed after a delay
    GameOver,
}

/// Phase plus the clock it is measured against.
///
/// The clock (milliseconds) only ever grows and is never reset by a phase
/// change; `entered_at` records the clock value at the last transition.
#[derive(Debug, Clone)]
pub struct StateMachine {
    phase: GamePhase,
    entered_at: f64,
    clock: f64,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Ready,
            entered_at: 0.0,
            clock: 0.0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is(&self, phase: GamePhase) -> bool {
        self.phase == phase
    }

    /// Current clock in milliseconds
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    /// Time spent in the current phase (ms)
    pub fn elapsed(&self) -> f64 {
        self.clock - self.entered_at
    }

    /// Advance the clock by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.clock += f64::from(dt) * 1000.0;
    }

    /// Enter `phase`, stamping the entry time
    pub fn set(&mut self, phase: GamePhase) {
        log::debug!("{:?} -> {:?} at {:.0}ms", self.phase, phase, self.clock);
        self.phase = phase;
        self.entered_at = self.clock;
    }
}
