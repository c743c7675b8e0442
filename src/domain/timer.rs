/// Countdown clock with hint penalties.
///
/// `Running → Expired`, one way. The caller feeds elapsed time since
/// session start into `tick()`; the countdown never reads a clock itself,
/// which keeps it deterministic under test.
///
/// Penalties accumulate in an offset that is subtracted from the
/// remaining time, so a penalty shows up on the next `tick()` without
/// touching the session start time.

use std::time::Duration;

use crate::error::GateError;

use super::puzzle::PuzzleId;

pub const MAX_HINTS_PER_PUZZLE: u8 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Running,
    Expired,
}

/// Result of a single `tick()`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerTick {
    Running { remaining: Duration },
    /// The countdown reached zero. Reported exactly once.
    Expired,
    /// Already expired and reported.
    Stopped,
}

#[derive(Clone, Debug)]
pub struct Countdown {
    total: Duration,
    hint_penalty: Duration,
    penalty_total: Duration,
    elapsed: Duration,
    remaining: Duration,
    state: TimerState,
    expiry_reported: bool,
    hints_used: [u8; PuzzleId::COUNT],
}

impl Countdown {
    pub fn new(total: Duration, hint_penalty: Duration) -> Self {
        Countdown {
            total,
            hint_penalty,
            penalty_total: Duration::ZERO,
            elapsed: Duration::ZERO,
            remaining: total,
            state: if total.is_zero() { TimerState::Expired } else { TimerState::Running },
            expiry_reported: false,
            hints_used: [0; PuzzleId::COUNT],
        }
    }

    /// Advance to `elapsed` since session start.
    /// Elapsed time never runs backwards; an earlier value is ignored.
    pub fn tick(&mut self, elapsed: Duration) -> TimerTick {
        if elapsed > self.elapsed {
            self.elapsed = elapsed;
        }
        self.recompute();

        match self.state {
            TimerState::Running => TimerTick::Running { remaining: self.remaining },
            TimerState::Expired if !self.expiry_reported => {
                self.expiry_reported = true;
                TimerTick::Expired
            }
            TimerState::Expired => TimerTick::Stopped,
        }
    }

    /// Spend a hint on a puzzle: costs `hint_penalty` of remaining time.
    /// Returns the new hint count for that puzzle (the hint tier to show).
    pub fn apply_hint_penalty(&mut self, id: PuzzleId) -> Result<u8, GateError> {
        let used = &mut self.hints_used[id.index()];
        if *used >= MAX_HINTS_PER_PUZZLE {
            return Err(GateError::HintExhausted(id));
        }
        *used += 1;
        let tier = *used;
        self.penalty_total += self.hint_penalty;
        self.recompute();
        Ok(tier)
    }

    fn recompute(&mut self) {
        self.remaining = self
            .total
            .saturating_sub(self.elapsed)
            .saturating_sub(self.penalty_total);
        if self.remaining.is_zero() {
            self.state = TimerState::Expired;
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Elapsed time as of the last tick.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Time charged per hint.
    pub fn hint_penalty(&self) -> Duration {
        self.hint_penalty
    }

    pub fn penalty_total(&self) -> Duration {
        self.penalty_total
    }

    pub fn hints_used(&self, id: PuzzleId) -> u8 {
        self.hints_used[id.index()]
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

}
