/// Events emitted by the session.
/// The presentation layer consumes these for sound, overlays and the log.

use std::time::Duration;

use crate::domain::puzzle::PuzzleId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// The player walked up to an unsolved gate.
    PuzzleOpened { id: PuzzleId },
    /// Look capture should be released so the overlay can take input.
    ReleasePointer,
    KeyCollected { id: PuzzleId, key: String, total: usize },
    DoorUnlocked,
    HintUsed { id: PuzzleId, tier: u8, remaining: Duration },
    Won { elapsed: Duration },
    TimedOut,
}
