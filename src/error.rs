/// Error taxonomy for the gating core and the built-in grid.
///
/// Nothing here is fatal: every variant describes a rejected request
/// that leaves the session untouched.

use thiserror::Error;

use crate::domain::puzzle::PuzzleId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("puzzle {0} is already solved")]
    AlreadySolved(PuzzleId),
    #[error("no hints left for puzzle {0}")]
    HintExhausted(PuzzleId),
    #[error("unknown puzzle id {0}")]
    UnknownPuzzle(u8),
    #[error("incorrect answer")]
    WrongAnswer,
    #[error("session is not in play")]
    NotPlaying,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown cell code {code} at ({x}, {z})")]
    UnknownCode { code: u8, x: usize, z: usize },
    #[error("expected exactly one goal cell, found {0}")]
    GoalCount(usize),
}
