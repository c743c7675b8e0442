/// Gating state: which puzzles are solved and which keys are held.
///
/// Passability of gate and door cells is derived here at query time.
/// Callers pass `&GatingState` into every movement or trigger query
/// instead of caching a copy, so a solve is visible to the very next
/// query.

use std::collections::BTreeSet;

use crate::error::GateError;

use super::cell::Cell;
use super::puzzle::PuzzleId;

/// Keys needed to open the locked door.
pub const KEYS_FOR_DOOR: usize = PuzzleId::COUNT;

#[derive(Clone, Debug, Default)]
pub struct GatingState {
    solved: BTreeSet<PuzzleId>,
    keys: Vec<String>,
}

impl GatingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Can an entity occupy a cell of this kind right now?
    pub fn is_passable(&self, cell: Cell) -> bool {
        match cell {
            Cell::Wall => false,
            Cell::Floor | Cell::Goal => true,
            Cell::Gate(id) => self.is_solved(id),
            Cell::LockedDoor => self.door_open(),
        }
    }

    /// Record a solved puzzle and the key it grants.
    /// A puzzle yields at most one key: a repeat solve is rejected and
    /// changes nothing.
    pub fn record_solve(&mut self, id: PuzzleId, key: impl Into<String>) -> Result<(), GateError> {
        if !self.solved.insert(id) {
            return Err(GateError::AlreadySolved(id));
        }
        self.keys.push(key.into());
        Ok(())
    }

    pub fn is_solved(&self, id: PuzzleId) -> bool {
        self.solved.contains(&id)
    }

    /// Keys in the order they were collected.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn solved_count(&self) -> usize {
        self.solved.len()
    }

    pub fn door_open(&self) -> bool {
        self.keys.len() >= KEYS_FOR_DOOR
    }
}
