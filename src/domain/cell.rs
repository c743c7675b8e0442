/// Cell types of the maze grid and their properties.
/// Properties are queried via methods, so cell semantics live here
/// and nowhere else.

use super::puzzle::PuzzleId;

pub const CODE_FLOOR: u8 = 0;
pub const CODE_WALL: u8 = 1;
pub const CODE_GOAL: u8 = 2;
pub const CODE_FIRST_GATE: u8 = 3;
pub const CODE_LAST_GATE: u8 = 7;
pub const CODE_DOOR: u8 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Floor,
    Wall,
    Goal,
    Gate(PuzzleId), // closed until its puzzle is solved
    LockedDoor,     // closed until every key is collected
}

impl Cell {
    /// Decode a raw layout code. Gate codes 3..=7 map to puzzles 1..=5.
    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            CODE_FLOOR => Some(Cell::Floor),
            CODE_WALL => Some(Cell::Wall),
            CODE_GOAL => Some(Cell::Goal),
            CODE_FIRST_GATE..=CODE_LAST_GATE => {
                PuzzleId::new(code - 2).map(Cell::Gate)
            }
            CODE_DOOR => Some(Cell::LockedDoor),
            _ => None,
        }
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Cell::Goal)
    }

    pub fn gate_puzzle(self) -> Option<PuzzleId> {
        match self {
            Cell::Gate(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_code_decodes() {
        assert_eq!(Cell::from_code(CODE_FLOOR), Some(Cell::Floor));
        assert_eq!(Cell::from_code(CODE_WALL), Some(Cell::Wall));
        assert_eq!(Cell::from_code(CODE_GOAL), Some(Cell::Goal));
        assert_eq!(Cell::from_code(CODE_DOOR), Some(Cell::LockedDoor));
        for code in 0..=8u8 {
            assert!(Cell::from_code(code).is_some(), "code {code}");
        }
    }

    #[test]
    fn gate_codes_map_to_puzzle_ids() {
        assert_eq!(Cell::from_code(3), Some(Cell::Gate(PuzzleId::new(1).unwrap())));
        assert_eq!(Cell::from_code(7), Some(Cell::Gate(PuzzleId::new(5).unwrap())));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(Cell::from_code(9), None);
        assert_eq!(Cell::from_code(255), None);
    }
}
