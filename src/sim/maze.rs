/// The built-in maze.
///
/// ## Layout legend
///   '#' = Wall            '.' = Floor
///   'G' = Goal            'D' = Locked door (opens with every key)
///   '1'..'5' = Gate guarded by that puzzle
///
/// The layout is 41 columns by 39 rows. The player spawns in the
/// top-left corridor facing south; the goal sits in the bottom-right
/// corner behind the locked door.

use std::f32::consts::FRAC_PI_2;

use crate::domain::cell::{CODE_DOOR, CODE_FIRST_GATE, CODE_FLOOR, CODE_GOAL, CODE_WALL};
use crate::domain::entity::PlayerPose;
use crate::domain::grid::Grid;
use crate::error::GridError;

pub const SPAWN_X: f32 = 1.5;
pub const SPAWN_Z: f32 = 1.5;
/// Facing +Z, down the open corridor from the spawn cell.
pub const SPAWN_YAW: f32 = FRAC_PI_2;

const LAYOUT: [&str; 39] = [
    "#########################################",
    "#...#.....#.....#...#.....#.....#.......#",
    "#.#.#.###.#.###.#.#.#.###.#.###.#.#####.#",
    "#.#...#.....#.....#...#.......#...#.....#",
    "#.#####.#####.#######.#.#####.###.#.#####",
    "#...........#.......#.......#...#...#...#",
    "###########.#######.#######.###.###.#.#.#",
    "#.........#.......#.......#...#...#...#.#",
    "#.#######.#######.#######.###.###.###.#.#",
    "#.#.............#.......#...#...#...#...#",
    "#.#.###########1#######.###.###.###.###.#",
    "#...#.................#...#...#...#...#.#",
    "###.#.###############.###.###.###.###.#.#",
    "#.....#.............#...#...#...#...#...#",
    "#.#####.###########.###.###.###.###2###.#",
    "#.....#...........#...#...#...#.......#.#",
    "#####.###########.###.###.###.#######.#.#",
    "#...#...........#...#...#...#.......#...#",
    "#.#.###########.###.###.###.#######.###.#",
    "#.#...........#...#...#...#.......#...#.#",
    "#.###########.###.###3###.#######.###.#.#",
    "#...........#...#.......#.......#...#...#",
    "###########.###.#######.#######.###.###.#",
    "#.........#...#.......#.......#...#...#.#",
    "#.#######.###.#######.#######.###.###.#.#",
    "#.......#...#.......#.......#...#...#...#",
    "#######4###.#######.#######.###.###.###.#",
    "#.........#.......#.......#...#...#...#.#",
    "#.#######.#######.#######.###.###.###.#.#",
    "#.......#.......#.......#...#...#...#...#",
    "#######.#######.#######.###.###.###5###.#",
    "#.....#.......#.......#...#...#.......#.#",
    "#.###.#######.#######.###.###.#######.#.#",
    "#...#.......#.......#...#...#.......#...#",
    "###.#######.#######.###.###.#######.###.#",
    "#.........#.......#...#...#.......#.....#",
    "#.#######.#######.###.###.#######..#.##D#",
    "#.....................................DG#",
    "#########################################",
];

/// Build the built-in maze grid.
pub fn builtin_grid() -> Result<Grid, GridError> {
    let rows: Vec<Vec<u8>> = LAYOUT.iter().map(|row| parse_row(row)).collect();
    Grid::from_codes(&rows)
}

/// Where a fresh session puts the player.
pub fn spawn_pose() -> PlayerPose {
    PlayerPose::new(SPAWN_X, SPAWN_Z, SPAWN_YAW)
}

/// Map layout chars to cell codes. Unknown chars become an
/// out-of-range code so `Grid::from_codes` rejects them with a position.
fn parse_row(row: &str) -> Vec<u8> {
    row.bytes()
        .map(|ch| match ch {
            b'.' => CODE_FLOOR,
            b'#' => CODE_WALL,
            b'G' => CODE_GOAL,
            b'1'..=b'5' => CODE_FIRST_GATE + (ch - b'1'),
            b'D' => CODE_DOOR,
            _ => u8::MAX,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Cell;
    use crate::domain::gating::GatingState;
    use crate::domain::physics::is_blocked;
    use crate::domain::puzzle::PuzzleId;

    #[test]
    fn builtin_dimensions_and_goal() {
        let g = builtin_grid().unwrap();
        assert_eq!((g.width(), g.height()), (41, 39));
        assert_eq!(g.goal(), (39, 37));
    }

    #[test]
    fn five_gates_one_per_puzzle() {
        let g = builtin_grid().unwrap();
        let mut gates: Vec<PuzzleId> = g.cells().filter_map(|(_, _, c)| c.gate_puzzle()).collect();
        gates.sort();
        let expected: Vec<PuzzleId> = PuzzleId::all().collect();
        assert_eq!(gates, expected);
    }

    #[test]
    fn door_guards_the_goal() {
        let g = builtin_grid().unwrap();
        let doors: Vec<(usize, usize)> = g
            .cells()
            .filter(|(_, _, c)| *c == Cell::LockedDoor)
            .map(|(x, z, _)| (x, z))
            .collect();
        assert_eq!(doors, vec![(39, 36), (38, 37)]);
        // every open neighbour of the goal is a door
        let (gx, gz) = g.goal();
        for (dx, dz) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let c = g.cell_at(gx as i32 + dx, gz as i32 + dz);
            assert!(matches!(c, Cell::Wall | Cell::LockedDoor), "{c:?}");
        }
    }

    #[test]
    fn border_is_solid() {
        let g = builtin_grid().unwrap();
        let (w, h) = (g.width() as i32, g.height() as i32);
        for x in 0..w {
            assert_eq!(g.cell_at(x, 0), Cell::Wall);
            assert_eq!(g.cell_at(x, h - 1), Cell::Wall);
        }
        for z in 0..h {
            assert_eq!(g.cell_at(0, z), Cell::Wall);
            assert_eq!(g.cell_at(w - 1, z), Cell::Wall);
        }
    }

    #[test]
    fn spawn_is_clear_floor() {
        let g = builtin_grid().unwrap();
        let p = spawn_pose();
        assert_eq!(g.cell_at_pos(p.x, p.z), Cell::Floor);
        assert!(!is_blocked(&g, &GatingState::new(), p.x, p.z, 0.3));
        // facing an open corridor
        let (fx, fz) = p.forward();
        assert_eq!(g.cell_at_pos(p.x + fx, p.z + fz), Cell::Floor);
    }

    #[test]
    fn unknown_layout_char_is_rejected() {
        let rows = vec![parse_row("G?")];
        assert!(matches!(
            Grid::from_codes(&rows),
            Err(GridError::UnknownCode { x: 1, z: 0, .. })
        ));
    }
}
