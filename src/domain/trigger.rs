/// Puzzle trigger detection.
///
/// A gate "notices" the player when they come within `TRIGGER_DISTANCE`
/// of its cell centre. Only the 3×3 neighbourhood of the player's cell is
/// scanned, rows outer and columns inner, and the first unsolved gate in
/// range wins.

use super::gating::GatingState;
use super::grid::{grid_coords, Grid};
use super::puzzle::PuzzleId;

pub const TRIGGER_DISTANCE: f32 = 1.5;

/// Every unsolved gate within range of `(x, z)`, in scan order.
pub fn gates_in_range<'a>(
    grid: &'a Grid,
    gating: &'a GatingState,
    x: f32,
    z: f32,
) -> impl Iterator<Item = PuzzleId> + 'a {
    let (px, pz) = grid_coords(x, z);
    (-1..=1)
        .flat_map(move |dz| (-1..=1).map(move |dx| (px + dx, pz + dz)))
        .filter(move |&(cx, cz)| grid.contains(cx, cz))
        .filter_map(move |(cx, cz)| {
            let id = grid.cell_at(cx, cz).gate_puzzle()?;
            if gating.is_solved(id) {
                return None;
            }
            let (ox, oz) = (cx as f32 + 0.5 - x, cz as f32 + 0.5 - z);
            ((ox * ox + oz * oz).sqrt() < TRIGGER_DISTANCE).then_some(id)
        })
}

/// The puzzle to open for a player standing at `(x, z)`, if any.
pub fn check_trigger(grid: &Grid, gating: &GatingState, x: f32, z: f32) -> Option<PuzzleId> {
    gates_in_range(grid, gating, x, z).next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;

    fn id(n: u8) -> PuzzleId {
        PuzzleId::new(n).unwrap()
    }

    #[test]
    fn adjacent_gate_fires() {
        let g = grid_from(&["#####", "#.1G#", "#####"]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.5, 1.5), Some(id(1)));
    }

    #[test]
    fn first_match_in_row_major_order() {
        // Gate 2 sits above the player, gate 1 to the right: the row above
        // is scanned first.
        let g = grid_from(&["#2##", "#.1#", "#.G#"]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.5, 1.5), Some(id(2)));

        // Same row: the left column comes first.
        let g = grid_from(&["#####", "3.1G#", "#####"]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.5, 1.5), Some(id(3)));
    }

    #[test]
    fn every_gate_in_range_is_listed_in_scan_order() {
        let g = grid_from(&["#2##", "#.1#", "#.G#"]);
        let gating = GatingState::new();
        let ids: Vec<PuzzleId> = gates_in_range(&g, &gating, 1.5, 1.5).collect();
        assert_eq!(ids, vec![id(2), id(1)]);
        assert_eq!(gates_in_range(&g, &gating, 1.1, 2.9).count(), 0);
    }

    #[test]
    fn solved_gates_never_fire() {
        let g = grid_from(&["#2##", "#.1#", "#.G#"]);
        let mut gating = GatingState::new();
        gating.record_solve(id(2), "Sapphire Key").unwrap();
        assert_eq!(check_trigger(&g, &gating, 1.5, 1.5), Some(id(1)));
        gating.record_solve(id(1), "Ruby Key").unwrap();
        assert_eq!(check_trigger(&g, &gating, 1.5, 1.5), None);
    }

    #[test]
    fn diagonal_gate_respects_distance() {
        // Diagonal centre is sqrt(2) ≈ 1.414 away from a cell centre.
        let g = grid_from(&["###", "#.#", "#G1"]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.5, 1.5), Some(id(1)));
        // From the far corner of the cell the diagonal is out of range.
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.1, 1.1), None);
    }

    #[test]
    fn neighbourhood_is_only_three_by_three() {
        let g = grid_from(&["######", "#..1G#", "######"]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 1.5, 1.5), None);
    }

    #[test]
    fn edge_of_grid_is_skipped() {
        let g = grid_from(&["G1", ".."]);
        assert_eq!(check_trigger(&g, &GatingState::new(), 0.5, 0.5), Some(id(1)));
        assert_eq!(check_trigger(&g, &GatingState::new(), 0.5, 1.5), Some(id(1)));
    }
}
