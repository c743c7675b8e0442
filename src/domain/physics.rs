/// Collision and movement resolution.
///
/// ## Model
///
/// The player is an axis-aligned square of half-size `radius` centred on
/// its continuous position. A position is BLOCKED when any of the four
/// corners lies in a cell the gating state says is impassable.
///
/// ## Wall sliding
///
///   1. Try the full displacement `(dx, dz)`.
///   2. Failing that, try X alone from the current position.
///   3. Then try Z alone from the (possibly X-slid) position.
///
/// The order lets a diagonal move into a wall keep the component that
/// runs along it instead of stopping dead.
///
/// Gating is read at query time: callers pass the live `&GatingState`.

use super::entity::PlayerPose;
use super::gating::GatingState;
use super::grid::{grid_coords, Grid};

/// How a move resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Full,
    SlideX,
    SlideZ,
    /// Diagonal blocked, but each axis moved on its own.
    SlideBoth,
    Blocked,
}

/// Effective passability of a cell at integer grid coordinates.
#[inline]
pub fn passable_at(grid: &Grid, gating: &GatingState, x: i32, z: i32) -> bool {
    gating.is_passable(grid.cell_at(x, z))
}

/// Does a player square centred at `(x, z)` overlap any impassable cell?
pub fn is_blocked(grid: &Grid, gating: &GatingState, x: f32, z: f32, radius: f32) -> bool {
    corners(x, z, radius).into_iter().any(|(cx, cz)| {
        let (gx, gz) = grid_coords(cx, cz);
        !passable_at(grid, gating, gx, gz)
    })
}

fn corners(x: f32, z: f32, r: f32) -> [(f32, f32); 4] {
    [(x - r, z - r), (x + r, z - r), (x - r, z + r), (x + r, z + r)]
}

/// Resolve a desired displacement into the pose actually reached.
pub fn try_move(
    grid: &Grid,
    gating: &GatingState,
    pose: PlayerPose,
    dx: f32,
    dz: f32,
    radius: f32,
) -> (PlayerPose, MoveOutcome) {
    let (x, z) = (pose.x, pose.z);

    if !is_blocked(grid, gating, x + dx, z + dz, radius) {
        return (pose.with_position(x + dx, z + dz), MoveOutcome::Full);
    }

    let mut nx = x;
    let mut nz = z;
    let mut slid_x = false;
    let mut slid_z = false;

    if dx != 0.0 && !is_blocked(grid, gating, x + dx, z, radius) {
        nx = x + dx;
        slid_x = true;
    }
    if dz != 0.0 && !is_blocked(grid, gating, nx, z + dz, radius) {
        nz = z + dz;
        slid_z = true;
    }

    let outcome = match (slid_x, slid_z) {
        (true, true) => MoveOutcome::SlideBoth,
        (true, false) => MoveOutcome::SlideX,
        (false, true) => MoveOutcome::SlideZ,
        (false, false) => MoveOutcome::Blocked,
    };
    (pose.with_position(nx, nz), outcome)
}

/// Is the player standing in the goal cell?
pub fn on_goal(grid: &Grid, pose: &PlayerPose) -> bool {
    grid.cell_at_pos(pose.x, pose.z).is_goal()
}
