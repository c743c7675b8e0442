/// The step function: advances a session by one frame.
///
/// Processing order:
///   1. Countdown (expiry ends the session, even with a puzzle open)
///   2. Puzzle-active gate (overlay owns input; nothing below runs)
///   3. Look rotation
///   4. Movement resolution (wall sliding)
///   5. Puzzle trigger (only when the player tried to move)
///   6. Win check
///
/// Gating is passed by reference into every query, so a solve applied
/// between frames is visible to the very next step.

use std::time::Duration;

use tracing::{debug, info};

use crate::domain::entity::FrameInput;
use crate::domain::physics;
use crate::domain::timer::TimerTick;
use crate::domain::trigger;
use super::event::GameEvent;
use super::session::{Phase, Session};

/// Longest frame the simulation will integrate in one go, in seconds.
/// A stall (terminal resize, suspended process) must not teleport the
/// player through a wall.
pub const MAX_FRAME_DT: f32 = 0.1;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// `elapsed` is the time since the session started.
pub fn step(session: &mut Session, input: &FrameInput, elapsed: Duration) -> Vec<GameEvent> {
    if session.phase != Phase::Playing {
        return vec![];
    }

    let dt = elapsed
        .saturating_sub(session.last_elapsed)
        .as_secs_f32()
        .min(MAX_FRAME_DT);
    session.last_elapsed = session.last_elapsed.max(elapsed);
    session.expire_message();

    if resolve_timer(session, elapsed) {
        return session.take_events();
    }
    if session.active_puzzle.is_some() {
        return session.take_events();
    }

    resolve_look(session, input.turn, dt);
    let tried_to_move = resolve_movement(session, input, dt);
    if tried_to_move && resolve_trigger(session) {
        return session.take_events();
    }
    resolve_win(session);

    session.take_events()
}

// ══════════════════════════════════════════════════════════════
// Countdown
// ══════════════════════════════════════════════════════════════

/// Returns true when the session just ended.
fn resolve_timer(session: &mut Session, elapsed: Duration) -> bool {
    match session.countdown.tick(elapsed) {
        TimerTick::Running { .. } => false,
        TimerTick::Expired | TimerTick::Stopped => {
            session.phase = Phase::TimedOut;
            session.active_puzzle = None;
            info!(
                keys = session.gating.key_count(),
                penalty_secs = session.countdown.penalty_total().as_secs(),
                "time ran out"
            );
            session.events.push(GameEvent::TimedOut);
            session.events.push(GameEvent::ReleasePointer);
            true
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Look + movement
// ══════════════════════════════════════════════════════════════

fn resolve_look(session: &mut Session, turn: f32, dt: f32) {
    if turn != 0.0 {
        session.pose.turn(turn * session.movement.turn_speed * dt);
    }
}

/// Returns true when there was a movement intent this frame.
fn resolve_movement(session: &mut Session, input: &FrameInput, dt: f32) -> bool {
    let (strafe, advance) = input.local_axes();
    if strafe == 0.0 && advance == 0.0 {
        return false;
    }

    let (fx, fz) = session.pose.forward();
    let (rx, rz) = session.pose.right();
    let dist = session.movement.move_speed * dt;
    let dx = (fx * advance + rx * strafe) * dist;
    let dz = (fz * advance + rz * strafe) * dist;

    let (pose, _outcome) = physics::try_move(
        &session.grid,
        &session.gating,
        session.pose,
        dx,
        dz,
        session.movement.collision_radius,
    );
    session.pose = pose;
    true
}

// ══════════════════════════════════════════════════════════════
// Trigger / win
// ══════════════════════════════════════════════════════════════

/// Returns true when a puzzle was opened.
/// Dismissed puzzles are passed over while they stay in range; any other
/// gate in range still fires.
fn resolve_trigger(session: &mut Session) -> bool {
    let (x, z) = (session.pose.x, session.pose.z);
    let hit = if session.dismissed.is_empty() {
        trigger::check_trigger(&session.grid, &session.gating, x, z)
    } else {
        let in_range: Vec<_> = trigger::gates_in_range(&session.grid, &session.gating, x, z).collect();
        session.dismissed.retain(|id| {
            let near = in_range.contains(id);
            if !near {
                debug!(puzzle = %id, "dismissed puzzle out of range");
            }
            near
        });
        in_range.into_iter().find(|id| !session.dismissed.contains(id))
    };

    let Some(id) = hit else {
        return false;
    };
    session.active_puzzle = Some(id);
    info!(puzzle = %id, x, z, "puzzle opened");
    session.events.push(GameEvent::PuzzleOpened { id });
    session.events.push(GameEvent::ReleasePointer);
    true
}

fn resolve_win(session: &mut Session) {
    if !physics::on_goal(&session.grid, &session.pose) {
        return;
    }
    let elapsed = session.countdown.elapsed();
    session.phase = Phase::Won;
    session.final_elapsed = Some(elapsed);
    info!(
        elapsed_secs = elapsed.as_secs(),
        keys = session.gating.key_count(),
        solved = session.gating.solved_count(),
        "goal reached"
    );
    session.events.push(GameEvent::Won { elapsed });
    session.events.push(GameEvent::ReleasePointer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::PlayerPose;
    use crate::domain::grid::tests::grid_from;
    use crate::domain::puzzle::PuzzleId;

    const FRAME: Duration = Duration::from_nanos(16_666_667);

    fn forward() -> FrameInput {
        FrameInput { forward: true, ..Default::default() }
    }

    fn back() -> FrameInput {
        FrameInput { back: true, ..Default::default() }
    }

    fn session_on(rows: &[&str], x: f32, z: f32, cfg: &GameConfig) -> Session {
        let mut s = Session::new(grid_from(rows), cfg);
        s.start();
        s.pose = PlayerPose::new(x, z, 0.0); // facing +X
        s
    }

    /// Step with `input` until `done` holds, returning the events of the
    /// final step and the elapsed time it ran at.
    fn run_until(
        s: &mut Session,
        clock: &mut Duration,
        input: FrameInput,
        mut done: impl FnMut(&Session, &[GameEvent]) -> bool,
    ) -> Vec<GameEvent> {
        for _ in 0..600 {
            *clock += FRAME;
            let events = step(s, &input, *clock);
            if done(s, &events) {
                return events;
            }
        }
        panic!("condition never reached");
    }

    #[test]
    fn not_playing_is_a_no_op() {
        let mut s = Session::new(grid_from(&["#####", "#..G#", "#####"]), &GameConfig::default());
        let before = s.pose();
        assert!(step(&mut s, &forward(), Duration::from_secs(1)).is_empty());
        assert_eq!(s.pose(), before);
        assert_eq!(s.phase(), Phase::NotStarted);
    }

    #[test]
    fn walking_onto_goal_wins_and_freezes_time() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["#####", "#..G#", "#####"], 1.5, 1.5, &cfg);
        let mut clock = Duration::ZERO;
        let events = run_until(&mut s, &mut clock, forward(), |s, _| s.phase() == Phase::Won);

        let elapsed = s.final_elapsed().unwrap();
        assert_eq!(elapsed, clock);
        assert_eq!(events, vec![GameEvent::Won { elapsed }, GameEvent::ReleasePointer]);
        assert!(s.pose().x >= 3.0);

        // Frozen: later frames neither move the player nor change the time.
        let pose = s.pose();
        assert!(step(&mut s, &forward(), clock + Duration::from_secs(5)).is_empty());
        assert_eq!(s.pose(), pose);
        assert_eq!(s.final_elapsed(), Some(elapsed));
    }

    #[test]
    fn countdown_expiry_times_out_and_stops_movement() {
        let mut cfg = GameConfig::default();
        cfg.session.duration = Duration::from_secs(10);
        let mut s = session_on(&["######", "#...G#", "######"], 1.5, 1.5, &cfg);

        assert!(step(&mut s, &FrameInput::default(), Duration::from_millis(9_990)).is_empty());
        assert_eq!(s.phase(), Phase::Playing);

        let events = step(&mut s, &FrameInput::default(), Duration::from_secs(10));
        assert_eq!(events, vec![GameEvent::TimedOut, GameEvent::ReleasePointer]);
        assert_eq!(s.phase(), Phase::TimedOut);
        assert_eq!(s.countdown().remaining(), Duration::ZERO);

        let pose = s.pose();
        assert!(step(&mut s, &forward(), Duration::from_secs(11)).is_empty());
        assert_eq!(s.pose(), pose);
    }

    #[test]
    fn timer_runs_while_a_puzzle_is_open() {
        let mut cfg = GameConfig::default();
        cfg.session.duration = Duration::from_secs(5);
        let mut s = session_on(&["######", "#..1G#", "######"], 1.5, 1.5, &cfg);
        s.active_puzzle = PuzzleId::new(1);

        let events = step(&mut s, &FrameInput::default(), Duration::from_secs(5));
        assert_eq!(events, vec![GameEvent::TimedOut, GameEvent::ReleasePointer]);
        assert!(s.active_puzzle().is_none());
    }

    #[test]
    fn hint_penalty_expiry_lands_on_next_step() {
        let mut cfg = GameConfig::default();
        cfg.session.duration = Duration::from_secs(60);
        let mut s = session_on(&["######", "#..1G#", "######"], 1.5, 1.5, &cfg);
        let id = PuzzleId::new(1).unwrap();

        assert_eq!(s.use_hint(id), Ok(1));
        assert_eq!(s.phase(), Phase::Playing);
        let events = step(&mut s, &FrameInput::default(), FRAME);
        assert!(matches!(events[0], GameEvent::HintUsed { tier: 1, .. }));
        assert!(events.contains(&GameEvent::TimedOut));
        assert_eq!(s.phase(), Phase::TimedOut);
    }

    #[test]
    fn approaching_a_gate_opens_its_puzzle() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["######", "#..1G#", "######"], 1.5, 1.5, &cfg);
        let mut clock = Duration::ZERO;
        let events = run_until(&mut s, &mut clock, forward(), |_, ev| !ev.is_empty());

        let id = PuzzleId::new(1).unwrap();
        assert_eq!(events, vec![GameEvent::PuzzleOpened { id }, GameEvent::ReleasePointer]);
        assert_eq!(s.active_puzzle().map(|p| p.id), Some(id));

        // Movement is ignored while the overlay is open, the clock is not.
        let pose = s.pose();
        clock += FRAME;
        assert!(step(&mut s, &forward(), clock).is_empty());
        assert_eq!(s.pose(), pose);
        assert_eq!(s.countdown().elapsed(), clock);
    }

    #[test]
    fn standing_still_never_triggers() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["######", "#..1G#", "######"], 2.5, 1.5, &cfg);
        assert!(step(&mut s, &FrameInput::default(), FRAME).is_empty());
        assert!(s.active_puzzle().is_none());

        let events = step(&mut s, &forward(), FRAME * 2);
        assert!(events.contains(&GameEvent::PuzzleOpened { id: PuzzleId::new(1).unwrap() }));
    }

    #[test]
    fn closed_puzzle_waits_until_player_leaves_range() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["#######", "#...1G#", "#######"], 1.5, 1.5, &cfg);
        let mut clock = Duration::ZERO;
        run_until(&mut s, &mut clock, forward(), |s, _| s.active_puzzle().is_some());
        s.close_puzzle();

        // Still in range: pressing on does not reopen it.
        for _ in 0..10 {
            clock += FRAME;
            assert!(step(&mut s, &forward(), clock).is_empty());
        }

        // Back off out of range, then return.
        run_until(&mut s, &mut clock, back(), |s, _| s.pose().x < 2.0);
        let events = run_until(&mut s, &mut clock, forward(), |_, ev| !ev.is_empty());
        assert!(matches!(events[0], GameEvent::PuzzleOpened { .. }));
    }

    #[test]
    fn dismissed_gate_does_not_hide_another_in_range() {
        let cfg = GameConfig::default();
        let rows = ["#2###", "#..1#", "#..G#", "#####"];
        let mut s = session_on(&rows, 1.5, 1.5, &cfg);
        let mut clock = Duration::ZERO;
        let (one, two) = (PuzzleId::new(1).unwrap(), PuzzleId::new(2).unwrap());
        let events = run_until(&mut s, &mut clock, forward(), |_, ev| !ev.is_empty());
        assert_eq!(events[0], GameEvent::PuzzleOpened { id: two });
        s.close_puzzle();

        // Gate 2 is still in range when gate 1 comes into range.
        let events = run_until(&mut s, &mut clock, forward(), |_, ev| !ev.is_empty());
        assert_eq!(events[0], GameEvent::PuzzleOpened { id: one });
        assert!(s.pose().x < 2.6);

        // Pressing on against the closed gate reopens neither.
        s.close_puzzle();
        for _ in 0..40 {
            clock += FRAME;
            assert!(step(&mut s, &forward(), clock).is_empty());
        }
        // Gate 2 fell out of range on the way; gate 1 is still close.
        assert_eq!(s.dismissed, vec![one]);
    }

    #[test]
    fn solved_gate_lets_the_player_through() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["######", "#..1G#", "######"], 1.5, 1.5, &cfg);
        let mut clock = Duration::ZERO;
        run_until(&mut s, &mut clock, forward(), |s, _| s.active_puzzle().is_some());

        let id = PuzzleId::new(1).unwrap();
        s.solve(id, "Ruby Key").unwrap();
        assert!(s.active_puzzle().is_none());

        let events = run_until(&mut s, &mut clock, forward(), |s, _| s.phase() == Phase::Won);
        assert!(events.contains(&GameEvent::Won { elapsed: clock }));
        // The key event queued between frames was handed out on the way.
        assert_eq!(s.gating().keys(), ["Ruby Key".to_string()]);
    }

    #[test]
    fn turning_scales_with_frame_time() {
        let cfg = GameConfig::default();
        let mut s = session_on(&["#####", "#..G#", "#####"], 1.5, 1.5, &cfg);
        let input = FrameInput { turn: 1.0, ..Default::default() };
        step(&mut s, &input, Duration::from_millis(50));
        assert!((s.pose().yaw - cfg.movement.turn_speed * 0.05).abs() < 1e-4);

        // A long stall integrates at most MAX_FRAME_DT.
        let before = s.pose().yaw;
        step(&mut s, &input, Duration::from_secs(3));
        assert!((s.pose().yaw - before - cfg.movement.turn_speed * MAX_FRAME_DT).abs() < 1e-4);
    }

    #[test]
    fn diagonal_is_not_faster() {
        let cfg = GameConfig::default();
        let rows = ["#######", "#.....#", "#.....#", "#.....#", "#....G#", "#######"];
        let mut straight = session_on(&rows, 2.5, 2.5, &cfg);
        let mut diagonal = session_on(&rows, 2.5, 2.5, &cfg);
        step(&mut straight, &forward(), FRAME);
        step(&mut diagonal, &FrameInput { forward: true, right: true, ..Default::default() }, FRAME);

        let dist = |s: &Session| ((s.pose().x - 2.5).powi(2) + (s.pose().z - 2.5).powi(2)).sqrt();
        assert!((dist(&straight) - dist(&diagonal)).abs() < 1e-5);
    }
}
