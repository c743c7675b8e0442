/// Session: the complete state of one run through the maze.
///
/// ## Phases
///
///   NotStarted → Playing → { Won, TimedOut }
///
/// `Playing` has a sub-mode: while `active_puzzle` is set the overlay owns
/// input and movement is ignored, but the countdown keeps running.
///
/// ## Mutation paths
///
/// Per-frame updates go through `step::step()`. Puzzle outcomes arrive
/// from the overlay between frames through `solve()`, `use_hint()`,
/// `close_puzzle()` and `submit_answer()`. Events produced by either path
/// are queued and handed out by the next `step()` (or `take_events()`).
///
/// The grid is read-only for the lifetime of the session; everything
/// else is rebuilt by `start()`.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::{GameConfig, MovementConfig, SessionConfig};
use crate::domain::entity::PlayerPose;
use crate::domain::gating::{GatingState, KEYS_FOR_DOOR};
use crate::domain::grid::Grid;
use crate::domain::puzzle::{self, Answer, Puzzle, PuzzleId};
use crate::domain::timer::Countdown;
use crate::error::GateError;

use super::event::GameEvent;
use super::maze;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    NotStarted,
    Playing,
    Won,
    TimedOut,
}

pub struct Session {
    // ── World ──
    pub(super) grid: Grid,
    pub(super) gating: GatingState,
    pub(super) pose: PlayerPose,

    // ── Clock ──
    pub(super) countdown: Countdown,
    /// Elapsed time seen by the previous step; frame dt is derived from it.
    pub(super) last_elapsed: Duration,
    pub(super) final_elapsed: Option<Duration>,

    // ── Meta ──
    pub(super) phase: Phase,
    pub(super) active_puzzle: Option<PuzzleId>,
    /// Puzzles closed unsolved. Each stays quiet until the player steps
    /// out of its trigger range.
    pub(super) dismissed: Vec<PuzzleId>,
    pub(super) events: Vec<GameEvent>,

    // ── Tuning ──
    pub(super) rules: SessionConfig,
    pub(super) movement: MovementConfig,

    // ── UI ──
    message: String,
    message_until: Duration,
}

// ── Construction ──

impl Session {
    pub fn new(grid: Grid, config: &GameConfig) -> Self {
        let rules = config.session.clone();
        Session {
            grid,
            gating: GatingState::new(),
            pose: maze::spawn_pose(),
            countdown: Countdown::new(rules.duration, rules.hint_penalty),
            last_elapsed: Duration::ZERO,
            final_elapsed: None,
            phase: Phase::NotStarted,
            active_puzzle: None,
            dismissed: vec![],
            events: vec![],
            rules,
            movement: config.movement.clone(),
            message: String::new(),
            message_until: Duration::ZERO,
        }
    }

    /// Begin a fresh run: new gating state, spawn pose, full countdown.
    /// The caller restarts its own session clock at the same moment.
    pub fn start(&mut self) {
        self.gating = GatingState::new();
        self.pose = maze::spawn_pose();
        self.countdown = Countdown::new(self.rules.duration, self.rules.hint_penalty);
        self.last_elapsed = Duration::ZERO;
        self.final_elapsed = None;
        self.active_puzzle = None;
        self.dismissed.clear();
        self.events.clear();
        self.message.clear();
        self.message_until = Duration::ZERO;
        self.phase = Phase::Playing;
        info!(duration_secs = self.rules.duration.as_secs(), "session started");
    }

    pub fn restart(&mut self) {
        info!(phase = ?self.phase, keys = self.gating.key_count(), "session restarted");
        self.start();
    }
}

// ── Puzzle outcomes (applied between frames) ──

impl Session {
    /// Record a solved puzzle and grant its key.
    pub fn solve(&mut self, id: PuzzleId, key: impl Into<String>) -> Result<(), GateError> {
        self.ensure_playing()?;
        let key = key.into();
        self.gating.record_solve(id, key.clone())?;
        if self.active_puzzle == Some(id) {
            self.active_puzzle = None;
        }
        self.dismissed.retain(|d| *d != id);

        let total = self.gating.key_count();
        info!(puzzle = %id, key = %key, keys = total, "key collected");
        self.set_message(&format!("{key} collected ({total}/{KEYS_FOR_DOOR})"), 3);
        self.events.push(GameEvent::KeyCollected { id, key, total });

        if total == KEYS_FOR_DOOR {
            info!("final door unlocked");
            self.set_message("All keys collected. The final door is open!", 5);
            self.events.push(GameEvent::DoorUnlocked);
        }
        Ok(())
    }

    /// Spend a hint on a puzzle. Returns the hint tier to reveal (1 or 2).
    /// A penalty that drains the clock ends the session on the next step.
    pub fn use_hint(&mut self, id: PuzzleId) -> Result<u8, GateError> {
        self.ensure_playing()?;
        if self.gating.is_solved(id) {
            return Err(GateError::AlreadySolved(id));
        }
        let tier = self.countdown.apply_hint_penalty(id)?;
        let remaining = self.countdown.remaining();
        info!(
            puzzle = %id,
            tier,
            penalty_secs = self.rules.hint_penalty.as_secs(),
            remaining_secs = remaining.as_secs(),
            "hint used"
        );
        if self.countdown.is_expired() {
            info!(puzzle = %id, "hint penalty used up the clock");
        }
        self.events.push(GameEvent::HintUsed { id, tier, remaining });
        Ok(tier)
    }

    /// Close the overlay without solving. Returns the puzzle that was open.
    pub fn close_puzzle(&mut self) -> Option<PuzzleId> {
        let closed = self.active_puzzle.take();
        if let Some(id) = closed {
            debug!(puzzle = %id, "puzzle closed unsolved");
            if !self.dismissed.contains(&id) {
                self.dismissed.push(id);
            }
        }
        closed
    }

    /// Check an answer and, when it is right, solve the puzzle with its key.
    pub fn submit_answer(&mut self, id: PuzzleId, answer: Answer<'_>) -> Result<(), GateError> {
        self.ensure_playing()?;
        if self.gating.is_solved(id) {
            return Err(GateError::AlreadySolved(id));
        }
        let p = puzzle::puzzle(id);
        if !p.accepts(answer) {
            debug!(puzzle = %id, "wrong answer");
            return Err(GateError::WrongAnswer);
        }
        self.solve(id, p.key)
    }

    /// A clock drained by a hint penalty counts as over, even before the
    /// next step records the time-out.
    fn ensure_playing(&self) -> Result<(), GateError> {
        if self.phase == Phase::Playing && !self.countdown.is_expired() {
            Ok(())
        } else {
            Err(GateError::NotPlaying)
        }
    }

    /// Hand out queued events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

// ── Read access for the renderer and overlay ──

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn gating(&self) -> &GatingState {
        &self.gating
    }

    pub fn pose(&self) -> PlayerPose {
        self.pose
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn active_puzzle(&self) -> Option<&'static Puzzle> {
        self.active_puzzle.map(puzzle::puzzle)
    }

    /// Completion time, frozen at the moment the goal was reached.
    pub fn final_elapsed(&self) -> Option<Duration> {
        self.final_elapsed
    }

    /// Status line, empty once it has expired.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Show a status line for `secs` seconds of session time.
    pub fn set_message(&mut self, msg: &str, secs: u64) {
        self.message = msg.to_string();
        self.message_until = self.last_elapsed + Duration::from_secs(secs);
    }

    pub(super) fn expire_message(&mut self) {
        if !self.message.is_empty() && self.last_elapsed >= self.message_until {
            self.message.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> PuzzleId {
        PuzzleId::new(n).unwrap()
    }

    fn session() -> Session {
        let grid = maze::builtin_grid().unwrap();
        let mut s = Session::new(grid, &GameConfig::default());
        s.start();
        s
    }

    #[test]
    fn new_session_waits_for_start() {
        let s = Session::new(maze::builtin_grid().unwrap(), &GameConfig::default());
        assert_eq!(s.phase(), Phase::NotStarted);
        assert_eq!(s.pose(), maze::spawn_pose());
    }

    #[test]
    fn outcomes_rejected_before_start() {
        let mut s = Session::new(maze::builtin_grid().unwrap(), &GameConfig::default());
        assert_eq!(s.solve(id(1), "Ruby Key"), Err(GateError::NotPlaying));
        assert_eq!(s.use_hint(id(1)), Err(GateError::NotPlaying));
        assert_eq!(s.gating().key_count(), 0);
    }

    #[test]
    fn solve_emits_key_then_door() {
        let mut s = session();
        for n in 1..=4 {
            s.solve(id(n), format!("k{n}")).unwrap();
        }
        let events = s.take_events();
        assert_eq!(events.len(), 4);
        assert!(!events.contains(&GameEvent::DoorUnlocked));

        s.solve(id(5), "k5").unwrap();
        let events = s.take_events();
        assert_eq!(
            events,
            vec![
                GameEvent::KeyCollected { id: id(5), key: "k5".into(), total: 5 },
                GameEvent::DoorUnlocked,
            ]
        );
        assert!(s.gating().door_open());
    }

    #[test]
    fn duplicate_solve_changes_nothing() {
        let mut s = session();
        s.solve(id(2), "Sapphire Key").unwrap();
        s.take_events();
        assert_eq!(s.solve(id(2), "Sapphire Key"), Err(GateError::AlreadySolved(id(2))));
        assert!(s.take_events().is_empty());
        assert_eq!(s.gating().key_count(), 1);
    }

    #[test]
    fn solve_clears_the_active_slot() {
        let mut s = session();
        s.active_puzzle = Some(id(3));
        s.solve(id(3), "Emerald Key").unwrap();
        assert!(s.active_puzzle().is_none());
    }

    #[test]
    fn hints_cost_time_and_run_out() {
        let mut s = session();
        let full = s.countdown().remaining();
        assert_eq!(s.use_hint(id(1)), Ok(1));
        assert_eq!(s.use_hint(id(1)), Ok(2));
        assert_eq!(s.countdown().remaining(), full - Duration::from_secs(120));
        assert_eq!(s.use_hint(id(1)), Err(GateError::HintExhausted(id(1))));
        assert_eq!(s.countdown().remaining(), full - Duration::from_secs(120));
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn no_hints_for_solved_puzzles() {
        let mut s = session();
        s.solve(id(4), "Topaz Key").unwrap();
        assert_eq!(s.use_hint(id(4)), Err(GateError::AlreadySolved(id(4))));
    }

    #[test]
    fn submit_answer_checks_before_solving() {
        let mut s = session();
        assert_eq!(s.submit_answer(id(1), Answer::Text("GATE")), Err(GateError::WrongAnswer));
        assert_eq!(s.gating().key_count(), 0);

        s.submit_answer(id(1), Answer::Text(" gateway ")).unwrap();
        assert!(s.gating().is_solved(id(1)));
        assert_eq!(s.gating().keys(), [puzzle::puzzle(id(1)).key.to_string()]);
        assert_eq!(
            s.submit_answer(id(1), Answer::Text("GATEWAY")),
            Err(GateError::AlreadySolved(id(1)))
        );
    }

    #[test]
    fn nothing_granted_once_a_hint_drains_the_clock() {
        let mut cfg = GameConfig::default();
        cfg.session.duration = Duration::from_secs(60);
        let mut s = Session::new(maze::builtin_grid().unwrap(), &cfg);
        s.start();
        s.active_puzzle = Some(id(1));

        assert_eq!(s.use_hint(id(1)), Ok(1));
        assert_eq!(s.countdown().remaining(), Duration::ZERO);
        assert_eq!(s.submit_answer(id(1), Answer::Text("GATEWAY")), Err(GateError::NotPlaying));
        assert_eq!(s.solve(id(2), "Sapphire Key"), Err(GateError::NotPlaying));
        assert_eq!(s.use_hint(id(1)), Err(GateError::NotPlaying));
        assert_eq!(s.gating().key_count(), 0);
        assert_eq!(s.countdown().hints_used(id(1)), 1);
    }

    #[test]
    fn close_puzzle_keeps_it_unsolved() {
        let mut s = session();
        s.active_puzzle = Some(id(2));
        assert_eq!(s.close_puzzle(), Some(id(2)));
        assert!(s.active_puzzle().is_none());
        assert!(!s.gating().is_solved(id(2)));
        assert_eq!(s.close_puzzle(), None);
    }

    #[test]
    fn restart_resets_everything() {
        let mut s = session();
        s.solve(id(1), "Ruby Key").unwrap();
        s.use_hint(id(2)).unwrap();
        s.pose = PlayerPose::new(10.5, 10.5, 0.0);
        s.phase = Phase::Won;
        s.final_elapsed = Some(Duration::from_secs(99));

        s.restart();
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.gating().key_count(), 0);
        assert_eq!(s.countdown().hints_used(id(2)), 0);
        assert_eq!(s.countdown().remaining(), Duration::from_secs(45 * 60));
        assert_eq!(s.pose(), maze::spawn_pose());
        assert!(s.final_elapsed().is_none());
        assert!(s.take_events().is_empty());
    }
}
