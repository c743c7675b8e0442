/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::time::Instant;

use crossterm::event::KeyCode;
use tracing::{error, info, warn};

use config::GameConfig;
use domain::entity::FrameInput;
use domain::puzzle::{self, PuzzleId};
use error::GateError;
use sim::event::GameEvent;
use sim::maze;
use sim::session::{Phase, Session};
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::overlay::{Overlay, OverlayCommand};
use ui::renderer::{fmt_clock, Renderer};
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Logging disabled ({}): {e}", config.logging.file.display());
    }
    for w in &config.warnings {
        warn!("{w}");
    }

    let grid = match maze::builtin_grid() {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "built-in maze rejected");
            eprintln!("Maze error: {e}");
            return;
        }
    };
    info!(
        width = grid.width(),
        height = grid.height(),
        goal = ?grid.goal(),
        gates = grid.cells().filter(|(_, _, c)| c.gate_puzzle().is_some()).count(),
        "maze loaded"
    );
    let mut session = Session::new(grid, &config);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        info!("no audio output, sound disabled");
    }

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Gate Maze!");
    match session.phase() {
        Phase::Won => {
            let time = session.final_elapsed().unwrap_or_default();
            println!("Escaped in {}", fmt_clock(time));
        }
        _ => println!("Keys collected: {}", session.gating().key_count()),
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.enable_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(key_release = kb.honor_release, gamepad = gp.connected, "input ready");

    let mut started_at = Instant::now();
    let mut overlay: Option<Overlay> = None;
    // Keys held when a puzzle opened; ignored by the overlay until released.
    let mut suppressed: Vec<KeyCode> = vec![];

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        match session.phase() {
            Phase::NotStarted | Phase::Won | Phase::TimedOut => {
                if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
                    if session.phase() == Phase::NotStarted {
                        session.start();
                    } else {
                        session.restart();
                    }
                    started_at = Instant::now();
                    overlay = None;
                    kb.reset();
                } else if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
                    break;
                }
            }
            Phase::Playing => {
                if let Some(o) = overlay.as_mut() {
                    suppressed.retain(|k| kb.is_held(*k));
                    let keys = overlay_keys(&kb, &gp, &suppressed);
                    if drive_overlay(session, o, &keys, sound) {
                        overlay = None;
                    }
                } else if kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed() {
                    break;
                }

                let input = if overlay.is_some() {
                    FrameInput::default()
                } else {
                    detect_input(&kb, &gp)
                };
                let events = step::step(session, &input, started_at.elapsed());

                for event in &events {
                    match event {
                        GameEvent::PuzzleOpened { id } => {
                            let p = puzzle::puzzle(*id);
                            info!(puzzle = %id, kind = p.kind.label(), "overlay shown");
                            overlay = Some(Overlay::new(p));
                            suppressed = kb.held_keys();
                        }
                        // The terminal never captures the pointer.
                        GameEvent::ReleasePointer => {}
                        GameEvent::TimedOut | GameEvent::Won { .. } => overlay = None,
                        _ => {}
                    }
                }
                process_sound_events(sound, &events);
            }
        }

        renderer.render(session, overlay.as_ref(), &config.display)?;
        std::thread::sleep(config.display.frame);
    }

    Ok(())
}

/// Feed this frame's keys to the overlay and apply its commands to the
/// session. Returns true when the overlay should close.
fn drive_overlay(
    session: &mut Session,
    o: &mut Overlay,
    keys: &[KeyCode],
    sound: Option<&SoundEngine>,
) -> bool {
    let id = o.puzzle().id;
    for &key in keys {
        match o.handle_key(key) {
            OverlayCommand::None => {}
            OverlayCommand::Submit => match session.submit_answer(id, o.answer()) {
                Ok(()) => return true,
                Err(GateError::WrongAnswer) => {
                    o.reject("Incorrect answer. Try again!");
                    if let Some(sfx) = sound {
                        sfx.play_wrong();
                    }
                }
                Err(e) => {
                    warn!(puzzle = %id, error = %e, "submit rejected");
                    return session.active_puzzle().is_none();
                }
            },
            OverlayCommand::Hint => hint(session, o, id),
            OverlayCommand::Close => {
                session.close_puzzle();
                return true;
            }
        }
    }
    false
}

fn hint(session: &mut Session, o: &mut Overlay, id: PuzzleId) {
    match session.use_hint(id) {
        Ok(tier) => {
            let penalty = fmt_clock(session.countdown().hint_penalty());
            o.notify(format!("Hint {tier} revealed. -{penalty} from the clock."));
        }
        Err(GateError::HintExhausted(_)) => o.reject("No more hints for this puzzle."),
        Err(e) => o.reject(e.to_string()),
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::PuzzleOpened { .. } => sfx.play_puzzle_open(),
            GameEvent::KeyCollected { .. } => sfx.play_key(),
            GameEvent::DoorUnlocked => sfx.play_door(),
            GameEvent::HintUsed { .. } => sfx.play_hint(),
            GameEvent::Won { .. } => sfx.play_win(),
            GameEvent::TimedOut => sfx.play_timeout(),
            GameEvent::ReleasePointer => {}
        }
    }
}

// ── Key Constants ──

const KEYS_FORWARD: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_BACK: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_STRAFE_L: &[KeyCode] = &[KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_STRAFE_R: &[KeyCode] = &[KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_TURN_L: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_TURN_R: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('e'), KeyCode::Char('E')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn held(kb: &InputState, keys: &[KeyCode]) -> bool {
    kb.any_held(keys) || kb.any_pressed(keys)
}

fn detect_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let mut turn = gp.turn();
    if held(kb, KEYS_TURN_L) {
        turn -= 1.0;
    }
    if held(kb, KEYS_TURN_R) {
        turn += 1.0;
    }
    FrameInput {
        forward: held(kb, KEYS_FORWARD) || gp.forward_held(),
        back: held(kb, KEYS_BACK) || gp.back_held(),
        left: held(kb, KEYS_STRAFE_L) || gp.strafe_left_held(),
        right: held(kb, KEYS_STRAFE_R) || gp.strafe_right_held(),
        turn: turn.clamp(-1.0, 1.0),
    }
}

/// Typed keys for the overlay, with gamepad actions mapped onto the
/// keys they stand for.
fn overlay_keys(kb: &InputState, gp: &GamepadState, suppressed: &[KeyCode]) -> Vec<KeyCode> {
    let mut keys: Vec<KeyCode> = kb
        .typed()
        .iter()
        .copied()
        .filter(|k| !suppressed.contains(k))
        .collect();
    if gp.confirm_pressed() {
        keys.push(KeyCode::Enter);
    }
    if gp.hint_pressed() {
        keys.push(KeyCode::Tab);
    }
    if gp.cancel_pressed() {
        keys.push(KeyCode::Esc);
    }
    keys
}
