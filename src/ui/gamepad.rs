/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Walk (up/down) and strafe (left/right)
///   Right Stick X         →  Turn
///   L1 / L2, R1 / R2      →  Turn left, turn right
///   A / Start             →  Confirm (start, submit, play again)
///   B / Select            →  Cancel (close puzzle, quit)
///   Y                     →  Hint

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    hint: Vec<Btn>,
    turn_left: Vec<Btn>,
    turn_right: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm:    vec![Btn::A, Btn::Start],
            cancel:     vec![Btn::B, Btn::Select],
            hint:       vec![Btn::Y],
            turn_left:  vec![Btn::L1, Btn::L2],
            turn_right: vec![Btn::R1, Btn::R2],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // D-pad
    dpad_up: bool,
    dpad_down: bool,
    dpad_left: bool,
    dpad_right: bool,

    // Sticks
    stick_x: f32,
    stick_y: f32,
    look_x: f32,

    // Action mapping
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(_) => (None, false),
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_up: false,
            dpad_down: false,
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            stick_y: 0.0,
            look_x: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. A list with no recognised
    /// button names leaves that action's default in place.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.cancel, &cfg.cancel);
        apply(&mut map.hint, &cfg.hint);
        apply(&mut map.turn_left, &cfg.turn_left);
        apply(&mut map.turn_right, &cfg.turn_right);
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        Axis::RightStickX => self.look_x = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    tracing::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad_up = held; return; }
            Button::DPadDown  => { self.dpad_down = held; return; }
            Button::DPadLeft  => { self.dpad_left = held; return; }
            Button::DPadRight => { self.dpad_right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.press(btn, held);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn, held: bool) {
        let state = &mut self.buttons[btn_index(btn)];
        if held && !state.held {
            state.just_pressed = true;
        }
        state.held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].held)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn hint_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.hint)
    }

    // Movement (continuous, held)
    pub fn forward_held(&self) -> bool {
        self.dpad_up || self.stick_y > STICK_DEADZONE
    }
    pub fn back_held(&self) -> bool {
        self.dpad_down || self.stick_y < -STICK_DEADZONE
    }
    pub fn strafe_left_held(&self) -> bool {
        self.dpad_left || self.stick_x < -STICK_DEADZONE
    }
    pub fn strafe_right_held(&self) -> bool {
        self.dpad_right || self.stick_x > STICK_DEADZONE
    }

    /// Signed turn amount in -1.0..=1.0 (negative = left).
    /// Shoulder buttons turn at full speed; the right stick is analog.
    pub fn turn(&self) -> f32 {
        let mut t = 0.0;
        if self.any_held(&self.action_map.turn_left) {
            t -= 1.0;
        }
        if self.any_held(&self.action_map.turn_right) {
            t += 1.0;
        }
        if self.look_x.abs() > STICK_DEADZONE {
            t += self.look_x;
        }
        t.clamp(-1.0, 1.0)
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = false;
        self.dpad_down = false;
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_x = 0.0;
        self.stick_y = 0.0;
        self.look_x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_and_aliases() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name(" north "), Some(Btn::Y));
        assert_eq!(Btn::from_name("LB"), Some(Btn::L1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_only_recognised_lists() {
        let mut pad = GamepadState::new();
        pad.load_button_config(&GamepadConfig {
            confirm: names(&["X"]),
            cancel: names(&["nonsense"]),
            hint: vec![],
            turn_left: names(&["L2", "bogus"]),
            turn_right: names(&["R2"]),
        });
        let defaults = ActionMap::default();
        assert_eq!(pad.action_map.confirm, vec![Btn::X]);
        assert_eq!(pad.action_map.cancel, defaults.cancel);
        assert_eq!(pad.action_map.hint, defaults.hint);
        assert_eq!(pad.action_map.turn_left, vec![Btn::L2]);
    }

    #[test]
    fn press_is_an_edge_until_next_update() {
        let mut pad = GamepadState::new();
        pad.press(Btn::Y, true);
        assert!(pad.hint_pressed());
        pad.update();
        assert!(!pad.hint_pressed());
        // still held: no new edge
        pad.press(Btn::Y, true);
        assert!(!pad.hint_pressed());
    }

    #[test]
    fn turn_combines_buttons_and_stick() {
        let mut pad = GamepadState::new();
        assert_eq!(pad.turn(), 0.0);
        pad.press(Btn::L1, true);
        assert_eq!(pad.turn(), -1.0);
        pad.press(Btn::R1, true);
        assert_eq!(pad.turn(), 0.0);
        pad.press(Btn::L1, false);
        pad.press(Btn::R1, false);
        pad.look_x = 0.1;
        assert_eq!(pad.turn(), 0.0);
        pad.look_x = -0.6;
        assert!((pad.turn() + 0.6).abs() < 1e-6);
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut pad = GamepadState::new();
        pad.stick_y = 0.2;
        assert!(!pad.forward_held());
        pad.stick_y = 0.8;
        assert!(pad.forward_held());
        pad.stick_x = -0.9;
        assert!(pad.strafe_left_held());
        pad.release_all();
        assert!(!pad.forward_held() && !pad.strafe_left_held());
    }
}
