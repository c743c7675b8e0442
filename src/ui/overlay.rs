/// Puzzle overlay: answer entry for the open puzzle.
///
/// The overlay owns only presentation state (the typed answer, the
/// Caesar shift being tried, the debug cursor and fixes found so far).
/// Whether a puzzle is solved, and how many hints were spent, lives in
/// the session; the overlay asks for those through `OverlayCommand`.
///
/// ## Keys
///   Text puzzles   type letters/digits, Backspace, Enter submits
///   Caesar         ←/→ change the trial shift, then type the word
///   Debug          ↑/↓ pick a line, Enter inspects it; in the fix
///                  list ↑/↓ or 1-3 pick a fix, Enter applies it
///   Tab            spend a hint
///   Esc            close (or back out of the fix list)

use crossterm::event::KeyCode;

use crate::domain::cipher;
use crate::domain::puzzle::{Answer, BugFix, Puzzle, PuzzleKind};

const MAX_ENTRY: usize = 16;

/// What the overlay wants the session to do after a key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OverlayCommand {
    None,
    Submit,
    Hint,
    Close,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Feedback {
    Good(String),
    Bad(String),
}

pub struct Overlay {
    puzzle: &'static Puzzle,
    entry: String,
    shift: u8,
    cursor: usize,
    fixing: Option<&'static BugFix>,
    fix_choice: usize,
    fixed: Vec<u8>,
    feedback: Option<Feedback>,
}

impl Overlay {
    pub fn new(puzzle: &'static Puzzle) -> Self {
        Overlay {
            puzzle,
            entry: String::new(),
            shift: 0,
            cursor: 0,
            fixing: None,
            fix_choice: 0,
            fixed: vec![],
            feedback: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> OverlayCommand {
        match code {
            KeyCode::Esc if self.fixing.is_some() => {
                self.fixing = None;
                OverlayCommand::None
            }
            KeyCode::Esc => OverlayCommand::Close,
            KeyCode::Tab => OverlayCommand::Hint,
            _ => match self.puzzle.kind {
                PuzzleKind::Debug { .. } => self.debug_key(code),
                PuzzleKind::Caesar { .. } => match code {
                    KeyCode::Left => {
                        self.shift = (self.shift + 25) % 26;
                        OverlayCommand::None
                    }
                    KeyCode::Right => {
                        self.shift = (self.shift + 1) % 26;
                        OverlayCommand::None
                    }
                    _ => self.text_key(code),
                },
                _ => self.text_key(code),
            },
        }
    }

    fn text_key(&mut self, code: KeyCode) -> OverlayCommand {
        match code {
            KeyCode::Char(c) if c.is_ascii_alphanumeric() || c == ' ' => {
                if self.entry.len() < MAX_ENTRY {
                    self.entry.push(c.to_ascii_uppercase());
                }
                OverlayCommand::None
            }
            KeyCode::Backspace => {
                self.entry.pop();
                OverlayCommand::None
            }
            KeyCode::Enter if !self.entry.trim().is_empty() => OverlayCommand::Submit,
            _ => OverlayCommand::None,
        }
    }

    fn debug_key(&mut self, code: KeyCode) -> OverlayCommand {
        let PuzzleKind::Debug { listing } = self.puzzle.kind else {
            return OverlayCommand::None;
        };

        if let Some(bug) = self.fixing {
            return match code {
                KeyCode::Up => {
                    self.fix_choice = self.fix_choice.saturating_sub(1);
                    OverlayCommand::None
                }
                KeyCode::Down => {
                    self.fix_choice = (self.fix_choice + 1).min(bug.options.len() - 1);
                    OverlayCommand::None
                }
                KeyCode::Char(c @ '1'..='3') => {
                    self.fix_choice = c as usize - '1' as usize;
                    self.apply_fix(bug)
                }
                KeyCode::Enter => self.apply_fix(bug),
                _ => OverlayCommand::None,
            };
        }

        match code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                OverlayCommand::None
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(listing.len().saturating_sub(1));
                OverlayCommand::None
            }
            KeyCode::PageUp => {
                self.cursor = self.cursor.saturating_sub(10);
                OverlayCommand::None
            }
            KeyCode::PageDown => {
                self.cursor = (self.cursor + 10).min(listing.len().saturating_sub(1));
                OverlayCommand::None
            }
            KeyCode::Enter => {
                let Some(line) = listing.get(self.cursor) else {
                    return OverlayCommand::None;
                };
                match self.puzzle.bug_on_line(line.number) {
                    Some(bug) if self.fixed.contains(&bug.id) => {
                        self.feedback = Some(Feedback::Good(format!("Line {} is already fixed.", line.number)));
                    }
                    Some(bug) => {
                        self.fixing = Some(bug);
                        self.fix_choice = 0;
                        self.feedback = None;
                    }
                    None => {
                        self.feedback = Some(Feedback::Bad("No bug on this line. Keep looking!".into()));
                    }
                }
                OverlayCommand::None
            }
            _ => OverlayCommand::None,
        }
    }

    fn apply_fix(&mut self, bug: &'static BugFix) -> OverlayCommand {
        if !bug.is_correct(self.fix_choice) {
            self.feedback = Some(Feedback::Bad("Wrong fix! Try again.".into()));
            return OverlayCommand::None;
        }
        self.fixing = None;
        if !self.fixed.contains(&bug.id) {
            self.fixed.push(bug.id);
        }
        let total = self.bug_total();
        self.feedback = Some(Feedback::Good(format!("Bug {}/{} fixed!", self.fixed.len(), total)));
        if self.fixed.len() == total {
            OverlayCommand::Submit
        } else {
            OverlayCommand::None
        }
    }

    /// The answer to hand to `Session::submit_answer`.
    pub fn answer(&self) -> Answer<'_> {
        match self.puzzle.kind {
            PuzzleKind::Debug { .. } => Answer::FixedBugs(&self.fixed),
            _ => Answer::Text(&self.entry),
        }
    }

    pub fn reject(&mut self, msg: impl Into<String>) {
        self.feedback = Some(Feedback::Bad(msg.into()));
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        self.feedback = Some(Feedback::Good(msg.into()));
    }

    // ── Read access for the renderer ──

    pub fn puzzle(&self) -> &'static Puzzle {
        self.puzzle
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn shift(&self) -> u8 {
        self.shift
    }

    /// Live decode of the Caesar text at the current trial shift.
    pub fn caesar_preview(&self) -> Option<String> {
        match self.puzzle.kind {
            PuzzleKind::Caesar { encoded, .. } => Some(cipher::caesar_decode(encoded, self.shift)),
            _ => None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The bug whose fix list is open, with the highlighted option.
    pub fn fixing(&self) -> Option<(&'static BugFix, usize)> {
        self.fixing.map(|b| (b, self.fix_choice))
    }

    pub fn is_fixed(&self, bug_id: u8) -> bool {
        self.fixed.contains(&bug_id)
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed.len()
    }

    pub fn bug_total(&self) -> usize {
        match self.puzzle.kind {
            PuzzleKind::Debug { listing } => listing.iter().filter(|l| l.bug.is_some()).count(),
            _ => 0,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::puzzle::{puzzle, PuzzleId};

    fn overlay(n: u8) -> Overlay {
        Overlay::new(puzzle(PuzzleId::new(n).unwrap()))
    }

    fn type_str(o: &mut Overlay, s: &str) {
        for c in s.chars() {
            assert_eq!(o.handle_key(KeyCode::Char(c)), OverlayCommand::None);
        }
    }

    #[test]
    fn typing_builds_an_uppercase_answer() {
        let mut o = overlay(1);
        assert_eq!(o.handle_key(KeyCode::Enter), OverlayCommand::None);
        type_str(&mut o, "gatewax");
        o.handle_key(KeyCode::Backspace);
        type_str(&mut o, "y");
        assert_eq!(o.entry(), "GATEWAY");
        assert_eq!(o.handle_key(KeyCode::Enter), OverlayCommand::Submit);
        assert!(o.puzzle().accepts(o.answer()));
    }

    #[test]
    fn entry_is_bounded_and_filters_symbols() {
        let mut o = overlay(2);
        type_str(&mut o, "4!2");
        assert_eq!(o.entry(), "42");
        type_str(&mut o, &"9".repeat(40));
        assert_eq!(o.entry().len(), MAX_ENTRY);
    }

    #[test]
    fn control_keys() {
        let mut o = overlay(3);
        assert_eq!(o.handle_key(KeyCode::Tab), OverlayCommand::Hint);
        assert_eq!(o.handle_key(KeyCode::Esc), OverlayCommand::Close);
    }

    #[test]
    fn caesar_shift_wraps_and_previews() {
        let mut o = overlay(4);
        assert_eq!(o.caesar_preview().as_deref(), Some("BDAOQQP"));
        o.handle_key(KeyCode::Left);
        assert_eq!(o.shift(), 25);
        for _ in 0..13 {
            o.handle_key(KeyCode::Right);
        }
        assert_eq!(o.shift(), 12);
        assert_eq!(o.caesar_preview().as_deref(), Some("PROCEED"));
        assert!(overlay(1).caesar_preview().is_none());
    }

    #[test]
    fn debug_rejects_clean_lines_and_wrong_fixes() {
        let mut o = overlay(5);
        o.handle_key(KeyCode::Enter); // line 1
        assert!(matches!(o.feedback(), Some(Feedback::Bad(_))));
        assert!(o.fixing().is_none());

        for _ in 0..4 {
            o.handle_key(KeyCode::Down);
        }
        o.handle_key(KeyCode::Enter); // line 5
        let (bug, choice) = o.fixing().unwrap();
        assert_eq!((bug.id, choice), (1, 0));
        assert_eq!(o.handle_key(KeyCode::Char('1')), OverlayCommand::None);
        assert!(matches!(o.feedback(), Some(Feedback::Bad(_))));
        assert_eq!(o.fixed_count(), 0);

        o.handle_key(KeyCode::Esc);
        assert!(o.fixing().is_none());
    }

    #[test]
    fn fixing_every_bug_submits() {
        let mut o = overlay(5);
        let PuzzleKind::Debug { listing } = o.puzzle().kind else { unreachable!() };
        let mut last = OverlayCommand::None;
        for (i, line) in listing.iter().enumerate() {
            let Some(bug) = &line.bug else { continue };
            while o.cursor() < i {
                o.handle_key(KeyCode::Down);
            }
            o.handle_key(KeyCode::Enter);
            let right = bug.options.iter().position(|opt| *opt == bug.fix).unwrap();
            let key = char::from(b'1' + right as u8);
            last = o.handle_key(KeyCode::Char(key));
            assert!(o.is_fixed(bug.id));
        }
        assert_eq!(last, OverlayCommand::Submit);
        assert_eq!(o.fixed_count(), o.bug_total());
        assert!(o.puzzle().accepts(o.answer()));
    }
}
