/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The first-person view is a column raycaster: one ray per terminal
/// column, stepped cell by cell through the grid (DDA) until it meets a
/// cell the gating state says is closed. Solved gates and the opened
/// door are see-through, exactly as they are walk-through.

use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::DisplayConfig;
use crate::domain::cell::Cell;
use crate::domain::cipher;
use crate::domain::gating::{GatingState, KEYS_FOR_DOOR};
use crate::domain::grid::Grid;
use crate::domain::puzzle::{self, PuzzleId, PuzzleKind};
use crate::domain::timer::MAX_HINTS_PER_PUZZLE;
use crate::sim::session::{Phase, Session};

use super::overlay::{Feedback, Overlay};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// gap between rows matches the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Glyph::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Raycasting ──

/// Which kind of grid line the ray crossed when it hit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    X,
    Z,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RayHit {
    /// Distance along the ray to the face that was hit.
    pub dist: f32,
    pub cell: Cell,
    pub side: Side,
    /// Distance at which the ray entered the goal cell, if it crossed it.
    pub goal: Option<f32>,
}

/// Step a ray from `(ox, oz)` along `angle` until it enters a closed cell.
/// Returns None when nothing is hit within `max_dist`.
pub fn cast_ray(
    grid: &Grid,
    gating: &GatingState,
    ox: f32,
    oz: f32,
    angle: f32,
    max_dist: f32,
) -> Option<RayHit> {
    let (dx, dz) = (angle.cos(), angle.sin());
    let mut mx = ox.floor() as i32;
    let mut mz = oz.floor() as i32;

    let delta_x = if dx == 0.0 { f32::INFINITY } else { dx.recip().abs() };
    let delta_z = if dz == 0.0 { f32::INFINITY } else { dz.recip().abs() };
    let (step_x, mut side_x) = if dx < 0.0 {
        (-1, (ox - mx as f32) * delta_x)
    } else {
        (1, (mx as f32 + 1.0 - ox) * delta_x)
    };
    let (step_z, mut side_z) = if dz < 0.0 {
        (-1, (oz - mz as f32) * delta_z)
    } else {
        (1, (mz as f32 + 1.0 - oz) * delta_z)
    };

    let mut goal = None;
    loop {
        let (dist, side) = if side_x < side_z {
            mx += step_x;
            let d = side_x;
            side_x += delta_x;
            (d, Side::X)
        } else {
            mz += step_z;
            let d = side_z;
            side_z += delta_z;
            (d, Side::Z)
        };
        if dist > max_dist {
            return None;
        }

        let cell = grid.cell_at(mx, mz);
        if !gating.is_passable(cell) {
            return Some(RayHit { dist, cell, side, goal });
        }
        if cell.is_goal() && goal.is_none() {
            goal = Some(dist);
        }
    }
}

// ── Palette ──

const SKY: Color = Color::Rgb { r: 120, g: 180, b: 230 };
const GRASS: Color = Color::Rgb { r: 60, g: 110, b: 50 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const PANEL_BG: Color = Color::Rgb { r: 235, g: 240, b: 250 };
const PANEL_FG: Color = Color::Rgb { r: 30, g: 40, b: 80 };
const CODE_BG: Color = Color::Rgb { r: 30, g: 30, b: 40 };
const GOOD: Color = Color::Rgb { r: 0, g: 170, b: 60 };
const BAD: Color = Color::Rgb { r: 210, g: 40, b: 40 };
const GOAL_GLOW: Color = Color::Rgb { r: 255, g: 215, b: 0 };

fn gate_color(id: PuzzleId) -> (u8, u8, u8) {
    match id.get() {
        1 => (220, 30, 60),   // ruby
        2 => (30, 90, 220),   // sapphire
        3 => (20, 180, 90),   // emerald
        4 => (240, 180, 30),  // topaz
        _ => (150, 70, 200),  // amethyst
    }
}

fn base_color(cell: Cell) -> (u8, u8, u8) {
    match cell {
        Cell::Gate(id) => gate_color(id),
        Cell::LockedDoor => (139, 90, 43),
        _ => (150, 150, 150),
    }
}

fn shade((r, g, b): (u8, u8, u8), k: f32) -> Color {
    let k = k.clamp(0.0, 1.0);
    Color::Rgb { r: (r as f32 * k) as u8, g: (g as f32 * k) as u8, b: (b as f32 * k) as u8 }
}

fn wall_char(dist: f32) -> char {
    match dist {
        d if d < 2.0 => '█',
        d if d < 4.0 => '▓',
        d if d < 7.0 => '▒',
        _ => '░',
    }
}

// ── Layout ──

const HUD_ROW: usize = 0;
const VIEW_ROW: usize = 1;
const MAX_RAY: f32 = 24.0;
/// Terminal cells are about twice as tall as they are wide.
const CELL_ASPECT: f32 = 0.5;
const MINIMAP_RADIUS_X: i32 = 8;
const MINIMAP_RADIUS_Z: i32 = 5;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Glyph::INVALID);

        Ok(())
    }

    /// Ask the terminal for key release events. Returns true when the
    /// terminal supports them; input can then trust Release.
    pub fn enable_key_release(&mut self) -> bool {
        if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            return false;
        }
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        self.enhanced_keys = execute!(self.writer, PushKeyboardEnhancementFlags(flags)).is_ok();
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(
        &mut self,
        session: &Session,
        overlay: Option<&Overlay>,
        display: &DisplayConfig,
    ) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for a clean transition
        let phase = session.phase();
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();

        match phase {
            Phase::NotStarted => self.compose_instructions(session),
            Phase::Playing => {
                self.compose_game(session, display);
                if let Some(o) = overlay {
                    self.compose_puzzle(session, o);
                }
            }
            Phase::Won => self.compose_victory(session),
            Phase::TimedOut => self.compose_timeout(session),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default, which may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Glyph::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: in-game ──

    fn compose_game(&mut self, s: &Session, display: &DisplayConfig) {
        let buf_w = self.front.width;
        let buf_h = self.front.height;
        if buf_h < VIEW_ROW + 4 {
            return;
        }

        // ── HUD row ──
        let cd = s.countdown();
        let remaining = cd.remaining();
        let mut hud = format!(
            " TIME {}   KEYS {}/{}",
            fmt_clock(remaining),
            s.gating().key_count(),
            KEYS_FOR_DOOR,
        );
        if !cd.penalty_total().is_zero() {
            hud.push_str(&format!("   HINT PENALTY -{}", fmt_clock(cd.penalty_total())));
        }
        if s.gating().door_open() {
            hud.push_str("   FINAL DOOR OPEN");
        }
        let hud_fg = if remaining < Duration::from_secs(300) { BAD } else { Color::White };
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, hud_fg, HUD_BG);

        // ── 3D view ──
        let view_h = buf_h - VIEW_ROW - 2;
        self.compose_view(s, display.fov, buf_w, view_h);

        if display.show_minimap {
            self.compose_minimap(s, buf_w);
        }

        // ── Message bar ──
        let msg_row = VIEW_ROW + view_h;
        if !s.message().is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, s.message(), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " W/S move  A/D strafe  Q/E or ←/→ turn  Esc quit";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_view(&mut self, s: &Session, fov: f32, width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }
        let pose = s.pose();
        let horizon = height as f32 / 2.0;
        // Wall one cell away fills the view vertically at this scale.
        let proj = (width as f32 / 2.0) / (fov / 2.0).tan() * CELL_ASPECT;

        for col in 0..width {
            let t = (col as f32 + 0.5) / width as f32 - 0.5;
            let angle = pose.yaw + t * fov;
            let hit = cast_ray(s.grid(), s.gating(), pose.x, pose.z, angle, MAX_RAY);

            // Fish-eye correction: distance measured along the view axis.
            let cos_off = (angle - pose.yaw).cos();
            let wall = hit.map(|h| {
                let perp = (h.dist * cos_off).max(0.05);
                (h, perp, (proj / perp).min(height as f32 * 4.0))
            });

            for row in 0..height {
                let y = VIEW_ROW + row;
                let fy = row as f32 + 0.5;
                let base = if fy < horizon { SKY } else { GRASS };
                let mut glyph = Glyph::new(' ', Color::White, base);

                if let Some((h, perp, line_h)) = wall {
                    if (fy - horizon).abs() <= line_h / 2.0 {
                        let k = 1.0 - perp / MAX_RAY;
                        let k = if h.side == Side::Z { k * 0.75 } else { k };
                        let fg = shade(base_color(h.cell), k);
                        glyph = Glyph::new(wall_char(perp), fg, shade(base_color(h.cell), k * 0.6));
                    }
                }

                if let Some(goal) = hit.and_then(|h| h.goal).filter(|_| wall.is_some()) {
                    let gp = (goal * cos_off).max(0.3);
                    let band = (proj / gp / 3.0).max(1.0);
                    if fy > horizon && fy - horizon <= band {
                        glyph = Glyph::new('◆', GOAL_GLOW, glyph.bg);
                    }
                }

                self.front.set(col, y, glyph);
            }
        }
    }

    fn compose_minimap(&mut self, s: &Session, buf_w: usize) {
        let map_w = (MINIMAP_RADIUS_X * 2 + 1) as usize * 2;
        if buf_w < map_w + 2 {
            return;
        }
        let left = buf_w - map_w - 1;
        let top = VIEW_ROW + 1;
        let pose = s.pose();
        let (px, pz) = pose.cell();

        for dz in -MINIMAP_RADIUS_Z..=MINIMAP_RADIUS_Z {
            for dx in -MINIMAP_RADIUS_X..=MINIMAP_RADIUS_X {
                let (gx, gz) = (px + dx, pz + dz);
                let col = left + ((dx + MINIMAP_RADIUS_X) * 2) as usize;
                let row = top + (dz + MINIMAP_RADIUS_Z) as usize;
                let cell = s.grid().cell_at(gx, gz);
                let open = s.gating().is_passable(cell);

                let (text, fg, bg) = if dx == 0 && dz == 0 {
                    let arrow = facing_arrow(pose.yaw);
                    ([arrow, ' '], Color::White, Color::Rgb { r: 200, g: 40, b: 40 })
                } else if !s.grid().contains(gx, gz) {
                    ([' ', ' '], Color::Black, Color::Black)
                } else {
                    match cell {
                        Cell::Wall => ([' ', ' '], Color::White, Color::Rgb { r: 90, g: 90, b: 90 }),
                        Cell::Floor => ([' ', ' '], Color::White, Color::Rgb { r: 25, g: 25, b: 25 }),
                        Cell::Goal => (['◆', ' '], GOAL_GLOW, Color::Rgb { r: 25, g: 25, b: 25 }),
                        Cell::Gate(id) if open => (['·', '·'], shade(gate_color(id), 1.0), Color::Rgb { r: 25, g: 25, b: 25 }),
                        Cell::Gate(id) => {
                            let digit = char::from(b'0' + id.get());
                            ([digit, ' '], Color::White, shade(gate_color(id), 1.0))
                        }
                        Cell::LockedDoor if open => (['·', '·'], shade(base_color(cell), 1.0), Color::Rgb { r: 25, g: 25, b: 25 }),
                        Cell::LockedDoor => (['D', ' '], Color::White, shade(base_color(cell), 1.0)),
                    }
                };
                self.front.set(col, row, Glyph::new(text[0], fg, bg));
                self.front.set(col + 1, row, Glyph::new(text[1], fg, bg));
            }
        }
    }

    // ── Compose: puzzle overlay ──

    fn compose_puzzle(&mut self, s: &Session, o: &Overlay) {
        let p = o.puzzle();
        let box_w = self.front.width.saturating_sub(4).min(76);
        let box_h = self.front.height.saturating_sub(2);
        if box_w < 30 || box_h < 12 {
            return;
        }
        let x0 = (self.front.width - box_w) / 2;
        let y0 = 1;
        let inner = box_w - 4;
        self.front.fill_rect(x0, y0, box_w, box_h, PANEL_BG);

        let mut lines: Vec<(String, Color, Color)> = vec![];
        lines.push((format!("PUZZLE {}: {}", p.id, p.title), PANEL_FG, PANEL_BG));
        for l in wrap(p.description, inner) {
            lines.push((l, PANEL_FG, PANEL_BG));
        }
        lines.push((String::new(), PANEL_FG, PANEL_BG));

        match p.kind {
            PuzzleKind::Hex { bytes } => {
                lines.push((format!("  {bytes}"), Color::White, CODE_BG));
                lines.push((String::new(), PANEL_FG, PANEL_BG));
                let chart = cipher::hex_reference_chart();
                let half = chart.len().div_ceil(2);
                for i in 0..half {
                    let left = &chart[i];
                    let mut row = format!("  {} = {:>3} = 0x{}", left.letter, left.decimal, left.hex);
                    if let Some(right) = chart.get(i + half) {
                        row.push_str(&format!("      {} = {:>3} = 0x{}", right.letter, right.decimal, right.hex));
                    }
                    lines.push((row, PANEL_FG, PANEL_BG));
                }
            }
            PuzzleKind::Pseudocode { code } | PuzzleKind::Algorithm { algorithm: code, .. } => {
                for l in code.lines() {
                    lines.push((format!("  {l}"), Color::White, CODE_BG));
                }
            }
            PuzzleKind::Caesar { encoded, .. } => {
                lines.push((format!("  Encrypted: {encoded}"), Color::White, CODE_BG));
                let preview = o.caesar_preview().unwrap_or_default();
                lines.push((format!("  Shift {:>2}  ←/→   Decoded: {preview}", o.shift()), Color::White, CODE_BG));
            }
            PuzzleKind::Debug { listing } => {
                lines.push((format!("Bugs fixed: {} / {}", o.fixed_count(), o.bug_total()), PANEL_FG, PANEL_BG));
                let window = box_h.saturating_sub(lines.len() + 10).max(5);
                let start = o.cursor().saturating_sub(window / 2).min(listing.len().saturating_sub(window));
                for (i, line) in listing.iter().enumerate().skip(start).take(window) {
                    let fixed = line.bug.as_ref().is_some_and(|b| o.is_fixed(b.id));
                    let marker = if i == o.cursor() { '>' } else { ' ' };
                    let text = match &line.bug {
                        Some(b) if fixed => format!("{marker}{:>3} ✓ {}", line.number, b.fix),
                        _ => format!("{marker}{:>3}   {}", line.number, line.text),
                    };
                    let fg = if fixed { GOOD } else { Color::White };
                    let bg = if i == o.cursor() { Color::Rgb { r: 60, g: 60, b: 90 } } else { CODE_BG };
                    lines.push((text, fg, bg));
                }
                if let Some((bug, choice)) = o.fixing() {
                    lines.push((String::new(), PANEL_FG, PANEL_BG));
                    lines.push(("Select the correct fix (1-3, Enter):".into(), PANEL_FG, PANEL_BG));
                    for (i, opt) in bug.options.iter().enumerate() {
                        let marker = if i == choice { '>' } else { ' ' };
                        lines.push((format!(" {marker} {}. {opt}", i + 1), PANEL_FG, PANEL_BG));
                    }
                }
            }
        }

        lines.push((String::new(), PANEL_FG, PANEL_BG));
        if !matches!(p.kind, PuzzleKind::Debug { .. }) {
            lines.push((format!("Answer: {}_", o.entry()), PANEL_FG, PANEL_BG));
        }

        let used = s.countdown().hints_used(p.id);
        for tier in 1..=used {
            if let Some(h) = p.hint(tier) {
                for l in wrap(&format!("Hint {tier}: {h}"), inner) {
                    lines.push((l, Color::Rgb { r: 120, g: 80, b: 0 }, PANEL_BG));
                }
            }
        }
        match o.feedback() {
            Some(Feedback::Good(m)) => lines.push((m.clone(), GOOD, PANEL_BG)),
            Some(Feedback::Bad(m)) => lines.push((m.clone(), BAD, PANEL_BG)),
            None => {}
        }

        let max_rows = box_h.saturating_sub(3);
        for (i, (text, fg, bg)) in lines.iter().take(max_rows).enumerate() {
            let clipped: String = text.chars().take(inner).collect();
            self.front.put_str(x0 + 2, y0 + 1 + i, &clipped, *fg, *bg);
        }

        let hints_left = MAX_HINTS_PER_PUZZLE.saturating_sub(used);
        let footer = format!(
            "Enter submit   Tab hint ({hints_left} left, -{} each)   Esc close",
            fmt_clock(s.countdown().hint_penalty()),
        );
        self.front.put_str(x0 + 2, y0 + box_h - 2, &footer, Color::DarkGrey, PANEL_BG);
    }

    // ── Static screens ──

    fn compose_instructions(&mut self, s: &Session) {
        let title = [
            r"   ___      _         __  __              ",
            r"  / __|__ _| |_ ___  |  \/  |__ _ ______  ",
            r" | (_ / _` |  _/ -_) | |\/| / _` |_ / -_) ",
            r"  \___\__,_|\__\___| |_|  |_\__,_/__\___| ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, Color::Rgb { r: 255, g: 200, b: 50 }, Color::Reset);
        }

        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        let body = [
            format!("Reach the goal before the {} countdown runs out.", fmt_clock(s.countdown().total())),
            "Coloured gates block the corridors. Walk up to one to open its puzzle.".to_string(),
            "Each solved puzzle opens its gate and grants a key.".to_string(),
            format!("The final door needs all {KEYS_FOR_DOOR} keys."),
            format!("Hints are available, but each costs {} of time.", fmt_clock(s.countdown().hint_penalty())),
        ];
        for (i, line) in body.iter().enumerate() {
            self.front.put_str(4, 7 + i, line, Color::White, Color::Reset);
        }

        let controls = [
            "Controls",
            "  W / S          forward / back",
            "  A / D          strafe",
            "  Q / E  ← / →   turn",
            "  Tab            hint (in a puzzle)",
            "  Esc            close puzzle / quit",
        ];
        for (i, line) in controls.iter().enumerate() {
            let fg = if i == 0 { Color::Rgb { r: 255, g: 200, b: 50 } } else { Color::White };
            self.front.put_str(4, 14 + i, line, fg, Color::Reset);
        }

        self.front.put_str(4, 21, "ENTER   Start", hi, Color::Reset);
        self.front.put_str(4, 22, "ESC     Quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_victory(&mut self, s: &Session) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★  MAZE COMPLETE!  ESCAPED  ★  ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 3 + i, l, Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);
        }
        let time = s.final_elapsed().unwrap_or_default();
        let lines = [
            format!("◈ Completion time: {}", fmt_clock(time)),
            format!("◈ Keys collected:  {}/{}", s.gating().key_count(), KEYS_FOR_DOOR),
            format!("◈ Hint penalty:    {}", fmt_clock(s.countdown().penalty_total())),
        ];
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(6, 8 + i, l, Color::White, Color::Reset);
        }
        self.compose_summary(s, 12);
        self.front.put_str(6, 19, "▸ ENTER: Play again", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(6, 20, "▸ ESC:   Quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_timeout(&mut self, s: &Session) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║      ✕  TIME'S UP!  ✕            ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 3 + i, l, BAD, Color::Reset);
        }
        let mut keys = format!("◈ Keys collected: {}/{}", s.gating().key_count(), KEYS_FOR_DOOR);
        if !s.gating().keys().is_empty() {
            keys.push_str(&format!("  ({})", s.gating().keys().join(", ")));
        }
        self.front.put_str(6, 8, "The countdown ran out before you reached the goal.", Color::White, Color::Reset);
        self.front.put_str(6, 9, &keys, Color::White, Color::Reset);
        self.compose_summary(s, 11);
        self.front.put_str(6, 18, "▸ ENTER: Try again", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(6, 19, "▸ ESC:   Quit", Color::DarkGrey, Color::Reset);
    }

    /// One line per puzzle: solved or not, and hints spent.
    fn compose_summary(&mut self, s: &Session, row: usize) {
        for (i, id) in PuzzleId::all().enumerate() {
            let p = puzzle::puzzle(id);
            let solved = s.gating().is_solved(id);
            let (mark, fg) = if solved { ('✓', GOOD) } else { ('✕', Color::DarkGrey) };
            let line = format!(
                "{mark} {:<24} {:<14} hints {}",
                p.title,
                if solved { p.key } else { "" },
                s.countdown().hints_used(id),
            );
            self.front.put_str(8, row + i, &line, fg, Color::Reset);
        }
    }
}

/// `MM:SS`, minutes uncapped.
pub fn fmt_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn facing_arrow(yaw: f32) -> char {
    const ARROWS: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];
    let octant = (yaw / std::f32::consts::FRAC_PI_4).round() as i32;
    ARROWS[octant.rem_euclid(8) as usize]
}

/// Greedy word wrap to `width` columns.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = vec![];
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn ray_hits_far_wall_through_goal() {
        let g = grid_from(&["#####", "#..G#", "#####"]);
        let hit = cast_ray(&g, &GatingState::new(), 1.5, 1.5, 0.0, MAX_RAY).unwrap();
        assert_eq!(hit.cell, Cell::Wall);
        assert_eq!(hit.side, Side::X);
        assert!((hit.dist - 2.5).abs() < 1e-5);
        assert!((hit.goal.unwrap() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn ray_side_and_direction() {
        let g = grid_from(&["#####", "#..G#", "#####"]);
        let down = cast_ray(&g, &GatingState::new(), 1.5, 1.5, FRAC_PI_2, MAX_RAY).unwrap();
        assert_eq!(down.side, Side::Z);
        assert!((down.dist - 0.5).abs() < 1e-5);

        let back = cast_ray(&g, &GatingState::new(), 1.5, 1.5, PI, MAX_RAY).unwrap();
        assert!((back.dist - 0.5).abs() < 1e-5);
        assert!(back.goal.is_none());
    }

    #[test]
    fn solved_gate_is_see_through() {
        let g = grid_from(&["#####", "#.1G#", "#####"]);
        let mut gating = GatingState::new();
        let hit = cast_ray(&g, &gating, 1.5, 1.5, 0.0, MAX_RAY).unwrap();
        assert_eq!(hit.cell, Cell::Gate(PuzzleId::new(1).unwrap()));
        assert!((hit.dist - 0.5).abs() < 1e-5);

        gating.record_solve(PuzzleId::new(1).unwrap(), "Ruby Key").unwrap();
        let hit = cast_ray(&g, &gating, 1.5, 1.5, 0.0, MAX_RAY).unwrap();
        assert_eq!(hit.cell, Cell::Wall);
    }

    #[test]
    fn ray_gives_up_past_max_distance() {
        let g = grid_from(&["#######", "#....G#", "#######"]);
        assert!(cast_ray(&g, &GatingState::new(), 1.5, 1.5, 0.0, 2.0).is_none());
    }

    #[test]
    fn clock_format() {
        assert_eq!(fmt_clock(Duration::from_secs(45 * 60)), "45:00");
        assert_eq!(fmt_clock(Duration::from_millis(59_900)), "00:59");
        assert_eq!(fmt_clock(Duration::ZERO), "00:00");
    }

    #[test]
    fn arrows_follow_yaw() {
        assert_eq!(facing_arrow(0.0), '→');
        assert_eq!(facing_arrow(FRAC_PI_2), '↓');
        assert_eq!(facing_arrow(PI), '←');
        assert_eq!(facing_arrow(-FRAC_PI_2), '↑');
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(wrap("", 10).is_empty());
    }
}
