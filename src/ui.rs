//! Layout and drawing: playfield, sidebar, pause, ending sequence, name entry, ranking.
//!
//! Pure read of engine state; nothing here mutates the session.

use crate::app::Screen;
use crate::ending::{EndingAnimation, PAD_TOP, Phase, SCREEN_HEIGHT, SCREEN_WIDTH, Tier};
use crate::grid::{COLS, ROWS};
use crate::leaderboard::{NameEntry, Ranking};
use crate::piece::Piece;
use crate::session::{Session, SessionState};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is two terminal columns wide.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 16;
const BOARD_WIDTH: u16 = COLS as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 + 2;
/// Ranking panel fade-in.
const REVEAL_FADE_MS: u32 = 600;
/// Frames per dance pose.
const DANCE_FRAME_TICKS: u64 = 15;

/// Everything the renderer reads in one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub session: &'a Session,
    pub ending: Option<&'a EndingAnimation>,
    pub name_entry: &'a NameEntry,
    pub rankings: &'a [Ranking],
    pub highlight: Option<usize>,
    pub final_score: u32,
    pub theme: &'a Theme,
    pub muted: bool,
}

pub fn draw(
    frame: &mut Frame,
    view: &View,
    reveal_effect: &mut Option<Effect>,
    reveal_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = game_area(frame.area());
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(frame.area(), frame.buffer_mut());

    match view.screen {
        Screen::Normal => draw_game(frame, view, area),
        Screen::Ending => {
            if let Some(ending) = view.ending {
                draw_ending(frame.buffer_mut(), view.theme, ending, area);
            }
        }
        Screen::NameEntry => {
            draw_game(frame, view, area);
            draw_name_entry(frame, view, area);
        }
        Screen::Ranking => {
            draw_game(frame, view, area);
            let popup = draw_ranking(frame, view, area);
            apply_reveal_effect(frame, view.theme, popup, reveal_effect, reveal_process_time, now);
        }
    }
}

/// Board + sidebar, centred in the terminal.
fn game_area(area: Rect) -> Rect {
    let total_w = BOARD_WIDTH + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    vert[1]
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(BOARD_WIDTH), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);
    let session = view.session;
    // The board is hidden while paused.
    let hide_board = session.state == SessionState::Paused;
    draw_board(frame, view.theme, session, chunks[0], hide_board);
    draw_sidebar(frame, view, chunks[1]);

    match session.state {
        SessionState::Idle if view.screen == Screen::Normal => {
            draw_banner(frame, view.theme, chunks[0], "PRESS START");
        }
        SessionState::Paused => draw_banner(frame, view.theme, chunks[0], "PAUSE"),
        _ => {}
    }
}

fn draw_board(frame: &mut Frame, theme: &Theme, session: &Session, area: Rect, hide: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    if hide {
        return;
    }

    let filled = Style::default().fg(theme.block).bg(theme.bg);
    let buf = frame.buffer_mut();
    for (row, cells) in session.grid.rows().enumerate() {
        for (col, &v) in cells.iter().enumerate() {
            if v != 0 {
                put_cell(buf, inner, row as i32, col as i32, filled);
            }
        }
    }
    if session.state == SessionState::Running || session.state == SessionState::GameOver {
        for (row, col) in session.grid.active.cells() {
            put_cell(buf, inner, row, col, filled);
        }
    }
}

fn put_cell(buf: &mut Buffer, inner: Rect, row: i32, col: i32, style: Style) {
    if row < 0 || col < 0 {
        return;
    }
    let x = inner.x + col as u16 * CELL_WIDTH;
    let y = inner.y + row as u16;
    if x + CELL_WIDTH <= inner.right() && y < inner.bottom() {
        buf.set_string(x, y, "[]", style);
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let session = view.session;
    let label = Style::default().fg(theme.title).bg(theme.bg);
    let value = Style::default()
        .fg(theme.main_fg)
        .bg(theme.bg)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(" SCORE", label)),
        Line::from(Span::styled(format!(" {:>8}", session.score), value)),
        Line::from(""),
        Line::from(Span::styled(" LEVEL", label)),
        Line::from(Span::styled(format!(" {:>8}", session.level), value)),
        Line::from(""),
        Line::from(Span::styled(" LINES", label)),
        Line::from(Span::styled(format!(" {:>8}", session.lines), value)),
        Line::from(""),
        Line::from(Span::styled(" NEXT", label)),
    ];
    lines.extend(preview_lines(&session.next_piece, value));
    lines.push(Line::from(""));
    if view.muted {
        lines.push(Line::from(Span::styled(" MUTED", label)));
    }
    lines.push(Line::from(Span::styled(" ←→↓ move", label)));
    lines.push(Line::from(Span::styled(" Z/X  rotate", label)));
    lines.push(Line::from(Span::styled(" ⏎    start", label)));

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .render(area, frame.buffer_mut());
}

/// Next piece as text rows, blank rows trimmed.
fn preview_lines(piece: &Piece, style: Style) -> Vec<Line<'static>> {
    let shape = &piece.shape;
    (0..shape.height())
        .filter(|&r| (0..shape.width()).any(|c| shape.get(r, c) != 0))
        .map(|r| {
            let text: String = (0..shape.width())
                .map(|c| if shape.get(r, c) != 0 { "[]" } else { "  " })
                .collect();
            Line::from(Span::styled(format!("  {text}"), style))
        })
        .collect()
}

fn draw_banner(frame: &mut Frame, theme: &Theme, board: Rect, text: &str) {
    let popup = centered(board, 15, 3);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(theme.main_fg)
            .bg(theme.bg)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border).bg(theme.bg)),
    )
    .render(popup, frame.buffer_mut());
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Map logical screen coordinates (160x144) into `area`.
fn to_cell(area: Rect, x: f64, y: f64) -> (i32, i32) {
    let col = (x / SCREEN_WIDTH * f64::from(area.width)).floor() as i32;
    let row = (y / SCREEN_HEIGHT * f64::from(area.height)).floor() as i32;
    (area.x as i32 + col, area.y as i32 + row)
}

/// Write `text` at (col, row) if the row is inside `area`, clipped horizontally.
fn put(buf: &mut Buffer, area: Rect, col: i32, row: i32, text: &str, style: Style) {
    if row < area.y as i32 || row >= area.bottom() as i32 {
        return;
    }
    let mut col = col;
    let mut skip = 0usize;
    if col < area.x as i32 {
        skip = (area.x as i32 - col) as usize;
        col = area.x as i32;
    }
    if col >= area.right() as i32 {
        return;
    }
    let visible: String = text.chars().skip(skip).collect();
    let max = (area.right() as i32 - col) as usize;
    buf.set_stringn(col as u16, row as u16, visible, max, style);
}

fn rocket_sprite(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Small => &[" ^ ", "/#\\", "|#|", "/_\\"],
        Tier::Medium => &["  ^  ", " /#\\ ", " |#| ", " |#| ", "/|#|\\", "/___\\"],
        Tier::Large => &["   ^   ", "  /#\\  ", "  |#|  ", " /|#|\\ ", " ||#|| ", "/||#||\\", "/_____\\"],
    }
}

fn draw_ending(buf: &mut Buffer, theme: &Theme, ending: &EndingAnimation, area: Rect) {
    let ink = Style::default().fg(theme.block).bg(theme.bg);
    let soft = Style::default().fg(theme.border).bg(theme.bg);

    if ending.phase == Phase::Performance {
        draw_performance(buf, theme, ending.tick, area);
        return;
    }

    // Ground
    let (_, ground_row) = to_cell(area, 0.0, 130.0);
    for row in ground_row..area.bottom() as i32 {
        put(buf, area, area.x as i32, row, &"▓".repeat(area.width as usize), soft);
    }

    // Launch pad tower beside the rocket
    let (tower_col, pad_row) = to_cell(area, 100.0, PAD_TOP);
    for row in (pad_row - 6)..pad_row {
        put(buf, area, tower_col, row, "|=|", soft);
    }
    let (pad_col, _) = to_cell(area, 60.0, PAD_TOP);
    put(buf, area, pad_col, pad_row, "=========", soft);

    for p in &ending.particles {
        let (col, row) = to_cell(area, p.x, p.y);
        let glyph = if p.life > 0.66 {
            "@"
        } else if p.life > 0.33 {
            "o"
        } else {
            "."
        };
        put(buf, area, col, row, glyph, Style::default().fg(theme.smoke).bg(theme.bg));
    }

    let sprite = rocket_sprite(ending.tier);
    // Sprite bottom sits on the rocket's base.
    let (mut col, mut base_row) = to_cell(
        area,
        ending.rocket_x,
        ending.rocket_y + ending.tier.rocket_height(),
    );
    col -= sprite[0].len() as i32 / 2;
    if ending.phase == Phase::Ready {
        // Countdown shake
        col += [0, 1, 0, -1][(ending.tick % 4) as usize];
        base_row += i32::from(ending.tick % 6 == 0);
    }
    let sprite_top = base_row - sprite.len() as i32;
    for (i, line) in sprite.iter().enumerate() {
        put(buf, area, col, sprite_top + i as i32, line, ink);
    }

    if ending.phase == Phase::Ready {
        let secs_left = 2 - (ending.phase_elapsed_ms / 1000.0).floor() as i32;
        let (c, r) = to_cell(area, 8.0, 16.0);
        put(buf, area, c, r, &format!("LAUNCH IN {}", secs_left.max(1)), ink);
    }
}

fn draw_performance(buf: &mut Buffer, theme: &Theme, tick: u64, area: Rect) {
    let ink = Style::default().fg(theme.block).bg(theme.bg);
    let pose = (tick / DANCE_FRAME_TICKS) % 2;
    let dancer: [&str; 3] = if pose == 0 {
        [" o ", "/|\\", "/ \\"]
    } else {
        ["\\o/", " | ", "| |"]
    };
    let musician: [&str; 3] = if pose == 0 {
        [" o ", "<|=", "/ \\"]
    } else {
        [" o ", "<|-", "/ \\"]
    };

    let (_, stage_row) = to_cell(area, 0.0, 100.0);
    let (title_col, title_row) = to_cell(area, 24.0, 20.0);
    put(buf, area, title_col, title_row, "CONGRATULATIONS!", ink);
    if pose == 0 {
        let (c, r) = to_cell(area, 40.0, 50.0);
        put(buf, area, c, r, "♪   ♫   ♪", ink);
    }

    for (i, figure) in [musician, dancer, dancer, musician].iter().enumerate() {
        let (col, _) = to_cell(area, 16.0 + i as f64 * 36.0, 0.0);
        for (j, line) in figure.iter().enumerate() {
            put(buf, area, col, stage_row + j as i32, line, ink);
        }
    }
    let (_, floor_row) = to_cell(area, 0.0, 130.0);
    put(buf, area, area.x as i32, floor_row, &"▀".repeat(area.width as usize), ink);
}

fn draw_name_entry(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 26, 9);
    Clear.render(popup, frame.buffer_mut());
    let text = Style::default().fg(theme.main_fg).bg(theme.bg);
    let mut slots = vec![Span::styled("  ", text)];
    for (i, c) in view.name_entry.chars().iter().enumerate() {
        let style = if i == view.name_entry.cursor {
            text.add_modifier(Modifier::REVERSED)
        } else {
            text
        };
        slots.push(Span::styled(format!(" {c} "), style));
    }
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("NEW HIGH SCORE", text.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(format!("{}", view.final_score), text)),
        Line::from(""),
        Line::from(slots),
        Line::from(""),
        Line::from(Span::styled("↑↓ letter  ⏎ ok", text)),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_ranking(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let theme = view.theme;
    let popup = centered(area, 26, 11);
    Clear.render(popup, frame.buffer_mut());
    let text = Style::default().fg(theme.main_fg).bg(theme.bg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("RANKING", text.add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    if view.rankings.is_empty() {
        lines.push(Line::from(Span::styled("no scores yet", text)));
    }
    for (i, entry) in view.rankings.iter().enumerate() {
        let style = if Some(i) == view.highlight {
            text.add_modifier(Modifier::SLOW_BLINK | Modifier::REVERSED)
        } else {
            text
        };
        lines.push(Line::from(Span::styled(
            format!("{}. {:<4} {:>9}", i + 1, entry.name, entry.score),
            style,
        )));
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
    popup
}

/// Create or continue the ranking fade-in (TachyonFX: fade the panel in from the background).
fn apply_reveal_effect(
    frame: &mut Frame,
    theme: &Theme,
    popup: Rect,
    reveal_effect: &mut Option<Effect>,
    reveal_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = reveal_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *reveal_process_time = Some(now);

    let effect = reveal_effect.get_or_insert_with(|| {
        fx::fade_from(theme.bg, theme.bg, (REVEAL_FADE_MS, Interpolation::QuadOut)).with_area(popup)
    });
    if !effect.done() {
        frame.render_effect(effect, popup, TfxDuration::from_millis(delta_ms));
    }
}
