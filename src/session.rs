//! Session: gravity timer, scoring, leveling and the play/pause/game-over machine.

use crate::audio::Cue;
use crate::ending::Tier;
use crate::grid::{COLS, DropOutcome, Grid};
use crate::piece::{Piece, Randomizer};
use crate::timing::FrameTimer;

/// Points per lock by rows cleared, multiplied by `level + 1`.
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];
const LINES_PER_LEVEL: u32 = 10;
const BASE_DROP_INTERVAL_MS: u32 = 1000;
const DROP_INTERVAL_STEP_MS: u32 = 100;
const MIN_DROP_INTERVAL_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Final result handed to whoever runs the post-game flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub score: u32,
    /// `None` skips the ending animation.
    pub tier: Option<Tier>,
}

pub fn points_for(lines_cleared: u32, level: u32) -> u32 {
    LINE_SCORES[lines_cleared.min(4) as usize] * (level + 1)
}

/// Gravity period for a level: 1000 ms minus 100 ms per level, floored at 100 ms.
pub fn drop_interval_ms(level: u32) -> u32 {
    BASE_DROP_INTERVAL_MS
        .saturating_sub(level.saturating_mul(DROP_INTERVAL_STEP_MS))
        .max(MIN_DROP_INTERVAL_MS)
}

/// One game instance. Every mutation goes through `&mut self`; nothing is global.
#[derive(Debug, Clone)]
pub struct Session {
    pub grid: Grid,
    pub next_piece: Piece,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub drop_interval_ms: u32,
    pub elapsed_since_drop_ms: f64,
    pub state: SessionState,
    randomizer: Randomizer,
    timer: FrameTimer,
    cues: Vec<Cue>,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        let mut randomizer = Randomizer::new(seed);
        let grid = Grid::new(randomizer.spawn(COLS));
        let next_piece = randomizer.spawn(COLS);
        Self {
            grid,
            next_piece,
            score: 0,
            lines: 0,
            level: 0,
            drop_interval_ms: BASE_DROP_INTERVAL_MS,
            elapsed_since_drop_ms: 0.0,
            state: SessionState::Idle,
            randomizer,
            timer: FrameTimer::default(),
            cues: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Begin a new game. Ignored while one is running or paused.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if matches!(self.state, SessionState::Running | SessionState::Paused) {
            return false;
        }
        let active = self.randomizer.spawn(COLS);
        self.grid.reset(active);
        self.next_piece = self.randomizer.spawn(COLS);
        self.score = 0;
        self.lines = 0;
        self.level = 0;
        self.drop_interval_ms = BASE_DROP_INTERVAL_MS;
        self.elapsed_since_drop_ms = 0.0;
        self.state = SessionState::Running;
        self.timer.reanchor(now_ms);
        self.cues.push(Cue::Music(true));
        log::info!("session started");
        true
    }

    /// Running <-> Paused. Resuming re-anchors the frame clock so the paused
    /// interval never counts toward gravity.
    pub fn toggle_pause(&mut self, now_ms: f64) {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Paused;
                self.cues.push(Cue::Music(false));
            }
            SessionState::Paused => {
                self.state = SessionState::Running;
                self.timer.reanchor(now_ms);
                self.cues.push(Cue::Music(true));
            }
            SessionState::Idle | SessionState::GameOver => {}
        }
    }

    /// Zero the board after the post-game flow and wait for the next start.
    pub fn reset_to_idle(&mut self) {
        let active = self.randomizer.spawn(COLS);
        self.grid.reset(active);
        self.elapsed_since_drop_ms = 0.0;
        self.state = SessionState::Idle;
    }

    /// Frame callback: computes the delta against this session's own clock.
    pub fn frame(&mut self, now_ms: f64) -> Option<GameOver> {
        if !self.is_running() {
            return None;
        }
        let dt = self.timer.delta(now_ms);
        self.advance(dt)
    }

    /// Accumulate `dt_ms`; at most one gravity tick per threshold crossing.
    pub fn advance(&mut self, dt_ms: f64) -> Option<GameOver> {
        if !self.is_running() {
            return None;
        }
        self.elapsed_since_drop_ms += dt_ms.max(0.0);
        if self.elapsed_since_drop_ms > f64::from(self.drop_interval_ms) {
            let (_, over) = self.drop();
            return over;
        }
        None
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1)
    }

    pub fn rotate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let rotated = self.grid.rotate();
        if rotated {
            self.cues.push(Cue::Rotate);
        }
        rotated
    }

    /// Manual one-row drop through the gravity path: it restarts the drop
    /// timer and locks the piece when it cannot fall.
    pub fn soft_drop(&mut self) -> Option<GameOver> {
        if !self.is_running() {
            return None;
        }
        let (outcome, over) = self.drop();
        if !outcome.piece_locked {
            self.cues.push(Cue::Move);
        }
        over
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    fn shift(&mut self, dx: i32) -> bool {
        if !self.is_running() {
            return false;
        }
        let moved = self.grid.move_piece(dx, 0);
        if moved {
            self.cues.push(Cue::Move);
        }
        moved
    }

    fn drop(&mut self) -> (DropOutcome, Option<GameOver>) {
        self.elapsed_since_drop_ms = 0.0;
        let outcome = self
            .grid
            .lock_and_advance(Some(self.next_piece.clone()), &mut self.randomizer);
        if !outcome.still_playing {
            return (outcome, Some(self.finish()));
        }
        if outcome.lines_cleared > 0 {
            self.add_lines(outcome.lines_cleared);
            self.cues.push(Cue::Clear(outcome.lines_cleared));
        }
        if outcome.piece_locked {
            self.cues.push(Cue::Lock);
            self.next_piece = self.randomizer.spawn(COLS);
            log::trace!("locked; next {}", self.next_piece.kind.letter());
        }
        (outcome, None)
    }

    fn add_lines(&mut self, cleared: u32) {
        self.score += points_for(cleared, self.level);
        self.lines += cleared;
        self.level = self.lines / LINES_PER_LEVEL;
        self.drop_interval_ms = drop_interval_ms(self.level);
    }

    fn finish(&mut self) -> GameOver {
        self.state = SessionState::GameOver;
        self.cues.push(Cue::GameOver);
        self.cues.push(Cue::Music(false));
        let tier = Tier::for_score(self.score);
        log::info!(
            "game over: score {} lines {} level {} tier {:?}",
            self.score,
            self.lines,
            self.level,
            tier
        );
        GameOver {
            score: self.score,
            tier,
        }
    }
}
