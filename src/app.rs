//! App: terminal init, frame loop, input routing and the post-game flow.

use crate::GameConfig;
use crate::audio::AudioSink;
use crate::ending::EndingAnimation;
use crate::input::{Action, key_to_action};
use crate::leaderboard::{
    self, Leaderboard, NameEntry, Ranking, fetch_or_empty, is_high_score, submit_best_effort,
};
use crate::session::{GameOver, Session, SessionState};
use crate::theme::Theme;
use crate::timing::Clock;
use crate::ui::{self, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Which layer currently owns input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Title, play and pause.
    Normal,
    Ending,
    NameEntry,
    Ranking,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    session: Session,
    ending: Option<EndingAnimation>,
    screen: Screen,
    name_entry: NameEntry,
    rankings: Vec<Ranking>,
    highlight: Option<usize>,
    final_score: u32,
    leaderboard: Box<dyn Leaderboard>,
    audio: Box<dyn AudioSink>,
    clock: Box<dyn Clock>,
    running: bool,
    endings_played: u64,
    /// TachyonFX fade for the ranking panel (created when the panel opens).
    reveal_effect: Option<Effect>,
    /// Last time we processed the reveal effect (for delta).
    reveal_process_time: Option<Instant>,
}

impl App {
    pub fn new(
        config: GameConfig,
        theme: Theme,
        leaderboard: Box<dyn Leaderboard>,
        audio: Box<dyn AudioSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            session: Session::new(config.seed),
            config,
            theme,
            ending: None,
            screen: Screen::Normal,
            name_entry: NameEntry::default(),
            rankings: Vec::new(),
            highlight: None,
            final_score: 0,
            leaderboard,
            audio,
            clock,
            running: true,
            endings_played: 0,
            reveal_effect: None,
            reveal_process_time: None,
        }
    }

    /// Route one discrete input. Returns false once the player quits.
    pub fn handle_action(&mut self, action: Action, now_ms: f64) -> bool {
        match action {
            Action::Quit => {
                self.running = false;
                return false;
            }
            Action::ToggleMute => {
                self.audio.toggle_mute();
                return true;
            }
            Action::None => return true,
            _ => {}
        }

        match self.screen {
            Screen::Ending => {}
            Screen::NameEntry => match action {
                Action::Start | Action::Rotate => self.submit_name(),
                Action::MoveLeft => self.name_entry.cursor_left(),
                Action::MoveRight => self.name_entry.cursor_right(),
                Action::SoftDrop => self.name_entry.next_char(),
                Action::Up => self.name_entry.prev_char(),
                _ => {}
            },
            Screen::Ranking => self.dismiss_ranking(),
            Screen::Normal => self.handle_play_action(action, now_ms),
        }
        self.flush_cues();
        true
    }

    fn handle_play_action(&mut self, action: Action, now_ms: f64) {
        match self.session.state {
            SessionState::Idle | SessionState::GameOver => {
                if action == Action::Start {
                    self.ending = None;
                    self.session.start(now_ms);
                }
            }
            SessionState::Paused => {
                if action == Action::Start {
                    self.session.toggle_pause(now_ms);
                }
            }
            SessionState::Running => {
                let over = match action {
                    Action::Start => {
                        self.session.toggle_pause(now_ms);
                        None
                    }
                    Action::MoveLeft => {
                        self.session.move_left();
                        None
                    }
                    Action::MoveRight => {
                        self.session.move_right();
                        None
                    }
                    Action::Rotate => {
                        self.session.rotate();
                        None
                    }
                    Action::SoftDrop => self.session.soft_drop(),
                    _ => None,
                };
                if let Some(over) = over {
                    self.on_game_over(over, now_ms);
                }
            }
        }
    }

    /// One scheduled frame of simulation.
    pub fn frame(&mut self, now_ms: f64) {
        match self.screen {
            Screen::Normal => {
                if let Some(over) = self.session.frame(now_ms) {
                    self.on_game_over(over, now_ms);
                }
            }
            Screen::Ending => {
                let finished = self.ending.as_mut().is_some_and(|e| e.frame(now_ms));
                if finished {
                    self.flush_cues();
                    self.ending = None;
                    self.check_leaderboard();
                }
            }
            Screen::NameEntry | Screen::Ranking => {}
        }
        self.flush_cues();
    }

    fn on_game_over(&mut self, over: GameOver, now_ms: f64) {
        self.final_score = over.score;
        if let Some(stale) = self.ending.take() {
            log::warn!("stopping stale ending sequence in phase {:?}", stale.phase);
        }
        match over.tier {
            Some(tier) => {
                self.endings_played += 1;
                let seed = self.config.seed.wrapping_add(self.endings_played);
                let mut ending = EndingAnimation::new(tier, seed);
                ending.start(now_ms);
                self.ending = Some(ending);
                self.screen = Screen::Ending;
            }
            None => self.check_leaderboard(),
        }
    }

    fn check_leaderboard(&mut self) {
        let rankings = fetch_or_empty(self.leaderboard.as_ref());
        if is_high_score(self.final_score, &rankings) {
            self.name_entry = NameEntry::default();
            self.screen = Screen::NameEntry;
        } else {
            self.show_ranking(rankings, None);
        }
    }

    fn submit_name(&mut self) {
        let entry = Ranking {
            name: self.name_entry.name(),
            score: self.final_score,
        };
        submit_best_effort(self.leaderboard.as_mut(), &entry);
        let rankings = fetch_or_empty(self.leaderboard.as_ref());
        self.show_ranking(rankings, Some(&entry));
    }

    fn show_ranking(&mut self, rankings: Vec<Ranking>, highlight: Option<&Ranking>) {
        let (top, index) = leaderboard::top_rankings(rankings, highlight);
        self.rankings = top;
        self.highlight = index;
        self.reveal_effect = None;
        self.reveal_process_time = None;
        self.screen = Screen::Ranking;
    }

    fn dismiss_ranking(&mut self) {
        self.session.reset_to_idle();
        self.rankings.clear();
        self.highlight = None;
        self.screen = Screen::Normal;
    }

    fn flush_cues(&mut self) {
        let mut cues = self.session.drain_cues();
        if let Some(ending) = self.ending.as_mut() {
            cues.extend(ending.drain_cues());
        }
        for cue in cues {
            self.audio.play(cue);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        while self.running {
            let frame_start = Instant::now();
            // A failed frame is logged and the loop keeps scheduling.
            if let Err(e) = self.render_frame(terminal) {
                log::error!("frame failed: {e:#}");
            }

            let timeout = frame_duration.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        let now_ms = self.clock.now_ms();
                        if !self.handle_action(key_to_action(key), now_ms) {
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn render_frame(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let now_ms = self.clock.now_ms();
        self.frame(now_ms);
        let view = View {
            screen: self.screen,
            session: &self.session,
            ending: self.ending.as_ref(),
            name_entry: &self.name_entry,
            rankings: &self.rankings,
            highlight: self.highlight,
            final_score: self.final_score,
            theme: &self.theme,
            muted: self.audio.is_muted(),
        };
        let reveal_effect = &mut self.reveal_effect;
        let reveal_process_time = &mut self.reveal_process_time;
        terminal.draw(|f| ui::draw(f, &view, reveal_effect, reveal_process_time, Instant::now()))?;
        Ok(())
    }
}
