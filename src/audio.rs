//! Sound cues emitted by the simulation and the sink that plays them.
//!
//! The engine only queues cues; playing them is one-way and can never feed
//! back into game state.

use crate::ending::Phase;
use std::io::Write;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Manual move succeeded
    Move,
    /// Rotation succeeded
    Rotate,
    /// Piece locked into the board
    Lock,
    /// Rows cleared by a lock
    Clear(u32),
    /// Session ended
    GameOver,
    /// Background music on/off
    Music(bool),
    /// Ending animation entered a new phase
    Phase(Phase),
}

pub trait AudioSink {
    fn play(&mut self, cue: Cue);

    fn toggle_mute(&mut self);

    fn is_muted(&self) -> bool;
}

/// Terminal sink: rings the bell on the loud cues and logs the rest.
#[derive(Debug, Default)]
pub struct TerminalAudio {
    muted: bool,
}

impl TerminalAudio {
    pub fn new(muted: bool) -> Self {
        Self { muted }
    }

    fn bell(&self) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
            log::debug!("bell failed: {e}");
        }
    }
}

impl AudioSink for TerminalAudio {
    fn play(&mut self, cue: Cue) {
        log::trace!("cue {cue:?}");
        if self.muted {
            return;
        }
        match cue {
            Cue::Clear(n) if n >= 4 => self.bell(),
            Cue::GameOver | Cue::Phase(Phase::Ready) => self.bell(),
            _ => {}
        }
    }

    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        log::info!("audio {}", if self.muted { "muted" } else { "unmuted" });
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_mute() {
        let mut a = TerminalAudio::new(true);
        assert!(a.is_muted());
        a.toggle_mute();
        assert!(!a.is_muted());
    }

    #[test]
    fn test_muted_play_is_noop() {
        let mut a = TerminalAudio::new(true);
        a.play(Cue::GameOver);
        a.play(Cue::Clear(4));
        assert!(a.is_muted());
    }
}
