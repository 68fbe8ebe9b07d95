//! Post-game rocket sequence: performance, countdown, liftoff.
//!
//! Phases only move forward. `advance` reports completion exactly once, on the
//! frame that reaches [`Phase::Done`].

use crate::audio::Cue;
use crate::timing::FrameTimer;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Logical screen the rocket coordinates live in (Game Boy resolution).
pub const SCREEN_WIDTH: f64 = 160.0;
pub const SCREEN_HEIGHT: f64 = 144.0;
/// Top of the launch pad.
pub const PAD_TOP: f64 = 125.0;

const PERFORMANCE_MS: f64 = 10_000.0;
const READY_MS: f64 = 2_000.0;
/// 0.33 px per 60 Hz frame.
const ASCENT_PER_MS: f64 = 0.33 * 60.0 / 1000.0;
const OFF_SCREEN_Y: f64 = -50.0;
const ROCKET_X: f64 = 72.0;
const PARTICLE_EVERY: u64 = 5;
const PARTICLE_DECAY: f64 = 0.02;

/// Rocket size, chosen from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Small = 1,
    Medium = 2,
    Large = 3,
}

impl Tier {
    /// `None` for a zero score: no animation, straight to the leaderboard.
    pub fn for_score(score: u32) -> Option<Self> {
        match score {
            0 => None,
            1..=9_999 => Some(Self::Small),
            10_000..=99_999 => Some(Self::Medium),
            _ => Some(Self::Large),
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Rocket sprite height in logical pixels.
    pub fn rocket_height(self) -> f64 {
        match self {
            Self::Small => 14.0,
            Self::Medium => 20.0,
            Self::Large => 22.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Performance,
    Ready,
    Launch,
    Done,
}

/// One puff of exhaust smoke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: f64,
}

#[derive(Debug, Clone)]
pub struct EndingAnimation {
    pub tier: Tier,
    pub phase: Phase,
    pub phase_elapsed_ms: f64,
    /// Frames processed since the sequence began; drives dance frames and smoke cadence.
    pub tick: u64,
    pub rocket_x: f64,
    pub rocket_y: f64,
    pub particles: Vec<Particle>,
    timer: FrameTimer,
    rng: Pcg32,
    cues: Vec<Cue>,
    handed_off: bool,
}

impl EndingAnimation {
    pub fn new(tier: Tier, seed: u64) -> Self {
        log::info!("ending sequence: tier {}", tier.number());
        Self {
            tier,
            phase: Phase::Performance,
            phase_elapsed_ms: 0.0,
            tick: 0,
            rocket_x: ROCKET_X,
            rocket_y: PAD_TOP - tier.rocket_height(),
            particles: Vec::new(),
            timer: FrameTimer::default(),
            rng: Pcg32::seed_from_u64(seed),
            cues: vec![Cue::Phase(Phase::Performance)],
            handed_off: false,
        }
    }

    /// Anchor the frame clock; call once when the sequence takes over the loop.
    pub fn start(&mut self, now_ms: f64) {
        self.timer.reanchor(now_ms);
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Frame callback. Returns true on the single frame the sequence completes.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        let dt = self.timer.delta(now_ms);
        self.advance(dt)
    }

    /// Step the sequence by `dt_ms` of simulated time.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if self.is_done() {
            return false;
        }
        self.phase_elapsed_ms += dt_ms.max(0.0);
        self.tick += 1;

        match self.phase {
            Phase::Performance => {
                if self.phase_elapsed_ms > PERFORMANCE_MS {
                    self.enter(Phase::Ready);
                }
            }
            Phase::Ready => {
                if self.phase_elapsed_ms > READY_MS {
                    self.enter(Phase::Launch);
                }
            }
            Phase::Launch => {
                self.rocket_y -= ASCENT_PER_MS * dt_ms.max(0.0);
                if self.tick % PARTICLE_EVERY == 0 {
                    self.spawn_particle();
                }
                if self.rocket_y < OFF_SCREEN_Y {
                    self.enter(Phase::Done);
                }
            }
            Phase::Done => {}
        }

        self.step_particles();

        if self.is_done() && !self.handed_off {
            self.handed_off = true;
            return true;
        }
        false
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase);
        log::debug!("ending phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.phase_elapsed_ms = 0.0;
        self.cues.push(Cue::Phase(phase));
    }

    fn spawn_particle(&mut self) {
        let particle = Particle {
            x: self.rocket_x + 4.0 + self.rng.random_range(0.0..8.0),
            y: self.rocket_y + 16.0,
            vx: self.rng.random_range(-0.5..0.5),
            vy: 0.5 + self.rng.random_range(0.0..1.0),
            life: 1.0,
        };
        self.particles.push(particle);
    }

    fn step_particles(&mut self) {
        self.particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= PARTICLE_DECAY;
            p.life > 0.0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: f64 = 1000.0 / 60.0;

    fn run_to_done(anim: &mut EndingAnimation, dt: f64) -> u64 {
        let mut handoffs = 0;
        for _ in 0..100_000 {
            if anim.advance(dt) {
                handoffs += 1;
            }
            if anim.is_done() {
                break;
            }
        }
        handoffs
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_score(0), None);
        assert_eq!(Tier::for_score(1), Some(Tier::Small));
        assert_eq!(Tier::for_score(9_999), Some(Tier::Small));
        assert_eq!(Tier::for_score(10_000), Some(Tier::Medium));
        assert_eq!(Tier::for_score(99_999), Some(Tier::Medium));
        assert_eq!(Tier::for_score(100_000), Some(Tier::Large));
        assert_eq!(Tier::Large.number(), 3);
    }

    #[test]
    fn test_rocket_sits_on_pad() {
        assert_eq!(EndingAnimation::new(Tier::Small, 0).rocket_y, 111.0);
        assert_eq!(EndingAnimation::new(Tier::Medium, 0).rocket_y, 105.0);
        assert_eq!(EndingAnimation::new(Tier::Large, 0).rocket_y, 103.0);
    }

    #[test]
    fn test_phase_thresholds_are_strict() {
        let mut anim = EndingAnimation::new(Tier::Small, 1);
        anim.advance(10_000.0);
        assert_eq!(anim.phase, Phase::Performance);
        anim.advance(1.0);
        assert_eq!(anim.phase, Phase::Ready);
        assert_eq!(anim.phase_elapsed_ms, 0.0);
        anim.advance(2_000.0);
        assert_eq!(anim.phase, Phase::Ready);
        anim.advance(0.5);
        assert_eq!(anim.phase, Phase::Launch);
    }

    #[test]
    fn test_rocket_only_moves_during_launch() {
        let mut anim = EndingAnimation::new(Tier::Small, 1);
        anim.advance(5_000.0);
        assert_eq!(anim.rocket_y, 111.0);
        anim.advance(5_001.0);
        anim.advance(2_001.0);
        assert_eq!(anim.phase, Phase::Launch);
        assert_eq!(anim.rocket_y, 111.0);
        anim.advance(100.0);
        assert!((anim.rocket_y - (111.0 - ASCENT_PER_MS * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_handoff_fires_once() {
        for tier in [Tier::Small, Tier::Medium, Tier::Large] {
            let mut anim = EndingAnimation::new(tier, 3);
            assert_eq!(run_to_done(&mut anim, FRAME), 1);
            assert!(!anim.advance(FRAME));
            assert!(!anim.frame(1e9));
            assert_eq!(anim.phase, Phase::Done);
        }
    }

    #[test]
    fn test_particles_spawn_every_fifth_tick() {
        let mut anim = EndingAnimation::new(Tier::Small, 5);
        anim.advance(10_001.0);
        anim.advance(2_001.0);
        assert_eq!(anim.tick, 2);
        assert!(anim.particles.is_empty());
        anim.advance(FRAME);
        anim.advance(FRAME);
        assert!(anim.particles.is_empty());
        anim.advance(FRAME);
        assert_eq!(anim.tick, 5);
        assert_eq!(anim.particles.len(), 1);
        let p = anim.particles[0];
        assert!((p.life - (1.0 - PARTICLE_DECAY)).abs() < 1e-9);
        assert!(p.vy >= 0.5 && p.vy < 1.5);
        assert!(p.vx >= -0.5 && p.vx < 0.5);
    }

    #[test]
    fn test_particles_expire() {
        let mut anim = EndingAnimation::new(Tier::Small, 5);
        anim.particles.push(Particle {
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 1.0,
            life: 0.03,
        });
        anim.advance(0.0);
        assert_eq!(anim.particles.len(), 1);
        assert_eq!(anim.particles[0].x, 1.0);
        anim.advance(0.0);
        assert!(anim.particles.is_empty());
    }

    #[test]
    fn test_phase_cues_in_order() {
        let mut anim = EndingAnimation::new(Tier::Medium, 9);
        run_to_done(&mut anim, FRAME);
        let cues = anim.drain_cues();
        assert_eq!(
            cues,
            vec![
                Cue::Phase(Phase::Performance),
                Cue::Phase(Phase::Ready),
                Cue::Phase(Phase::Launch),
                Cue::Phase(Phase::Done),
            ]
        );
    }

    #[test]
    fn test_frame_uses_own_clock() {
        let mut anim = EndingAnimation::new(Tier::Small, 1);
        anim.start(50_000.0);
        anim.frame(60_001.0);
        assert_eq!(anim.phase, Phase::Ready);
    }

    proptest! {
        #[test]
        fn phases_never_go_back(
            tier in prop_oneof![Just(Tier::Small), Just(Tier::Medium), Just(Tier::Large)],
            steps in proptest::collection::vec(1.0f64..500.0, 1..400),
        ) {
            let mut anim = EndingAnimation::new(tier, 11);
            let mut last = anim.phase;
            for dt in steps {
                anim.advance(dt);
                prop_assert!(anim.phase >= last);
                last = anim.phase;
            }
            // Any positive frame length finishes eventually.
            let mut guard = 0;
            while !anim.is_done() && guard < 1_000_000 {
                anim.advance(1.0);
                guard += 1;
            }
            prop_assert!(anim.is_done());
        }
    }
}
