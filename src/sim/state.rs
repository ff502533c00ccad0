//! Game state and core simulation types
//!
//! Everything the update pass mutates lives in one owned `GameState`. The
//! renderer only ever reads it between frames.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::boss::Boss;
use super::dialogue::Dialogue;
use super::generator::ObstacleGenerator;
use super::obstacle::{LaserBeam, Meteorite, Obstacle};
use super::player::{ExhaustParticle, Player};
use super::stage::Stage;
use crate::consts::*;
use crate::{lerp, rlerp};

/// Side effects for the collaborators outside the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// First time leaving the title screen; audio may be created now
    AudioStart,
    DialogueBeep,
    Explosion,
    CoinCollected,
    GravitySwitched,
    LaserFired,
    StageChanged(Stage),
    BossHit,
    BossDefeated,
}

/// Logical viewport; the height is always `LOGICAL_HEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: LOGICAL_HEIGHT * 16.0 / 9.0,
            height: LOGICAL_HEIGHT,
        }
    }
}

impl Viewport {
    /// Logical size for a client area of the given pixel size
    pub fn from_client(client_width: f32, client_height: f32) -> Self {
        if client_width <= 0.0 || client_height <= 0.0 {
            log::warn!("Ignoring degenerate client size {client_width}x{client_height}");
            return Self::default();
        }
        Self {
            width: LOGICAL_HEIGHT * client_width / client_height,
            height: LOGICAL_HEIGHT,
        }
    }
}

fn unseeded_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip, default = "unseeded_rng")]
    pub rng: Pcg32,
    /// Simulated seconds since the run began
    pub elapsed: f32,

    pub stage: Stage,
    pub substage: u32,
    pub stage_elapsed: f32,
    /// Generator cursor when the stage was entered
    pub stage_start_x: f32,
    /// Where play resumes after a rewind
    pub death_stage: Option<Stage>,
    pub coins_needed: u32,
    pub coins_gotten: u32,
    pub regenerator_repaired: bool,
    pub laser_unlocked: bool,

    pub player: Player,
    pub last_explosion: Option<f32>,
    last_exhaust: f32,
    pub exhaust: VecDeque<ExhaustParticle>,
    /// Sorted by leading edge, oldest first
    pub obstacles: VecDeque<Obstacle>,
    pub lasers: Vec<LaserBeam>,
    /// Boss shots; these move on their own so they stay out of `obstacles`
    pub projectiles: Vec<Meteorite>,
    pub generator: ObstacleGenerator,
    pub dialogue: Dialogue,
    pub boss: Boss,
    pub viewport: Viewport,

    audio_started: bool,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new run on the title screen
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            elapsed: 0.0,
            stage: Stage::Title,
            substage: 0,
            stage_elapsed: 0.0,
            stage_start_x: GENERATOR_START_X,
            death_stage: None,
            coins_needed: 0,
            coins_gotten: 0,
            regenerator_repaired: false,
            laser_unlocked: false,
            player: Player::default(),
            last_explosion: None,
            last_exhaust: 0.0,
            exhaust: VecDeque::new(),
            obstacles: VecDeque::new(),
            lasers: Vec::new(),
            projectiles: Vec::new(),
            generator: ObstacleGenerator::default(),
            dialogue: Dialogue::default(),
            boss: Boss::default(),
            viewport: Viewport::default(),
            audio_started: false,
            events: Vec::new(),
        }
    }

    /// Fresh run that keeps the host-facing bits (viewport, audio)
    pub fn restarted(&self, seed: u64) -> Self {
        let mut state = Self::new(seed);
        state.viewport = self.viewport;
        state.audio_started = self.audio_started;
        state
    }

    /// Left edge of the view in world x
    pub fn cam_x(&self) -> f32 {
        self.player.x.max(CAMERA_LEAD) - CAMERA_LEAD
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Emit `AudioStart` unless it already went out
    pub(crate) fn start_audio_once(&mut self) {
        if !self.audio_started {
            self.audio_started = true;
            self.emit(GameEvent::AudioStart);
        }
    }

    /// Shake the screen and play the explosion sound
    pub fn cause_explosion(&mut self) {
        self.last_explosion = Some(self.elapsed);
        self.emit(GameEvent::Explosion);
    }

    /// Inside the grace period after the last explosion
    pub fn is_invulnerable(&self) -> bool {
        self.last_explosion
            .is_some_and(|t| self.elapsed - t < INVULNERABILITY_WINDOW)
    }

    /// Random jitter that fades out after an explosion
    pub fn explosion_offset(&mut self) -> f32 {
        let Some(t) = self.last_explosion else {
            return 0.0;
        };
        let fade = (self.elapsed - t) / EXPLOSION_SHAKE_DURATION;
        if fade >= 1.0 {
            return 0.0;
        }
        lerp(rlerp(&mut self.rng, -20.0, 20.0), 0.0, fade)
    }

    /// Spawn a pair of exhaust puffs if the cadence is due
    pub(crate) fn emit_exhaust(&mut self) {
        if self.elapsed - self.last_exhaust <= EXHAUST_INTERVAL {
            return;
        }
        for dy in EXHAUST_OFFSETS {
            let x = self.player.x - 80.0 + self.explosion_offset();
            let y = self.player.y + dy + self.explosion_offset();
            self.exhaust.push_back(ExhaustParticle {
                x,
                y,
                dx: EXHAUST_DRIFT,
                dy: self.player.vel_y / 3.0,
                t: self.elapsed,
            });
        }
        self.last_exhaust = self.elapsed;
    }
}
