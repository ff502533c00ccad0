//! Grav Flip - a gravity-flipping side-scrolling arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, dialogue, stages)
//! - `driver`: Frame delta to bounded sub-step conversion
//! - `music`: Lookahead note scheduling
//! - `settings`: Persisted player preferences
//! - `snapshot`: Per-frame JSON handed to the renderer
//! - `audio` / `web`: Browser collaborators (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod driver;
pub mod music;
pub mod settings;
pub mod sim;
pub mod snapshot;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use driver::{ActionLatch, FrameDriver, substep_plan};
pub use settings::{GraphicsMode, Settings};

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Logical playfield height; all world units are relative to this
    pub const LOGICAL_HEIGHT: f32 = 1000.0;
    /// Default canvas vertical resolution
    pub const DEFAULT_VERTICAL_RESOLUTION: u32 = 600;

    /// Largest frame delta fed to the simulation (tab stalls etc.)
    pub const MAX_FRAME_DT: f32 = 1.0 / 15.0;
    /// Target upper bound for a single sub-step
    pub const SUBSTEP_SPAN: f32 = 0.03;

    /// Player physics
    pub const FORWARD_VELOCITY: f32 = 330.0;
    pub const GRAVITY: f32 = 1000.0;
    pub const CEILING_Y: f32 = 60.0;
    pub const CUSHION_Y: f32 = 120.0;
    pub const CUSHION_DAMPING: f32 = 15.0;
    pub const FLOOR_Y: f32 = 850.0;
    pub const FLOOR_PUSHBACK: f32 = 50.0;
    /// Gravity switch keeps a quarter of the vertical speed
    pub const GRAV_SWITCH_DAMPING: f32 = 4.0;
    /// Camera keeps the ship this far from the left edge
    pub const CAMERA_LEAD: f32 = 600.0;
    /// Where the ship "waits" before dropping out of hyperspace
    pub const HYPERSPACE_X: f32 = -1.0e20;

    /// Damage / health
    pub const FLOOR_DAMAGE: f32 = 1.0 / 5.0;
    pub const PLASMA_DAMAGE: f32 = 1.0 / 5.0;
    pub const METEORITE_DAMAGE: f32 = 1.0 / 10.0;
    pub const INVULNERABILITY_WINDOW: f32 = 2.5;
    pub const SAFE_STAGE_HEALTH_FLOOR: f32 = 0.05;
    /// Displayed health moves toward real health at most this fast (per second)
    pub const HEALTH_DISPLAY_RATE: f32 = 0.5;
    pub const REGEN_RATE: f32 = 0.01;
    /// Explosion jitter fades out over this long
    pub const EXPLOSION_SHAKE_DURATION: f32 = 3.0;

    /// Exhaust
    pub const EXHAUST_INTERVAL: f32 = 0.2;
    pub const EXHAUST_OFFSETS: [f32; 2] = [-35.0, 35.0];
    pub const EXHAUST_DRIFT: f32 = -5.0;
    pub const EXHAUST_RETIRE_DISTANCE: f32 = 200.0;

    /// Generator
    pub const GENERATION_MARGIN: f32 = 100.0;
    pub const GENERATOR_START_X: f32 = 600.0;
    pub const IDLE_CURSOR_STEP: f32 = 100.0;
    pub const COIN_CHANCE: f64 = 0.4;
    pub const COIN_KEEP_CHANCE: f64 = 0.4;
    pub const SWARM_SIZE: usize = 14;
    pub const SWARM_LENGTH: f32 = 1400.0;
    pub const TUTORIAL_DISTANCE: f32 = 6000.0;

    /// Obstacles
    pub const PLASMA_BOX_PAD: f32 = 100.0;
    pub const PLASMA_SAMPLE_STEP: f32 = 2.0;
    pub const PLASMA_STRIP_HALF_WIDTH: f32 = 30.0;
    pub const LASER_NEUTRALIZE_TIME: f32 = 3.0;
    pub const COIN_RADIUS: f32 = 25.0;
    pub const COIN_EAT_DURATION: f32 = 0.4;
    pub const METEORITE_BUMPS: f32 = 7.0;
    pub const METEORITE_SAMPLES: usize = 28;

    /// Laser
    pub const LASER_GROW_SPEED: f32 = 3000.0;
    pub const LASER_SHRINK_SPEED: f32 = 4000.0;
    pub const LASER_HALF_THICKNESS: f32 = 6.0;

    /// Dialogue
    pub const DIALOGUE_BOX_WIDTH: f32 = 700.0;
    pub const DIALOGUE_BOX_MARGIN: f32 = 50.0;
    pub const DIALOGUE_TEXT_PADDING: f32 = 40.0;
    pub const DIALOGUE_RATE: f32 = 0.06;
    pub const DIALOGUE_PAUSE: f32 = 0.5;
    /// Press Start 2P advances exactly one em per glyph
    pub const DIALOGUE_FONT_SIZE: f32 = 30.0;

    /// Coin quotas per collection stage
    pub const REGENERATOR_COINS: u32 = 10;
    pub const LASER_COINS: u32 = 20;
    pub const HYPERDRIVE_COINS: u32 = 25;
    pub const BOSS_COINS: u32 = 15;

    /// Boss
    pub const BOSS_STANDOFF: f32 = 250.0;
    /// Closest the boss centre gets to the ship
    pub const BOSS_MIN_LEAD: f32 = 400.0;
    pub const BOSS_HALF_HEIGHT: f32 = 90.0;
    pub const BOSS_TRACKING_RATE: f32 = 1.5;
    pub const BOSS_SHIELDED_INTERVAL: f32 = 3.0;
    pub const BOSS_EXPOSED_INTERVAL: f32 = 2.0;
    pub const BOSS_MILESTONE_COINS: u32 = 5;
    pub const BOSS_LASER_DAMAGE: f32 = 0.1;
    pub const BOSS_SINK_TIME: f32 = 3.0;
    pub const BOSS_SHOT_SPEED: f32 = 420.0;
    pub const BOSS_SHOT_RADIUS: f32 = 28.0;
}

/// Linear interpolation with `x` clamped to [0, 1]
#[inline]
pub fn lerp(start: f32, end: f32, x: f32) -> f32 {
    start + x.clamp(0.0, 1.0) * (end - start)
}

/// Uniform random value between `start` and `end`
#[inline]
pub fn rlerp<R: Rng + ?Sized>(rng: &mut R, start: f32, end: f32) -> f32 {
    lerp(start, end, rng.random::<f32>())
}

/// Random element of a non-empty slice
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Triangle wave with period 1, ranging over [0, 1]
#[inline]
pub fn triangle_wave(x: f32) -> f32 {
    2.0 * (x - (x + 0.5).floor()).abs()
}

/// Triangle wave centred on zero, ranging over [-0.5, 0.5]
#[inline]
pub fn offset_triangle_wave(x: f32) -> f32 {
    triangle_wave(x) - 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, -3.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 7.0), 10.0);
    }

    #[test]
    fn test_triangle_wave_shape() {
        assert!(triangle_wave(0.0).abs() < 1e-6);
        assert!((triangle_wave(0.5) - 1.0).abs() < 1e-6);
        assert!((triangle_wave(0.25) - 0.5).abs() < 1e-6);
        assert!((triangle_wave(1.25) - triangle_wave(0.25)).abs() < 1e-6);
        assert!((offset_triangle_wave(0.0) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rlerp_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let v = rlerp(&mut rng, 250.0, 350.0);
            assert!((250.0..=350.0).contains(&v));
        }
    }
}
