//! The player's ship: gravity-flip physics, health and exhaust trail

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;

/// Direction gravity currently pulls the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityDirection {
    /// Toward the ceiling
    Up,
    /// Locked out (scripted narration)
    Off,
    /// Toward the floor
    #[default]
    Down,
}

impl GravityDirection {
    /// -1, 0 or 1 (screen y grows downward)
    pub fn sign(self) -> f32 {
        match self {
            GravityDirection::Up => -1.0,
            GravityDirection::Off => 0.0,
            GravityDirection::Down => 1.0,
        }
    }

    /// Sign flip; `Off` stays `Off`
    pub fn flipped(self) -> Self {
        match self {
            GravityDirection::Up => GravityDirection::Down,
            GravityDirection::Off => GravityDirection::Off,
            GravityDirection::Down => GravityDirection::Up,
        }
    }
}

/// Ship outline relative to the ship origin, in drawing order
pub const HITBOX: [Vec2; 17] = [
    Vec2::new(30.0, 0.0),
    Vec2::new(0.0, -20.0),
    Vec2::new(-40.0, -20.0),
    Vec2::new(-60.0, -30.0),
    Vec2::new(-70.0, -40.0),
    Vec2::new(-80.0, -40.0),
    Vec2::new(-80.0, -30.0),
    Vec2::new(-70.0, -30.0),
    Vec2::new(-60.0, -20.0),
    Vec2::new(-60.0, 20.0),
    Vec2::new(-70.0, 30.0),
    Vec2::new(-80.0, 30.0),
    Vec2::new(-80.0, 40.0),
    Vec2::new(-70.0, 40.0),
    Vec2::new(-60.0, 30.0),
    Vec2::new(-40.0, 20.0),
    Vec2::new(0.0, 20.0),
];

/// Outcome of one physics sub-step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Flying,
    /// Ship scraped the floor and was pushed back up
    HitFloor,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// World x, grows monotonically while flying
    pub x: f32,
    pub y: f32,
    pub vel_y: f32,
    pub gravity: GravityDirection,
    /// Real health in [0, 1]
    pub health: f32,
    /// Health bar value, lags behind `health`
    pub displayed_health: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: LOGICAL_HEIGHT / 2.0,
            vel_y: 0.0,
            gravity: GravityDirection::Down,
            health: 1.0,
            displayed_health: 1.0,
        }
    }
}

impl Player {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Hitbox polygon in world space
    pub fn hitbox(&self) -> [Vec2; 17] {
        let origin = self.pos();
        HITBOX.map(|p| p + origin)
    }

    /// Broad-phase box around the ship
    pub fn coarse_box(&self) -> Aabb {
        Aabb::new(self.x - 100.0, self.y - 40.0, 150.0, 80.0)
    }

    /// Nose of the ship (laser muzzle)
    pub fn nose(&self) -> Vec2 {
        self.pos() + HITBOX[0]
    }

    /// Integrate one sub-step of flight
    pub fn step(&mut self, dt: f32) -> StepOutcome {
        self.x += FORWARD_VELOCITY * dt;

        self.vel_y += self.gravity.sign() * GRAVITY * dt;
        self.y += self.vel_y * dt;

        if self.y < CEILING_Y {
            self.y = CEILING_Y;
            self.vel_y = 0.0;
        } else if self.y < CUSHION_Y && self.vel_y < 0.0 {
            self.vel_y += -CUSHION_DAMPING * dt * self.vel_y;
        }

        if self.y > FLOOR_Y {
            self.y = (self.y - FLOOR_PUSHBACK).min(FLOOR_Y);
            self.vel_y = 0.0;
            self.gravity = GravityDirection::Up;
            return StepOutcome::HitFloor;
        }

        StepOutcome::Flying
    }

    /// Primary-action gravity flip: soft reversal, not a full stop
    pub fn do_grav_switch(&mut self) {
        self.gravity = self.gravity.flipped();
        self.vel_y /= GRAV_SWITCH_DAMPING;
    }

    /// Park the ship for narration: no gravity, no vertical motion
    pub fn hold_at(&mut self, y: f32) {
        self.y = y;
        self.vel_y = 0.0;
        self.gravity = GravityDirection::Off;
    }

    /// Ease toward a cruising height with gravity locked out
    pub fn cruise_toward(&mut self, y: f32, dt: f32) {
        self.gravity = GravityDirection::Off;
        self.vel_y = 0.0;
        self.y += (y - self.y) * (2.0 * dt).min(1.0);
        self.y = self.y.clamp(CEILING_Y, FLOOR_Y);
    }

    /// Move the health bar toward real health without overshooting
    pub fn update_displayed_health(&mut self, dt: f32) {
        let max_step = HEALTH_DISPLAY_RATE * dt;
        if self.displayed_health > self.health {
            self.displayed_health -= max_step.min(self.displayed_health - self.health);
        } else if self.displayed_health < self.health {
            self.displayed_health += max_step.min(self.health - self.displayed_health);
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, 1.0);
    }
}

/// A puff of engine exhaust (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhaustParticle {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    /// Spawn time
    pub t: f32,
}

impl ExhaustParticle {
    pub fn update(&mut self, dt: f32) {
        self.x += self.dx * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ceiling_clamp_zeroes_velocity() {
        let mut p = Player {
            y: 70.0,
            vel_y: -2000.0,
            gravity: GravityDirection::Up,
            ..Default::default()
        };
        p.step(0.02);
        assert_eq!(p.y, CEILING_Y);
        assert_eq!(p.vel_y, 0.0);
    }

    #[test]
    fn test_cushion_slows_upward_motion() {
        let mut p = Player {
            y: 110.0,
            vel_y: -100.0,
            gravity: GravityDirection::Off,
            ..Default::default()
        };
        p.step(0.01);
        assert!(p.vel_y > -100.0);
        assert!(p.vel_y < 0.0);
    }

    #[test]
    fn test_floor_pushes_back_and_flips_gravity() {
        let mut p = Player {
            y: 849.0,
            vel_y: 500.0,
            ..Default::default()
        };
        assert_eq!(p.step(0.01), StepOutcome::HitFloor);
        assert!(p.y <= FLOOR_Y - FLOOR_PUSHBACK + 10.0);
        assert_eq!(p.vel_y, 0.0);
        assert_eq!(p.gravity, GravityDirection::Up);
    }

    #[test]
    fn test_grav_switch_quarters_velocity() {
        let mut p = Player {
            vel_y: 400.0,
            ..Default::default()
        };
        p.do_grav_switch();
        assert_eq!(p.gravity, GravityDirection::Up);
        assert_eq!(p.vel_y, 100.0);

        p.gravity = GravityDirection::Off;
        p.do_grav_switch();
        assert_eq!(p.gravity, GravityDirection::Off);
    }

    #[test]
    fn test_forward_motion() {
        let mut p = Player::default();
        p.step(0.5);
        assert!((p.x - FORWARD_VELOCITY * 0.5).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_y_stays_in_bounds(
            steps in prop::collection::vec((0.001f32..0.034, any::<bool>()), 1..400),
            start_y in 60.0f32..850.0,
        ) {
            let mut p = Player { y: start_y, ..Default::default() };
            for (dt, flip) in steps {
                if flip {
                    p.do_grav_switch();
                }
                p.step(dt);
                prop_assert!(p.y >= CEILING_Y && p.y <= FLOOR_Y);
                if p.y == CEILING_Y && p.gravity == GravityDirection::Up {
                    prop_assert_eq!(p.vel_y, 0.0);
                }
            }
        }

        #[test]
        fn prop_displayed_health_converges(
            health in 0.0f32..=1.0,
            shown in 0.0f32..=1.0,
            dts in prop::collection::vec(0.0f32..0.05, 1..200),
        ) {
            let mut p = Player { health, displayed_health: shown, ..Default::default() };
            let mut gap = (p.displayed_health - p.health).abs();
            let above = p.displayed_health >= p.health;
            for dt in dts {
                p.update_displayed_health(dt);
                let new_gap = (p.displayed_health - p.health).abs();
                prop_assert!(new_gap <= gap + 1e-6);
                // Never crosses over to the other side
                if above {
                    prop_assert!(p.displayed_health >= p.health - 1e-6);
                } else {
                    prop_assert!(p.displayed_health <= p.health + 1e-6);
                }
                gap = new_gap;
            }
        }
    }
}
