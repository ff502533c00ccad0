//! Boss encounter
//!
//! The boss hangs at the right edge of the view and tracks the ship's
//! height. While shielded it lobs single rocks; every coin milestone it
//! answers with a volley. Once the coin quota is met the shield drops, and
//! laser hits wear it down until it sinks out of view.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::obstacle::Meteorite;
use crate::consts::*;
use crate::rlerp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BossPhase {
    /// Not part of the current stage
    #[default]
    Dormant,
    /// Invulnerable, firing slowly
    Shielded,
    /// Takes laser damage, fires spreads
    Exposed,
    /// Sinking out of view
    Defeated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub phase: BossPhase,
    pub y: f32,
    pub health: f32,
    /// Time of the last attack
    pub last_action: f32,
    /// Coin milestones already answered
    pub milestones: u32,
    pub defeated_at: Option<f32>,
}

impl Default for Boss {
    fn default() -> Self {
        Self {
            phase: BossPhase::Dormant,
            y: LOGICAL_HEIGHT / 2.0,
            health: 1.0,
            last_action: 0.0,
            milestones: 0,
            defeated_at: None,
        }
    }
}

impl Boss {
    /// Raise the shield and start attacking
    pub fn activate(&mut self, now: f32, player_y: f32) {
        *self = Self {
            phase: BossPhase::Shielded,
            y: player_y,
            last_action: now,
            ..Self::default()
        };
        log::info!("Boss activated");
    }

    pub fn is_active(&self) -> bool {
        self.phase != BossPhase::Dormant
    }

    /// World x of the boss centre; never closer than `BOSS_MIN_LEAD` ahead
    /// of the ship, even when a narrow view puts the right edge behind it
    pub fn x(cam_x: f32, view_width: f32, player_x: f32) -> f32 {
        (cam_x + view_width - BOSS_STANDOFF).max(player_x + BOSS_MIN_LEAD)
    }

    pub fn bounds(&self, cam_x: f32, view_width: f32, player_x: f32) -> Aabb {
        Aabb::around(
            Vec2::new(Self::x(cam_x, view_width, player_x), self.y),
            BOSS_HALF_HEIGHT,
            BOSS_HALF_HEIGHT,
        )
    }

    /// Drop the shield
    pub fn expose(&mut self, now: f32) {
        if self.phase == BossPhase::Shielded {
            self.phase = BossPhase::Exposed;
            self.last_action = now;
            log::info!("Boss shield down");
        }
    }

    /// Apply a laser hit; returns true if this hit finished it off
    pub fn take_laser_hit(&mut self, now: f32) -> bool {
        if self.phase != BossPhase::Exposed {
            return false;
        }
        self.health = (self.health - BOSS_LASER_DAMAGE).max(0.0);
        log::debug!("Boss hit, health {:.2}", self.health);
        if self.health <= 1e-4 {
            self.phase = BossPhase::Defeated;
            self.defeated_at = Some(now);
            log::info!("Boss defeated");
            return true;
        }
        false
    }

    /// Whether the defeated boss has finished sinking
    pub fn has_sunk(&self, now: f32) -> bool {
        self.defeated_at
            .is_some_and(|at| now - at > BOSS_SINK_TIME)
    }

    /// Count a newly reached coin milestone; true if it is new
    pub fn reach_milestone(&mut self, coins: u32) -> bool {
        let reached = coins / BOSS_MILESTONE_COINS;
        if reached > self.milestones {
            self.milestones = reached;
            return true;
        }
        false
    }

    /// Rocks aimed at `target` from the boss's mouth
    pub fn volley<R: Rng + ?Sized>(
        &self,
        origin: Vec2,
        target: Vec2,
        count: usize,
        rng: &mut R,
    ) -> Vec<Meteorite> {
        // Shots close in at their own speed plus the ship's
        let travel = ((origin.x - target.x) / (BOSS_SHOT_SPEED + FORWARD_VELOCITY)).max(0.5);
        (0..count)
            .map(|i| {
                let spread = (i as f32 - (count as f32 - 1.0) / 2.0) * 140.0;
                let aim_y = (target.y + spread).clamp(CEILING_Y, FLOOR_Y);
                let drift = Vec2::new(-BOSS_SHOT_SPEED, (aim_y - origin.y) / travel);
                Meteorite::new(origin, BOSS_SHOT_RADIUS, rng.random::<f32>(), rlerp(rng, -1.0, 1.0))
                    .with_drift(drift)
            })
            .collect()
    }

    /// Advance tracking and the attack timer; returns any shots fired
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        now: f32,
        origin_x: f32,
        player_pos: Vec2,
        rng: &mut R,
    ) -> Vec<Meteorite> {
        match self.phase {
            BossPhase::Dormant => Vec::new(),
            BossPhase::Defeated => {
                self.y += 150.0 * dt;
                Vec::new()
            }
            BossPhase::Shielded | BossPhase::Exposed => {
                self.y += (player_pos.y - self.y) * (BOSS_TRACKING_RATE * dt).min(1.0);

                let (interval, count) = if self.phase == BossPhase::Shielded {
                    (BOSS_SHIELDED_INTERVAL, 1)
                } else {
                    (BOSS_EXPOSED_INTERVAL, 3)
                };
                if now - self.last_action < interval {
                    return Vec::new();
                }
                self.last_action = now;
                self.volley(Vec2::new(origin_x, self.y), player_pos, count, rng)
            }
        }
    }
}
