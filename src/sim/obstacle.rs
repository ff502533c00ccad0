//! Obstacle entities: plasma arcs, meteorites, coins and the player's laser
//!
//! Every obstacle exposes a world-space bounding box for the broad phase and
//! an exact hit test for the narrow phase. Per-instance state that the effect
//! depends on (laser neutralisation, coin eaten time) lives on the variant.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::collision::{Aabb, circle_touches_polygon, point_in_polygon, point_in_stroke};
use super::player::Player;
use crate::consts::*;
use crate::{lerp, offset_triangle_wave, triangle_wave};

/// What touching an obstacle does to the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitEffect {
    Damage(f32),
    CoinPickup,
}

/// Stage-dependent rules for the narrow phase
#[derive(Debug, Clone, Copy)]
pub struct HitContext {
    pub now: f32,
    /// Coins may be picked up
    pub coins_enabled: bool,
    /// Hazards are fading away and cannot hurt
    pub harmless: bool,
}

/// A vertical ribbon of plasma between two emitters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlasmaArc {
    pub x: f32,
    pub y_top: f32,
    pub h: f32,
    /// Last time a laser cut this arc
    pub last_laser_hit: Option<f32>,
}

impl PlasmaArc {
    pub fn new(x: f32, y_top: f32, h: f32) -> Self {
        Self {
            x,
            y_top,
            h: h.max(PLASMA_SAMPLE_STEP),
            last_laser_hit: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.x - PLASMA_BOX_PAD,
            self.y_top - PLASMA_BOX_PAD,
            2.0 * PLASMA_BOX_PAD,
            self.h + 2.0 * PLASMA_BOX_PAD,
        )
    }

    /// Narrow strip the laser tests against
    pub fn strip(&self) -> Aabb {
        Aabb::new(
            self.x - PLASMA_STRIP_HALF_WIDTH,
            self.y_top,
            2.0 * PLASMA_STRIP_HALF_WIDTH,
            self.h,
        )
    }

    /// Horizontal displacement of the centreline at height `y`
    pub fn wave_offset(&self, y: f32, t: f32) -> f32 {
        let wave = 5.0 * offset_triangle_wave(y / 100.0 + t)
            + offset_triangle_wave(y / 30.0 - t * 3.0);
        // Pinned at both emitters
        wave * 6.0 * triangle_wave((y - self.y_top) / self.h)
    }

    fn sample_count(&self) -> usize {
        (self.h / PLASMA_SAMPLE_STEP).floor() as usize + 1
    }

    fn sample(&self, i: usize, t: f32) -> Vec2 {
        let y = self.y_top + i as f32 * PLASMA_SAMPLE_STEP;
        Vec2::new(self.x + self.wave_offset(y, t), y)
    }

    /// Stroke width pulses with the ship's distance
    pub fn stroke_width(&self, player_x: f32) -> f32 {
        12.0 + 4.0 * ((player_x - self.x) / 100.0).cos()
    }

    /// Whether a recent laser cut is still glowing
    pub fn is_neutralized(&self, now: f32) -> bool {
        self.last_laser_hit
            .is_some_and(|hit| now - hit < LASER_NEUTRALIZE_TIME)
    }

    /// Whether any point lies on the stroked centreline
    pub fn touches(&self, points: &[Vec2], player_x: f32, t: f32) -> bool {
        let width = self.stroke_width(player_x);
        let half = width / 2.0;
        let last = self.sample_count() - 1;
        points.iter().any(|&p| {
            if p.y < self.y_top - half || p.y > self.y_top + self.h + half {
                return false;
            }
            // Only samples within `half` vertically can be within `half` at all
            let lo = ((p.y - half - self.y_top) / PLASMA_SAMPLE_STEP).floor() - 1.0;
            let hi = ((p.y + half - self.y_top) / PLASMA_SAMPLE_STEP).ceil() + 1.0;
            let lo = (lo.max(0.0) as usize).min(last);
            let hi = (hi.max(0.0) as usize).min(last);
            let window: Vec<Vec2> = (lo..=hi).map(|i| self.sample(i, t)).collect();
            point_in_stroke(p, &window, width)
        })
    }
}

/// A jagged rock, optionally drifting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meteorite {
    pub center: Vec2,
    pub radius: f32,
    /// Phase of the outline bumps
    pub seed: f32,
    /// Outline rotation speed (bump periods per second)
    pub spin: f32,
    /// World units per second
    pub drift: Vec2,
}

impl Meteorite {
    pub fn new(center: Vec2, radius: f32, seed: f32, spin: f32) -> Self {
        Self {
            center,
            radius,
            seed,
            spin,
            drift: Vec2::ZERO,
        }
    }

    pub fn with_drift(mut self, drift: Vec2) -> Self {
        self.drift = drift;
        self
    }

    pub fn bounds(&self) -> Aabb {
        let extent = self.radius * 1.2;
        Aabb::around(self.center, extent, extent)
    }

    /// Outline radius in direction `theta` at time `t`
    pub fn radius_at(&self, theta: f32, t: f32) -> f32 {
        let bump = offset_triangle_wave(theta * METEORITE_BUMPS / TAU + self.seed + self.spin * t);
        self.radius * (1.0 + 0.18 * bump)
    }

    pub fn outline(&self, t: f32) -> Vec<Vec2> {
        (0..METEORITE_SAMPLES)
            .map(|i| {
                let theta = i as f32 / METEORITE_SAMPLES as f32 * TAU;
                self.center + Vec2::from_angle(theta) * self.radius_at(theta, t)
            })
            .collect()
    }

    pub fn update(&mut self, dt: f32) {
        self.center += self.drift * dt;
    }

    pub fn touches(&self, hitbox: &[Vec2], t: f32) -> bool {
        let outline = self.outline(t);
        hitbox.iter().any(|&p| point_in_polygon(p, &outline))
            || point_in_polygon(self.center, hitbox)
    }
}

/// A collectible coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    /// Spawn position; the bounding box stays here so list order holds
    pub anchor: Vec2,
    /// Drawn position, pulled toward the ship once eaten
    pub pos: Vec2,
    pub radius: f32,
    pub eaten_at: Option<f32>,
}

impl Coin {
    pub fn new(pos: Vec2) -> Self {
        Self {
            anchor: pos,
            pos,
            radius: COIN_RADIUS,
            eaten_at: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::around(self.anchor, COIN_RADIUS, COIN_RADIUS)
    }

    pub fn is_eaten(&self) -> bool {
        self.eaten_at.is_some()
    }

    /// Mark as eaten; true only the first time
    pub fn try_eat(&mut self, now: f32) -> bool {
        if self.eaten_at.is_some() {
            return false;
        }
        self.eaten_at = Some(now);
        true
    }

    pub fn update(&mut self, dt: f32, now: f32, player_pos: Vec2) {
        if let Some(eaten_at) = self.eaten_at {
            let progress = (now - eaten_at) / COIN_EAT_DURATION;
            self.radius = lerp(COIN_RADIUS, 0.0, progress);
            self.pos = self.pos.lerp(player_pos, (dt * 10.0).min(1.0));
        }
    }

    pub fn touches(&self, hitbox: &[Vec2]) -> bool {
        circle_touches_polygon(self.pos, self.radius, hitbox)
    }
}

/// Anything the generator places in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Obstacle {
    PlasmaArc(PlasmaArc),
    Meteorite(Meteorite),
    Coin(Coin),
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        match self {
            Obstacle::PlasmaArc(arc) => arc.bounds(),
            Obstacle::Meteorite(rock) => rock.bounds(),
            Obstacle::Coin(coin) => coin.bounds(),
        }
    }

    pub fn update(&mut self, dt: f32, now: f32, player_pos: Vec2) {
        match self {
            Obstacle::PlasmaArc(_) => {}
            Obstacle::Meteorite(rock) => rock.update(dt),
            Obstacle::Coin(coin) => coin.update(dt, now, player_pos),
        }
    }

    /// Narrow-phase test; applies per-instance side effects (coin eaten)
    pub fn hit(&mut self, player: &Player, ctx: &HitContext) -> Option<HitEffect> {
        let hitbox = player.hitbox();
        match self {
            // Laser neutralisation only recolours the arc; it still burns
            Obstacle::PlasmaArc(arc) => (!ctx.harmless && arc.touches(&hitbox, player.x, ctx.now))
                .then_some(HitEffect::Damage(PLASMA_DAMAGE)),
            Obstacle::Meteorite(rock) => (!ctx.harmless && rock.touches(&hitbox, ctx.now))
                .then_some(HitEffect::Damage(METEORITE_DAMAGE)),
            Obstacle::Coin(coin) => {
                if !ctx.coins_enabled || coin.is_eaten() || !coin.touches(&hitbox) {
                    return None;
                }
                coin.try_eat(ctx.now).then_some(HitEffect::CoinPickup)
            }
        }
    }
}

/// A beam fired forward from the ship's nose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaserBeam {
    /// Tail x
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub growing: bool,
}

impl LaserBeam {
    pub fn fire(from: Vec2) -> Self {
        Self {
            x: from.x,
            y: from.y,
            length: 0.0,
            growing: true,
        }
    }

    pub fn head(&self) -> f32 {
        self.x + self.length
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.x,
            self.y - LASER_HALF_THICKNESS,
            self.length,
            2.0 * LASER_HALF_THICKNESS,
        )
    }

    pub fn update(&mut self, dt: f32) {
        if self.growing {
            self.length += LASER_GROW_SPEED * dt;
        } else {
            // Tail catches up with the head
            let shrink = (LASER_SHRINK_SPEED * dt).min(self.length);
            self.x += shrink;
            self.length -= shrink;
        }
    }

    /// Stop growing with the head at `head_x`
    pub fn stop_at(&mut self, head_x: f32) {
        self.length = (head_x - self.x).clamp(0.0, self.length);
        self.growing = false;
    }

    pub fn is_spent(&self) -> bool {
        !self.growing && self.length <= 0.0
    }

    pub fn hits_plasma(&self, arc: &PlasmaArc) -> bool {
        self.growing && self.bounds().overlaps(&arc.strip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::HITBOX;

    fn ctx(now: f32) -> HitContext {
        HitContext {
            now,
            coins_enabled: true,
            harmless: false,
        }
    }

    #[test]
    fn test_plasma_pinned_at_emitters() {
        let arc = PlasmaArc::new(1000.0, 100.0, 300.0);
        for t in [0.0, 0.37, 2.9] {
            assert!(arc.wave_offset(100.0, t).abs() < 1e-3);
            assert!(arc.wave_offset(400.0, t).abs() < 1e-3);
        }
        assert_eq!(arc.sample_count(), 151);
        assert_eq!(arc.sample(0, 0.0), Vec2::new(1000.0, 100.0));
        assert_eq!(arc.sample(150, 0.0), Vec2::new(1000.0, 400.0));
    }

    #[test]
    fn test_plasma_hit_uses_wavy_line() {
        let arc = PlasmaArc::new(1000.0, 0.0, 800.0);
        let t = 0.3;
        let y = 400.0;
        let on_line = Vec2::new(1000.0 + arc.wave_offset(y, t), y);
        assert!(arc.touches(&[on_line], 1000.0, t));
        // Well inside the bounding box but far off the stroke
        let off_line = Vec2::new(on_line.x + 60.0, y);
        assert!(arc.bounds().x < off_line.x && off_line.x < arc.bounds().right());
        assert!(!arc.touches(&[off_line], 1000.0, t));
    }

    #[test]
    fn test_plasma_damages_even_when_neutralized() {
        let mut arc = PlasmaArc::new(1000.0, 300.0, 400.0);
        arc.last_laser_hit = Some(0.0);
        assert!(arc.is_neutralized(1.0));
        assert!(!arc.is_neutralized(3.5));

        // Put the ship's nose right on the ribbon
        let line_x = arc.x + arc.wave_offset(500.0, 1.0);
        let player = Player {
            x: line_x - HITBOX[0].x,
            y: 500.0,
            ..Default::default()
        };
        let mut obstacle = Obstacle::PlasmaArc(arc);
        let effect = obstacle.hit(&player, &ctx(1.0));
        assert_eq!(effect, Some(HitEffect::Damage(PLASMA_DAMAGE)));
    }

    #[test]
    fn test_meteorite_outline_and_hit() {
        let rock = Meteorite::new(Vec2::new(500.0, 500.0), 40.0, 0.3, 0.5);
        for p in rock.outline(1.2) {
            let r = p.distance(rock.center);
            assert!(r >= 40.0 * 0.91 - 1e-3 && r <= 40.0 * 1.09 + 1e-3);
        }
        let player = Player {
            x: 500.0,
            y: 500.0,
            ..Default::default()
        };
        assert!(rock.touches(&player.hitbox(), 0.0));
        let far = Player {
            x: 800.0,
            y: 500.0,
            ..Default::default()
        };
        assert!(!rock.touches(&far.hitbox(), 0.0));
    }

    #[test]
    fn test_coin_pickup_is_idempotent() {
        let player = Player {
            x: 500.0,
            y: 500.0,
            ..Default::default()
        };
        let mut coin = Obstacle::Coin(Coin::new(Vec2::new(480.0, 500.0)));
        assert_eq!(coin.hit(&player, &ctx(1.0)), Some(HitEffect::CoinPickup));
        for i in 0..10 {
            coin.update(0.01, 1.0 + i as f32 * 0.01, player.pos());
            assert_eq!(coin.hit(&player, &ctx(1.0 + i as f32 * 0.01)), None);
        }
    }

    #[test]
    fn test_coin_suppressed_in_cutscenes() {
        let player = Player {
            x: 500.0,
            y: 500.0,
            ..Default::default()
        };
        let mut coin = Obstacle::Coin(Coin::new(Vec2::new(480.0, 500.0)));
        let cutscene = HitContext {
            coins_enabled: false,
            ..ctx(1.0)
        };
        assert_eq!(coin.hit(&player, &cutscene), None);
        // Still there to be collected later
        assert_eq!(coin.hit(&player, &ctx(2.0)), Some(HitEffect::CoinPickup));
    }

    #[test]
    fn test_eaten_coin_shrinks_toward_ship() {
        let mut coin = Coin::new(Vec2::new(600.0, 500.0));
        coin.try_eat(0.0);
        let anchor_box = coin.bounds();
        for i in 1..=50 {
            coin.update(0.01, i as f32 * 0.01, Vec2::new(500.0, 500.0));
        }
        assert_eq!(coin.radius, 0.0);
        assert!(coin.pos.x < 600.0);
        assert_eq!(coin.bounds(), anchor_box);
    }

    #[test]
    fn test_laser_grows_then_shrinks_away() {
        let mut beam = LaserBeam::fire(Vec2::new(0.0, 300.0));
        beam.update(0.1);
        assert!((beam.length - LASER_GROW_SPEED * 0.1).abs() < 1e-2);

        let arc = PlasmaArc::new(200.0, 0.0, 600.0);
        assert!(beam.hits_plasma(&arc));
        beam.stop_at(arc.x - PLASMA_STRIP_HALF_WIDTH);
        assert!(!beam.growing);
        assert_eq!(beam.head(), 170.0);
        assert!(!beam.hits_plasma(&arc));

        for _ in 0..10 {
            beam.update(0.01);
        }
        assert!(beam.is_spent());
    }
}
