//! Procedural obstacle placement
//!
//! The generator owns a cursor in world x. Everything left of the cursor has
//! already been generated; it only ever moves right, so obstacles come out in
//! ascending x order and the list can be retired from the front.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::obstacle::{Coin, Meteorite, Obstacle, PlasmaArc};
use crate::consts::*;
use crate::{lerp, rlerp};

/// Placement policy for the active stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Scripted stages: advance the cursor, spawn nothing
    Idle,
    /// Short plasma fields only
    Tutorial,
    /// Full mix of separators, plasma fields and meteorite swarms
    Main,
}

/// Plasma layouts a field is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldPiece {
    /// Arcs from ceiling and floor with a gap between
    Gap,
    /// Arc hanging from the ceiling
    Hanging,
    /// Arc rising from the floor
    Rising,
    /// Free-floating arc mid-screen
    Floating,
}

const FIELD_PIECES: [FieldPiece; 4] = [
    FieldPiece::Gap,
    FieldPiece::Hanging,
    FieldPiece::Rising,
    FieldPiece::Floating,
];

/// Plasma bottoms reach below the floor so nothing slips underneath
const FIELD_BOTTOM: f32 = 900.0;
const FIELD_TOP: f32 = -20.0;
const GAP_HALF: f32 = 140.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleGenerator {
    /// World x up to which obstacles exist
    pub cursor: f32,
}

impl Default for ObstacleGenerator {
    fn default() -> Self {
        Self {
            cursor: GENERATOR_START_X,
        }
    }
}

impl ObstacleGenerator {
    /// Append an obstacle, refusing anything that would break x order
    pub fn push_ordered(obstacles: &mut VecDeque<Obstacle>, obstacle: Obstacle) -> bool {
        if let Some(last) = obstacles.back() {
            if obstacle.bounds().x < last.bounds().x {
                log::debug!(
                    "Dropping out-of-order obstacle at x={:.0} (last x={:.0})",
                    obstacle.bounds().x,
                    last.bounds().x
                );
                return false;
            }
        }
        obstacles.push_back(obstacle);
        true
    }

    /// Generate until the cursor reaches `horizon`
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        obstacles: &mut VecDeque<Obstacle>,
        horizon: f32,
        mode: GenerationMode,
        rng: &mut R,
    ) {
        while self.cursor < horizon {
            match mode {
                GenerationMode::Idle => self.cursor += IDLE_CURSOR_STEP,
                GenerationMode::Tutorial => self.tutorial_segment(obstacles, rng),
                GenerationMode::Main => self.main_segment(obstacles, rng),
            }
        }
    }

    fn tutorial_segment<R: Rng + ?Sized>(&mut self, obstacles: &mut VecDeque<Obstacle>, rng: &mut R) {
        if rng.random::<f32>() < 0.3 {
            self.separator(obstacles, rng);
        } else {
            let length = rlerp(rng, 600.0, 1600.0);
            self.plasma_field(obstacles, length, rng);
        }
    }

    fn main_segment<R: Rng + ?Sized>(&mut self, obstacles: &mut VecDeque<Obstacle>, rng: &mut R) {
        let roll = rng.random::<f32>();
        if roll < 0.1 {
            self.separator(obstacles, rng);
        } else if roll < 0.5 {
            let length = rlerp(rng, 800.0, 3200.0);
            self.plasma_field(obstacles, length, rng);
        } else {
            self.meteorite_swarm(obstacles, rng);
        }
    }

    /// A lone arc splitting the screen
    fn separator<R: Rng + ?Sized>(&mut self, obstacles: &mut VecDeque<Obstacle>, rng: &mut R) {
        let y_top = rlerp(rng, 0.0, 450.0);
        let h = rlerp(rng, 250.0, 350.0);
        log::debug!("Separator at x={:.0}", self.cursor);
        Self::push_ordered(obstacles, Obstacle::PlasmaArc(PlasmaArc::new(self.cursor, y_top, h)));
        self.cursor += 700.0;
    }

    /// Coin with the keep filter applied
    fn maybe_coin<R: Rng + ?Sized>(obstacles: &mut VecDeque<Obstacle>, pos: Vec2, rng: &mut R) {
        if rng.random_bool(COIN_KEEP_CHANCE) {
            Self::push_ordered(obstacles, Obstacle::Coin(Coin::new(pos)));
        }
    }

    fn plasma_field<R: Rng + ?Sized>(
        &mut self,
        obstacles: &mut VecDeque<Obstacle>,
        length: f32,
        rng: &mut R,
    ) {
        let end = self.cursor + length;
        log::debug!("Plasma field {:.0}..{:.0}", self.cursor, end);

        while self.cursor < end {
            let x = self.cursor;
            let piece = *crate::pick(rng, &FIELD_PIECES);
            let coin_y = match piece {
                FieldPiece::Gap => {
                    let gap_center = rlerp(rng, 280.0, 620.0);
                    let top_h = gap_center - GAP_HALF - FIELD_TOP;
                    let bottom_y = gap_center + GAP_HALF;
                    Self::push_ordered(obstacles, Obstacle::PlasmaArc(PlasmaArc::new(x, FIELD_TOP, top_h)));
                    Self::push_ordered(
                        obstacles,
                        Obstacle::PlasmaArc(PlasmaArc::new(x, bottom_y, FIELD_BOTTOM - bottom_y)),
                    );
                    gap_center
                }
                FieldPiece::Hanging => {
                    let h = rlerp(rng, 300.0, 520.0);
                    Self::push_ordered(obstacles, Obstacle::PlasmaArc(PlasmaArc::new(x, FIELD_TOP, h)));
                    rlerp(rng, FIELD_TOP + h + 120.0, 780.0)
                }
                FieldPiece::Rising => {
                    let y_top = rlerp(rng, 380.0, 600.0);
                    Self::push_ordered(
                        obstacles,
                        Obstacle::PlasmaArc(PlasmaArc::new(x, y_top, FIELD_BOTTOM - y_top)),
                    );
                    rlerp(rng, 120.0, y_top - 120.0)
                }
                FieldPiece::Floating => {
                    let y_top = rlerp(rng, 200.0, 420.0);
                    let h = rlerp(rng, 180.0, 300.0);
                    Self::push_ordered(obstacles, Obstacle::PlasmaArc(PlasmaArc::new(x, y_top, h)));
                    if rng.random_bool(0.5) {
                        y_top - 100.0
                    } else {
                        y_top + h + 100.0
                    }
                }
            };

            if rng.random_bool(COIN_CHANCE) {
                Self::maybe_coin(obstacles, Vec2::new(x, coin_y.clamp(CUSHION_Y, FLOOR_Y - 50.0)), rng);
            }
            self.cursor += rlerp(rng, 350.0, 500.0);
        }

        self.cursor += 300.0;
    }

    /// Rocks fanning out over a widening band, with the odd coin mixed in
    fn meteorite_swarm<R: Rng + ?Sized>(&mut self, obstacles: &mut VecDeque<Obstacle>, rng: &mut R) {
        let start = self.cursor;
        log::debug!("Meteorite swarm at x={:.0}", start);

        for i in 0..SWARM_SIZE {
            let t = i as f32 / (SWARM_SIZE - 1) as f32;
            let x = start + t * SWARM_LENGTH;
            let half_band = lerp(80.0, 360.0, t);
            let y = 450.0 + rlerp(rng, -half_band, half_band);

            if rng.random_bool(0.1) {
                Self::maybe_coin(obstacles, Vec2::new(x, y), rng);
                continue;
            }

            let radius = rlerp(rng, 22.0, 42.0);
            let seed = rng.random::<f32>();
            let spin = rlerp(rng, -0.5, 0.5);
            let mut rock = Meteorite::new(Vec2::new(x, y), radius, seed, spin);
            if rng.random_bool(0.3) {
                rock = rock.with_drift(Vec2::new(0.0, rlerp(rng, -30.0, 30.0)));
            }
            Self::push_ordered(obstacles, Obstacle::Meteorite(rock));
        }

        self.cursor = start + SWARM_LENGTH + 500.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn is_sorted(obstacles: &VecDeque<Obstacle>) -> bool {
        obstacles
            .iter()
            .zip(obstacles.iter().skip(1))
            .all(|(a, b)| a.bounds().x <= b.bounds().x)
    }

    #[test]
    fn test_idle_spawns_nothing() {
        let mut generator = ObstacleGenerator::default();
        let mut obstacles = VecDeque::new();
        let mut rng = Pcg32::seed_from_u64(1);
        generator.fill(&mut obstacles, 5000.0, GenerationMode::Idle, &mut rng);
        assert!(obstacles.is_empty());
        assert!(generator.cursor >= 5000.0);
        assert!(generator.cursor < 5000.0 + IDLE_CURSOR_STEP);
    }

    #[test]
    fn test_tutorial_has_no_meteorites() {
        let mut generator = ObstacleGenerator::default();
        let mut obstacles = VecDeque::new();
        let mut rng = Pcg32::seed_from_u64(2);
        generator.fill(&mut obstacles, 40_000.0, GenerationMode::Tutorial, &mut rng);
        assert!(!obstacles.is_empty());
        assert!(
            obstacles
                .iter()
                .all(|o| !matches!(o, Obstacle::Meteorite(_)))
        );
    }

    #[test]
    fn test_main_mix_has_every_kind() {
        let mut generator = ObstacleGenerator::default();
        let mut obstacles = VecDeque::new();
        let mut rng = Pcg32::seed_from_u64(3);
        generator.fill(&mut obstacles, 200_000.0, GenerationMode::Main, &mut rng);
        assert!(obstacles.iter().any(|o| matches!(o, Obstacle::PlasmaArc(_))));
        assert!(obstacles.iter().any(|o| matches!(o, Obstacle::Meteorite(_))));
        assert!(obstacles.iter().any(|o| matches!(o, Obstacle::Coin(_))));
    }

    #[test]
    fn test_push_ordered_rejects_backwards() {
        let mut obstacles = VecDeque::new();
        assert!(ObstacleGenerator::push_ordered(
            &mut obstacles,
            Obstacle::Coin(Coin::new(Vec2::new(1000.0, 500.0)))
        ));
        assert!(!ObstacleGenerator::push_ordered(
            &mut obstacles,
            Obstacle::Coin(Coin::new(Vec2::new(900.0, 500.0)))
        ));
        assert_eq!(obstacles.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_generation_keeps_x_order(seed in any::<u64>(), main in any::<bool>(), horizon in 1000.0f32..60_000.0) {
            let mode = if main { GenerationMode::Main } else { GenerationMode::Tutorial };
            let mut generator = ObstacleGenerator::default();
            let mut obstacles = VecDeque::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut last_cursor = generator.cursor;
            let mut h = 1000.0;
            while h < horizon {
                generator.fill(&mut obstacles, h, mode, &mut rng);
                prop_assert!(generator.cursor >= last_cursor);
                last_cursor = generator.cursor;
                h += 700.0;
            }
            prop_assert!(is_sorted(&obstacles));
        }
    }
}
