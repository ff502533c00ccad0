//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Bounded sub-steps only (see `driver`)
//! - Seeded RNG only
//! - Obstacles kept in ascending x order
//! - No rendering, audio or platform dependencies

pub mod boss;
pub mod collision;
pub mod dialogue;
pub mod generator;
pub mod obstacle;
pub mod player;
pub mod stage;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossPhase};
pub use collision::Aabb;
pub use dialogue::{Beat, Dialogue, MonospaceMeasure, TextMeasure, Token};
pub use generator::{GenerationMode, ObstacleGenerator};
pub use obstacle::{Coin, HitContext, HitEffect, LaserBeam, Meteorite, Obstacle, PlasmaArc};
pub use player::{ExhaustParticle, GravityDirection, Player};
pub use stage::{Stage, enter_stage};
pub use state::{GameEvent, GameState, Viewport};
pub use tick::{DamageSource, TickInput, deal_damage, tick, tick_with_measure};
