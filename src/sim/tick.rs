//! Simulation sub-step
//!
//! Advances the game state by one bounded time step: physics, obstacle
//! contacts, lasers, the boss, retirement, generation, dialogue and finally
//! the stage script.

use glam::Vec2;
use rand::Rng;

use super::boss::{Boss, BossPhase};
use super::collision::Aabb;
use super::dialogue::{MonospaceMeasure, TextMeasure};
use super::obstacle::{HitContext, HitEffect, LaserBeam, Obstacle};
use super::player::{GravityDirection, StepOutcome};
use super::stage::{self, Stage};
use super::state::{GameEvent, GameState};
use crate::consts::*;

/// Input commands for a single sub-step
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Primary action (space / tap), already edge-triggered
    pub primary: bool,
    /// Idle/demo mode - the autopilot plays the game
    pub idle_mode: bool,
}

/// What hurt the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Floor,
    Plasma,
    Meteorite,
    Boss,
}

/// Advance the game state by one sub-step
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    tick_with_measure(state, input, dt, &MonospaceMeasure::default());
}

/// `tick` with the host's text metrics for dialogue wrapping
pub fn tick_with_measure(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    measure: &dyn TextMeasure,
) {
    state.elapsed += dt;
    state.stage_elapsed += dt;

    let mut input = *input;
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    if input.primary {
        primary_action(state);
    }

    if state.stage == Stage::Title {
        return;
    }
    let now = state.elapsed;

    state.emit_exhaust();
    for particle in state.exhaust.iter_mut() {
        particle.update(dt);
    }

    if state.player.step(dt) == StepOutcome::HitFloor {
        deal_damage(state, FLOOR_DAMAGE, DamageSource::Floor);
    }
    state.player.update_displayed_health(dt);
    if state.regenerator_repaired && state.player.health > 0.0 {
        state.player.heal(REGEN_RATE * dt);
    }

    resolve_contacts(state, dt);
    update_lasers(state, dt);
    if state.stage == Stage::BossFight {
        update_boss(state, dt);
    }
    retire(state);

    // Keep the world generated past the right edge of the view
    let horizon = state.cam_x() + state.viewport.width + GENERATION_MARGIN;
    let mode = state
        .stage
        .generation_mode(state.generator.cursor - state.stage_start_x);
    state
        .generator
        .fill(&mut state.obstacles, horizon, mode, &mut state.rng);

    if state.dialogue.update(now, measure) {
        state.emit(GameEvent::DialogueBeep);
    }

    stage::update_stage(state, dt);
}

/// Apply damage to the ship; returns false if it was ignored
pub fn deal_damage(state: &mut GameState, amount: f32, source: DamageSource) -> bool {
    if state.is_invulnerable() {
        return false;
    }
    log::debug!("{source:?} damage {amount:.2} in {:?}", state.stage);

    let safe = state.stage.is_safe();
    let health = state.player.health;
    state.player.health = if safe {
        // Dents the hull for show, never kills
        (health * (1.0 - amount)).max(SAFE_STAGE_HEALTH_FLOOR.min(health))
    } else {
        (health - amount).max(0.0)
    };
    state.cause_explosion();

    if !safe && state.player.health <= 0.0 {
        stage::player_died(state);
    }
    true
}

/// Count a picked-up coin and check the stage quota
fn collect_coin(state: &mut GameState) {
    state.coins_gotten += 1;
    state.emit(GameEvent::CoinCollected);
    log::debug!("Coin {}/{}", state.coins_gotten, state.coins_needed);

    if state.stage == Stage::BossFight && state.boss.reach_milestone(state.coins_gotten) {
        // The boss answers every milestone with a volley
        let origin = Vec2::new(boss_mouth_x(state), state.boss.y);
        let shots = state
            .boss
            .volley(origin, state.player.pos(), 3, &mut state.rng);
        state.projectiles.extend(shots);
    }

    if state.stage.coin_quota().is_some() && state.coins_gotten == state.coins_needed {
        stage::complete_collection(state);
    }
}

fn fire_laser(state: &mut GameState) {
    state.lasers.push(LaserBeam::fire(state.player.nose()));
    state.emit(GameEvent::LaserFired);
}

fn primary_action(state: &mut GameState) {
    let stage = state.stage;
    if stage.has_dialogue_screen() {
        state.dialogue.on_primary();
        return;
    }
    match stage {
        Stage::Title => stage::enter_stage(state, Stage::Intro),
        Stage::Credits => {
            let seed = state.rng.random::<u64>();
            log::info!("Starting a new run with seed {seed}");
            *state = state.restarted(seed);
        }
        _ => {
            state.player.do_grav_switch();
            state.emit(GameEvent::GravitySwitched);
            if state.laser_unlocked && stage.is_play() {
                fire_laser(state);
            }
        }
    }
}

fn boss_mouth_x(state: &GameState) -> f32 {
    Boss::x(state.cam_x(), state.viewport.width, state.player.x) - BOSS_HALF_HEIGHT
}

fn boss_bounds(state: &GameState) -> Aabb {
    state
        .boss
        .bounds(state.cam_x(), state.viewport.width, state.player.x)
}

fn boss_is_solid(boss: &Boss) -> bool {
    matches!(boss.phase, BossPhase::Shielded | BossPhase::Exposed)
}

/// Stage-dependent rules for a contact, read fresh since every applied
/// effect may change the stage
fn hit_context(state: &GameState) -> HitContext {
    HitContext {
        now: state.elapsed,
        coins_enabled: state.stage.coins_enabled(),
        harmless: state.stage.is_fade_away(),
    }
}

/// Move obstacles and shots, then resolve everything touching the ship
fn resolve_contacts(state: &mut GameState, dt: f32) {
    let now = state.elapsed;
    let player_pos = state.player.pos();
    for obstacle in state.obstacles.iter_mut() {
        obstacle.update(dt, now, player_pos);
    }
    for shot in state.projectiles.iter_mut() {
        shot.update(dt);
    }

    let coarse = state.player.coarse_box();
    for i in 0..state.obstacles.len() {
        let ctx = hit_context(state);
        let Some(obstacle) = state.obstacles.get_mut(i) else {
            break;
        };
        if !obstacle.bounds().overlaps(&coarse) {
            continue;
        }
        let source = match obstacle {
            Obstacle::PlasmaArc(_) => DamageSource::Plasma,
            _ => DamageSource::Meteorite,
        };
        match obstacle.hit(&state.player, &ctx) {
            Some(HitEffect::Damage(amount)) => {
                deal_damage(state, amount, source);
            }
            Some(HitEffect::CoinPickup) => collect_coin(state),
            None => {}
        }
    }

    let hitbox = state.player.hitbox();
    let mut i = 0;
    while i < state.projectiles.len() {
        let shot = &state.projectiles[i];
        if hit_context(state).harmless
            || !shot.bounds().overlaps(&coarse)
            || !shot.touches(&hitbox, now)
        {
            i += 1;
            continue;
        }
        state.projectiles.remove(i);
        deal_damage(state, METEORITE_DAMAGE, DamageSource::Boss);
    }

    if !hit_context(state).harmless
        && boss_is_solid(&state.boss)
        && boss_bounds(state).overlaps(&coarse)
    {
        deal_damage(state, PLASMA_DAMAGE, DamageSource::Boss);
    }
}

/// Grow beams, cut plasma, hit the boss and drop finished beams
fn update_lasers(state: &mut GameState, dt: f32) {
    let now = state.elapsed;
    let cam_x = state.cam_x();
    let view_width = state.viewport.width;
    let boss_box = boss_is_solid(&state.boss).then(|| boss_bounds(state));
    let mut boss_hits = 0;

    for beam in state.lasers.iter_mut() {
        beam.update(dt);
        if !beam.growing {
            continue;
        }
        // List is x-ordered, so the first arc hit is the nearest
        for obstacle in state.obstacles.iter_mut() {
            if let Obstacle::PlasmaArc(arc) = obstacle {
                if beam.hits_plasma(arc) {
                    arc.last_laser_hit = Some(now);
                    beam.stop_at(arc.x - PLASMA_STRIP_HALF_WIDTH);
                    break;
                }
            }
        }
        if let Some(bounds) = boss_box {
            if beam.growing && beam.bounds().overlaps(&bounds) {
                beam.stop_at(bounds.x);
                boss_hits += 1;
            }
        }
    }

    for _ in 0..boss_hits {
        if state.boss.take_laser_hit(now) {
            state.emit(GameEvent::BossDefeated);
            state.cause_explosion();
        } else if state.boss.phase == BossPhase::Exposed {
            state.emit(GameEvent::BossHit);
        }
    }

    // Beams live until they leave the view or pass the boss, whichever is
    // further right
    let view_right = cam_x + view_width;
    let right_edge = boss_box.map_or(view_right, |b| view_right.max(b.right()));
    state
        .lasers
        .retain(|beam| !beam.is_spent() && beam.head() <= right_edge);
}

fn update_boss(state: &mut GameState, dt: f32) {
    let now = state.elapsed;
    let origin_x = boss_mouth_x(state);
    let player_pos = state.player.pos();
    let shots = state
        .boss
        .update(dt, now, origin_x, player_pos, &mut state.rng);
    state.projectiles.extend(shots);
}

/// Drop everything that has scrolled off the left edge
fn retire(state: &mut GameState) {
    let cam_x = state.cam_x();
    while state
        .obstacles
        .front()
        .is_some_and(|o| o.bounds().right() < cam_x)
    {
        state.obstacles.pop_front();
    }
    while state
        .exhaust
        .front()
        .is_some_and(|p| p.x + EXHAUST_RETIRE_DISTANCE < cam_x)
    {
        state.exhaust.pop_front();
    }
    state
        .projectiles
        .retain(|shot| shot.bounds().right() >= cam_x);
}

/// Demo player: dismisses dialogue and bounces between the bounds
fn autopilot(state: &GameState, input: &mut TickInput) {
    let stage = state.stage;
    if stage.has_dialogue_screen() {
        input.primary = state.dialogue.is_done() && state.dialogue.need_proceed;
        return;
    }
    let player = &state.player;
    input.primary = match stage {
        Stage::Title => true,
        Stage::Credits => state.stage_elapsed > 5.0,
        _ => match player.gravity {
            GravityDirection::Down => player.y > 600.0 && player.vel_y > 0.0,
            GravityDirection::Up => player.y < 300.0 && player.vel_y < 0.0,
            GravityDirection::Off => false,
        },
    };
}
