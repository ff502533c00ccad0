//! Stage progression
//!
//! Each stage runs a small ladder of substages. Narrative stages show a list
//! of dialogue pages, one per substage, each waiting for the player to
//! dismiss the previous one. Play stages hand control to the player and
//! advance on coin quotas, distance or the boss fight.

use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::dialogue::Beat;
use super::generator::{GenerationMode, ObstacleGenerator};
use super::obstacle::{Obstacle, PlasmaArc};
use super::player::GravityDirection;
use super::state::{GameEvent, GameState};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Title,
    Intro,
    Tutorial,
    PlasmaBriefing,
    CollectRegenerator,
    Rewind,
    RegeneratorReward,
    CollectLaser,
    LaserReward,
    CollectHyperdrive,
    HyperdriveReward,
    BossFight,
    Finale,
    Credits,
}

impl Stage {
    pub const ALL: [Stage; 14] = [
        Stage::Title,
        Stage::Intro,
        Stage::Tutorial,
        Stage::PlasmaBriefing,
        Stage::CollectRegenerator,
        Stage::Rewind,
        Stage::RegeneratorReward,
        Stage::CollectLaser,
        Stage::LaserReward,
        Stage::CollectHyperdrive,
        Stage::HyperdriveReward,
        Stage::BossFight,
        Stage::Finale,
        Stage::Credits,
    ];

    /// Stage number as shown to the host
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The dialogue box is up and the primary action talks to it
    pub fn has_dialogue_screen(self) -> bool {
        matches!(
            self,
            Stage::Intro
                | Stage::PlasmaBriefing
                | Stage::Rewind
                | Stage::RegeneratorReward
                | Stage::LaserReward
                | Stage::HyperdriveReward
                | Stage::Finale
        )
    }

    /// Leftover hazards dissolve and cannot hurt
    pub fn is_fade_away(self) -> bool {
        matches!(
            self,
            Stage::Rewind
                | Stage::RegeneratorReward
                | Stage::LaserReward
                | Stage::HyperdriveReward
                | Stage::Finale
        )
    }

    /// Damage only dents the hull here
    pub fn is_safe(self) -> bool {
        self.has_dialogue_screen() || matches!(self, Stage::Tutorial | Stage::Credits)
    }

    pub fn coins_enabled(self) -> bool {
        !self.has_dialogue_screen() && !self.is_fade_away()
    }

    /// The player steers with gravity
    pub fn is_play(self) -> bool {
        matches!(
            self,
            Stage::Tutorial
                | Stage::CollectRegenerator
                | Stage::CollectLaser
                | Stage::CollectHyperdrive
                | Stage::BossFight
        )
    }

    pub fn coin_quota(self) -> Option<u32> {
        match self {
            Stage::CollectRegenerator => Some(REGENERATOR_COINS),
            Stage::CollectLaser => Some(LASER_COINS),
            Stage::CollectHyperdrive => Some(HYPERDRIVE_COINS),
            Stage::BossFight => Some(BOSS_COINS),
            _ => None,
        }
    }

    pub fn generation_mode(self, traveled: f32) -> GenerationMode {
        match self {
            Stage::Tutorial if traveled < TUTORIAL_DISTANCE => GenerationMode::Tutorial,
            Stage::CollectRegenerator
            | Stage::CollectLaser
            | Stage::CollectHyperdrive
            | Stage::BossFight => GenerationMode::Main,
            _ => GenerationMode::Idle,
        }
    }
}

const INTRO_CRUISE_Y: f32 = 250.0;
const NARRATIVE_CRUISE_Y: f32 = 500.0;
const NARRATIVE_LEAD_IN: f32 = 1.0;
const NARRATIVE_GAP: f32 = 0.3;

type Pages = &'static [&'static [Beat<'static>]];

const PLASMA_BRIEFING: Pages = &[
    &[
        Beat::Say("Well, you are still in one piece."),
        Beat::Pause,
        Beat::Say("Mostly."),
        Beat::Pause,
        Beat::Say("Those purple ribbons are plasma arcs. They burn straight through hull plating, so do try to fly between them."),
    ],
    &[
        Beat::Say("Now for some repairs. The hull regenerator was shaken loose in the crash."),
        Beat::Pause,
        Beat::Say("The coins floating around this planet are made of exactly the alloy it needs. Collect ten of them and I can patch it up."),
    ],
];

const REWIND: Pages = &[
    &[
        Beat::Say("[HULL BREACH]"),
        Beat::Newline,
        Beat::Pause,
        Beat::Say("That did not go well."),
        Beat::Pause,
        Beat::Say("Luckily I keep a backup of the ship from the last checkpoint."),
        Beat::Pause,
        Beat::Say("Rewinding..."),
    ],
    &[Beat::Say(
        "Hull integrity restored. Let us try that again, and perhaps fly around the hazards this time.",
    )],
];

const REGENERATOR_REWARD: Pages = &[
    &[
        Beat::Say("[REGENERATOR ONLINE]"),
        Beat::Newline,
        Beat::Pause,
        Beat::Say("Excellent! The hull will now slowly repair itself."),
    ],
    &[
        Beat::Say("The ship also carries a mining laser. It is offline too, but twenty more coins should fix that."),
        Beat::Pause,
        Beat::Say("I will hook it up to the gravity switch once it works."),
    ],
];

const LASER_REWARD: Pages = &[
    &[
        Beat::Say("[LASER ONLINE]"),
        Beat::Newline,
        Beat::Pause,
        Beat::Say("Every time you flip gravity the laser fires forward. It can cut plasma arcs, although they still sting if you touch them."),
    ],
    &[Beat::Say(
        "Last on the list is the hyperdrive. Twenty-five coins and we can leave this rock behind.",
    )],
];

const HYPERDRIVE_REWARD: Pages = &[
    &[
        Beat::Say("[HYPERDRIVE REPAIRED]"),
        Beat::Newline,
        Beat::Pause,
        Beat::Say("We are ready to jump!"),
        Beat::Pause,
        Beat::Pause,
        Beat::Say("..."),
    ],
    &[
        Beat::Say("Oh no."),
        Beat::Pause,
        Beat::Say("Something very large is following us, and it is shielded."),
        Beat::Pause,
        Beat::Say("Its shield feeds on the same coins. Take fifteen and it should fail. Then use the laser."),
    ],
];

const FINALE: Pages = &[
    &[
        Beat::Say("[HOSTILE NEUTRALIZED]"),
        Beat::Newline,
        Beat::Pause,
        Beat::Say("You did it! I never doubted you."),
        Beat::Pause,
        Beat::Say("Well, I doubted you a little."),
    ],
    &[
        Beat::Say("Spooling up the hyperdrive."),
        Beat::Pause,
        Beat::Say("Three."),
        Beat::Pause,
        Beat::Say("Two."),
        Beat::Pause,
        Beat::Say("One."),
    ],
];

/// Switch to `stage`, resetting the per-stage counters
pub fn enter_stage(state: &mut GameState, stage: Stage) {
    if state.stage == Stage::Title && stage != Stage::Title {
        state.start_audio_once();
        // Parked in hyperspace until the intro drops us out
        state.player.x = HYPERSPACE_X;
        state.exhaust.clear();
    }

    log::info!("Stage {:?} -> {:?}", state.stage, stage);
    state.stage = stage;
    state.substage = 0;
    state.stage_elapsed = 0.0;
    state.stage_start_x = state.generator.cursor;

    if let Some(quota) = stage.coin_quota() {
        state.coins_needed = quota;
        state.coins_gotten = 0;
    }
    if stage == Stage::BossFight {
        state.boss.activate(state.elapsed, state.player.y);
        state.projectiles.clear();
    } else if state.boss.is_active() {
        state.boss = Boss::default();
        state.projectiles.clear();
    }
    if !stage.has_dialogue_screen() {
        state.dialogue.clear();
        state.dialogue.need_proceed = false;
    }

    state.emit(GameEvent::StageChanged(stage));
}

/// Coin quota met in the current stage
pub fn complete_collection(state: &mut GameState) {
    match state.stage {
        Stage::CollectRegenerator => {
            state.regenerator_repaired = true;
            log::info!("Regenerator repaired");
            enter_stage(state, Stage::RegeneratorReward);
        }
        Stage::CollectLaser => {
            state.laser_unlocked = true;
            log::info!("Laser unlocked");
            enter_stage(state, Stage::LaserReward);
        }
        Stage::CollectHyperdrive => {
            log::info!("Hyperdrive repaired");
            enter_stage(state, Stage::HyperdriveReward);
        }
        Stage::BossFight => {
            let now = state.elapsed;
            state.boss.expose(now);
        }
        other => log::debug!("Coin quota has no effect in {other:?}"),
    }
}

/// Ship ran out of health in a play stage
pub fn player_died(state: &mut GameState) {
    log::info!("Player died in {:?}", state.stage);
    state.death_stage = Some(state.stage);
    enter_stage(state, Stage::Rewind);
}

/// Show the next page once the previous one was dismissed; true when all
/// pages are through
fn run_pages(state: &mut GameState, pages: Pages) -> bool {
    let page = state.substage as usize;
    let ready = if page == 0 {
        state.stage_elapsed > NARRATIVE_LEAD_IN
    } else {
        state.dialogue.idle_longer_than(state.elapsed, NARRATIVE_GAP)
    };
    if !ready {
        return false;
    }
    let Some(beats) = pages.get(page) else {
        return true;
    };
    state.dialogue.clear();
    state.dialogue.can_skip = true;
    state.dialogue.need_proceed = true;
    state.dialogue.push_script(beats);
    state.substage += 1;
    false
}

fn run_intro(state: &mut GameState) {
    state.player.hold_at(INTRO_CRUISE_Y);
    let now = state.elapsed;
    let dialogue = &mut state.dialogue;

    match state.substage {
        0 if state.stage_elapsed > 1.0 => {
            dialogue.say("[HYPERSPACE ANOMALY DETECTED]");
            dialogue.newline();
            dialogue.pause();
            dialogue.say("[STARTING SHIP AI]");
            dialogue.newline();
            dialogue.push_script(&[Beat::Pause, Beat::Pause, Beat::Pause]);
            dialogue.say("Hello there,");
            dialogue.pause();
            dialogue.say("I am OSCaR, your Onboard Ship Computer and Rectifier. Please standby...");
            dialogue.newline();
            state.substage = 1;
        }
        1 if dialogue.idle_longer_than(now, 2.0) => {
            // Drop out of hyperspace just behind the first screen
            state.player.x = -300.0;
            dialogue.say("ALERT! Exiting hyperspeed!");
            dialogue.newline();
            dialogue.can_skip = false;
            dialogue.need_proceed = true;
            state.substage = 2;
        }
        2 if dialogue.idle_longer_than(now, 0.3) => {
            dialogue.clear();
            dialogue.can_skip = true;
            dialogue.need_proceed = true;
            dialogue.push_script(&[
                Beat::Say("I have detected some good news and some bad news."),
                Beat::Pause,
                Beat::Say("The bad news is that the ship has exited hyperspace onto a planet 200 parsecs away from the target destination."),
                Beat::Pause,
                Beat::Say("The good news is that all the ship's systems are intact..."),
            ]);
            state.substage = 3;
        }
        3 if dialogue.idle_longer_than(now, 0.1) => {
            dialogue.clear();
            dialogue.can_skip = true;
            dialogue.need_proceed = true;
            dialogue.push_script(&[
                Beat::Pause,
                Beat::Pause,
                Beat::Pause,
                Beat::Pause,
                Beat::Say("Update: I was wrong. It's all bad news actually."),
                Beat::Pause,
                Beat::Say("Almost every control is scrambled. In fact, the only thing that's working seems to be the internal gravitational actuator."),
                Beat::Pause,
                Beat::Say("I've wired up the [SPACE] button on your control matrix to it. The orbital navigation system should keep you from flying up to outer space, but uhhhh still..."),
                Beat::Pause,
                Beat::Say("be careful."),
            ]);
            state.substage = 4;
            state.cause_explosion();
        }
        4 if dialogue.idle_longer_than(now, 0.3) => {
            state.generator.cursor += 900.0;
            let arc = PlasmaArc::new(state.generator.cursor, -20.0, 500.0);
            ObstacleGenerator::push_ordered(&mut state.obstacles, Obstacle::PlasmaArc(arc));
            state.generator.cursor += 500.0;
            enter_stage(state, Stage::Tutorial);
        }
        _ => {}
    }
}

/// Per-sub-step stage logic, run after physics and dialogue
pub fn update_stage(state: &mut GameState, dt: f32) {
    let stage = state.stage;
    match stage {
        Stage::Title | Stage::Credits => {}
        Stage::Intro => run_intro(state),
        Stage::Tutorial => {
            let traveled = state.generator.cursor - state.stage_start_x;
            if traveled >= TUTORIAL_DISTANCE && state.obstacles.is_empty() {
                enter_stage(state, Stage::PlasmaBriefing);
            }
        }
        Stage::CollectRegenerator | Stage::CollectLaser | Stage::CollectHyperdrive => {}
        Stage::BossFight => {
            if state.boss.has_sunk(state.elapsed) {
                enter_stage(state, Stage::Finale);
            }
        }
        Stage::PlasmaBriefing => {
            if run_pages(state, PLASMA_BRIEFING) {
                enter_stage(state, Stage::CollectRegenerator);
            }
        }
        Stage::Rewind => {
            if run_pages(state, REWIND) {
                state.player.health = 1.0;
                state.coins_gotten = 0;
                let resume = state.death_stage.take().unwrap_or(Stage::CollectRegenerator);
                enter_stage(state, resume);
            }
        }
        Stage::RegeneratorReward => {
            if run_pages(state, REGENERATOR_REWARD) {
                enter_stage(state, Stage::CollectLaser);
            }
        }
        Stage::LaserReward => {
            if run_pages(state, LASER_REWARD) {
                enter_stage(state, Stage::CollectHyperdrive);
            }
        }
        Stage::HyperdriveReward => {
            if run_pages(state, HYPERDRIVE_REWARD) {
                enter_stage(state, Stage::BossFight);
            }
        }
        Stage::Finale => {
            if run_pages(state, FINALE) {
                enter_stage(state, Stage::Credits);
            }
        }
    }

    // Ship handling for whatever stage we ended up in
    let stage = state.stage;
    if stage.is_play() {
        if state.player.gravity == GravityDirection::Off {
            state.player.gravity = GravityDirection::Down;
        }
    } else if stage != Stage::Title && stage != Stage::Intro {
        state.player.cruise_toward(NARRATIVE_CRUISE_Y, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dialogue::MonospaceMeasure;

    /// Drive dialogue and the stage script, dismissing pages as they finish
    fn run_narrative(state: &mut GameState, max_secs: f32) {
        let measure = MonospaceMeasure::default();
        let start = state.stage;
        let dt = 0.02;
        let mut t = 0.0;
        while state.stage == start && t < max_secs {
            state.elapsed += dt;
            state.stage_elapsed += dt;
            t += dt;
            if state.dialogue.is_done() && state.dialogue.need_proceed {
                state.dialogue.on_primary();
            } else if !state.dialogue.is_idle() {
                state.dialogue.on_primary();
            }
            state.dialogue.update(state.elapsed, &measure);
            update_stage(state, dt);
        }
    }

    fn at_stage(stage: Stage) -> GameState {
        let mut state = GameState::new(11);
        enter_stage(&mut state, stage);
        state.drain_events();
        state
    }

    #[test]
    fn test_stage_sets() {
        assert!(Stage::Tutorial.is_safe());
        assert!(!Stage::Tutorial.has_dialogue_screen());
        assert!(Stage::Rewind.is_fade_away());
        assert!(!Stage::PlasmaBriefing.is_fade_away());
        assert!(!Stage::CollectLaser.is_safe());
        assert!(!Stage::Finale.coins_enabled());
        assert!(Stage::Tutorial.coins_enabled());
        assert_eq!(Stage::BossFight.index(), 11);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index() as usize, i);
        }
        assert_eq!(Stage::CollectHyperdrive.coin_quota(), Some(25));
        assert_eq!(
            Stage::Tutorial.generation_mode(TUTORIAL_DISTANCE),
            GenerationMode::Idle
        );
    }

    #[test]
    fn test_leaving_title_parks_ship_in_hyperspace() {
        let mut state = GameState::new(1);
        state.stage_elapsed = 3.0;
        enter_stage(&mut state, Stage::Intro);
        assert_eq!(state.stage, Stage::Intro);
        assert_eq!(state.substage, 0);
        assert_eq!(state.stage_elapsed, 0.0);
        assert_eq!(state.player.x, HYPERSPACE_X);
        let events = state.drain_events();
        assert_eq!(events[0], GameEvent::AudioStart);
        assert!(events.contains(&GameEvent::StageChanged(Stage::Intro)));
    }

    #[test]
    fn test_entry_records_start_and_quota() {
        let mut state = GameState::new(1);
        state.generator.cursor = 12_345.0;
        state.coins_gotten = 7;
        enter_stage(&mut state, Stage::CollectLaser);
        assert_eq!(state.stage_start_x, 12_345.0);
        assert_eq!(state.coins_needed, LASER_COINS);
        assert_eq!(state.coins_gotten, 0);
    }

    #[test]
    fn test_intro_runs_to_tutorial() {
        let mut state = at_stage(Stage::Intro);
        run_narrative(&mut state, 300.0);
        assert_eq!(state.stage, Stage::Tutorial);
        assert_eq!(state.player.y, INTRO_CRUISE_Y);
        assert!(matches!(state.obstacles.back(), Some(Obstacle::PlasmaArc(_))));
        assert!(state.last_explosion.is_some());
    }

    #[test]
    fn test_every_narrative_stage_finishes() {
        let expected = [
            (Stage::PlasmaBriefing, Stage::CollectRegenerator),
            (Stage::RegeneratorReward, Stage::CollectLaser),
            (Stage::LaserReward, Stage::CollectHyperdrive),
            (Stage::HyperdriveReward, Stage::BossFight),
            (Stage::Finale, Stage::Credits),
        ];
        for (from, to) in expected {
            let mut state = at_stage(from);
            run_narrative(&mut state, 300.0);
            assert_eq!(state.stage, to, "{from:?} stalled at substage {}", state.substage);
        }
    }

    #[test]
    fn test_rewind_returns_to_death_stage() {
        let mut state = at_stage(Stage::CollectHyperdrive);
        state.coins_gotten = 12;
        state.player.health = 0.0;
        player_died(&mut state);
        assert_eq!(state.stage, Stage::Rewind);
        run_narrative(&mut state, 300.0);
        assert_eq!(state.stage, Stage::CollectHyperdrive);
        assert_eq!(state.player.health, 1.0);
        assert_eq!(state.coins_gotten, 0);
        assert_eq!(state.death_stage, None);
    }

    #[test]
    fn test_narrative_waits_for_proceed() {
        let measure = MonospaceMeasure::default();
        let mut state = at_stage(Stage::PlasmaBriefing);
        let dt = 0.02;
        for _ in 0..5000 {
            state.elapsed += dt;
            state.stage_elapsed += dt;
            state.dialogue.update(state.elapsed, &measure);
            update_stage(&mut state, dt);
        }
        // Text is out but nobody dismissed it
        assert_eq!(state.stage, Stage::PlasmaBriefing);
        assert_eq!(state.substage, 1);
        assert!(state.dialogue.is_done());
    }

    #[test]
    fn test_tutorial_ends_after_distance_and_drain() {
        let mut state = at_stage(Stage::Tutorial);
        state.obstacles.push_back(Obstacle::PlasmaArc(PlasmaArc::new(9000.0, 0.0, 300.0)));
        state.generator.cursor = state.stage_start_x + TUTORIAL_DISTANCE;
        update_stage(&mut state, 0.01);
        assert_eq!(state.stage, Stage::Tutorial);
        state.obstacles.clear();
        update_stage(&mut state, 0.01);
        assert_eq!(state.stage, Stage::PlasmaBriefing);
    }

    #[test]
    fn test_play_stage_restores_gravity() {
        let mut state = at_stage(Stage::CollectRegenerator);
        state.player.gravity = GravityDirection::Off;
        update_stage(&mut state, 0.01);
        assert_eq!(state.player.gravity, GravityDirection::Down);
    }
}
