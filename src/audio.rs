//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and the background music voices.
//! Everything routes through one master gain so muting is a single switch.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::music::{END_GAIN, NOTE_TAIL, Note, Waveform};
use crate::sim::GameEvent;

const MASTER_VOLUME: f32 = 0.8;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// One typewriter character
    DialogueBeep,
    /// Ship took damage (or the intro blew up)
    Explosion,
    /// Coin picked up
    Coin,
    /// Laser fired
    Laser,
    /// Laser struck the exposed boss
    BossHit,
}

impl SoundEffect {
    /// Sound for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::DialogueBeep => Some(SoundEffect::DialogueBeep),
            GameEvent::Explosion | GameEvent::BossDefeated => Some(SoundEffect::Explosion),
            GameEvent::CoinCollected => Some(SoundEffect::Coin),
            GameEvent::LaserFired => Some(SoundEffect::Laser),
            GameEvent::BossHit => Some(SoundEffect::BossHit),
            _ => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    muted: bool,
}

impl AudioManager {
    pub fn new(muted: bool) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let master = ctx.as_ref().and_then(|ctx| {
            let gain = ctx.create_gain().ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        let mut audio = Self { ctx, master, muted };
        audio.set_muted(muted);
        audio
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// False when the browser refused to create an AudioContext
    pub fn is_available(&self) -> bool {
        self.ctx.is_some()
    }

    /// Audio clock in seconds
    pub fn current_time(&self) -> Option<f64> {
        self.ctx.as_ref().map(|ctx| ctx.current_time())
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(master) = &self.master {
            master
                .gain()
                .set_value(if muted { 0.0 } else { MASTER_VOLUME });
        }
    }

    /// Play the sound for a simulation event
    pub fn handle_event(&self, event: &GameEvent) {
        if let Some(effect) = SoundEffect::for_event(event) {
            self.play(effect);
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        if self.muted {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::DialogueBeep => self.play_beep(ctx),
            SoundEffect::Explosion => self.play_explosion(ctx),
            SoundEffect::Coin => self.play_coin(ctx),
            SoundEffect::Laser => self.play_laser(ctx),
            SoundEffect::BossHit => self.play_boss_hit(ctx),
        }
    }

    /// Queue music notes from the scheduler
    pub fn schedule(&self, notes: &[Note]) {
        let Some(ctx) = &self.ctx else { return };
        for note in notes {
            let osc_type = match note.waveform {
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Sine => OscillatorType::Sine,
            };
            let Some((osc, gain)) = self.create_osc(ctx, note.frequency, osc_type) else {
                continue;
            };
            let end = note.start + note.duration;
            gain.gain().set_value_at_time(note.gain, note.start).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(END_GAIN, end)
                .ok();
            osc.start_with_when(note.start).ok();
            osc.stop_with_when(end + NOTE_TAIL).ok();
        }
    }

    // === Sound generators ===

    /// Create an oscillator feeding the master gain through its own envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let master = self.master.as_ref()?;
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        Some((osc, gain))
    }

    /// Typewriter blip - falling chirp
    fn play_beep(&self, ctx: &AudioContext) {
        let Some((osc, gain)) = self.create_osc(ctx, 700.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.12, t).ok();
        gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.04).ok();
        osc.frequency().set_value_at_time(700.0, t).ok();
        osc.frequency()
            .linear_ramp_to_value_at_time(100.0, t + 0.04)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.05).ok();
    }

    /// Explosion - long rumbling sweep
    fn play_explosion(&self, ctx: &AudioContext) {
        let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 1.5)
            .ok();
        osc.frequency().set_value_at_time(1200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(40.0, t + 1.5)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 1.5).ok();

        // Add high frequency crack
        if let Some((osc2, gain2)) = self.create_osc(ctx, 1500.0, OscillatorType::Square) {
            gain2.gain().set_value_at_time(0.2, t).ok();
            gain2
                .gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc2.start().ok();
            osc2.stop_with_when(t + 0.15).ok();
        }
    }

    /// Coin - two rising notes
    fn play_coin(&self, ctx: &AudioContext) {
        let t = ctx.current_time();
        for (i, freq) in [880.0, 1320.0].into_iter().enumerate() {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Square) else {
                return;
            };
            let start = t + i as f64 * 0.06;
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().set_value_at_time(0.15, start).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, start + 0.12)
                .ok();
            osc.start_with_when(start).ok();
            osc.stop_with_when(start + 0.15).ok();
        }
    }

    /// Laser - fast downward zap
    fn play_laser(&self, ctx: &AudioContext) {
        let Some((osc, gain)) = self.create_osc(ctx, 2000.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(300.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Boss hit - metallic clang
    fn play_boss_hit(&self, ctx: &AudioContext) {
        let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.3)
            .ok();
        osc.frequency().set_value_at_time(220.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(90.0, t + 0.3)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.35).ok();
    }
}
