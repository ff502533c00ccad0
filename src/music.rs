//! Background music scheduling
//!
//! Two channels of randomly chosen notes are kept scheduled a fixed
//! lookahead into the future. The host calls `top_up` every frame with the
//! audio clock and plays whatever comes back.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::pick;

pub const BASE_NOTE: f32 = 200.0;
pub const MUSIC_BPM: f64 = 70.0;
/// Seconds of music kept scheduled ahead of the audio clock
pub const LOOKAHEAD: f64 = 10.0;
/// Extra release after each note so neighbours overlap slightly
pub const NOTE_TAIL: f64 = 0.03;

const RATIOS: [f32; 5] = [1.0, 1.5, 0.75, 1.125, 2.0 / 3.0];
const BEATS: [f64; 6] = [1.0, 1.0, 1.0, 1.0, 0.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sawtooth,
    Sine,
}

/// One scheduled note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub channel: usize,
    pub waveform: Waveform,
    pub frequency: f32,
    /// Audio clock time
    pub start: f64,
    pub duration: f64,
    /// Gain at note start; ramps down to `END_GAIN`
    pub gain: f32,
}

pub const END_GAIN: f32 = 0.03;

#[derive(Debug, Clone)]
pub struct MusicScheduler {
    /// Per channel: time up to which notes are scheduled
    till: [f64; 2],
    rng: Pcg32,
}

impl MusicScheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            till: [0.0; 2],
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn channel_voice(channel: usize) -> (Waveform, f32) {
        if channel == 0 {
            (Waveform::Sawtooth, 0.1)
        } else {
            (Waveform::Sine, 0.7)
        }
    }

    /// Schedule notes until every channel reaches `now + LOOKAHEAD`
    pub fn top_up(&mut self, now: f64) -> Vec<Note> {
        let mut notes = Vec::new();
        for channel in 0..self.till.len() {
            // Never schedule into the past after a stall
            let mut till = self.till[channel].max(now);
            let (waveform, gain) = Self::channel_voice(channel);
            while till - now < LOOKAHEAD {
                let ratio = *pick(&mut self.rng, &RATIOS);
                let duration = 60.0 * *pick(&mut self.rng, &BEATS) / MUSIC_BPM;
                notes.push(Note {
                    channel,
                    waveform,
                    frequency: ratio * BASE_NOTE,
                    start: till,
                    duration,
                    gain,
                });
                till += duration;
            }
            self.till[channel] = till;
        }
        if !notes.is_empty() {
            log::debug!("Scheduled {} notes up to {:.1}s", notes.len(), now + LOOKAHEAD);
        }
        notes
    }
}
