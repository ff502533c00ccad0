//! Browser host bindings
//!
//! The page owns the canvas and the animation loop; it calls into
//! `GameHandle` once per `requestAnimationFrame` and draws the JSON snapshot
//! it gets back.

use wasm_bindgen::prelude::*;

use crate::audio::AudioManager;
use crate::driver::FrameDriver;
use crate::music::MusicScheduler;
use crate::settings::{LocalStorage, Settings};
use crate::sim::{GameEvent, GameState, Viewport};
use crate::snapshot::Snapshot;

#[wasm_bindgen]
pub struct GameHandle {
    state: GameState,
    driver: FrameDriver,
    settings: Settings,
    storage: LocalStorage,
    audio: Option<AudioManager>,
    music: Option<MusicScheduler>,
}

#[wasm_bindgen]
impl GameHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GameHandle {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("Logger already installed");
        }

        let seed = js_sys::Date::now() as u64;
        let storage = LocalStorage::new();
        let settings = Settings::load(&storage);
        log::info!("Grav Flip starting with seed: {seed}");

        GameHandle {
            state: GameState::new(seed),
            driver: FrameDriver::new(),
            settings,
            storage,
            audio: None,
            music: None,
        }
    }

    /// Advance to wall-clock `now_ms` and return the frame snapshot as JSON
    pub fn frame(&mut self, now_ms: f64) -> String {
        self.driver.frame(&mut self.state, now_ms / 1000.0);
        self.dispatch_events();
        self.top_up_music();
        self.snapshot()
    }

    pub fn key_down(&mut self, key: &str) {
        match key {
            " " | "Enter" | "ArrowUp" | "ArrowDown" => self.driver.primary.press(),
            "m" | "M" => {
                let muted = self.settings.toggle_mute(&mut self.storage);
                if let Some(audio) = &mut self.audio {
                    audio.set_muted(muted);
                }
            }
            "g" | "G" => {
                self.settings.cycle_graphics(&mut self.storage);
            }
            "i" | "I" => {
                self.driver.idle_mode = !self.driver.idle_mode;
                log::info!("Idle mode: {}", self.driver.idle_mode);
            }
            _ => {}
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if matches!(key, " " | "Enter" | "ArrowUp" | "ArrowDown") {
            self.driver.primary.release();
        }
    }

    /// Mouse or touch press anywhere on the canvas
    pub fn pointer_down(&mut self) {
        self.driver.primary.press();
    }

    pub fn pointer_up(&mut self) {
        self.driver.primary.release();
    }

    /// Canvas client size changed
    pub fn resize(&mut self, client_width: f32, client_height: f32) {
        self.state.viewport = Viewport::from_client(client_width, client_height);
        log::debug!("Viewport width: {:.0}", self.state.viewport.width);
    }
}

impl Default for GameHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl GameHandle {
    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::AudioStart => self.start_audio(),
                GameEvent::StageChanged(stage) => log::debug!("Host saw stage {stage:?}"),
                other => {
                    if let Some(audio) = &self.audio {
                        audio.handle_event(&other);
                    }
                }
            }
        }
    }

    /// Audio may only be created after a user gesture, which is exactly when
    /// the title screen is left
    fn start_audio(&mut self) {
        if self.audio.is_some() {
            return;
        }
        let audio = AudioManager::new(self.settings.muted);
        audio.resume();
        self.music = Some(MusicScheduler::new(self.state.seed));
        self.audio = Some(audio);
    }

    fn top_up_music(&mut self) {
        let (Some(audio), Some(music)) = (&self.audio, &mut self.music) else {
            return;
        };
        if let Some(now) = audio.current_time() {
            audio.schedule(&music.top_up(now));
        }
    }

    fn snapshot(&self) -> String {
        let audio_available = self.audio.as_ref().is_none_or(AudioManager::is_available);
        Snapshot::new(&self.state, self.settings, self.driver.idle_mode, audio_available).to_json()
    }
}

