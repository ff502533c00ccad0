//! Per-frame render snapshot
//!
//! The page draws from this JSON every frame. Besides the raw state it
//! carries values the renderer would otherwise have to recompute.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{GameState, Obstacle};

/// What the renderer sees each frame
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub state: &'a GameState,
    pub settings: Settings,
    pub star_count: usize,
    pub line_density: f32,
    pub vertical_resolution: u32,
    pub idle_mode: bool,
    /// False once audio creation has failed, so the page can say so
    pub audio_available: bool,
    /// Indices into `state.obstacles` of plasma arcs still glowing from a
    /// laser cut
    pub neutralized_arcs: Vec<usize>,
}

impl<'a> Snapshot<'a> {
    pub fn new(
        state: &'a GameState,
        settings: Settings,
        idle_mode: bool,
        audio_available: bool,
    ) -> Self {
        Self {
            state,
            settings,
            star_count: settings.graphics.star_count(),
            line_density: settings.graphics.line_density(),
            vertical_resolution: settings.graphics.vertical_resolution(),
            idle_mode,
            audio_available,
            neutralized_arcs: neutralized_arcs(state),
        }
    }

    /// JSON for the page; an empty object if serialization ever fails
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("Snapshot serialization failed: {e}");
            String::from("{}")
        })
    }
}

fn neutralized_arcs(state: &GameState) -> Vec<usize> {
    state
        .obstacles
        .iter()
        .enumerate()
        .filter_map(|(i, obstacle)| match obstacle {
            Obstacle::PlasmaArc(arc) if arc.is_neutralized(state.elapsed) => Some(i),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LASER_NEUTRALIZE_TIME;
    use crate::sim::PlasmaArc;

    #[test]
    fn test_reports_missing_audio() {
        let state = GameState::new(1);
        let json = Snapshot::new(&state, Settings::default(), false, false).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["audio_available"], serde_json::json!(false));
        assert_eq!(value["star_count"], serde_json::json!(300));
        assert_eq!(value["state"]["stage"], serde_json::json!("Title"));
    }

    #[test]
    fn test_lists_glowing_arcs_only() {
        let mut state = GameState::new(1);
        state.elapsed = 10.0;
        let mut cut = PlasmaArc::new(1000.0, 0.0, 400.0);
        cut.last_laser_hit = Some(9.0);
        let mut faded = PlasmaArc::new(2000.0, 0.0, 400.0);
        faded.last_laser_hit = Some(10.0 - LASER_NEUTRALIZE_TIME - 0.1);
        state.obstacles.push_back(Obstacle::PlasmaArc(PlasmaArc::new(500.0, 0.0, 400.0)));
        state.obstacles.push_back(Obstacle::PlasmaArc(cut));
        state.obstacles.push_back(Obstacle::PlasmaArc(faded));

        let snapshot = Snapshot::new(&state, Settings::default(), true, true);
        assert_eq!(snapshot.neutralized_arcs, vec![1]);
    }
}
