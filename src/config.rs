use std::path::{Path, PathBuf};

use crate::direction::icons::IconPlannerConfig;
use crate::foundation::core::CanvasSize;
use crate::foundation::error::{DanceError, DanceResult};
use crate::generation::gateway::RetryPolicy;
use crate::generation::history::DiversityConfig;
use crate::model::audio_dna::HookConfig;
use crate::render::text::FontBook;

/// Engine-wide settings. Every section has defaults, so partial JSON files are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output surface size.
    pub canvas: CanvasSize,
    /// Integrator step rate.
    pub tick_hz: f64,
    /// Beats between micro-surprises; 0 disables them.
    pub micro_surprise_interval: u32,
    /// Seconds a micro-surprise stays visible after its beat.
    pub micro_surprise_window_s: f64,
    pub show_progress: bool,
    /// Most beat impulses fed in a single frame when playback jumps ahead.
    pub max_catchup_beats: usize,
    pub icons: IconPlannerConfig,
    pub diversity: DiversityConfig,
    pub retry: RetryPolicy,
    pub hooks: HookConfig,
    /// TrueType/OpenType file for lyric text; the bundled face when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            tick_hz: 60.0,
            micro_surprise_interval: 16,
            micro_surprise_window_s: 0.18,
            show_progress: true,
            max_catchup_beats: 4,
            icons: IconPlannerConfig::default(),
            diversity: DiversityConfig::default(),
            retry: RetryPolicy::default(),
            hooks: HookConfig::default(),
            font_path: None,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file.
    pub fn from_path(path: &Path) -> DanceResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            DanceError::validation(format!("read engine config \"{}\": {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .map_err(|e| DanceError::serde(format!("parse engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Font book for the configured face.
    pub fn fonts(&self) -> DanceResult<FontBook> {
        match &self.font_path {
            Some(path) => FontBook::from_path(path),
            None => Ok(FontBook::bundled()),
        }
    }

    pub fn validate(&self) -> DanceResult<()> {
        CanvasSize::new(self.canvas.width, self.canvas.height)?;
        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 {
            return Err(DanceError::validation("tick_hz must be finite and > 0"));
        }
        if !self.micro_surprise_window_s.is_finite() || self.micro_surprise_window_s < 0.0 {
            return Err(DanceError::validation(
                "micro_surprise_window_s must be finite and >= 0",
            ));
        }
        if !self.diversity.min_rgb_distance.is_finite() || self.diversity.min_rgb_distance < 0.0 {
            return Err(DanceError::validation(
                "diversity.min_rgb_distance must be finite and >= 0",
            ));
        }
        let h = &self.hooks;
        if !(h.min_len_s.is_finite() && h.max_len_s.is_finite() && h.gap_s.is_finite())
            || h.min_len_s <= 0.0
            || h.max_len_s < h.min_len_s
            || h.gap_s < 0.0
        {
            return Err(DanceError::validation(
                "hooks must satisfy 0 < min_len_s <= max_len_s and gap_s >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
