use std::path::Path;

use crate::foundation::error::{DanceError, DanceResult};
use crate::model::audio_dna::HookRegion;
use crate::model::beat_grid::BeatGrid;
use crate::model::lyrics::LyricLine;
use crate::model::physics_spec::{PhysicsSpec, SpecOverrides, SystemKind};
use crate::random::seeded::hash_seed;

/// Tempo used when a record carries no usable beat grid.
pub const FALLBACK_BPM: f64 = 120.0;

/// Song seed as persisted: either a number or an identifier string.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    /// Numeric seed (truncated to 32 bits).
    Number(u64),
    /// String seed; decimal strings are read as numbers, others are hashed.
    Text(String),
}

impl SeedValue {
    /// Resolve to a 32-bit logic seed.
    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Number(n) => (*n & 0xffff_ffff) as u32,
            Self::Text(s) => s.trim().parse::<u32>().unwrap_or_else(|_| hash_seed(s)),
        }
    }
}

/// Persisted song row, consumed read-only.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SongRecord {
    /// Song title.
    #[serde(default)]
    pub title: String,
    /// Performing artist.
    #[serde(default)]
    pub artist: String,
    /// Timed lyric lines.
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
    /// Generated physics parameterization.
    #[serde(default)]
    pub physics_spec: PhysicsSpec,
    /// Detected beats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_grid: Option<BeatGrid>,
    /// Row-level palette override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    /// Row-level system override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
    /// Row-level seed; replaces `physics_spec.logic_seed` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedValue>,
    /// Raw direction document as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cinematic_direction: Option<serde_json::Value>,
    /// Normalized hook regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Vec<HookRegion>>,
    /// Song length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
}

impl SongRecord {
    /// Load a record from a JSON file.
    pub fn from_path(path: &Path) -> DanceResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            DanceError::validation(format!("read song record \"{}\": {e}", path.display()))
        })?;
        let rec: Self = serde_json::from_slice(&bytes)
            .map_err(|e| DanceError::serde(format!("parse song record: {e}")))?;
        rec.validate()?;
        Ok(rec)
    }

    /// Check lyric ordering.
    pub fn validate(&self) -> DanceResult<()> {
        LyricLine::validate_sequence(&self.lyrics)
    }

    /// Row-level palette/system as session overrides.
    pub fn overrides(&self) -> SpecOverrides {
        SpecOverrides {
            palette: self.palette.clone(),
            system: self.system_type.as_deref().and_then(SystemKind::parse),
            energy: None,
        }
    }

    /// Spec with row-level overrides and seed applied.
    pub fn effective_spec(&self) -> PhysicsSpec {
        let mut spec = self.overrides().apply(&self.physics_spec);
        if let Some(seed) = &self.seed {
            spec.logic_seed = seed.to_u32();
        }
        spec
    }

    /// Song length: explicit duration, else the latest lyric end or beat.
    pub fn duration(&self) -> f64 {
        if let Some(d) = self.duration_s
            && d.is_finite()
            && d > 0.0
        {
            return d;
        }
        let last_line = self.lyrics.last().map_or(0.0, |l| l.end);
        let last_beat = self
            .beat_grid
            .as_ref()
            .and_then(BeatGrid::last_beat)
            .unwrap_or(0.0);
        last_line.max(last_beat).max(0.0)
    }

    /// Normalized beat grid, or an evenly spaced one when missing or empty.
    pub fn beat_grid_or_synthetic(&self) -> BeatGrid {
        if let Some(grid) = &self.beat_grid {
            let grid = grid.normalized();
            if !grid.beats.is_empty() {
                return grid;
            }
        }
        let bpm = self
            .beat_grid
            .as_ref()
            .map(|g| g.bpm)
            .filter(|b| b.is_finite() && *b > 0.0)
            .unwrap_or(FALLBACK_BPM);
        tracing::warn!(field = "beat_grid", action = "synthesize", bpm);
        BeatGrid::synthetic(bpm, self.duration()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/record.rs"]
mod tests;
