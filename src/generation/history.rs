use std::collections::VecDeque;

use crate::foundation::core::Rgb;
use crate::model::physics_spec::{PhysicsSpec, SystemKind};

/// Diversity guard settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    /// Number of recent generations remembered.
    pub history_cap: usize,
    /// Palettes whose three slots are all closer than this (Euclidean RGB) are "too similar".
    pub min_rgb_distance: f64,
    /// Resubmissions allowed when a result is too similar.
    pub max_resubmits: u32,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            history_cap: 20,
            min_rgb_distance: 60.0,
            max_resubmits: 1,
        }
    }
}

/// What is remembered about one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationRecord {
    pub palette: [Rgb; 3],
    pub system: SystemKind,
}

impl GenerationRecord {
    pub fn from_spec(spec: &PhysicsSpec) -> Self {
        Self {
            palette: spec.resolved_palette(),
            system: spec.system,
        }
    }
}

/// Return `true` when every palette slot of `a` is within `min_distance` of the same slot of `b`.
pub fn palettes_too_similar(a: &[Rgb; 3], b: &[Rgb; 3], min_distance: f64) -> bool {
    a.iter().zip(b).all(|(x, y)| x.distance(*y) < min_distance)
}

/// Bounded window of recent generations, owned by the generation service.
#[derive(Clone, Debug)]
pub struct GenerationHistory {
    cap: usize,
    entries: VecDeque<GenerationRecord>,
}

impl GenerationHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationRecord> {
        self.entries.iter()
    }

    /// Remember `record`, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, record: GenerationRecord) {
        if self.cap == 0 {
            return;
        }
        while self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// Most recent remembered generation whose palette is too close to `record`'s.
    pub fn too_similar(
        &self,
        record: &GenerationRecord,
        min_distance: f64,
    ) -> Option<&GenerationRecord> {
        self.entries
            .iter()
            .rev()
            .find(|r| palettes_too_similar(&r.palette, &record.palette, min_distance))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generation/history.rs"]
mod tests;
