use crate::foundation::error::{DanceError, DanceResult};

/// Beats per bar; every `BEATS_PER_BAR`-th beat (by index) is a downbeat.
pub const BEATS_PER_BAR: usize = 4;

/// Detected beat timestamps plus tempo and detection confidence.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BeatGrid {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Beat timestamps in seconds, ascending.
    pub beats: Vec<f64>,
    /// Detection confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
}

impl BeatGrid {
    /// Evenly spaced grid starting at `t = 0`.
    pub fn synthetic(bpm: f64, duration_s: f64) -> DanceResult<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(DanceError::validation("bpm must be finite and > 0"));
        }
        if !duration_s.is_finite() || duration_s < 0.0 {
            return Err(DanceError::validation("duration must be finite and >= 0"));
        }
        let step = 60.0 / bpm;
        let count = (duration_s / step).floor() as usize + 1;
        let beats = (0..count)
            .map(|i| i as f64 * step)
            .filter(|&t| t <= duration_s)
            .collect();
        Ok(Self {
            bpm,
            beats,
            confidence: 1.0,
        })
    }

    /// Copy with non-finite beats dropped, beats sorted, confidence clamped.
    pub fn normalized(&self) -> Self {
        let mut beats: Vec<f64> = self.beats.iter().copied().filter(|t| t.is_finite()).collect();
        beats.sort_by(f64::total_cmp);
        let confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bpm = if self.bpm.is_finite() && self.bpm > 0.0 {
            self.bpm
        } else {
            0.0
        };
        Self {
            bpm,
            beats,
            confidence,
        }
    }

    /// Return `true` when the beat at `index` starts a bar.
    pub fn is_downbeat(index: usize) -> bool {
        index % BEATS_PER_BAR == 0
    }

    /// Number of beats with timestamp `<= t`.
    pub fn beats_at_or_before(&self, t: f64) -> usize {
        if t.is_nan() {
            return 0;
        }
        self.beats.partition_point(|&b| b <= t)
    }

    /// Timestamp of the most recent beat at or before `t`.
    pub fn last_beat_before(&self, t: f64) -> Option<f64> {
        let n = self.beats_at_or_before(t);
        n.checked_sub(1).map(|i| self.beats[i])
    }

    /// Timestamp of the final beat.
    pub fn last_beat(&self) -> Option<f64> {
        self.beats.last().copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/beat_grid.rs"]
mod tests;
