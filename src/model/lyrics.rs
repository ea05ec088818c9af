use crate::foundation::error::{DanceError, DanceResult};

/// One timed lyric line. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricLine {
    /// Display text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (exclusive).
    pub end: f64,
}

impl LyricLine {
    /// Build a line.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Return `true` when `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Line duration in seconds (never negative).
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Progress of `t` through the line in `[0, 1]`.
    pub fn progress_at(&self, t: f64) -> f64 {
        let d = self.duration();
        if d <= 0.0 || !t.is_finite() {
            return 0.0;
        }
        ((t - self.start) / d).clamp(0.0, 1.0)
    }

    /// Validate ordering invariants: finite times, `start <= end`, sorted, non-overlapping.
    pub fn validate_sequence(lines: &[LyricLine]) -> DanceResult<()> {
        let mut prev_end = f64::NEG_INFINITY;
        for (i, line) in lines.iter().enumerate() {
            if !line.start.is_finite() || !line.end.is_finite() {
                return Err(DanceError::validation(format!(
                    "lyric line {i} has non-finite times"
                )));
            }
            if line.end < line.start {
                return Err(DanceError::validation(format!(
                    "lyric line {i} ends before it starts"
                )));
            }
            if line.start < prev_end {
                return Err(DanceError::validation(format!(
                    "lyric line {i} overlaps or precedes the previous line"
                )));
            }
            prev_end = line.end;
        }
        Ok(())
    }
}

/// Index of the line whose `[start, end)` contains `t`.
pub fn active_line_index(lines: &[LyricLine], t: f64) -> Option<usize> {
    if !t.is_finite() {
        return None;
    }
    // Lines are sorted by start; the candidate is the last line starting at or before `t`.
    let idx = lines.partition_point(|l| l.start <= t);
    let candidate = idx.checked_sub(1)?;
    lines[candidate].contains(t).then_some(candidate)
}

/// Split a line into display words (whitespace separated, empty pieces dropped).
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Lowercase a word and strip surrounding punctuation.
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_matches('\'')
        .to_lowercase()
}

#[cfg(test)]
#[path = "../../tests/unit/model/lyrics.rs"]
mod tests;
