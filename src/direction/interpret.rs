use std::borrow::Cow;

use crate::foundation::core::Rgb;
use crate::foundation::math::lerp;
use crate::model::direction::{
    Chapter, CinematicDirection, StoryboardEntry, TypographyShift, WordDirective,
};
use crate::model::physics_spec::resolve_palette;

/// Distance in progress over which intensity ramps toward the climax peak.
pub const CLIMAX_RAMP: f64 = 0.1;

/// Read-only answers to "what should be happening now" for one playback session.
#[derive(Clone, Debug)]
pub struct DirectionInterpreter {
    doc: CinematicDirection,
    duration_s: f64,
}

impl DirectionInterpreter {
    /// Normalize `doc` for lookups. Chapters are sorted; an empty chapter list becomes one
    /// chapter spanning the whole song.
    pub fn new(doc: &CinematicDirection, duration_s: f64) -> Self {
        let mut doc = doc.clone();
        doc.chapters.retain(|c| c.start_ratio.is_finite() && c.end_ratio.is_finite());
        doc.chapters.sort_by(|a, b| a.start_ratio.total_cmp(&b.start_ratio));
        if doc.chapters.is_empty() {
            doc.chapters.push(Chapter {
                title: String::new(),
                start_ratio: 0.0,
                end_ratio: 1.0,
                dominant_color: doc.palette.get(1).cloned().unwrap_or_default(),
                emotional_intensity: 0.5,
                background_directive: String::new(),
                light_behavior: String::new(),
                particle_directive: String::new(),
                typography_shift: None,
            });
        }
        let duration_s = if duration_s.is_finite() && duration_s > 0.0 {
            duration_s
        } else {
            0.0
        };
        Self { doc, duration_s }
    }

    /// The normalized document.
    pub fn document(&self) -> &CinematicDirection {
        &self.doc
    }

    /// Song duration this interpreter was built for.
    pub fn duration(&self) -> f64 {
        self.duration_s
    }

    /// Song progress in `[0, 1]` at time `t`.
    pub fn progress_at(&self, t: f64) -> f64 {
        if self.duration_s <= 0.0 || !t.is_finite() {
            return 0.0;
        }
        (t / self.duration_s).clamp(0.0, 1.0)
    }

    /// Chapter whose `[start, end)` contains `progress`, else the last chapter.
    pub fn current_section(&self, progress: f64) -> &Chapter {
        let last = self.doc.chapters.len() - 1;
        if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
            return &self.doc.chapters[last];
        }
        self.doc
            .chapters
            .iter()
            .find(|c| c.start_ratio <= progress && progress < c.end_ratio)
            .unwrap_or(&self.doc.chapters[last])
    }

    /// Progress through the current chapter in `[0, 1]`.
    pub fn section_progress(&self, progress: f64) -> f64 {
        let c = self.current_section(progress);
        let span = c.end_ratio - c.start_ratio;
        if span <= 0.0 || !progress.is_finite() {
            return 0.0;
        }
        ((progress - c.start_ratio) / span).clamp(0.0, 1.0)
    }

    /// Chapter intensity, ramped toward the climax peak near the climax ratio.
    pub fn intensity(&self, progress: f64) -> f64 {
        let base = self.current_section(progress).emotional_intensity;
        let base = if base.is_finite() { base.clamp(0.0, 1.0) } else { 0.5 };
        let Some(climax) = &self.doc.climax else {
            return base;
        };
        let Some(ratio) = climax.time_ratio.filter(|r| r.is_finite()) else {
            return base;
        };
        if !progress.is_finite() {
            return base;
        }
        let d = (progress - ratio).abs();
        if d >= CLIMAX_RAMP {
            return base;
        }
        let peak = if climax.max_light_intensity.is_finite() {
            climax.max_light_intensity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        lerp(base, peak.max(base), 1.0 - d / CLIMAX_RAMP).clamp(0.0, 1.0)
    }

    /// Storyboard entry for `line_index`, or neutral defaults when out of range.
    pub fn line_direction(&self, line_index: usize) -> Cow<'_, StoryboardEntry> {
        match self.doc.storyboard.get(line_index) {
            Some(e) => Cow::Borrowed(e),
            None => Cow::Owned(StoryboardEntry::neutral(line_index)),
        }
    }

    /// Case-insensitive word directive lookup.
    pub fn word_directive(&self, word: &str) -> Option<&WordDirective> {
        self.doc.word_directives.get(word)
    }

    /// Explicit effect key for a line, when the document sequences effects.
    pub fn effect_for_line(&self, line_index: usize) -> Option<&str> {
        self.doc
            .effect_sequence
            .get(line_index)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Typography change of the current chapter.
    pub fn typography_shift(&self, progress: f64) -> Option<&TypographyShift> {
        self.current_section(progress).typography_shift.as_ref()
    }

    /// Direction palette resolved to `[background, accent, text]`.
    pub fn palette(&self) -> [Rgb; 3] {
        resolve_palette(&self.doc.palette)
    }

    /// Dominant color of the current chapter.
    pub fn chapter_color(&self, progress: f64) -> Option<Rgb> {
        Rgb::parse_hex(&self.current_section(progress).dominant_color)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/direction/interpret.rs"]
mod tests;
