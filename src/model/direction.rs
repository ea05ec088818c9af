use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::lyrics::normalize_word;
use crate::model::{decode_field, decode_list};

/// The AI-produced animation script for one song.
///
/// All sections are optional on the wire; [`crate::synthesize_missing`] backfills whatever a
/// generator left out. Key names follow the generator's camelCase schema.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CinematicDirection {
    /// One-sentence statement of what the piece is about.
    #[serde(default)]
    pub thesis: String,
    /// Exactly three `#RRGGBB` colors when valid: background, accent, text.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Contiguous chapters covering progress `[0, 1]`.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Peak moment of the song.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climax: Option<Climax>,
    /// One entry per lyric line.
    #[serde(default)]
    pub storyboard: Vec<StoryboardEntry>,
    /// Per-word behavior keyed by lowercase word.
    #[serde(default, skip_serializing_if = "WordDirectives::is_empty")]
    pub word_directives: WordDirectives,
    /// Tension samples over progress.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tension_curve: Vec<TensionPoint>,
    /// How the piece resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending: Option<Ending>,
    /// Framing/camera intent per phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_language: Option<CameraLanguage>,
    /// Optional explicit effect key per line index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effect_sequence: Vec<String>,
}

/// A contiguous `[start_ratio, end_ratio)` slice of the song.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Short label.
    #[serde(default)]
    pub title: String,
    /// Inclusive start progress.
    #[serde(default)]
    pub start_ratio: f64,
    /// Exclusive end progress.
    #[serde(default)]
    pub end_ratio: f64,
    /// `#RRGGBB` color dominating the chapter.
    #[serde(default)]
    pub dominant_color: String,
    /// Emotional intensity in `[0, 1]`.
    #[serde(default = "default_intensity")]
    pub emotional_intensity: f64,
    /// Background treatment hint.
    #[serde(default)]
    pub background_directive: String,
    /// Lighting behavior hint.
    #[serde(default)]
    pub light_behavior: String,
    /// Particle behavior hint.
    #[serde(default)]
    pub particle_directive: String,
    /// Typography change entering this chapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography_shift: Option<TypographyShift>,
}

fn default_intensity() -> f64 {
    0.5
}

/// Typography change applied while a chapter is active.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyShift {
    /// Replacement weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u32>,
    /// Replacement letter spacing (em).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    /// `uppercase`, `lowercase` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<String>,
}

/// Climax marker.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Climax {
    /// Progress at which the climax lands, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ratio: Option<f64>,
    /// Lyric text that triggers the climax.
    #[serde(default)]
    pub trigger_line: String,
    /// Peak light intensity in `[0, 1]`.
    #[serde(default = "default_peak")]
    pub max_light_intensity: f64,
}

fn default_peak() -> f64 {
    1.0
}

/// Per-line animation metadata.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardEntry {
    /// Index of the lyric line this entry describes. Position in the storyboard is
    /// authoritative; the field is kept only when the document carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    /// Entry animation style key.
    #[serde(default = "default_style")]
    pub entry_style: String,
    /// Exit animation style key.
    #[serde(default = "default_style")]
    pub exit_style: String,
    /// Word to emphasize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_word: Option<String>,
    /// Icon glyph drawn with the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_glyph: Option<String>,
    /// `behind`, `beside` or `above`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_position: Option<String>,
    /// `outline`, `filled` or `ghost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_style: Option<String>,
    /// Icon scale relative to the font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_scale: Option<f64>,
}

fn default_style() -> String {
    "fade".to_owned()
}

impl StoryboardEntry {
    /// Neutral defaults for a line the generator did not describe.
    pub fn neutral(line_index: usize) -> Self {
        Self {
            line_index: Some(line_index),
            entry_style: default_style(),
            exit_style: default_style(),
            hero_word: None,
            icon_glyph: None,
            icon_position: None,
            icon_style: None,
            icon_scale: None,
        }
    }

    /// Return `true` when the entry carries a non-empty icon glyph.
    pub fn has_icon(&self) -> bool {
        self.icon_glyph.as_deref().is_some_and(|g| !g.trim().is_empty())
    }
}

/// Where an icon sits relative to its line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconPosition {
    /// Large, faint, centered behind the text.
    Behind,
    /// Next to the hero word.
    Beside,
    /// Above the line.
    Above,
}

impl IconPosition {
    /// Parse a position name, defaulting unknown names to [`IconPosition::Beside`].
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("behind") => Self::Behind,
            Some("above") => Self::Above,
            _ => Self::Beside,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Behind => "behind",
            Self::Beside => "beside",
            Self::Above => "above",
        }
    }
}

/// Icon rendering style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconStyle {
    /// Stroked look (drawn at reduced alpha).
    Outline,
    /// Solid glyph.
    Filled,
    /// Very faint glyph.
    Ghost,
}

impl IconStyle {
    /// Parse a style name, defaulting unknown names to [`IconStyle::Outline`].
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("filled") => Self::Filled,
            Some("ghost") => Self::Ghost,
            _ => Self::Outline,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Filled => "filled",
            Self::Ghost => "ghost",
        }
    }

    /// Alpha multiplier used when drawing.
    pub fn alpha(self) -> f64 {
        match self {
            Self::Outline => 0.55,
            Self::Filled => 0.9,
            Self::Ghost => 0.22,
        }
    }
}

/// Per-word animation behavior.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordDirective {
    /// Entry animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Behavior while visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    /// Exit animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<String>,
    /// Trail effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail: Option<String>,
    /// Emphasis level (0..5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<f64>,
}

/// Word directives normalized to a lowercase-keyed map.
///
/// Generators emit either `{"word": {...}}` or `[{"word": "x", ...}]`; both decode here.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct WordDirectives(BTreeMap<String, WordDirective>);

impl WordDirectives {
    /// Case- and punctuation-insensitive lookup.
    pub fn get(&self, word: &str) -> Option<&WordDirective> {
        self.0.get(&normalize_word(word))
    }

    /// Return `true` when a directive exists for `word`.
    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// Insert under the normalized key; the first directive for a key wins.
    pub fn insert(&mut self, word: &str, directive: WordDirective) {
        let key = normalize_word(word);
        if key.is_empty() {
            return;
        }
        self.0.entry(key).or_insert(directive);
    }

    /// Number of directives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when there are no directives.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WordDirective)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for WordDirectives {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Listed {
            word: String,
            #[serde(flatten)]
            directive: WordDirective,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Map(BTreeMap<String, WordDirective>),
            List(Vec<Listed>),
        }

        let mut out = WordDirectives::default();
        match Repr::deserialize(deserializer)? {
            Repr::Map(m) => {
                for (word, directive) in m {
                    out.insert(&word, directive);
                }
            }
            Repr::List(v) => {
                for l in v {
                    out.insert(&l.word, l.directive);
                }
            }
        }
        Ok(out)
    }
}

/// One sample of the tension curve.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensionPoint {
    /// Progress in `[0, 1]`.
    pub ratio: f64,
    /// Tension in `[0, 1]`.
    pub tension: f64,
}

/// Ending treatment.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ending {
    /// Ending style key (`dissolve`, `cut`, `freeze`, ...).
    #[serde(default)]
    pub style: String,
    /// Seconds to hold the last frame.
    #[serde(default)]
    pub hold_seconds: f64,
    /// Word left on screen, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_word: Option<String>,
}

/// Camera/framing intent.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraLanguage {
    /// Framing at the start.
    #[serde(default)]
    pub opening: String,
    /// Framing at the climax.
    #[serde(default)]
    pub climax: String,
    /// Framing at the end.
    #[serde(default)]
    pub closing: String,
    /// Movement style.
    #[serde(default)]
    pub movement: String,
}

impl CinematicDirection {
    /// Decode a parsed JSON value, keeping every section that decodes on its own.
    ///
    /// Returns the document plus one message per dropped section/element. Storyboard elements
    /// that fail to decode are replaced by neutral entries so indices stay aligned with lines.
    pub fn from_value_lenient(value: &serde_json::Value) -> (Self, Vec<String>) {
        if let Ok(doc) = Self::deserialize(value) {
            return (doc, Vec::new());
        }
        let Some(obj) = value.as_object() else {
            return (
                Self::default(),
                vec!["direction document is not a JSON object".to_owned()],
            );
        };

        let mut doc = Self::default();
        let mut dropped = Vec::new();
        decode_field(obj, "thesis", &mut doc.thesis, &mut dropped);
        decode_list(obj, "palette", &mut doc.palette, &mut dropped, |_| None);
        decode_list(obj, "chapters", &mut doc.chapters, &mut dropped, |_| None);
        decode_field(obj, "climax", &mut doc.climax, &mut dropped);
        decode_list(obj, "storyboard", &mut doc.storyboard, &mut dropped, |i| {
            Some(StoryboardEntry::neutral(i))
        });
        decode_field(obj, "wordDirectives", &mut doc.word_directives, &mut dropped);
        decode_list(obj, "tensionCurve", &mut doc.tension_curve, &mut dropped, |_| None);
        decode_field(obj, "ending", &mut doc.ending, &mut dropped);
        decode_field(obj, "cameraLanguage", &mut doc.camera_language, &mut dropped);
        decode_list(obj, "effectSequence", &mut doc.effect_sequence, &mut dropped, |_| {
            Some("resolve".to_owned())
        });
        (doc, dropped)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/direction.rs"]
mod tests;
