use crate::foundation::core::{Rgb, Rgba};
use crate::model::direction::WordDirective;
use crate::model::lyrics::normalize_word;

/// Directive emphasis at or above which a word is always [`WordClass::Impact`].
pub const IMPACT_EMPHASIS: f64 = 4.0;
/// Alpha applied to filler words.
pub const FILLER_ALPHA: f64 = 0.6;

// Sorted for binary search.
static IMPACT_WORDS: &[&str] = &[
    "blood", "boom", "break", "burn", "crash", "dead", "die", "explode", "fight", "fire", "gone",
    "hate", "kill", "loud", "never", "rage", "run", "scream", "shatter", "smash", "storm", "war",
    "wild",
];

static TENDER_WORDS: &[&str] = &[
    "baby", "breathe", "darling", "dream", "gentle", "heart", "hold", "home", "kiss", "love",
    "moon", "quiet", "slow", "soft", "stay", "tears", "tender", "touch", "warm", "whisper",
];

static FILLER_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "i", "if", "in", "is",
    "it", "its", "just", "me", "my", "of", "oh", "on", "or", "so", "that", "the", "to", "uh",
    "was", "we", "with", "yeah", "you", "your",
];

/// Visual weight of a word inside a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordClass {
    Impact,
    Tender,
    Neutral,
    Filler,
}

impl WordClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impact => "IMPACT",
            Self::Tender => "TENDER",
            Self::Neutral => "NEUTRAL",
            Self::Filler => "FILLER",
        }
    }

    /// Size multiplier relative to the fitted line size.
    pub fn scale(self) -> f64 {
        match self {
            Self::Impact => 1.12,
            Self::Tender | Self::Neutral => 1.0,
            Self::Filler => 0.85,
        }
    }
}

/// Classify a display word, letting an explicit directive emphasis win.
pub fn classify_word(word: &str, directive: Option<&WordDirective>) -> WordClass {
    if let Some(e) = directive.and_then(|d| d.emphasis)
        && e.is_finite()
        && e >= IMPACT_EMPHASIS
    {
        return WordClass::Impact;
    }

    let norm = normalize_word(word);
    if norm.is_empty() {
        return WordClass::Filler;
    }
    if IMPACT_WORDS.binary_search(&norm.as_str()).is_ok() {
        return WordClass::Impact;
    }
    if TENDER_WORDS.binary_search(&norm.as_str()).is_ok() {
        return WordClass::Tender;
    }
    if FILLER_WORDS.binary_search(&norm.as_str()).is_ok() {
        return WordClass::Filler;
    }
    // Shouted words ("NO", "STOP") read as impact.
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return WordClass::Impact;
    }
    WordClass::Neutral
}

/// Fill color for a word of `class` under a `[background, accent, text]` palette.
pub fn word_color(class: WordClass, palette: &[Rgb; 3]) -> Rgba {
    let [_, accent, text] = *palette;
    match class {
        WordClass::Impact => Rgba::opaque(accent),
        WordClass::Tender => Rgba::opaque(text.mix(accent, 0.35)),
        WordClass::Neutral => Rgba::opaque(text),
        WordClass::Filler => text.with_alpha(FILLER_ALPHA),
    }
}

/// Largest size in `[min_px, base_px]` at which `text` fits `max_width`.
pub fn fit_font_size(
    text: &str,
    max_width: f64,
    base_px: f64,
    min_px: f64,
    measure: impl Fn(&str, f64) -> f64,
) -> f64 {
    let min_px = if min_px.is_finite() && min_px > 0.0 {
        min_px
    } else {
        1.0
    };
    if !base_px.is_finite() || base_px <= min_px || !max_width.is_finite() || max_width <= 0.0 {
        return min_px;
    }
    let width = measure(text, base_px);
    if !width.is_finite() || width <= max_width {
        return base_px;
    }
    // Shaped widths are not exactly linear in size (pixel-snapped advances), so refine.
    let mut size = (base_px * max_width / width).clamp(min_px, base_px);
    for _ in 0..FIT_REFINE_STEPS {
        let width = measure(text, size);
        if !width.is_finite() || width <= max_width || size <= min_px {
            break;
        }
        size = (size * max_width / width).min(size - FIT_STEP_PX).clamp(min_px, base_px);
    }
    size
}

const FIT_REFINE_STEPS: usize = 6;
const FIT_STEP_PX: f64 = 0.25;

/// One word placed on a line.
#[derive(Clone, Debug, PartialEq)]
pub struct WordSlot<'a> {
    pub word: &'a str,
    /// Horizontal center relative to the line center.
    pub center_x: f64,
    pub width: f64,
}

/// Lay out words left to right, centered on zero, with one space between words.
pub fn layout_words<'a>(
    words: &[&'a str],
    size_px: f64,
    measure: impl Fn(&str, f64) -> f64,
) -> Vec<WordSlot<'a>> {
    let space = measure(" ", size_px);
    let widths: Vec<f64> = words.iter().map(|w| measure(w, size_px)).collect();
    let total = widths.iter().sum::<f64>() + space * words.len().saturating_sub(1) as f64;

    let mut x = -total / 2.0;
    words
        .iter()
        .zip(widths)
        .map(|(&word, width)| {
            let slot = WordSlot {
                word,
                center_x: x + width / 2.0,
                width,
            };
            x += width + space;
            slot
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/words.rs"]
mod tests;
