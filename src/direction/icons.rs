use crate::model::direction::{CinematicDirection, IconPosition, IconStyle};
use crate::model::lyrics::{LyricLine, normalize_word, split_words};

/// Tunable constants of the icon planner.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IconPlannerConfig {
    /// Minimum number of icon-bearing storyboard entries.
    pub min_icons: usize,
    /// Bonus when the matched word is the entry's hero word.
    pub hero_score: u32,
    /// Bonus when the matched word has a word directive.
    pub directive_score: u32,
    /// Score every candidate starts with.
    pub base_score: u32,
    /// Icon scale for `behind` icons.
    pub scale_behind: f64,
    /// Icon scale for `above` icons.
    pub scale_above: f64,
    /// Icon scale for `beside` icons.
    pub scale_beside: f64,
}

impl Default for IconPlannerConfig {
    fn default() -> Self {
        Self {
            min_icons: 10,
            hero_score: 3,
            directive_score: 2,
            base_score: 1,
            scale_behind: 2.2,
            scale_above: 1.2,
            scale_beside: 1.0,
        }
    }
}

impl IconPlannerConfig {
    /// Scale applied to a planner-placed icon at `position`.
    pub fn scale_for(&self, position: IconPosition) -> f64 {
        match position {
            IconPosition::Behind => self.scale_behind,
            IconPosition::Above => self.scale_above,
            IconPosition::Beside => self.scale_beside,
        }
    }
}

/// Vocabulary entry: glyph and placement for one word.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconGlyph {
    /// Glyph text.
    pub glyph: &'static str,
    /// Placement.
    pub position: IconPosition,
    /// Style.
    pub style: IconStyle,
}

const fn icon(glyph: &'static str, position: IconPosition, style: IconStyle) -> IconGlyph {
    IconGlyph {
        glyph,
        position,
        style,
    }
}

use IconPosition::{Above, Behind, Beside};
use IconStyle::{Filled, Ghost, Outline};

// Sorted by word for binary search.
static VOCABULARY: &[(&str, IconGlyph)] = &[
    ("angel", icon("👼", Above, Ghost)),
    ("blood", icon("🩸", Beside, Filled)),
    ("bomb", icon("💣", Beside, Filled)),
    ("broken", icon("💔", Behind, Outline)),
    ("burn", icon("🔥", Behind, Filled)),
    ("car", icon("🚗", Beside, Outline)),
    ("chain", icon("⛓", Beside, Outline)),
    ("chains", icon("⛓", Beside, Outline)),
    ("city", icon("🏙", Behind, Ghost)),
    ("clock", icon("🕰", Above, Outline)),
    ("cloud", icon("☁", Above, Ghost)),
    ("crown", icon("👑", Above, Filled)),
    ("dance", icon("💃", Beside, Filled)),
    ("diamond", icon("💎", Beside, Filled)),
    ("dream", icon("💭", Above, Ghost)),
    ("eyes", icon("👁", Above, Outline)),
    ("fire", icon("🔥", Behind, Filled)),
    ("flower", icon("🌸", Beside, Outline)),
    ("ghost", icon("👻", Behind, Ghost)),
    ("gold", icon("🪙", Beside, Filled)),
    ("heart", icon("❤", Behind, Filled)),
    ("home", icon("🏠", Beside, Outline)),
    ("key", icon("🗝", Beside, Outline)),
    ("king", icon("👑", Above, Filled)),
    ("knife", icon("🔪", Beside, Outline)),
    ("light", icon("💡", Above, Outline)),
    ("lightning", icon("⚡", Behind, Filled)),
    ("love", icon("❤", Behind, Outline)),
    ("money", icon("💸", Beside, Filled)),
    ("moon", icon("🌙", Above, Ghost)),
    ("music", icon("🎵", Above, Outline)),
    ("night", icon("🌙", Behind, Ghost)),
    ("ocean", icon("🌊", Behind, Ghost)),
    ("phone", icon("📱", Beside, Outline)),
    ("queen", icon("👑", Above, Filled)),
    ("rain", icon("🌧", Behind, Ghost)),
    ("rose", icon("🌹", Beside, Filled)),
    ("sea", icon("🌊", Behind, Ghost)),
    ("sky", icon("🌌", Behind, Ghost)),
    ("smoke", icon("💨", Behind, Ghost)),
    ("snow", icon("❄", Above, Ghost)),
    ("star", icon("⭐", Above, Filled)),
    ("stars", icon("✨", Above, Filled)),
    ("storm", icon("⛈", Behind, Outline)),
    ("sun", icon("☀", Above, Filled)),
    ("tears", icon("💧", Beside, Outline)),
    ("thunder", icon("⚡", Behind, Filled)),
    ("time", icon("⏳", Above, Outline)),
    ("wave", icon("🌊", Behind, Ghost)),
    ("wings", icon("🪽", Above, Outline)),
];

/// Look up the glyph for a word (case and punctuation insensitive).
pub fn lookup_icon(word: &str) -> Option<IconGlyph> {
    let key = normalize_word(word);
    VOCABULARY
        .binary_search_by(|(w, _)| (*w).cmp(key.as_str()))
        .ok()
        .map(|i| VOCABULARY[i].1)
}

/// Outcome of one planning run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IconPlan {
    /// Storyboard indices that received an icon, ascending.
    pub added: Vec<usize>,
    /// Minimum spacing that was requested.
    pub spacing: usize,
    /// `true` when spacing had to be relaxed to reach the target.
    pub relaxed: bool,
}

#[derive(Clone, Debug)]
struct Candidate {
    index: usize,
    icon: IconGlyph,
    score: u32,
}

/// Minimum index spacing between icon-bearing lines.
pub fn icon_spacing(line_count: usize, target: usize) -> usize {
    (line_count / (target + 2)).max(2)
}

/// Top up storyboard icons until at least `cfg.min_icons` entries carry one.
///
/// Deterministic: identical lines and storyboard produce the identical plan.
pub fn plan_icons(
    doc: &mut CinematicDirection,
    lines: &[LyricLine],
    cfg: &IconPlannerConfig,
) -> IconPlan {
    let n = doc.storyboard.len();
    let target = cfg.min_icons;
    let spacing = icon_spacing(n, target);
    let mut taken: Vec<usize> = (0..n).filter(|&i| doc.storyboard[i].has_icon()).collect();
    let mut plan = IconPlan {
        spacing,
        ..IconPlan::default()
    };
    if taken.len() >= target {
        return plan;
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for (index, entry) in doc.storyboard.iter().enumerate() {
        if entry.has_icon() {
            continue;
        }
        let hero = entry.hero_word.as_deref().map(normalize_word);
        let text = lines.get(index).map_or("", |l| l.text.as_str());
        let found = hero
            .iter()
            .map(String::as_str)
            .chain(split_words(text))
            .find_map(|w| lookup_icon(w).map(|icon| (normalize_word(w), icon)));
        let Some((word, icon)) = found else {
            continue;
        };
        let mut score = cfg.base_score;
        if hero.as_deref() == Some(word.as_str()) {
            score += cfg.hero_score;
        }
        if doc.word_directives.contains(&word) {
            score += cfg.directive_score;
        }
        candidates.push(Candidate { index, icon, score });
    }
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));

    let mut chosen: Vec<Candidate> = Vec::new();
    let mut gap = spacing;
    loop {
        for c in &candidates {
            if taken.len() >= target {
                break;
            }
            if taken.contains(&c.index) {
                continue;
            }
            if taken.iter().all(|&t| t.abs_diff(c.index) >= gap) {
                taken.push(c.index);
                chosen.push(c.clone());
            }
        }
        if taken.len() >= target || gap <= 1 {
            break;
        }
        gap -= 1;
        plan.relaxed = true;
    }

    for c in &chosen {
        let entry = &mut doc.storyboard[c.index];
        entry.icon_glyph = Some(c.icon.glyph.to_owned());
        entry.icon_position = Some(c.icon.position.as_str().to_owned());
        entry.icon_style = Some(c.icon.style.as_str().to_owned());
        if entry.icon_scale.is_none() {
            entry.icon_scale = Some(cfg.scale_for(c.icon.position));
        }
    }
    plan.added = chosen.iter().map(|c| c.index).collect();
    plan.added.sort_unstable();

    if !plan.added.is_empty() || taken.len() < target {
        tracing::warn!(
            field = "storyboard",
            action = "inject_icons",
            added = plan.added.len(),
            total = taken.len(),
            target,
            spacing,
            relaxed = plan.relaxed,
            "icon planner"
        );
    }
    plan
}

#[cfg(test)]
#[path = "../../tests/unit/direction/icons.rs"]
mod tests;
