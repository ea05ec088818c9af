use crate::direction::validate::{MIN_CHAPTERS, RATIO_TOLERANCE};
use crate::foundation::core::Rgb;
use crate::foundation::math::clamp_finite;
use crate::model::direction::{
    CameraLanguage, Chapter, CinematicDirection, Climax, Ending, StoryboardEntry, TensionPoint,
};
use crate::model::lyrics::{LyricLine, active_line_index, normalize_word, split_words};
use crate::model::physics_spec::DEFAULT_PALETTE;

const FALLBACK_THESIS: &str = "the song, moving line by line";
const FALLBACK_CLIMAX_RATIO: f64 = 0.75;
const DEFAULT_TITLES: [&str; 3] = ["opening", "build", "release"];
const DEFAULT_INTENSITIES: [f64; 3] = [0.35, 0.6, 0.9];

/// One backfill performed on a direction document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisAction {
    /// Top-level section that was touched.
    pub field: &'static str,
    /// What was done.
    pub action: &'static str,
}

struct Actions(Vec<SynthesisAction>);

impl Actions {
    fn record(&mut self, field: &'static str, action: &'static str) {
        tracing::warn!(field, action, "direction synthesis");
        self.0.push(SynthesisAction { field, action });
    }
}

/// Backfill every missing or unusable section of `doc` for the given lines.
///
/// Idempotent: a second run on the output records no actions and changes nothing.
pub fn synthesize_missing(
    doc: &mut CinematicDirection,
    lines: &[LyricLine],
) -> Vec<SynthesisAction> {
    let mut actions = Actions(Vec::new());

    if doc.thesis.trim().is_empty() {
        doc.thesis = FALLBACK_THESIS.to_owned();
        actions.record("thesis", "default");
    }

    synthesize_palette(doc, &mut actions);
    synthesize_chapters(doc, &mut actions);
    synthesize_tension(doc, &mut actions);
    synthesize_storyboard(doc, lines.len(), &mut actions);
    synthesize_climax(doc, lines, &mut actions);

    if doc.ending.is_none() {
        doc.ending = Some(Ending {
            style: "dissolve".to_owned(),
            hold_seconds: 2.0,
            final_word: lines
                .last()
                .and_then(|l| split_words(&l.text).last().map(|w| normalize_word(w)))
                .filter(|w| !w.is_empty()),
        });
        actions.record("ending", "default");
    }

    if doc.camera_language.is_none() {
        doc.camera_language = Some(CameraLanguage {
            opening: "wide".to_owned(),
            climax: "close".to_owned(),
            closing: "wide".to_owned(),
            movement: "drift".to_owned(),
        });
        actions.record("cameraLanguage", "default");
    }

    actions.0
}

/// Fully synthesized document for songs with no usable direction.
pub fn fallback_direction(lines: &[LyricLine]) -> CinematicDirection {
    let mut doc = CinematicDirection::default();
    synthesize_missing(&mut doc, lines);
    doc
}

fn synthesize_palette(doc: &mut CinematicDirection, actions: &mut Actions) {
    if doc.palette.len() == 3 && doc.palette.iter().all(|c| Rgb::is_valid_hex(c)) {
        return;
    }
    let mut palette: Vec<String> = Vec::with_capacity(3);
    let candidates = doc
        .palette
        .iter()
        .map(String::as_str)
        .chain(doc.chapters.iter().map(|c| c.dominant_color.as_str()))
        .chain(DEFAULT_PALETTE);
    for c in candidates {
        if palette.len() == 3 {
            break;
        }
        if let Some(rgb) = Rgb::parse_hex(c) {
            let hex = rgb.to_hex();
            if !palette.contains(&hex) {
                palette.push(hex);
            }
        }
    }
    // All defaults are distinct, so three colors are always collected.
    doc.palette = palette;
    actions.record("palette", "rebuild");
}

/// Return `true` when sorted chapters cover `[0, 1]` without gaps or overlaps.
pub(crate) fn chapters_cover_unit(chapters: &[Chapter]) -> bool {
    let (Some(first), Some(last)) = (chapters.first(), chapters.last()) else {
        return false;
    };
    if first.start_ratio.abs() > RATIO_TOLERANCE || (last.end_ratio - 1.0).abs() > RATIO_TOLERANCE
    {
        return false;
    }
    chapters.iter().all(|c| c.start_ratio < c.end_ratio)
        && chapters
            .windows(2)
            .all(|w| (w[1].start_ratio - w[0].end_ratio).abs() <= RATIO_TOLERANCE)
}

fn synthesize_chapters(doc: &mut CinematicDirection, actions: &mut Actions) {
    let before = doc.chapters.len();
    doc.chapters.retain(|c| c.start_ratio.is_finite() && c.end_ratio.is_finite());
    if doc.chapters.len() != before {
        actions.record("chapters", "drop_non_finite");
    }

    if !doc
        .chapters
        .windows(2)
        .all(|w| w[0].start_ratio <= w[1].start_ratio)
    {
        doc.chapters.sort_by(|a, b| a.start_ratio.total_cmp(&b.start_ratio));
        actions.record("chapters", "sort");
    }

    let accent = doc.palette.get(1).cloned().unwrap_or_default();
    let mut fixed_fields = false;
    for c in &mut doc.chapters {
        if !Rgb::is_valid_hex(&c.dominant_color) {
            c.dominant_color = accent.clone();
            fixed_fields = true;
        }
        let intensity = clamp_finite(c.emotional_intensity, 0.0, 1.0, 0.5);
        if intensity != c.emotional_intensity {
            c.emotional_intensity = intensity;
            fixed_fields = true;
        }
    }
    if fixed_fields {
        actions.record("chapters", "fix_fields");
    }

    if doc.chapters.len() >= MIN_CHAPTERS {
        if chapters_cover_unit(&doc.chapters) {
            return;
        }
        let mut closed = doc.chapters.clone();
        reclose_boundaries(&mut closed);
        if chapters_cover_unit(&closed) {
            doc.chapters = closed;
            actions.record("chapters", "reclose_boundaries");
            return;
        }
    }

    doc.chapters = rebuild_three(&doc.chapters, &doc.tension_curve, &doc.palette);
    actions.record("chapters", "rebuild_three_segments");
}

fn reclose_boundaries(chapters: &mut [Chapter]) {
    let n = chapters.len();
    if n == 0 {
        return;
    }
    chapters[0].start_ratio = 0.0;
    chapters[n - 1].end_ratio = 1.0;
    for i in 1..n {
        let b = ((chapters[i - 1].end_ratio + chapters[i].start_ratio) / 2.0).clamp(0.0, 1.0);
        chapters[i - 1].end_ratio = b;
        chapters[i].start_ratio = b;
    }
}

fn rebuild_three(
    existing: &[Chapter],
    tension: &[TensionPoint],
    palette: &[String],
) -> Vec<Chapter> {
    let bounds = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];
    (0..3)
        .map(|k| {
            let (a, b) = (bounds[k], bounds[k + 1]);
            let mid = (a + b) / 2.0;
            let inherited = existing
                .iter()
                .find(|c| c.start_ratio <= mid && mid < c.end_ratio)
                .or_else(|| {
                    existing
                        .iter()
                        .filter(|c| c.start_ratio < b && a < c.end_ratio)
                        .max_by(|x, y| {
                            overlap(x, a, b).total_cmp(&overlap(y, a, b))
                        })
                });
            let mut ch = match inherited {
                Some(c) => c.clone(),
                None => Chapter {
                    title: DEFAULT_TITLES[k].to_owned(),
                    start_ratio: a,
                    end_ratio: b,
                    dominant_color: palette
                        .get(k)
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_PALETTE[k].to_owned()),
                    emotional_intensity: DEFAULT_INTENSITIES[k],
                    background_directive: String::new(),
                    light_behavior: String::new(),
                    particle_directive: String::new(),
                    typography_shift: None,
                },
            };
            ch.start_ratio = a;
            ch.end_ratio = b;
            if let Some(t) = mean_tension(tension, a, b) {
                ch.emotional_intensity = t;
            }
            ch
        })
        .collect()
}

fn overlap(c: &Chapter, a: f64, b: f64) -> f64 {
    (c.end_ratio.min(b) - c.start_ratio.max(a)).max(0.0)
}

fn mean_tension(points: &[TensionPoint], a: f64, b: f64) -> Option<f64> {
    let inside: Vec<f64> = points
        .iter()
        .filter(|p| p.ratio.is_finite() && p.tension.is_finite())
        .filter(|p| a <= p.ratio && (p.ratio < b || (b >= 1.0 && p.ratio <= 1.0)))
        .map(|p| p.tension.clamp(0.0, 1.0))
        .collect();
    if inside.is_empty() {
        return None;
    }
    Some(inside.iter().sum::<f64>() / inside.len() as f64)
}

fn synthesize_tension(doc: &mut CinematicDirection, actions: &mut Actions) {
    if doc.tension_curve.is_empty() {
        doc.tension_curve = doc
            .chapters
            .iter()
            .map(|c| TensionPoint {
                ratio: (c.start_ratio + c.end_ratio) / 2.0,
                tension: c.emotional_intensity,
            })
            .collect();
        actions.record("tensionCurve", "from_chapters");
        return;
    }

    let sane = doc.tension_curve.iter().all(|p| {
        (0.0..=1.0).contains(&p.ratio) && (0.0..=1.0).contains(&p.tension)
    }) && doc
        .tension_curve
        .windows(2)
        .all(|w| w[0].ratio <= w[1].ratio);
    if sane {
        return;
    }
    doc.tension_curve.retain(|p| p.ratio.is_finite() && p.tension.is_finite());
    for p in &mut doc.tension_curve {
        p.ratio = p.ratio.clamp(0.0, 1.0);
        p.tension = p.tension.clamp(0.0, 1.0);
    }
    doc.tension_curve.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
    actions.record("tensionCurve", "sanitize");
}

fn synthesize_storyboard(doc: &mut CinematicDirection, line_count: usize, actions: &mut Actions) {
    let len = doc.storyboard.len();
    if len < line_count {
        doc.storyboard.extend((len..line_count).map(StoryboardEntry::neutral));
        actions.record("storyboard", "pad");
    } else if len > line_count {
        doc.storyboard.truncate(line_count);
        actions.record("storyboard", "truncate");
    }

    let mut reindexed = false;
    for (i, e) in doc.storyboard.iter_mut().enumerate() {
        if let Some(idx) = e.line_index
            && idx != i
        {
            e.line_index = Some(i);
            reindexed = true;
        }
    }
    if reindexed {
        actions.record("storyboard", "reindex");
    }
}

fn synthesize_climax(doc: &mut CinematicDirection, lines: &[LyricLine], actions: &mut Actions) {
    let peak = peak_ratio(&doc.tension_curve);

    let climax = match doc.climax.take() {
        Some(mut c) => {
            if !c.time_ratio.is_some_and(|r| (0.0..=1.0).contains(&r)) {
                c.time_ratio = Some(peak);
                actions.record("climax", "time_ratio");
            }
            let light = clamp_finite(c.max_light_intensity, 0.0, 1.0, 1.0);
            if light != c.max_light_intensity {
                c.max_light_intensity = light;
                actions.record("climax", "max_light_intensity");
            }
            c
        }
        None => {
            actions.record("climax", "from_tension_peak");
            Climax {
                time_ratio: Some(peak),
                trigger_line: String::new(),
                max_light_intensity: 1.0,
            }
        }
    };
    doc.climax = Some(climax);

    if let Some(c) = doc.climax.as_mut()
        && c.trigger_line.trim().is_empty()
        && let Some(line) = line_at_ratio(lines, c.time_ratio.unwrap_or(FALLBACK_CLIMAX_RATIO))
    {
        c.trigger_line = line.text.clone();
        actions.record("climax", "trigger_line");
    }
}

/// Ratio of the highest tension point (earliest on ties).
fn peak_ratio(curve: &[TensionPoint]) -> f64 {
    curve
        .iter()
        .fold(None::<TensionPoint>, |best, p| match best {
            Some(b) if b.tension >= p.tension => Some(b),
            _ => Some(*p),
        })
        .map_or(FALLBACK_CLIMAX_RATIO, |p| p.ratio)
}

/// Line active at `ratio` of the lyric span, else the nearest line by index.
fn line_at_ratio(lines: &[LyricLine], ratio: f64) -> Option<&LyricLine> {
    let last = lines.last()?;
    let t = ratio * last.end;
    if let Some(i) = active_line_index(lines, t) {
        return lines.get(i);
    }
    let idx = (ratio * (lines.len() - 1) as f64).round() as usize;
    lines.get(idx.min(lines.len() - 1))
}

#[cfg(test)]
#[path = "../../tests/unit/direction/synthesize.rs"]
mod tests;
