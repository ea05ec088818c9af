use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::{
    foundation::core::{Affine, Point, Rect, Rgb, Rgba, Transform2D, Vec2},
    model::{
        audio_dna::HookRegion,
        direction::{IconPosition, IconStyle, StoryboardEntry},
        lyrics::LyricLine,
    },
    physics::state::PhysicsState,
    random::seeded::SeededRng,
    render::{
        canvas::{BlendMode, Canvas2d, TextAlign},
        words::{WordClass, layout_words},
    },
};

/// Effect used for unknown keys and empty pools.
pub const FALLBACK_EFFECT: &str = "resolve";
/// Effect forced on the last line of every hook region.
pub const HOOK_FINALE_EFFECT: &str = "fracture";
/// Line stride in the deterministic pool walk.
pub const POOL_STRIDE: u64 = 7;

/// Share of a line spent on its entry animation.
const ENTRY_SPAN: f64 = 0.15;
/// Share of a line spent on its exit animation.
const EXIT_SPAN: f64 = 0.1;

/// A display word with its resolved class and color.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledWord {
    /// Word as displayed, after any typography transform.
    pub text: String,
    pub class: WordClass,
    /// Fill color before effect alpha is applied.
    pub color: Rgba,
}

/// Everything a draw routine needs for one frame of one line.
#[derive(Clone, Copy, Debug)]
pub struct EffectState<'a> {
    /// Index of the active lyric line.
    pub line_index: usize,
    /// Words of the line in reading order.
    pub words: &'a [StyledWord],
    /// Progress through the active line in `[0, 1]`.
    pub line_progress: f64,
    /// Playback time in seconds.
    pub time_s: f64,
    /// Line anchor in canvas space.
    pub center: Point,
    /// Fitted line size in pixels.
    pub font_size: f64,
    /// `[background, accent, text]`.
    pub palette: [Rgb; 3],
    /// Integrator state after this frame's tick.
    pub physics: &'a PhysicsState,
    /// Storyboard entry style key.
    pub entry_style: &'a str,
    /// Storyboard exit style key.
    pub exit_style: &'a str,
    /// Section intensity in `[0, 1]`.
    pub intensity: f64,
    /// Session seed; effects derive their per-line randomness from it.
    pub seed: u32,
}

/// Draw routine signature.
pub type EffectFn = fn(&mut dyn Canvas2d, &EffectState<'_>);

/// Keyed table of draw routines.
#[derive(Clone, Debug)]
pub struct EffectRegistry {
    effects: BTreeMap<String, EffectFn>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

impl EffectRegistry {
    /// Registry with every built-in effect.
    pub fn builtin() -> Self {
        let mut effects: BTreeMap<String, EffectFn> = BTreeMap::new();
        effects.insert("resolve".to_owned(), draw_resolve);
        effects.insert("fracture".to_owned(), draw_fracture);
        effects.insert("pressure".to_owned(), draw_pressure);
        effects.insert("breathe".to_owned(), draw_breathe);
        effects.insert("ember".to_owned(), draw_ember);
        effects.insert("orbit".to_owned(), draw_orbit);
        effects.insert("typewriter".to_owned(), draw_typewriter);
        effects.insert("glitch".to_owned(), draw_glitch);
        Self { effects }
    }

    /// Add or replace an effect. Keys are case-insensitive.
    pub fn register(&mut self, key: &str, effect: EffectFn) {
        self.effects.insert(normalize_key(key), effect);
    }

    /// Whether `key` names a registered effect (without falling back).
    pub fn contains(&self, key: &str) -> bool {
        self.effects.contains_key(&normalize_key(key))
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    /// Resolve `key`, falling back to the static "resolve" draw.
    pub fn get(&self, key: &str) -> EffectFn {
        self.effects
            .get(&normalize_key(key))
            .copied()
            .unwrap_or(draw_resolve)
    }
}

/// Pick the effect key for a line.
///
/// The final line of a hook always gets [`HOOK_FINALE_EFFECT`]. Otherwise an explicit per-line key
/// wins, then the pool walk `(logic_seed + line_index * 7) mod pool.len()`.
pub fn select_effect_key<'a>(
    explicit: Option<&'a str>,
    pool: &'a [String],
    logic_seed: u32,
    line_index: usize,
    is_final_hook_line: bool,
) -> &'a str {
    if is_final_hook_line {
        return HOOK_FINALE_EFFECT;
    }
    if let Some(key) = explicit
        && !key.trim().is_empty()
    {
        return key;
    }
    if pool.is_empty() {
        return FALLBACK_EFFECT;
    }
    let idx = (u64::from(logic_seed) + line_index as u64 * POOL_STRIDE) % pool.len() as u64;
    pool[idx as usize].as_str()
}

/// Indices of the last line starting inside each hook region, sorted and deduplicated.
pub fn hook_final_lines(lines: &[LyricLine], hooks: &[HookRegion]) -> Vec<usize> {
    let mut out: Vec<usize> = hooks
        .iter()
        .filter_map(|h| lines.iter().rposition(|l| h.contains(l.start)))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Entry/exit shaping of a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub alpha: f64,
    /// Vertical offset in font sizes.
    pub rise: f64,
    pub scale: f64,
}

fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Shape a line by its entry and exit styles at `progress`.
pub fn envelope(entry_style: &str, exit_style: &str, progress: f64) -> Envelope {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let mut env = Envelope {
        alpha: 1.0,
        rise: 0.0,
        scale: 1.0,
    };

    let k_in = smoothstep(p / ENTRY_SPAN);
    match normalize_key(entry_style).as_str() {
        "none" | "cut" => {}
        "rise" => {
            env.alpha *= k_in;
            env.rise += (1.0 - k_in) * 0.6;
        }
        "slam" => env.scale *= 1.0 + (1.0 - k_in) * 0.5,
        "zoom" => {
            env.alpha *= k_in;
            env.scale *= 0.6 + 0.4 * k_in;
        }
        _ => env.alpha *= k_in,
    }

    let k_out = smoothstep((1.0 - p) / EXIT_SPAN);
    match normalize_key(exit_style).as_str() {
        "none" | "cut" => {}
        "sink" => {
            env.alpha *= k_out;
            env.rise -= (1.0 - k_out) * 0.6;
        }
        "shrink" => env.scale *= 0.5 + 0.5 * k_out,
        _ => env.alpha *= k_out,
    }
    env
}

/// Per-word adjustments applied on top of the line layout.
#[derive(Clone, Copy, Debug)]
struct WordPose {
    offset: Vec2,
    alpha: f64,
    scale: f64,
    color: Option<Rgba>,
}

impl Default for WordPose {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            alpha: 1.0,
            scale: 1.0,
            color: None,
        }
    }
}

fn line_transform(s: &EffectState<'_>, env: &Envelope, extra: Affine) -> Affine {
    let p = s.physics;
    let pose = Transform2D {
        translate: Vec2::new(
            s.center.x + p.offset_x,
            s.center.y + p.offset_y - env.rise * s.font_size,
        ),
        rotation_rad: p.rotation,
        scale: p.scale * env.scale,
        anchor: Vec2::ZERO,
    };
    pose.to_affine() * extra
}

fn draw_words(
    canvas: &mut dyn Canvas2d,
    s: &EffectState<'_>,
    extra: Affine,
    mut pose: impl FnMut(usize, &StyledWord) -> WordPose,
) {
    let env = envelope(s.entry_style, s.exit_style, s.line_progress);
    if env.alpha <= 0.0 || s.words.is_empty() {
        return;
    }
    let texts: Vec<&str> = s.words.iter().map(|w| w.text.as_str()).collect();
    let slots = layout_words(&texts, s.font_size, |t, px| canvas.measure_text(t, px));

    canvas.save();
    canvas.transform(line_transform(s, &env, extra));
    let ghosts: &[f64] = if s.physics.blur > 0.5 {
        &[-0.5, 0.5]
    } else {
        &[]
    };
    for (i, (word, slot)) in s.words.iter().zip(&slots).enumerate() {
        let pose = pose(i, word);
        if pose.alpha <= 0.0 {
            continue;
        }
        let jitter = s.physics.word_offsets.get(i).copied().unwrap_or(Vec2::ZERO);
        let at = Point::new(slot.center_x, 0.0) + jitter + pose.offset;
        let size = s.font_size * word.class.scale() * pose.scale;
        let color = pose.color.unwrap_or(word.color).fade(env.alpha * pose.alpha);
        for g in ghosts {
            let ghost = at + Vec2::new(g * s.physics.blur, 0.0);
            canvas.fill_text(&word.text, ghost, size, color.fade(0.25), TextAlign::Center);
        }
        canvas.fill_text(&word.text, at, size, color, TextAlign::Center);
    }
    canvas.restore();
}

fn draw_resolve(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    draw_words(canvas, s, Affine::IDENTITY, |_, _| WordPose::default());
}

fn draw_fracture(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let shatter = s.physics.shatter;
    let spread = if s.physics.is_fractured {
        1.0 + shatter * 3.0
    } else {
        1.0
    };
    let n = s.words.len().max(1) as f64;
    draw_words(canvas, s, Affine::IDENTITY, |i, _| {
        let dir = (i as f64 + 0.5) / n - 0.5;
        WordPose {
            offset: Vec2::new(dir * shatter * s.font_size, (i % 2) as f64 * shatter * 8.0)
                * spread,
            ..WordPose::default()
        }
    });

    if shatter <= 0.05 {
        return;
    }
    let mut rng = SeededRng::new(s.seed ^ (s.line_index as u32).wrapping_mul(0x9e37_79b9));
    let shard = s.palette[1].with_alpha(shatter * 0.8);
    let reach = s.font_size * (1.0 + shatter * 4.0);
    for _ in 0..(6.0 + shatter * 18.0) as usize {
        let d = rng.in_disc(reach);
        let w = rng.range(2.0, 2.0 + s.font_size * 0.2);
        let c = s.center + s.physics.offset() + d;
        canvas.fill_rect(Rect::new(c.x, c.y, c.x + w, c.y + w * 0.4), shard);
    }
}

fn draw_pressure(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let squeeze = (s.physics.position * 0.08).clamp(-0.3, 0.3);
    let swell = 1.0 + s.physics.glow * 0.15;
    let extra = Affine::scale_non_uniform(swell * (1.0 + squeeze), swell * (1.0 - squeeze));
    draw_words(canvas, s, extra, |_, w| WordPose {
        scale: if w.class == WordClass::Impact {
            1.0 + s.physics.heat * 0.2
        } else {
            1.0
        },
        ..WordPose::default()
    });
}

fn draw_breathe(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let breath = 0.5 + 0.5 * (s.time_s * TAU / 4.0).sin();
    let halo = s.palette[1].with_alpha(0.08 + s.physics.glow * 0.25);
    let c = s.center + s.physics.offset();
    canvas.fill_circle(c, s.font_size * (1.5 + breath), halo);
    draw_words(canvas, s, Affine::scale(1.0 + breath * 0.04), |_, _| WordPose {
        alpha: 0.75 + 0.25 * breath,
        ..WordPose::default()
    });
}

fn draw_ember(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let (w, h) = canvas.size().as_f64();
    let heat = s.physics.heat.max(s.intensity * 0.5);
    let mut rng = SeededRng::new(s.seed.wrapping_add(s.line_index as u32));
    let count = 12 + (heat * 24.0) as usize;
    canvas.save();
    canvas.set_blend(BlendMode::Lighter);
    for _ in 0..count {
        let x = rng.range(0.0, w);
        let speed = rng.range(20.0, 80.0) * (0.5 + heat);
        let phase = rng.range(0.0, h);
        let y = h - (phase + s.time_s * speed).rem_euclid(h);
        let r = rng.range(1.0, 3.5);
        let color = s.palette[1].mix(Rgb::WHITE, heat * 0.5).with_alpha(0.3 + heat * 0.5);
        canvas.fill_circle(Point::new(x, y), r, color);
    }
    canvas.restore();
    draw_words(canvas, s, Affine::IDENTITY, |_, w| WordPose {
        color: (w.class == WordClass::Impact)
            .then(|| s.palette[1].mix(Rgb::WHITE, heat * 0.4).with_alpha(w.color.alpha)),
        ..WordPose::default()
    });
}

fn draw_orbit(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let n = s.words.len().max(1) as f64;
    let radius = s.font_size * 0.3 * (0.3 + s.physics.glow);
    draw_words(canvas, s, Affine::IDENTITY, |i, _| {
        let a = s.time_s * 0.8 + i as f64 * TAU / n;
        WordPose {
            offset: Vec2::new(a.cos(), a.sin()) * radius,
            ..WordPose::default()
        }
    });
}

fn draw_typewriter(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let total: usize = s.words.iter().map(|w| w.text.chars().count()).sum();
    let shown = ((s.line_progress.clamp(0.0, 1.0) * 1.4).min(1.0) * total as f64).floor() as usize;
    let mut before = 0usize;
    draw_words(canvas, s, Affine::IDENTITY, |_, w| {
        // Words are visited in order; a word is visible once its first char is typed.
        let start = before;
        before += w.text.chars().count();
        WordPose {
            alpha: if start < shown { 1.0 } else { 0.0 },
            ..WordPose::default()
        }
    });
}

fn draw_glitch(canvas: &mut dyn Canvas2d, s: &EffectState<'_>) {
    let frame = (s.time_s.max(0.0) * 12.0).floor() as u32;
    let mut rng = SeededRng::new(s.seed ^ frame.wrapping_mul(0x85eb_ca6b));
    let split = (s.physics.shake * 6.0 + 1.0) * if rng.chance(0.5) { 1.0 } else { -1.0 };

    canvas.save();
    canvas.set_blend(BlendMode::Lighter);
    for (dx, tint) in [(split, Rgb::new(255, 0, 64)), (-split, Rgb::new(0, 200, 255))] {
        draw_words(canvas, s, Affine::translate((dx, 0.0)), |_, w| WordPose {
            color: Some(tint.with_alpha(w.color.alpha * 0.5)),
            ..WordPose::default()
        });
    }
    canvas.restore();
    draw_words(canvas, s, Affine::IDENTITY, |_, _| WordPose::default());

    let (w, _) = canvas.size().as_f64();
    let bar = s.palette[2].with_alpha(0.15 + s.physics.shake * 0.3);
    for _ in 0..3 {
        let y = s.center.y + rng.range(-1.0, 1.0) * s.font_size;
        let hgt = rng.range(1.0, 4.0);
        canvas.fill_rect(Rect::new(0.0, y, w, y + hgt), bar);
    }
}

/// Draw the storyboard icon of a line, if any.
pub fn draw_icon(canvas: &mut dyn Canvas2d, entry: &StoryboardEntry, s: &EffectState<'_>) {
    let Some(glyph) = entry.icon_glyph.as_deref().map(str::trim) else {
        return;
    };
    if glyph.is_empty() {
        return;
    }
    let position = IconPosition::parse_or_default(entry.icon_position.as_deref());
    let style = IconStyle::parse_or_default(entry.icon_style.as_deref());
    let scale = entry
        .icon_scale
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(1.0)
        .min(5.0);
    let env = envelope(s.entry_style, s.exit_style, s.line_progress);
    let size = s.font_size * 1.4 * scale;
    let anchor = s.center + s.physics.offset();

    let at = match position {
        IconPosition::Behind => anchor,
        IconPosition::Above => anchor - Vec2::new(0.0, s.font_size * 1.2 + size * 0.5),
        IconPosition::Beside => {
            let line: Vec<&str> = s.words.iter().map(|w| w.text.as_str()).collect();
            let half = canvas.measure_text(&line.join(" "), s.font_size) / 2.0;
            anchor + Vec2::new(half + size * 0.7, 0.0)
        }
    };
    let base = match style {
        IconStyle::Filled => s.palette[1],
        IconStyle::Outline | IconStyle::Ghost => s.palette[2],
    };
    let color = base.with_alpha(style.alpha() * env.alpha);
    canvas.fill_text(glyph, at, size, color, TextAlign::Center);
}

#[cfg(test)]
#[path = "../../tests/unit/render/effects.rs"]
mod tests;
