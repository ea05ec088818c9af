use crate::foundation::core::{Affine, Rect, Rgb, Vec2};
use crate::render::canvas::{BlendMode, Canvas2d};

/// Short full-frame overlay fired every `interval` beats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurpriseKind {
    RgbSplit,
    Flash,
    Invert,
}

impl SurpriseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RgbSplit => "rgb_split",
            Self::Flash => "flash",
            Self::Invert => "invert",
        }
    }
}

/// An active micro-surprise; `strength` decays from 1 to 0 across the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MicroSurprise {
    pub kind: SurpriseKind,
    pub strength: f64,
}

/// Gate a micro-surprise on the beat count.
///
/// Fires while `since_beat_s` is inside `window_s` and `beat_count` is a non-zero multiple of
/// `interval`. Kinds rotate through split, flash and invert on successive firings. An `interval`
/// of zero disables surprises.
pub fn micro_surprise(
    beat_count: usize,
    interval: u32,
    since_beat_s: f64,
    window_s: f64,
) -> Option<MicroSurprise> {
    let interval = interval as usize;
    if interval == 0 || beat_count == 0 || beat_count % interval != 0 {
        return None;
    }
    if !since_beat_s.is_finite() || !window_s.is_finite() || window_s <= 0.0 {
        return None;
    }
    if !(0.0..window_s).contains(&since_beat_s) {
        return None;
    }
    let kind = match (beat_count / interval) % 3 {
        1 => SurpriseKind::RgbSplit,
        2 => SurpriseKind::Flash,
        _ => SurpriseKind::Invert,
    };
    Some(MicroSurprise {
        kind,
        strength: 1.0 - since_beat_s / window_s,
    })
}

/// Overlay `surprise` on the whole canvas.
pub fn draw_surprise(canvas: &mut dyn Canvas2d, surprise: &MicroSurprise, palette: &[Rgb; 3]) {
    let (w, h) = canvas.size().as_f64();
    let k = surprise.strength.clamp(0.0, 1.0);
    if k <= 0.0 {
        return;
    }
    let full = Rect::new(0.0, 0.0, w, h);

    canvas.save();
    canvas.set_transform(Affine::IDENTITY);
    canvas.set_global_alpha(1.0);
    match surprise.kind {
        SurpriseKind::Flash => {
            canvas.fill_rect(full, palette[2].mix(Rgb::WHITE, 0.5).with_alpha(0.35 * k));
        }
        SurpriseKind::Invert => {
            canvas.set_blend(BlendMode::Difference);
            canvas.fill_rect(full, Rgb::WHITE.with_alpha(k));
        }
        SurpriseKind::RgbSplit => {
            let shift = 6.0 * k;
            canvas.set_blend(BlendMode::Lighter);
            let red = Rgb::new(255, 0, 40).with_alpha(0.12 * k);
            let cyan = Rgb::new(0, 220, 255).with_alpha(0.12 * k);
            canvas.fill_rect(full + Vec2::new(-shift, 0.0), red);
            canvas.fill_rect(full + Vec2::new(shift, 0.0), cyan);
        }
    }
    canvas.restore();
}

#[cfg(test)]
#[path = "../../tests/unit/render/surprise.rs"]
mod tests;
