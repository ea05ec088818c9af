use crate::foundation::{
    core::{Affine, CanvasSize, Point, Rect, Rgb, Rgba},
    math::Fnv1a64,
};
use crate::render::text::FontBook;

/// Compositing mode for subsequent draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    SourceOver,
    /// Additive ("lighter").
    Lighter,
    Difference,
}

/// Horizontal text anchoring relative to the draw position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Resolved drawing state at the time of a draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub transform: Affine,
    pub alpha: f64,
    pub blend: BlendMode,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            blend: BlendMode::SourceOver,
        }
    }
}

/// Canvas-like 2D drawing surface.
///
/// Implementations never fail inside the frame loop: draws with non-finite geometry are dropped.
pub trait Canvas2d {
    fn size(&self) -> CanvasSize;

    /// Push the current transform/alpha/blend state.
    fn save(&mut self);
    /// Pop to the last saved state. Unbalanced calls are ignored.
    fn restore(&mut self);

    fn set_transform(&mut self, transform: Affine);
    /// Post-multiply the current transform (`current * transform`).
    fn transform(&mut self, transform: Affine);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_blend(&mut self, mode: BlendMode);

    /// Fill the whole surface with an opaque color, ignoring transform and alpha.
    fn clear(&mut self, color: Rgb);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn fill_text(&mut self, text: &str, origin: Point, size_px: f64, color: Rgba, align: TextAlign);

    /// Shaped advance width of `text`, used for line fitting and word placement.
    fn measure_text(&self, text: &str, size_px: f64) -> f64;
}

/// Left edge of a text run anchored at `x`.
pub(crate) fn aligned_left(x: f64, width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    }
}

/// Save/restore stack shared by canvas implementations.
#[derive(Clone, Debug, Default)]
pub(crate) struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub(crate) fn current(&self) -> DrawState {
        self.current
    }

    pub(crate) fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub(crate) fn restore(&mut self) {
        if let Some(s) = self.saved.pop() {
            self.current = s;
        }
    }

    pub(crate) fn set_transform(&mut self, transform: Affine) {
        if affine_is_finite(transform) {
            self.current.transform = transform;
        }
    }

    pub(crate) fn transform(&mut self, transform: Affine) {
        if affine_is_finite(transform) {
            self.current.transform = self.current.transform * transform;
        }
    }

    pub(crate) fn set_alpha(&mut self, alpha: f64) {
        self.current.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub(crate) fn set_blend(&mut self, mode: BlendMode) {
        self.current.blend = mode;
    }

    pub(crate) fn reset(&mut self) {
        self.current = DrawState::default();
        self.saved.clear();
    }
}

pub(crate) fn affine_is_finite(a: Affine) -> bool {
    a.as_coeffs().iter().all(|c| c.is_finite())
}

pub(crate) fn rect_is_finite(r: Rect) -> bool {
    r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
}

pub(crate) fn point_is_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// One recorded draw call with its resolved state.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgb),
    Rect {
        rect: Rect,
        color: Rgba,
        state: DrawState,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba,
        state: DrawState,
    },
    Text {
        text: String,
        origin: Point,
        size_px: f64,
        color: Rgba,
        align: TextAlign,
        state: DrawState,
    },
}

/// 128-bit fingerprint of a recorded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl FrameFingerprint {
    /// Big-endian bytes (`hi` then `lo`).
    pub fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.hi.to_be_bytes());
        out[8..].copy_from_slice(&self.lo.to_be_bytes());
        out
    }
}

/// Recording surface: draws become [`DrawCommand`]s that can be fingerprinted or replayed.
#[derive(Clone, Debug)]
pub struct DisplayList {
    size: CanvasSize,
    fonts: FontBook,
    states: StateStack,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// Recording surface measuring text with the bundled face.
    pub fn new(size: CanvasSize) -> Self {
        Self::with_fonts(size, FontBook::bundled())
    }

    pub fn with_fonts(size: CanvasSize, fonts: FontBook) -> Self {
        Self {
            size,
            fonts,
            states: StateStack::default(),
            commands: Vec::new(),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Drop recorded commands and reset the state stack.
    pub fn reset(&mut self) {
        self.states.reset();
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text runs in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replay every recorded command onto another surface.
    pub fn replay(&self, target: &mut dyn Canvas2d) {
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Clear(c) => target.clear(*c),
                DrawCommand::Rect { rect, color, state } => {
                    apply_state(target, state);
                    target.fill_rect(*rect, *color);
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                    state,
                } => {
                    apply_state(target, state);
                    target.fill_circle(*center, *radius, *color);
                }
                DrawCommand::Text {
                    text,
                    origin,
                    size_px,
                    color,
                    align,
                    state,
                } => {
                    apply_state(target, state);
                    target.fill_text(text, *origin, *size_px, *color, *align);
                }
            }
        }
    }

    pub fn fingerprint(&self) -> FrameFingerprint {
        let mut a = Fnv1a64::new_default();
        let mut b = Fnv1a64::new(0x9ae1_6a3b_2f90_404f);
        for h in [&mut a, &mut b] {
            h.write_u64(u64::from(self.size.width));
            h.write_u64(u64::from(self.size.height));
            h.write_u64(self.commands.len() as u64);
            for cmd in &self.commands {
                write_command(h, cmd);
            }
        }

        FrameFingerprint {
            hi: a.finish(),
            lo: b.finish(),
        }
    }

    fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }
}

fn apply_state(target: &mut dyn Canvas2d, s: &DrawState) {
    target.set_transform(s.transform);
    target.set_global_alpha(s.alpha);
    target.set_blend(s.blend);
}

fn write_rgba(h: &mut Fnv1a64, c: Rgba) {
    h.write_bytes(&[c.rgb.r, c.rgb.g, c.rgb.b]);
    h.write_f64(c.alpha);
}

fn write_state(h: &mut Fnv1a64, s: &DrawState) {
    for c in s.transform.as_coeffs() {
        h.write_f64(c);
    }
    h.write_f64(s.alpha);
    h.write_u8(match s.blend {
        BlendMode::SourceOver => 0,
        BlendMode::Lighter => 1,
        BlendMode::Difference => 2,
    });
}

fn write_command(h: &mut Fnv1a64, cmd: &DrawCommand) {
    match cmd {
        DrawCommand::Clear(c) => {
            h.write_u8(0);
            h.write_bytes(&[c.r, c.g, c.b]);
        }
        DrawCommand::Rect { rect, color, state } => {
            h.write_u8(1);
            for v in [rect.x0, rect.y0, rect.x1, rect.y1] {
                h.write_f64(v);
            }
            write_rgba(h, *color);
            write_state(h, state);
        }
        DrawCommand::Circle {
            center,
            radius,
            color,
            state,
        } => {
            h.write_u8(2);
            h.write_f64(center.x);
            h.write_f64(center.y);
            h.write_f64(*radius);
            write_rgba(h, *color);
            write_state(h, state);
        }
        DrawCommand::Text {
            text,
            origin,
            size_px,
            color,
            align,
            state,
        } => {
            h.write_u8(3);
            h.write_str(text);
            h.write_f64(origin.x);
            h.write_f64(origin.y);
            h.write_f64(*size_px);
            write_rgba(h, *color);
            h.write_u8(*align as u8);
            write_state(h, state);
        }
    }
}

impl Canvas2d for DisplayList {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn save(&mut self) {
        self.states.save();
    }

    fn restore(&mut self) {
        self.states.restore();
    }

    fn set_transform(&mut self, transform: Affine) {
        self.states.set_transform(transform);
    }

    fn transform(&mut self, transform: Affine) {
        self.states.transform(transform);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.states.set_alpha(alpha);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.states.set_blend(mode);
    }

    fn clear(&mut self, color: Rgb) {
        self.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if !rect_is_finite(rect) {
            return;
        }
        let state = self.states.current();
        self.push(DrawCommand::Rect { rect, color, state });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        if !point_is_finite(center) || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let state = self.states.current();
        self.push(DrawCommand::Circle {
            center,
            radius,
            color,
            state,
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        origin: Point,
        size_px: f64,
        color: Rgba,
        align: TextAlign,
    ) {
        if text.is_empty() || !point_is_finite(origin) || !size_px.is_finite() || size_px <= 0.0 {
            return;
        }
        let state = self.states.current();
        self.push(DrawCommand::Text {
            text: text.to_owned(),
            origin,
            size_px,
            color,
            align,
            state,
        });
    }

    fn measure_text(&self, text: &str, size_px: f64) -> f64 {
        self.fonts.measure(text, size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
