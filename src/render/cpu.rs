use vello_cpu::kurbo::Shape as _;

use crate::{
    foundation::{
        core::{Affine, CanvasSize, Point, Rect, Rgb, Rgba},
        error::{DanceError, DanceResult},
    },
    render::{
        canvas::{
            BlendMode, Canvas2d, DrawState, StateStack, TextAlign, aligned_left, point_is_finite,
            rect_is_finite,
        },
        text::FontBook,
    },
};

/// A rendered frame in RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Raster surface backed by `vello_cpu`. Text is shaped by a [`FontBook`] and drawn as glyph runs.
pub struct CpuCanvas {
    size: CanvasSize,
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    fonts: FontBook,
    states: StateStack,
}

impl std::fmt::Debug for CpuCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCanvas")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl CpuCanvas {
    /// Raster surface using the bundled face.
    pub fn new(size: CanvasSize) -> DanceResult<Self> {
        Self::with_fonts(size, FontBook::bundled())
    }

    pub fn with_fonts(size: CanvasSize, fonts: FontBook) -> DanceResult<Self> {
        let width = u16::try_from(size.width)
            .map_err(|_| DanceError::render("canvas width exceeds u16"))?;
        let height = u16::try_from(size.height)
            .map_err(|_| DanceError::render("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(DanceError::render("canvas size must be non-zero"));
        }
        Ok(Self {
            size,
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            fonts,
            states: StateStack::default(),
        })
    }

    /// Rasterize everything drawn since the last call and start a fresh frame.
    pub fn finish(&mut self) -> FrameRgba {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.states.reset();

        FrameRgba {
            width: self.size.width,
            height: self.size.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn paint(&mut self, color: Rgba, state: &DrawState) -> bool {
        let c = color.fade(state.alpha);
        if c.alpha_u8() == 0 {
            return false;
        }
        self.ctx.set_transform(affine_to_cpu(state.transform));
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            c.rgb.r,
            c.rgb.g,
            c.rgb.b,
            c.alpha_u8(),
        ));
        true
    }

    fn with_blend(&mut self, state: &DrawState, draw: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let layer = blend_to_cpu(state.blend);
        if let Some(mode) = layer {
            self.ctx.push_blend_layer(mode);
        }
        draw(&mut self.ctx);
        if layer.is_some() {
            self.ctx.pop_layer();
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn blend_to_cpu(mode: BlendMode) -> Option<vello_cpu::peniko::BlendMode> {
    use vello_cpu::peniko::{Compose, Mix};
    match mode {
        BlendMode::SourceOver => None,
        BlendMode::Lighter => Some(vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::Plus)),
        BlendMode::Difference => Some(vello_cpu::peniko::BlendMode::new(
            Mix::Difference,
            Compose::SrcOver,
        )),
    }
}

impl Canvas2d for CpuCanvas {
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
        let (w, h) = self.size.as_f64();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let state = self.states.current();
        if !rect_is_finite(rect) || !self.paint(color, &state) {
            return;
        }
        self.with_blend(&state, |ctx| ctx.fill_rect(&rect_to_cpu(rect)));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        let state = self.states.current();
        if !point_is_finite(center) || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        if !self.paint(color, &state) {
            return;
        }
        let path = vello_cpu::kurbo::Circle::new((center.x, center.y), radius).to_path(0.1);
        self.with_blend(&state, |ctx| ctx.fill_path(&path));
    }

    fn fill_text(
        &mut self,
        text: &str,
        origin: Point,
        size_px: f64,
        color: Rgba,
        align: TextAlign,
    ) {
        let state = self.states.current();
        if text.is_empty() || !point_is_finite(origin) || !size_px.is_finite() || size_px <= 0.0 {
            return;
        }
        if !self.paint(color, &state) {
            return;
        }
        let shaped = self.fonts.shape(text, size_px);
        if shaped.glyphs.is_empty() {
            return;
        }
        // Glyphs are laid out from the top-left; center the line box on `origin.y`.
        let left = aligned_left(origin.x, shaped.width, align);
        let top = origin.y - shaped.height / 2.0;
        self.ctx
            .set_transform(affine_to_cpu(state.transform * Affine::translate((left, top))));
        let font = self.fonts.font_data().clone();
        self.with_blend(&state, |ctx| {
            ctx.glyph_run(&font)
                .font_size(shaped.font_size)
                .fill_glyphs(shaped.glyphs.into_iter());
        });
    }

    fn measure_text(&self, text: &str, size_px: f64) -> f64 {
        self.fonts.measure(text, size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
