use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::foundation::error::{DanceError, DanceResult};

/// Face used when no font file is configured (DejaVu Sans, Bitstream Vera license).
pub static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// A line of text shaped at one size, ready for a glyph run.
#[derive(Clone, Debug, Default)]
pub struct ShapedText {
    /// Glyphs positioned relative to the layout's top-left corner.
    pub glyphs: Vec<vello_cpu::Glyph>,
    /// Advance width including trailing whitespace.
    pub width: f64,
    pub height: f64,
    pub font_size: f32,
}

struct Shaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
}

impl Shaper {
    fn layout(&mut self, text: &str, size_px: f32) -> parley::Layout<()> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// One registered face plus the Parley contexts that shape text with it.
///
/// Cloning is cheap: clones share the same contexts, so a recording surface and a raster surface
/// built from the same book measure identically.
#[derive(Clone)]
pub struct FontBook {
    shaper: Arc<Mutex<Shaper>>,
    font: vello_cpu::peniko::FontData,
    family: Arc<str>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl FontBook {
    /// Register a face from raw TrueType/OpenType bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> DanceResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| DanceError::validation("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| DanceError::validation("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family, "font registered");
        Ok(Self {
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
            family: Arc::from(family.as_str()),
            shaper: Arc::new(Mutex::new(Shaper {
                font_ctx,
                layout_ctx: parley::LayoutContext::new(),
                family,
            })),
        })
    }

    /// Load a face from a font file.
    pub fn from_path(path: &Path) -> DanceResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            DanceError::validation(format!("read font \"{}\": {e}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Process-wide book over [`BUNDLED_FONT`].
    pub fn bundled() -> Self {
        static BOOK: OnceLock<FontBook> = OnceLock::new();
        BOOK.get_or_init(|| match Self::from_bytes(BUNDLED_FONT.to_vec()) {
            Ok(book) => book,
            Err(e) => {
                // Without a face every run shapes to nothing and measures zero.
                tracing::error!(error = %e, "bundled font failed to register");
                Self {
                    shaper: Arc::new(Mutex::new(Shaper {
                        font_ctx: parley::FontContext::default(),
                        layout_ctx: parley::LayoutContext::new(),
                        family: String::new(),
                    })),
                    font: vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(Vec::new()),
                        0,
                    ),
                    family: Arc::from(""),
                }
            }
        })
        .clone()
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Advance width of `text` at `size_px`, trailing whitespace included.
    pub fn measure(&self, text: &str, size_px: f64) -> f64 {
        let Some(size) = usable_size(text, size_px) else {
            return 0.0;
        };
        let mut shaper = self.shaper.lock().unwrap_or_else(PoisonError::into_inner);
        f64::from(shaper.layout(text, size).full_width())
    }

    /// Shape `text` into positioned glyphs.
    pub fn shape(&self, text: &str, size_px: f64) -> ShapedText {
        let Some(size) = usable_size(text, size_px) else {
            return ShapedText::default();
        };
        let mut shaper = self.shaper.lock().unwrap_or_else(PoisonError::into_inner);
        let layout = shaper.layout(text, size);

        let mut glyphs = Vec::new();
        let mut font_size = size;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                font_size = run.run().font_size();
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        ShapedText {
            glyphs,
            width: f64::from(layout.full_width()),
            height: f64::from(layout.height()),
            font_size,
        }
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::bundled()
    }
}

fn usable_size(text: &str, size_px: f64) -> Option<f32> {
    if text.is_empty() || !size_px.is_finite() || size_px <= 0.0 {
        return None;
    }
    Some(size_px as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
