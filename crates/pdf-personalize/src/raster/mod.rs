//! Text rasterization
//!
//! Renders a single styled run into a transparent bitmap sized to the
//! run's glyph bounds plus padding:
//! - Shaping via rustybuzz (joins Arabic, reorders right-to-left runs)
//! - Ink bounds via ttf-parser glyph boxes
//! - Outline filling via tiny-skia

mod glyph;
mod metrics;

pub use metrics::{InkBounds, TextMetrics};

use crate::constants::{PAD_X_RATIO, PAD_Y_RATIO};
use crate::fonts::FontCatalog;
use crate::types::*;
use log::{debug, error, warn};
use tiny_skia::Pixmap;

/// Style of one text run
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    pub family: String,
    pub size: f32,
    pub color: Rgb,
    pub direction: Direction,
}

impl StyleSpec {
    pub fn new(family: impl Into<String>, size: f32, color: Rgb, direction: Direction) -> Self {
        Self {
            family: family.into(),
            size,
            color,
            direction,
        }
    }
}

/// Renders text runs using the families of a [`FontCatalog`]
#[derive(Debug, Clone, Copy)]
pub struct TextRasterizer<'a> {
    fonts: &'a FontCatalog,
}

impl<'a> TextRasterizer<'a> {
    pub fn new(fonts: &'a FontCatalog) -> Self {
        Self { fonts }
    }

    /// Measure `text` at `size` in `family`.
    ///
    /// Unregistered families get [`TextMetrics::estimated`].
    pub fn measure(&self, text: &str, family: &str, size: f32, direction: Direction) -> TextMetrics {
        self.fonts
            .resolve(family)
            .and_then(|font| {
                let run = metrics::shape_run(font.data(), text, size, direction)?;
                metrics::measure_run(font.data(), &run, size)
            })
            .unwrap_or_else(|| {
                debug!("Estimating metrics for unregistered family '{}'", family);
                TextMetrics::estimated(text, size)
            })
    }

    /// Render `text` into a padded, transparent bitmap.
    ///
    /// Never fails: any rendering error yields a 1x1 transparent image so the
    /// surrounding document can still be delivered.
    pub fn render(&self, text: &str, style: &StyleSpec) -> RasterResult {
        match self.try_render(text, style) {
            Ok(raster) => raster,
            Err(e) => {
                error!("Rendering '{}' failed, using blank image: {}", text, e);
                blank_raster()
            }
        }
    }

    /// Render `text`, surfacing errors instead of substituting a blank image
    pub fn try_render(&self, text: &str, style: &StyleSpec) -> Result<RasterResult> {
        check_size(style.size)?;

        let size = style.size;
        let metrics = self.measure(text, &style.family, size, style.direction);

        let glyph_width = metrics.glyph_width(size);
        let pad_x = (size * PAD_X_RATIO).ceil();
        let pad_y = (size * PAD_Y_RATIO).ceil();

        let width = (glyph_width + pad_x * 2.0).ceil();
        let height = (metrics.ascent + metrics.descent + pad_y * 2.0).ceil();
        let mut pixmap = new_canvas(width, height)?;

        let baseline_y = pad_y + metrics.ascent;
        let origin_x = match style.direction {
            Direction::LeftToRight => pad_x - metrics.ink_left(),
            // Right-aligned: the run ends at the right padding
            Direction::RightToLeft => pixmap.width() as f32 - pad_x - metrics.advance,
        };

        self.draw_text(
            &mut pixmap,
            text,
            &style.family,
            size,
            style.color,
            style.direction,
            origin_x,
            baseline_y,
        );

        encode(&pixmap)
    }

    /// Draw `text` with its pen origin at (`origin_x`, `baseline_y`)
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw_text(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        family: &str,
        size: f32,
        color: Rgb,
        direction: Direction,
        origin_x: f32,
        baseline_y: f32,
    ) -> usize {
        if text.is_empty() {
            return 0;
        }
        let Some(font) = self.fonts.resolve(family) else {
            warn!("Font family '{}' is not registered, '{}' left blank", family, text);
            return 0;
        };
        let Some(run) = metrics::shape_run(font.data(), text, size, direction) else {
            warn!("Font family '{}' could not shape '{}'", family, text);
            return 0;
        };
        glyph::fill_run(pixmap, font.data(), &run, origin_x, baseline_y, color)
    }
}

/// The 1x1 transparent placeholder used after render failures
pub fn blank_raster() -> RasterResult {
    let png = Pixmap::new(1, 1)
        .and_then(|pixmap| pixmap.encode_png().ok())
        .unwrap_or_default();
    RasterResult {
        width: 1,
        height: 1,
        png,
    }
}

pub(crate) fn check_size(size: f32) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(PersonalizeError::Render(format!(
            "invalid font size {}",
            size
        )))
    }
}

/// Allocate a transparent canvas of at least 1x1 pixels
pub(crate) fn new_canvas(width: f32, height: f32) -> Result<Pixmap> {
    if !(width.is_finite() && height.is_finite()) {
        return Err(PersonalizeError::Render(format!(
            "invalid canvas size {}x{}",
            width, height
        )));
    }
    let w = width.ceil().max(1.0) as u32;
    let h = height.ceil().max(1.0) as u32;
    Pixmap::new(w, h)
        .ok_or_else(|| PersonalizeError::Render(format!("cannot allocate {}x{} canvas", w, h)))
}

pub(crate) fn encode(pixmap: &Pixmap) -> Result<RasterResult> {
    let png = pixmap
        .encode_png()
        .map_err(|e| PersonalizeError::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(RasterResult {
        width: pixmap.width(),
        height: pixmap.height(),
        png,
    })
}
