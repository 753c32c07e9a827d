//! Glyph outline filling

use super::metrics::ShapedRun;
use crate::types::Rgb;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};
use ttf_parser::{GlyphId, OutlineBuilder};

/// Fill every glyph of `run` with its pen origin at (`origin_x`, `baseline_y`).
///
/// Returns the number of glyphs that produced an outline.
pub(crate) fn fill_run(
    pixmap: &mut Pixmap,
    font_data: &[u8],
    run: &ShapedRun,
    origin_x: f32,
    baseline_y: f32,
    color: Rgb,
) -> usize {
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return 0;
    };

    let paint = fill_paint(color);
    let mut drawn = 0usize;
    for glyph in &run.glyphs {
        // Pixmap y grows downward, font units grow upward
        let mut builder =
            GlyphPathBuilder::new(origin_x + glyph.x, baseline_y - glyph.y, run.scale);
        if face
            .outline_glyph(GlyphId(glyph.glyph_id), &mut builder)
            .is_none()
        {
            continue;
        }
        let Some(path) = builder.finish() else {
            continue;
        };
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        drawn += 1;
    }
    drawn
}

fn fill_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
