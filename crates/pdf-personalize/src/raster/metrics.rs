//! Text shaping and measurement

use crate::constants::{
    ESTIMATED_CHAR_WIDTH_RATIO, FALLBACK_ASCENT_RATIO, FALLBACK_DESCENT_RATIO,
    MIN_GLYPH_WIDTH_RATIO,
};
use crate::types::Direction;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use ttf_parser::GlyphId;

/// Horizontal ink extents and vertical ink extents of a run, in pixels.
///
/// `left` and `right` are signed offsets from the pen origin (x grows right);
/// `ascent` and `descent` are distances above and below the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkBounds {
    pub left: f32,
    pub right: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// Measurement of one styled run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Pen advance of the whole run
    pub advance: f32,
    /// Glyph ink box, absent when nothing inks (empty text, spaces, unknown font)
    pub ink: Option<InkBounds>,
    /// Ink ascent, or the estimate when no ink is available
    pub ascent: f32,
    /// Ink descent, or the estimate when no ink is available
    pub descent: f32,
    /// Font ascender, used as the top baseline offset
    pub font_ascender: f32,
}

impl TextMetrics {
    /// Metrics for a family that is not registered
    pub fn estimated(text: &str, size: f32) -> Self {
        let chars = text.chars().count() as f32;
        Self {
            advance: chars * size * ESTIMATED_CHAR_WIDTH_RATIO,
            ink: None,
            ascent: (size * FALLBACK_ASCENT_RATIO).ceil(),
            descent: (size * FALLBACK_DESCENT_RATIO).ceil(),
            font_ascender: (size * FALLBACK_ASCENT_RATIO).ceil(),
        }
    }

    pub fn ink_left(&self) -> f32 {
        self.ink.map(|ink| ink.left).unwrap_or(0.0)
    }

    pub fn ink_width(&self) -> f32 {
        self.ink.map(|ink| ink.right - ink.left).unwrap_or(0.0)
    }

    /// Width used for layout: never below the advance or `0.4 × size`
    pub fn glyph_width(&self, size: f32) -> f32 {
        self.ink_width()
            .max(self.advance)
            .max((size * MIN_GLYPH_WIDTH_RATIO).ceil())
    }
}

/// A positioned glyph, offsets in pixels from the run origin (y up)
#[derive(Debug, Clone, Copy)]
pub(crate) struct ShapedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct ShapedRun {
    pub glyphs: Vec<ShapedGlyph>,
    pub advance: f32,
    /// Font units to pixels
    pub scale: f32,
}

/// Shape `text` into visual-order glyph positions.
///
/// Right-to-left runs come back already reordered, so the pen always moves
/// right and the run occupies `[0, advance]`.
pub(crate) fn shape_run(
    font_data: &[u8],
    text: &str,
    size: f32,
    direction: Direction,
) -> Option<ShapedRun> {
    let face = HbFace::from_slice(font_data, 0)?;
    let units_per_em = face.units_per_em().max(1) as f32;
    let scale = size / units_per_em;

    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    buffer.set_direction(match direction {
        Direction::LeftToRight => HbDirection::LeftToRight,
        Direction::RightToLeft => HbDirection::RightToLeft,
    });

    let output = rustybuzz::shape(&face, &[], buffer);
    let infos = output.glyph_infos();
    let positions = output.glyph_positions();
    if infos.len() != positions.len() {
        return None;
    }

    let mut glyphs = Vec::with_capacity(infos.len());
    let mut pen_x = 0.0f32;
    let mut pen_y = 0.0f32;
    for (info, pos) in infos.iter().zip(positions.iter()) {
        let gid = info.glyph_id as u16;
        if gid != 0 {
            glyphs.push(ShapedGlyph {
                glyph_id: gid,
                x: pen_x + pos.x_offset as f32 * scale,
                y: pen_y + pos.y_offset as f32 * scale,
            });
        }
        pen_x += pos.x_advance as f32 * scale;
        pen_y += pos.y_advance as f32 * scale;
    }

    Some(ShapedRun {
        glyphs,
        advance: pen_x,
        scale,
    })
}

/// Measure a shaped run against the face's glyph bounding boxes
pub(crate) fn measure_run(font_data: &[u8], run: &ShapedRun, size: f32) -> Option<TextMetrics> {
    let face = ttf_parser::Face::parse(font_data, 0).ok()?;

    let mut ink: Option<InkBounds> = None;
    for glyph in &run.glyphs {
        let Some(bbox) = face.glyph_bounding_box(GlyphId(glyph.glyph_id)) else {
            continue;
        };
        let glyph_ink = InkBounds {
            left: glyph.x + bbox.x_min as f32 * run.scale,
            right: glyph.x + bbox.x_max as f32 * run.scale,
            ascent: glyph.y + bbox.y_max as f32 * run.scale,
            descent: -(glyph.y + bbox.y_min as f32 * run.scale),
        };
        ink = Some(match ink {
            None => glyph_ink,
            Some(acc) => InkBounds {
                left: acc.left.min(glyph_ink.left),
                right: acc.right.max(glyph_ink.right),
                ascent: acc.ascent.max(glyph_ink.ascent),
                descent: acc.descent.max(glyph_ink.descent),
            },
        });
    }

    let (ascent, descent) = match ink {
        Some(ink) => (ink.ascent, ink.descent),
        None => (
            (size * FALLBACK_ASCENT_RATIO).ceil(),
            (size * FALLBACK_DESCENT_RATIO).ceil(),
        ),
    };

    Some(TextMetrics {
        advance: run.advance,
        ink,
        ascent,
        descent,
        font_ascender: face.ascender() as f32 * run.scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_metrics() {
        let metrics = TextMetrics::estimated("Ahmed", 100.0);
        assert_eq!(metrics.advance, 250.0);
        assert_eq!(metrics.ascent, 90.0);
        assert_eq!(metrics.descent, 35.0);
        assert!(metrics.ink.is_none());
    }

    #[test]
    fn test_glyph_width_floor_for_empty_text() {
        let metrics = TextMetrics::estimated("", 64.0);
        assert_eq!(metrics.advance, 0.0);
        assert_eq!(metrics.glyph_width(64.0), 26.0);
    }

    #[test]
    fn test_glyph_width_prefers_ink_when_wider() {
        let metrics = TextMetrics {
            advance: 100.0,
            ink: Some(InkBounds {
                left: -4.0,
                right: 110.0,
                ascent: 50.0,
                descent: 10.0,
            }),
            ascent: 50.0,
            descent: 10.0,
            font_ascender: 60.0,
        };
        assert_eq!(metrics.ink_width(), 114.0);
        assert_eq!(metrics.glyph_width(64.0), 114.0);
        assert_eq!(metrics.ink_left(), -4.0);
    }

    #[test]
    fn test_shape_rejects_non_font() {
        assert!(shape_run(b"nope", "abc", 12.0, Direction::LeftToRight).is_none());
    }
}
