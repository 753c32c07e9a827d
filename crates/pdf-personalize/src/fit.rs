//! Auto-fit layout for the salutation and name overlays
//!
//! The name is shrunk until it fits a maximum width or a minimum size is
//! reached. Left-to-right names are split into a bold lead word and a
//! regular remainder drawn in two colours on one canvas; right-to-left names
//! are fitted and drawn as a single right-aligned run.

use crate::constants::{FALLBACK_SPACE_RATIO, NAME_LINE_HEIGHT_RATIO, SHRINK_FACTOR};
use crate::fonts::FontCatalog;
use crate::options::LayoutOptions;
use crate::raster::{self, StyleSpec, TextRasterizer, blank_raster};
use crate::types::*;
use log::{debug, error};

// =============================================================================
// Shrink Loop
// =============================================================================

/// State of the shrink loop after measuring one candidate size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitState {
    /// Too wide and above the floor: try the next candidate
    Measuring { size: f32, width: f32 },
    /// Within the maximum width
    Fits { size: f32, width: f32 },
    /// Still too wide, but the floor size has been reached
    FloorReached { size: f32, width: f32 },
}

impl FitState {
    pub fn classify(size: f32, width: f32, max_width: f32, min_size: f32) -> Self {
        if width <= max_width {
            FitState::Fits { size, width }
        } else if size <= min_size {
            FitState::FloorReached { size, width }
        } else {
            FitState::Measuring { size, width }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FitState::Measuring { .. })
    }
}

/// Size chosen by the shrink loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOutcome {
    pub size: f32,
    /// Measured width at `size`
    pub width: f32,
    /// True when the loop stopped on the floor rather than on a fit
    pub floor_reached: bool,
}

/// Candidate sizes: `base`, then `floor(size × 0.9)` clamped to `min_size`,
/// ending with `min_size` itself
pub fn shrink_sizes(base: f32, min_size: f32) -> impl Iterator<Item = f32> {
    std::iter::successors(Some(base), move |&size| {
        (size > min_size).then(|| (size * SHRINK_FACTOR).floor().max(min_size))
    })
}

/// Walk the candidates until one fits or the floor is reached.
///
/// If the candidates run out first, the last one is reported as the floor.
/// Returns `None` only for an empty candidate sequence.
pub fn fit_text(
    candidates: impl IntoIterator<Item = f32>,
    max_width: f32,
    min_size: f32,
    mut measure: impl FnMut(f32) -> f32,
) -> Option<FitOutcome> {
    let mut last = None;
    for size in candidates {
        let width = measure(size);
        let state = FitState::classify(size, width, max_width, min_size);
        debug!("Fit candidate {}px measured {:.1}px: {:?}", size, width, state);
        match state {
            FitState::Fits { size, width } => {
                return Some(FitOutcome {
                    size,
                    width,
                    floor_reached: false,
                });
            }
            FitState::FloorReached { size, width } | FitState::Measuring { size, width } => {
                last = Some(FitOutcome {
                    size,
                    width,
                    floor_reached: true,
                });
                if state.is_terminal() {
                    break;
                }
            }
        }
    }
    last
}

// =============================================================================
// Name Styling
// =============================================================================

/// Fonts, colours and fit bounds for the name overlay
#[derive(Debug, Clone, PartialEq)]
pub struct NameStyle {
    pub bold_family: String,
    pub regular_family: String,
    /// Colour of the first word
    pub lead_color: Rgb,
    /// Colour of the remainder, and of whole right-to-left names
    pub rest_color: Rgb,
    pub direction: Direction,
    pub base_size: f32,
    pub min_size: f32,
    pub max_width: f32,
}

impl NameStyle {
    pub fn for_language(language: Language, layout: &LayoutOptions) -> Self {
        let fonts = language.fonts();
        Self {
            bold_family: fonts.bold.to_string(),
            regular_family: fonts.regular.to_string(),
            lead_color: layout.accent_color,
            rest_color: layout.body_color,
            direction: language.direction(),
            base_size: layout.name_font_size,
            min_size: layout.name_min_font_size,
            max_width: layout.name_max_width,
        }
    }
}

/// Rendered name overlay and the size it was fitted at
#[derive(Debug, Clone, PartialEq)]
pub struct NameRender {
    pub raster: RasterResult,
    pub size: f32,
    pub width: f32,
    pub floor_reached: bool,
}

/// Split at the first whitespace into the lead word and the remainder
pub fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(char::is_whitespace) {
        Some((lead, rest)) => (lead, rest),
        None => (name, ""),
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Renders overlays, shrinking the name to fit
#[derive(Debug, Clone, Copy)]
pub struct AutoFitLayout<'a> {
    rasterizer: TextRasterizer<'a>,
}

impl<'a> AutoFitLayout<'a> {
    pub fn new(fonts: &'a FontCatalog) -> Self {
        Self {
            rasterizer: TextRasterizer::new(fonts),
        }
    }

    /// Single run at the nominal size; the salutation always fits
    pub fn render_salutation(&self, text: &str, style: &StyleSpec) -> RasterResult {
        self.rasterizer.render(text, style)
    }

    pub fn render_name(&self, name: &str, style: &NameStyle) -> NameRender {
        match style.direction {
            Direction::RightToLeft => self.render_single_run(name, style),
            Direction::LeftToRight => self.render_segments(name, style),
        }
    }

    fn render_single_run(&self, name: &str, style: &NameStyle) -> NameRender {
        let outcome = fit_text(
            shrink_sizes(style.base_size, style.min_size),
            style.max_width,
            style.min_size,
            |size| {
                self.rasterizer
                    .measure(name, &style.bold_family, size, style.direction)
                    .glyph_width(size)
            },
        );
        let Some(outcome) = outcome else {
            return placeholder(style.base_size);
        };

        let raster = self.rasterizer.render(
            name,
            &StyleSpec::new(
                style.bold_family.clone(),
                outcome.size,
                style.rest_color,
                style.direction,
            ),
        );
        NameRender {
            raster,
            size: outcome.size,
            width: outcome.width,
            floor_reached: outcome.floor_reached,
        }
    }

    fn render_segments(&self, name: &str, style: &NameStyle) -> NameRender {
        let (lead, rest) = split_name(name);

        let outcome = fit_text(
            shrink_sizes(style.base_size, style.min_size),
            style.max_width,
            style.min_size,
            |size| self.segment_widths(lead, rest, style, size).total(),
        );
        let Some(outcome) = outcome else {
            return placeholder(style.base_size);
        };

        let raster = match self.draw_segments(lead, rest, style, outcome.size) {
            Ok(raster) => raster,
            Err(e) => {
                error!("Rendering name '{}' failed, using blank image: {}", name, e);
                blank_raster()
            }
        };
        NameRender {
            raster,
            size: outcome.size,
            width: outcome.width,
            floor_reached: outcome.floor_reached,
        }
    }

    fn segment_widths(&self, lead: &str, rest: &str, style: &NameStyle, size: f32) -> SegmentWidths {
        let lead_width = self
            .rasterizer
            .measure(lead, &style.bold_family, size, Direction::LeftToRight)
            .glyph_width(size);

        if rest.is_empty() {
            return SegmentWidths {
                lead: lead_width,
                space: 0.0,
                rest: None,
            };
        }

        let space = self
            .rasterizer
            .measure(" ", &style.regular_family, size, Direction::LeftToRight)
            .advance;
        let space = if space > 0.0 {
            space
        } else {
            (size * FALLBACK_SPACE_RATIO).ceil()
        };
        let rest_width = self
            .rasterizer
            .measure(rest, &style.regular_family, size, Direction::LeftToRight)
            .glyph_width(size);

        SegmentWidths {
            lead: lead_width,
            space,
            rest: Some(rest_width),
        }
    }

    /// Both segments on one canvas, top-aligned, each in its own colour
    fn draw_segments(
        &self,
        lead: &str,
        rest: &str,
        style: &NameStyle,
        size: f32,
    ) -> Result<RasterResult> {
        raster::check_size(size)?;

        let widths = self.segment_widths(lead, rest, style, size);
        let mut pixmap = raster::new_canvas(widths.total(), (size * NAME_LINE_HEIGHT_RATIO).ceil())?;

        let lead_top = self
            .rasterizer
            .measure(lead, &style.bold_family, size, Direction::LeftToRight)
            .font_ascender;
        self.rasterizer.draw_text(
            &mut pixmap,
            lead,
            &style.bold_family,
            size,
            style.lead_color,
            Direction::LeftToRight,
            0.0,
            lead_top,
        );

        if widths.rest.is_some() {
            let rest_top = self
                .rasterizer
                .measure(rest, &style.regular_family, size, Direction::LeftToRight)
                .font_ascender;
            self.rasterizer.draw_text(
                &mut pixmap,
                rest,
                &style.regular_family,
                size,
                style.rest_color,
                Direction::LeftToRight,
                widths.lead + widths.space,
                rest_top,
            );
        }

        raster::encode(&pixmap)
    }
}

#[derive(Debug, Clone, Copy)]
struct SegmentWidths {
    lead: f32,
    space: f32,
    rest: Option<f32>,
}

impl SegmentWidths {
    fn total(&self) -> f32 {
        let rest = self.rest.map(|rest| self.space + rest).unwrap_or(0.0);
        (self.lead + rest).ceil()
    }
}

fn placeholder(size: f32) -> NameRender {
    NameRender {
        raster: blank_raster(),
        size,
        width: 1.0,
        floor_reached: false,
    }
}
