//! Mapping from design-tool coordinates to PDF page coordinates
//!
//! Design tools put the origin at the top-left with y growing downward.
//! PDF pages put it at the bottom-left with y growing upward. Overlays are
//! anchored at a left margin for left-to-right text and against a right
//! margin for right-to-left text.

use crate::types::Direction;

/// Lower-left corner of an element on the output page, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

/// Everything needed to place one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSpec {
    /// Distance from the page top to the element's top edge
    pub design_top: f32,
    /// Left margin (left-to-right) or right margin (right-to-left)
    pub inset: f32,
    pub element_width: f32,
    pub element_height: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub direction: Direction,
}

impl PlacementSpec {
    pub fn place(&self) -> PagePoint {
        PagePoint {
            x: anchor_x(
                self.direction,
                self.page_width,
                self.inset,
                self.element_width,
            ),
            y: design_to_page_y(self.page_height, self.design_top, self.element_height),
        }
    }
}

/// `page_height − design_top − element_height`
pub fn design_to_page_y(page_height: f32, design_top: f32, element_height: f32) -> f32 {
    page_height - design_top - element_height
}

/// Left edge of an element anchored by writing direction
pub fn anchor_x(direction: Direction, page_width: f32, inset: f32, element_width: f32) -> f32 {
    match direction {
        Direction::LeftToRight => inset,
        Direction::RightToLeft => page_width - inset - element_width,
    }
}

/// Scale (width, height) down proportionally so width never exceeds `max_width`
pub fn clamp_width(width: f32, height: f32, max_width: f32) -> (f32, f32) {
    if width > max_width && width > 0.0 {
        let k = max_width / width;
        (max_width, height * k)
    } else {
        (width, height)
    }
}
