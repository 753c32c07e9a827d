//! Shared constants for document personalization
//!
//! This module centralizes the design measurements and rendering ratios
//! used throughout composition.

use crate::types::Rgb;

// =============================================================================
// Design Layout (design-tool pixels, 1px = 1pt on the output page)
// =============================================================================

/// Font size of the salutation line
pub const SALUTATION_FONT_SIZE: f32 = 64.0;

/// Distance from the page top to the salutation overlay
pub const SALUTATION_TOP: f32 = 1006.0;

/// Left margin for left-to-right overlays
pub const LEFT_MARGIN: f32 = 126.0;

/// Right margin for right-to-left overlays
pub const RIGHT_MARGIN: f32 = 126.0;

/// Starting font size of the name line
pub const NAME_FONT_SIZE: f32 = 128.0;

/// Smallest font size the name shrink loop may reach
pub const NAME_MIN_FONT_SIZE: f32 = 56.0;

/// Widest the name overlay may be on the page
pub const NAME_MAX_WIDTH: f32 = 968.0;

/// Distance from the page top to the name overlay
pub const NAME_TOP: f32 = 1059.0;

/// Salutation colour, also used for the first word of the name
pub const ACCENT_COLOR: Rgb = Rgb::new(0x96, 0x7E, 0x5A);

/// Colour of the remainder of the name
pub const BODY_COLOR: Rgb = Rgb::new(0x30, 0x25, 0x25);

// =============================================================================
// Rasterization
// =============================================================================

/// Horizontal canvas padding as a fraction of font size
pub const PAD_X_RATIO: f32 = 0.20;

/// Vertical canvas padding as a fraction of font size
pub const PAD_Y_RATIO: f32 = 0.18;

/// Ascent estimate when no glyph ink is available
pub const FALLBACK_ASCENT_RATIO: f32 = 0.9;

/// Descent estimate when no glyph ink is available
pub const FALLBACK_DESCENT_RATIO: f32 = 0.35;

/// Lower bound on a run's width, guards empty strings and missing glyphs
pub const MIN_GLYPH_WIDTH_RATIO: f32 = 0.4;

/// Approximate advance per character for unregistered families
pub const ESTIMATED_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Inter-word space when the font reports none
pub const FALLBACK_SPACE_RATIO: f32 = 0.2;

/// Canvas height of the two-segment name as a fraction of font size
pub const NAME_LINE_HEIGHT_RATIO: f32 = 1.4;

/// Factor applied to the font size on each shrink step
pub const SHRINK_FACTOR: f32 = 0.9;

// =============================================================================
// Remote Fetch
// =============================================================================

/// Per-attempt timeout for tail downloads
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 60_000;

/// Attempts made before a tail download is declared failed
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Base of the exponential backoff between attempts
pub const DEFAULT_FETCH_BACKOFF_MS: u64 = 1_000;

/// User agent sent with tail downloads
pub const FETCH_USER_AGENT: &str = concat!("pdf-personalize/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);
