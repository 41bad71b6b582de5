//! Global constants for noto-atlas
//!
//! Consolidates packing defaults, archive naming, and output naming
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Packing Constants
// ============================================================================

/// Gap in pixels between neighbouring glyphs and between shelves.
/// Keeps bilinear sampling in the renderer from bleeding across glyphs.
pub const PADDING: u32 = 2;

/// Default atlas sheet width in pixels
pub const DEFAULT_SHEET_WIDTH: u32 = 4096;

/// Largest value a placement field can hold in the index file
pub const MAX_INDEX_COORD: u32 = u16::MAX as u32;

// ============================================================================
// Archive Layout
// ============================================================================

/// Archive subdirectory holding the single-rendition rasters
pub const DEFAULT_RASTER_DIR: &str = "png/128";

/// Raster file name prefix (`emoji_u1f600.png`)
pub const RASTER_PREFIX: &str = "emoji_u";

/// Raster file name suffix
pub const RASTER_SUFFIX: &str = ".png";

/// Separator between codepoints in sequence file names (`emoji_u1f468_200d_1f469.png`)
pub const SEQUENCE_SEPARATOR: char = '_';

/// Longest hex string that can name a Unicode scalar value
pub const MAX_HEX_DIGITS: usize = 6;

/// Upper bound on the buffer reserved from an entry's declared size
pub const MAX_ENTRY_PREALLOC: usize = 1 << 20;

// ============================================================================
// Default Paths
// ============================================================================

/// Archive read when no path is given
pub const DEFAULT_ARCHIVE: &str = "noto-emoji-main.zip";

/// Output directory used when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "assets/emoji";

/// Output file stem prefix (`noto_low.png`, `noto_low.bin`)
pub const OUTPUT_PREFIX: &str = "noto_";

// ============================================================================
// Index Format
// ============================================================================

/// Header size: u32 width, u32 height, u32 count
pub const INDEX_HEADER_LEN: usize = 12;

/// Record size: u32 codepoint, u16 x, u16 y, u16 width, u16 height
pub const INDEX_RECORD_LEN: usize = 12;
