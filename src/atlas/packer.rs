//! Shelf packer
//!
//! Rescales every glyph to one target height and lays them out
//! left-to-right in fixed-width rows ("shelves"), wrapping to a new
//! shelf when the current one is full. Single pass, no backtracking:
//! once placed, a glyph never moves.

use image::imageops::FilterType;
use image::RgbaImage;
use log::{debug, warn};

use crate::constants::{DEFAULT_SHEET_WIDTH, PADDING};
use crate::source::GlyphEntry;

/// Packing parameters shared by every resolution pass
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    /// Fixed sheet width; an upper bound on every shelf
    pub sheet_width: u32,
    /// Gap between glyphs and between shelves
    pub padding: u32,
    /// Resampling filter for rescaling
    pub filter: FilterType,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            sheet_width: DEFAULT_SHEET_WIDTH,
            padding: PADDING,
            filter: FilterType::Lanczos3,
        }
    }
}

/// A glyph's rectangle within one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub ch: char,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Half-open rectangles `[x, right) x [y, bottom)` intersect
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Placement paired with the rescaled pixels that go there
#[derive(Debug, Clone)]
pub struct PackedGlyph {
    pub placement: Placement,
    pub image: RgbaImage,
}

/// Output of one packer pass
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    pub target_height: u32,
    pub sheet_width: u32,
    /// `last shelf y + its height`, 0 when nothing was packed
    pub sheet_height: u32,
    pub shelf_count: u32,
    /// Glyphs in input order (duplicates included)
    pub glyphs: Vec<PackedGlyph>,
    /// Glyphs wider than the sheet after scaling
    pub oversized: Vec<char>,
}

impl PackedAtlas {
    pub fn placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.glyphs.iter().map(|g| &g.placement)
    }
}

/// Running shelf state threaded through the pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ShelfCursor {
    /// Next free X on the current shelf
    pub x: u32,
    /// Top of the current shelf
    pub y: u32,
    /// Tallest glyph on the current shelf
    pub row_height: u32,
    /// Shelves opened so far
    pub shelves: u32,
}

impl ShelfCursor {
    /// Reserve a `width` x `height` slot and return its top-left corner
    ///
    /// A fresh shelf is only opened when the current one already holds
    /// something, so an oversized glyph lands at x = 0 of its own shelf.
    /// Arithmetic saturates; a saturated cursor always wraps, and the
    /// resulting coordinates are rejected by the index writer.
    pub fn place(&mut self, width: u32, height: u32, sheet_width: u32, padding: u32) -> (u32, u32) {
        if self.x > 0 && self.x.saturating_add(width) > sheet_width {
            self.x = 0;
            self.y = self
                .y
                .saturating_add(self.row_height)
                .saturating_add(padding);
            self.row_height = 0;
            self.shelves += 1;
        }
        if self.shelves == 0 {
            self.shelves = 1;
        }

        let pos = (self.x, self.y);
        self.x = self.x.saturating_add(width).saturating_add(padding);
        self.row_height = self.row_height.max(height);
        pos
    }

    /// Sheet height needed for everything placed so far
    pub fn extent(&self) -> u32 {
        self.y.saturating_add(self.row_height)
    }
}

/// Width of a `src_width` x `src_height` image scaled to `target_height`,
/// aspect ratio preserved, never below 1
pub fn scaled_width(src_width: u32, src_height: u32, target_height: u32) -> u32 {
    let scale = target_height as f64 / src_height as f64;
    let width = (src_width as f64 * scale).round();
    (width as u32).max(1)
}

/// Rescale one glyph to `width` x `height`
fn rescale(image: &RgbaImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, filter)
}

/// Pack `entries` (in order) at `target_height`
pub fn pack(entries: &[GlyphEntry], target_height: u32, options: &PackOptions) -> PackedAtlas {
    let mut cursor = ShelfCursor::default();
    let mut glyphs = Vec::with_capacity(entries.len());
    let mut oversized = Vec::new();

    for entry in entries {
        let (src_w, src_h) = entry.image.dimensions();
        let width = scaled_width(src_w, src_h, target_height);
        if width > options.sheet_width {
            warn!(
                "U+{:04X} is {}px wide at height {}, wider than the {}px sheet",
                entry.codepoint(),
                width,
                target_height,
                options.sheet_width
            );
            oversized.push(entry.ch);
        }

        let image = rescale(&entry.image, width, target_height, options.filter);
        let (x, y) = cursor.place(width, target_height, options.sheet_width, options.padding);
        glyphs.push(PackedGlyph {
            placement: Placement {
                ch: entry.ch,
                x,
                y,
                width,
                height: target_height,
            },
            image,
        });
    }

    let sheet_height = cursor.extent();
    debug!(
        "Packed {} glyphs at {}px: {} shelves, sheet {}x{}",
        glyphs.len(),
        target_height,
        cursor.shelves,
        options.sheet_width,
        sheet_height
    );

    PackedAtlas {
        target_height,
        sheet_width: options.sheet_width,
        sheet_height,
        shelf_count: cursor.shelves,
        glyphs,
        oversized,
    }
}
