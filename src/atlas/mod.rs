//! Atlas construction
//!
//! Handles:
//! - Shelf packing of rescaled glyphs
//! - Sheet compositing and PNG encoding
//! - Binary index serialization

pub mod index;
pub mod packer;
pub mod sheet;

pub use index::{AtlasIndex, IndexCount, IndexRecord};
pub use packer::{pack, PackOptions, PackedAtlas, PackedGlyph, Placement, ShelfCursor};
pub use sheet::{crop, encode_png, has_visible_pixels, render};
