//! noto-atlas - emoji atlas packer
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   Glyph Source (zip -> RGBA rasters)     │
//! ├──────────────────────────────────────────┤
//! │   per resolution (low / mid / high):     │
//! │     Shelf Packer  →  Sheet Renderer      │
//! │                          ↓               │
//! │                   Index Serializer       │
//! │                          ↓               │
//! │     noto_{name}.png + noto_{name}.bin    │
//! └──────────────────────────────────────────┘
//! ```

pub mod atlas;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod resolution;
pub mod source;

pub use error::{AtlasError, Result};
pub use resolution::Resolution;
