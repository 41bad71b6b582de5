//! Error types for atlas generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for atlas operations.
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Errors that can occur while reading glyphs or producing an atlas.
///
/// Every variant is fatal for the run. There is no skip-and-continue path.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// Archive file could not be opened.
    #[error("cannot open archive {}: {source}", path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive is not a readable zip file.
    #[error("corrupt archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A single archive entry could not be read.
    #[error("cannot read archive entry {entry}: {message}")]
    ArchiveEntry { entry: String, message: String },

    /// A raster entry is not a decodable image.
    #[error("cannot decode image {entry}: {source}")]
    Decode {
        entry: String,
        #[source]
        source: image::ImageError,
    },

    /// A raster entry decoded to an image with no pixels.
    #[error("image {entry} is empty ({width}x{height})")]
    EmptyImage {
        entry: String,
        width: u32,
        height: u32,
    },

    /// Requested resolution name is not one we know.
    #[error("unknown resolution '{0}' (expected one of: low, mid, high)")]
    UnknownResolution(String),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sheet has no rows, so there is nothing to encode.
    #[error("atlas for resolution '{resolution}' is empty")]
    EmptySheet { resolution: String },

    /// Placement field does not fit the on-disk u16.
    #[error("U+{codepoint:04X}: {field} = {value} does not fit in 16 bits")]
    IndexFieldOverflow {
        codepoint: u32,
        field: &'static str,
        value: u32,
    },

    /// Index file is truncated or contains invalid data.
    #[error("malformed atlas index: {0}")]
    MalformedIndex(String),

    /// Output file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoder failed.
    #[error("cannot encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    /// Written output did not survive a re-read.
    #[error("verification of '{resolution}' failed: {message}")]
    Verify { resolution: String, message: String },
}

impl AtlasError {
    /// Wrap an I/O error with the file it happened on.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
