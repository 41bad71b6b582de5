//! Glyph source reader
//!
//! Reads per-glyph PNG rasters out of a Noto emoji zip archive.
//! Only the single-codepoint rasters of one rendition directory are kept:
//! - `png/128/emoji_u1f600.png` -> U+1F600
//! - `png/128/emoji_u1f468_200d_1f469.png` -> skipped (sequence)
//! - `png/72/emoji_u1f600.png` -> skipped (other rendition)

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use image::RgbaImage;
use log::{debug, info, trace, warn};

use crate::constants::{
    MAX_ENTRY_PREALLOC, MAX_HEX_DIGITS, RASTER_PREFIX, RASTER_SUFFIX, SEQUENCE_SEPARATOR,
};
use crate::error::{AtlasError, Result};

/// One decoded glyph raster
#[derive(Debug, Clone)]
pub struct GlyphEntry {
    /// Codepoint the raster draws
    pub ch: char,
    /// Decoded pixels, always RGBA8
    pub image: RgbaImage,
    /// Archive path, for diagnostics
    pub path: String,
}

impl GlyphEntry {
    pub fn codepoint(&self) -> u32 {
        self.ch as u32
    }
}

/// Classification of a raster file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterName {
    /// `emoji_u<hex>.png` naming one scalar value
    Single(char),
    /// `emoji_u<hex>_<hex>...png`
    Sequence,
    /// Single hex value that is not a Unicode scalar (surrogate, > U+10FFFF)
    InvalidCodepoint(u32),
    /// Not a glyph raster at all
    Other,
}

/// Classify the final path component of an archive entry
pub fn parse_raster_name(file_name: &str) -> RasterName {
    let Some(hex) = file_name
        .strip_prefix(RASTER_PREFIX)
        .and_then(|rest| rest.strip_suffix(RASTER_SUFFIX))
    else {
        return RasterName::Other;
    };

    if hex.contains(SEQUENCE_SEPARATOR) {
        return RasterName::Sequence;
    }
    if hex.is_empty() || hex.len() > MAX_HEX_DIGITS || !hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return RasterName::Other;
    }

    // At most 6 hex digits, always fits
    let cp = match u32::from_str_radix(hex, 16) {
        Ok(cp) => cp,
        Err(_) => return RasterName::Other,
    };
    match char::from_u32(cp) {
        Some(ch) => RasterName::Single(ch),
        None => RasterName::InvalidCodepoint(cp),
    }
}

/// Split an archive path into (directory, file name)
fn split_entry_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// True if `dir` is the raster directory, possibly below a top-level folder
///
/// `noto-emoji-main/png/128` matches `png/128`; `png/1280` does not.
pub fn in_raster_dir(dir: &str, raster_dir: &str) -> bool {
    let raster_dir = raster_dir.trim_matches('/');
    let dir = dir.trim_end_matches('/');
    if dir == raster_dir {
        return true;
    }
    dir.strip_suffix(raster_dir)
        .map_or(false, |head| head.ends_with('/'))
}

/// Open an archive on disk and read its glyphs
pub fn open_archive(path: &Path, raster_dir: &str) -> Result<Vec<GlyphEntry>> {
    let file = File::open(path).map_err(|source| AtlasError::OpenArchive {
        path: path.to_path_buf(),
        source,
    })?;
    read_glyphs(BufReader::new(file), path, raster_dir)
}

/// Read glyphs from any zip source
///
/// `label` names the archive in error messages. Entries come back in
/// ascending lexical order of their archive paths.
pub fn read_glyphs<R: Read + Seek>(
    reader: R,
    label: &Path,
    raster_dir: &str,
) -> Result<Vec<GlyphEntry>> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|source| AtlasError::Archive {
        path: label.to_path_buf(),
        source,
    })?;
    info!("Archive {}: {} entries", label.display(), archive.len());

    let mut selected: Vec<(String, char)> = Vec::new();
    let mut sequences = 0usize;
    for name in archive.file_names() {
        let (dir, file_name) = split_entry_path(name);
        if file_name.is_empty() || !in_raster_dir(dir, raster_dir) {
            continue;
        }
        match parse_raster_name(file_name) {
            RasterName::Single(ch) => selected.push((name.to_string(), ch)),
            RasterName::Sequence => {
                trace!("skip sequence: {}", name);
                sequences += 1;
            }
            RasterName::InvalidCodepoint(cp) => {
                warn!("skip {}: 0x{:X} is not a Unicode scalar value", name, cp);
            }
            RasterName::Other => trace!("skip: {}", name),
        }
    }
    selected.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(
        "{} single-codepoint rasters under {}, {} sequences skipped",
        selected.len(),
        raster_dir,
        sequences
    );

    let mut entries = Vec::with_capacity(selected.len());
    for (name, ch) in selected {
        let bytes = read_entry(&mut archive, &name)?;
        let image = decode_png(&name, &bytes)?;
        trace!(
            "U+{:04X}: {}x{} from {}",
            ch as u32,
            image.width(),
            image.height(),
            name
        );
        entries.push(GlyphEntry {
            ch,
            image,
            path: name,
        });
    }

    info!("Loaded {} glyphs from {}", entries.len(), label.display());
    Ok(entries)
}

fn read_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| AtlasError::ArchiveEntry {
            entry: name.to_string(),
            message: e.to_string(),
        })?;
    let mut bytes = Vec::with_capacity(prealloc_hint(file.size()));
    file.read_to_end(&mut bytes)
        .map_err(|e| AtlasError::ArchiveEntry {
            entry: name.to_string(),
            message: e.to_string(),
        })?;
    Ok(bytes)
}

/// Buffer to reserve for an entry; the declared size comes from the
/// archive header and is not trusted beyond a small bound
fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(MAX_ENTRY_PREALLOC)
        .min(MAX_ENTRY_PREALLOC)
}

/// Decode a raster and normalize it to RGBA8
fn decode_png(entry: &str, data: &[u8]) -> Result<RgbaImage> {
    use image::io::Reader as ImageReader;

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AtlasError::ArchiveEntry {
            entry: entry.to_string(),
            message: format!("format detection failed: {}", e),
        })?;

    let img = reader.decode().map_err(|source| AtlasError::Decode {
        entry: entry.to_string(),
        source,
    })?;

    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(AtlasError::EmptyImage {
            entry: entry.to_string(),
            width: rgba.width(),
            height: rgba.height(),
        });
    }
    Ok(rgba)
}
