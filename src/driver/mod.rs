//! Multi-resolution driver
//!
//! Runs pack -> render -> serialize once per requested resolution and
//! writes `noto_{name}.png` / `noto_{name}.bin` into the output directory.
//! Resolutions share only the read-only glyph list.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};

use crate::atlas::{self, AtlasIndex, IndexCount, PackOptions, PackedAtlas};
use crate::config::{Config, ResolutionConfig};
use crate::error::{AtlasError, Result};
use crate::resolution::Resolution;
use crate::source::GlyphEntry;

/// Settings for a generation run
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub pack: PackOptions,
    pub index_count: IndexCount,
    pub heights: ResolutionConfig,
    /// Re-read every written file and check it
    pub verify: bool,
}

impl DriverOptions {
    /// Build from a validated config
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pack: PackOptions {
                sheet_width: config.atlas.sheet_width,
                padding: config.atlas.padding,
                filter: config.atlas.filter_type()?,
            },
            index_count: config.atlas.index_count()?,
            heights: config.resolutions.clone(),
            verify: false,
        })
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            pack: PackOptions::default(),
            index_count: IndexCount::default(),
            heights: ResolutionConfig::default(),
            verify: false,
        }
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub target_height: u32,
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub shelf_count: u32,
    /// Placements, duplicates included
    pub placements: usize,
    /// Records written to the index
    pub unique_glyphs: usize,
    pub png_path: PathBuf,
    pub index_path: PathBuf,
}

/// In-memory result of one pass, before anything touches the disk
#[derive(Debug, Clone)]
pub struct AtlasOutput {
    pub resolution: Resolution,
    pub packed: PackedAtlas,
    pub sheet: RgbaImage,
    pub index: AtlasIndex,
}

/// Pack, render and index one resolution without writing files
pub fn build_resolution(
    entries: &[GlyphEntry],
    resolution: Resolution,
    options: &DriverOptions,
) -> Result<AtlasOutput> {
    let target_height = options.heights.height(resolution);
    info!("[{}] packing {} glyphs at {}px", resolution, entries.len(), target_height);

    let packed = atlas::pack(entries, target_height, &options.pack);
    // Index first: coordinates past u16 fail here, before the sheet is allocated
    let index = AtlasIndex::from_placements(
        packed.sheet_width,
        packed.sheet_height,
        packed.placements(),
        options.index_count,
    )?;
    let sheet = atlas::render(&packed);
    debug!(
        "[{}] {} placements, {} records, {} shelves",
        resolution,
        packed.glyphs.len(),
        index.records.len(),
        packed.shelf_count
    );

    Ok(AtlasOutput {
        resolution,
        packed,
        sheet,
        index,
    })
}

/// Run every requested resolution and write its outputs
///
/// Stops at the first failure. Files already written for earlier
/// resolutions are left intact.
pub fn generate(
    entries: &[GlyphEntry],
    resolutions: &[Resolution],
    options: &DriverOptions,
    out_dir: &Path,
) -> Result<Vec<ResolutionReport>> {
    fs::create_dir_all(out_dir).map_err(|e| AtlasError::write(out_dir, e))?;

    let mut reports = Vec::with_capacity(resolutions.len());
    for &resolution in resolutions {
        let output = build_resolution(entries, resolution, options)?;
        let report = write_outputs(&output, out_dir)?;
        if options.verify {
            verify_outputs(resolution, report.target_height, &report.png_path, &report.index_path)?;
            info!("[{}] verified {} records", resolution, report.unique_glyphs);
        }
        reports.push(report);
    }
    Ok(reports)
}

/// Write the sheet and index of one pass
pub fn write_outputs(output: &AtlasOutput, out_dir: &Path) -> Result<ResolutionReport> {
    let resolution = output.resolution;
    if output.packed.sheet_height == 0 {
        return Err(AtlasError::EmptySheet {
            resolution: resolution.name().to_string(),
        });
    }

    let png_path = out_dir.join(resolution.png_file_name());
    let index_path = out_dir.join(resolution.index_file_name());

    write_atomic(&png_path, |out| {
        atlas::encode_png(&output.sheet, out).map_err(|source| AtlasError::Encode {
            path: png_path.clone(),
            source,
        })
    })?;
    write_atomic(&index_path, |out| {
        output
            .index
            .write_to(out)
            .map_err(|e| AtlasError::write(&index_path, e))
    })?;

    info!(
        "[{}] wrote {} ({}x{}) and {}",
        resolution,
        png_path.display(),
        output.sheet.width(),
        output.sheet.height(),
        index_path.display()
    );

    Ok(ResolutionReport {
        resolution,
        target_height: output.packed.target_height,
        sheet_width: output.packed.sheet_width,
        sheet_height: output.packed.sheet_height,
        shelf_count: output.packed.shelf_count,
        placements: output.packed.glyphs.len(),
        unique_glyphs: output.index.records.len(),
        png_path,
        index_path,
    })
}

/// Write to `<path>.tmp`, then rename over `path`
///
/// A failed write removes the temporary file and leaves `path` untouched.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let result = (|| -> Result<()> {
        let file = File::create(&tmp).map_err(|e| AtlasError::write(&tmp, e))?;
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush().map_err(|e| AtlasError::write(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| AtlasError::write(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Re-read a written sheet and index and check every record
///
/// Each record must start inside the sheet, have the pass's target height
/// and cover at least one visible pixel. Glyphs wider than the sheet were
/// clipped when rendered, so their records are checked clipped as well.
pub fn verify_outputs(
    resolution: Resolution,
    target_height: u32,
    png_path: &Path,
    index_path: &Path,
) -> Result<()> {
    let fail = |message: String| AtlasError::Verify {
        resolution: resolution.name().to_string(),
        message,
    };

    let bytes = fs::read(index_path)
        .map_err(|e| fail(format!("cannot read {}: {}", index_path.display(), e)))?;
    let index = AtlasIndex::parse(&bytes)?;
    let sheet = image::open(png_path)
        .map_err(|e| fail(format!("cannot read {}: {}", png_path.display(), e)))?
        .to_rgba8();

    if sheet.dimensions() != (index.sheet_width, index.sheet_height) {
        return Err(fail(format!(
            "index header says {}x{} but sheet is {}x{}",
            index.sheet_width,
            index.sheet_height,
            sheet.width(),
            sheet.height()
        )));
    }

    for record in &index.records {
        let placement = record
            .placement()
            .ok_or_else(|| fail(format!("invalid codepoint 0x{:X}", record.codepoint)))?;
        if placement.height != target_height {
            return Err(fail(format!(
                "U+{:04X} is {}px tall, expected {}",
                record.codepoint, placement.height, target_height
            )));
        }
        let mut visible = placement;
        if visible.x < sheet.width() && visible.right() > sheet.width() {
            warn!(
                "[{}] U+{:04X} is {}px wide, checking the {}px inside the sheet",
                resolution,
                record.codepoint,
                visible.width,
                sheet.width() - visible.x
            );
            visible.width = sheet.width() - visible.x;
        }
        let pixels = atlas::crop(&sheet, &visible).ok_or_else(|| {
            fail(format!(
                "U+{:04X} at ({}, {}) {}x{} lies outside the sheet",
                record.codepoint, placement.x, placement.y, placement.width, placement.height
            ))
        })?;
        if !atlas::has_visible_pixels(&pixels) {
            return Err(fail(format!(
                "U+{:04X} at ({}, {}) is fully transparent",
                record.codepoint, placement.x, placement.y
            )));
        }
    }
    Ok(())
}
