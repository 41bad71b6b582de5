//! noto-atlas command line
//!
//! Reads the Noto emoji archive and writes one atlas sheet and index per
//! requested resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use noto_atlas::config::Config;
use noto_atlas::driver::{self, DriverOptions};
use noto_atlas::{source, Resolution};

/// Pack Noto emoji rasters into atlas sheets
#[derive(Parser, Debug)]
#[command(name = "noto-atlas", version, about)]
struct Args {
    /// Resolutions to generate: low, mid, high (default: all)
    resolutions: Vec<String>,

    /// Zip archive with the per-glyph PNG rasters
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Directory receiving noto_{name}.png and noto_{name}.bin
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Config file (overrides NOTO_ATLAS_CONFIG and the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sheet width in pixels
    #[arg(long)]
    sheet_width: Option<u32>,

    /// Index header count: "placements" (legacy) or "records"
    #[arg(long)]
    index_count: Option<String>,

    /// Re-read written files and check every record
    #[arg(long)]
    verify: bool,

    /// Write a config template to ~/.config/noto-atlas/config.toml and exit
    #[arg(long)]
    init_config: bool,

    /// Overwrite an existing config with --init-config
    #[arg(short, long)]
    force: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.init_config {
        let path = Config::write_template(args.force)?;
        println!("Config file generated: {}", path.display());
        return Ok(());
    }

    // Load config file
    let mut cfg = match &args.config {
        Some(path) => {
            let cfg = Config::load_from_file(path)?;
            info!("Loaded config: {}", path.display());
            cfg
        }
        None => Config::load()?,
    };

    // Command line overrides
    if let Some(archive) = &args.archive {
        cfg.paths.archive = archive.clone();
    }
    if let Some(out_dir) = &args.out_dir {
        cfg.paths.output_dir = out_dir.clone();
    }
    if let Some(width) = args.sheet_width {
        cfg.atlas.sheet_width = width;
    }
    if let Some(mode) = &args.index_count {
        cfg.atlas.index_count = mode.clone();
    }

    if args.print_config {
        print!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(());
    }

    // Configuration errors are reported before any work begins
    let resolutions = Resolution::parse_list(args.resolutions.as_slice())?;
    let mut options = DriverOptions::from_config(&cfg)?;
    options.verify = args.verify;

    let archive = &cfg.paths.archive;
    let out_dir = &cfg.paths.output_dir;

    let entries = source::open_archive(archive, &cfg.paths.raster_dir)?;
    if entries.is_empty() {
        anyhow::bail!(
            "no single-codepoint rasters under '{}' in {}",
            cfg.paths.raster_dir,
            archive.display()
        );
    }

    let reports = driver::generate(&entries, &resolutions, &options, out_dir)
        .with_context(|| format!("Failed to generate atlases in {}", out_dir.display()))?;

    for report in &reports {
        println!(
            "{}: {} placements, {} unique glyphs -> {} ({}x{})",
            report.resolution,
            report.placements,
            report.unique_glyphs,
            report.png_path.display(),
            report.sheet_width,
            report.sheet_height
        );
    }
    Ok(())
}
