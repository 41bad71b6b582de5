//! Configuration file management
//!
//! Loads TOML configuration files and provides generator settings.
//! Default config path: ~/.config/noto-atlas/config.toml

use anyhow::{Context, Result};
use image::imageops::FilterType;
use log::info;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::atlas::IndexCount;
use crate::constants::{
    DEFAULT_ARCHIVE, DEFAULT_OUTPUT_DIR, DEFAULT_RASTER_DIR, DEFAULT_SHEET_WIDTH, MAX_INDEX_COORD,
    PADDING,
};
use crate::error::AtlasError;
use crate::resolution::Resolution;

/// Generator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input/output locations
    pub paths: PathConfig,
    /// Sheet layout and index format
    pub atlas: AtlasConfig,
    /// Target glyph height per resolution
    pub resolutions: ResolutionConfig,
}

/// Path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Zip archive containing the per-glyph rasters
    pub archive: PathBuf,
    /// Directory receiving noto_{name}.png / noto_{name}.bin
    pub output_dir: PathBuf,
    /// Archive subdirectory holding the rendition to pack (e.g. "png/128")
    pub raster_dir: String,
}

/// Atlas layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Fixed sheet width in pixels
    pub sheet_width: u32,
    /// Gap between glyphs and between shelves
    pub padding: u32,
    /// Resampling filter: "lanczos3" | "catmullrom" | "gaussian" | "triangle" | "nearest"
    pub filter: String,
    /// Header count field: "placements" (legacy, pre-dedup) | "records"
    pub index_count: String,
}

/// Glyph height in pixels for each named resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub low: u32,
    pub mid: u32,
    pub high: u32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            archive: PathBuf::from(DEFAULT_ARCHIVE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            raster_dir: DEFAULT_RASTER_DIR.to_string(),
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            sheet_width: DEFAULT_SHEET_WIDTH,
            padding: PADDING,
            filter: "lanczos3".to_string(),
            index_count: "placements".to_string(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            low: Resolution::Low.default_height(),
            mid: Resolution::Mid.default_height(),
            high: Resolution::High.default_height(),
        }
    }
}

impl AtlasConfig {
    /// Resampling filter used when rescaling glyphs
    pub fn filter_type(&self) -> crate::error::Result<FilterType> {
        match self.filter.trim().to_ascii_lowercase().as_str() {
            "lanczos3" | "lanczos" => Ok(FilterType::Lanczos3),
            "catmullrom" | "cubic" => Ok(FilterType::CatmullRom),
            "gaussian" => Ok(FilterType::Gaussian),
            "triangle" | "linear" => Ok(FilterType::Triangle),
            "nearest" => Ok(FilterType::Nearest),
            other => Err(AtlasError::InvalidConfig(format!(
                "unknown resampling filter '{}'",
                other
            ))),
        }
    }

    /// What the index header's count field records
    pub fn index_count(&self) -> crate::error::Result<IndexCount> {
        match self.index_count.trim().to_ascii_lowercase().as_str() {
            "placements" => Ok(IndexCount::Placements),
            "records" => Ok(IndexCount::Records),
            other => Err(AtlasError::InvalidConfig(format!(
                "unknown index_count '{}' (expected \"placements\" or \"records\")",
                other
            ))),
        }
    }
}

impl ResolutionConfig {
    /// Target height for a resolution
    pub fn height(&self, resolution: Resolution) -> u32 {
        match resolution {
            Resolution::Low => self.low,
            Resolution::Mid => self.mid,
            Resolution::High => self.high,
        }
    }
}

impl Config {
    /// Environment variable naming an explicit config file
    const ENV_VAR: &'static str = "NOTO_ATLAS_CONFIG";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    ///
    /// Fails when NOTO_ATLAS_CONFIG names a file that does not exist.
    pub fn config_path() -> Result<Option<PathBuf>> {
        Self::resolve_path(std::env::var_os(Self::ENV_VAR), Self::user_config_path())
    }

    fn resolve_path(env: Option<OsString>, user: Option<PathBuf>) -> Result<Option<PathBuf>> {
        // 1. NOTO_ATLAS_CONFIG environment variable
        if let Some(path) = env.filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            if !path.exists() {
                anyhow::bail!(
                    "{} points to a missing file: {}",
                    Self::ENV_VAR,
                    path.display()
                );
            }
            return Ok(Some(path));
        }

        // 2. User config: ~/.config/noto-atlas/config.toml
        Ok(user.filter(|p| p.exists()))
    }

    /// ~/.config/noto-atlas/config.toml, whether or not it exists
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("noto-atlas").join("config.toml"))
    }

    /// Load configuration with priority:
    /// 1. NOTO_ATLAS_CONFIG environment variable
    /// 2. ~/.config/noto-atlas/config.toml (user config)
    /// 3. Built-in defaults
    ///
    /// A config file that exists but cannot be read or parsed is an error.
    pub fn load() -> Result<Self> {
        Self::load_resolved(Self::config_path()?)
    }

    fn load_resolved(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                info!("Loaded config: {}", path.display());
                Ok(config)
            }
            None => {
                info!("Using built-in default config");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Check ranges before any work begins
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.atlas.sheet_width == 0 {
            return Err(AtlasError::InvalidConfig("sheet_width must be > 0".into()));
        }
        if self.atlas.sheet_width > MAX_INDEX_COORD {
            return Err(AtlasError::InvalidConfig(format!(
                "sheet_width {} exceeds {}",
                self.atlas.sheet_width, MAX_INDEX_COORD
            )));
        }
        if self.atlas.padding > MAX_INDEX_COORD {
            return Err(AtlasError::InvalidConfig(format!(
                "padding {} exceeds {}",
                self.atlas.padding, MAX_INDEX_COORD
            )));
        }
        for res in Resolution::ALL {
            let h = self.resolutions.height(res);
            if h == 0 || h > MAX_INDEX_COORD {
                return Err(AtlasError::InvalidConfig(format!(
                    "height for '{}' must be in 1..={}, got {}",
                    res, MAX_INDEX_COORD, h
                )));
            }
        }
        if self.paths.raster_dir.trim_matches('/').is_empty() {
            return Err(AtlasError::InvalidConfig("raster_dir must not be empty".into()));
        }
        self.atlas.filter_type()?;
        self.atlas.index_count()?;
        Ok(())
    }

    /// Write a config template to the user config path
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_template(force: bool) -> Result<PathBuf> {
        let path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Config directory not found"))?;
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        std::fs::write(&path, Self::template()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Template text: header comment plus the defaults
    pub fn template() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())?;
        Ok(format!(
            "# noto-atlas configuration\n\
             #\n\
             # [atlas] filter: lanczos3 | catmullrom | gaussian | triangle | nearest\n\
             # [atlas] index_count: \"placements\" keeps the legacy header count\n\
             #         (includes duplicate glyphs); \"records\" matches the records written.\n\
             # [resolutions] glyph height in pixels for noto_low / noto_mid / noto_high.\n\
             \n{}",
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.atlas.sheet_width, 4096);
        assert_eq!(cfg.atlas.padding, 2);
        assert_eq!(cfg.resolutions.height(Resolution::Low), 32);
        assert_eq!(cfg.resolutions.height(Resolution::High), 96);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = Config::from_toml("[atlas]\nsheet_width = 2048\n\n[resolutions]\nmid = 64\n")
            .unwrap();
        assert_eq!(cfg.atlas.sheet_width, 2048);
        assert_eq!(cfg.atlas.padding, 2);
        assert_eq!(cfg.resolutions.mid, 64);
        assert_eq!(cfg.resolutions.low, 32);
        assert_eq!(cfg.paths.raster_dir, "png/128");
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut cfg = Config::default();
        cfg.atlas.sheet_width = 0;
        assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_height_rejected() {
        let mut cfg = Config::default();
        cfg.resolutions.high = 0;
        assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
    }

    #[test]
    fn test_filter_names() {
        let mut atlas = AtlasConfig::default();
        assert_eq!(atlas.filter_type().unwrap(), FilterType::Lanczos3);
        atlas.filter = "Nearest".into();
        assert_eq!(atlas.filter_type().unwrap(), FilterType::Nearest);
        atlas.filter = "bicubic-ish".into();
        assert!(atlas.filter_type().is_err());
    }

    #[test]
    fn test_index_count_names() {
        let mut atlas = AtlasConfig::default();
        assert_eq!(atlas.index_count().unwrap(), IndexCount::Placements);
        atlas.index_count = "records".into();
        assert_eq!(atlas.index_count().unwrap(), IndexCount::Records);
        atlas.index_count = "both".into();
        assert!(atlas.index_count().is_err());
    }

    #[test]
    fn test_template_parses_back() {
        let text = Config::template().unwrap();
        let cfg = Config::from_toml(&text).unwrap();
        assert_eq!(cfg.atlas.sheet_width, DEFAULT_SHEET_WIDTH);
        assert_eq!(cfg.paths.archive, PathBuf::from(DEFAULT_ARCHIVE));
    }

    #[test]
    fn test_huge_padding_rejected() {
        let mut cfg = Config::default();
        cfg.atlas.padding = u32::MAX;
        assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
        cfg.atlas.padding = MAX_INDEX_COORD;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_env_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::resolve_path(Some(missing.clone().into_os_string()), None).unwrap_err();
        assert!(format!("{:#}", err).contains("nope.toml"));
    }

    #[test]
    fn test_env_config_wins_over_user_config() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join("env.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(&env, "").unwrap();
        std::fs::write(&user, "").unwrap();
        let found = Config::resolve_path(Some(env.clone().into_os_string()), Some(user.clone()))
            .unwrap();
        assert_eq!(found, Some(env));
        assert_eq!(Config::resolve_path(None, Some(user.clone())).unwrap(), Some(user));
        assert_eq!(
            Config::resolve_path(None, Some(dir.path().join("absent.toml"))).unwrap(),
            None
        );
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[atlas]\nsheet_width = \"oops\"\n").unwrap();
        let err = Config::load_resolved(Some(path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let cfg = Config::load_resolved(None).unwrap();
        assert_eq!(cfg.atlas.sheet_width, DEFAULT_SHEET_WIDTH);
    }

    #[test]
    fn test_paths_from_toml() {
        let cfg = Config::from_toml("[paths]\narchive = \"/data/emoji.zip\"\n").unwrap();
        assert_eq!(cfg.paths.archive, PathBuf::from("/data/emoji.zip"));
        assert_eq!(cfg.paths.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
