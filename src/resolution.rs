//! Named atlas resolutions
//!
//! Each resolution is packed independently into its own sheet and index.

use std::fmt;
use std::str::FromStr;

use crate::constants::OUTPUT_PREFIX;
use crate::error::{AtlasError, Result};

/// Target height preset for one atlas pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    Low,
    Mid,
    High,
}

impl Resolution {
    /// All resolutions in canonical (smallest first) order
    pub const ALL: [Resolution; 3] = [Resolution::Low, Resolution::Mid, Resolution::High];

    /// Name used on the command line and in output file names
    pub fn name(self) -> &'static str {
        match self {
            Resolution::Low => "low",
            Resolution::Mid => "mid",
            Resolution::High => "high",
        }
    }

    /// Built-in glyph height in pixels
    pub fn default_height(self) -> u32 {
        match self {
            Resolution::Low => 32,
            Resolution::Mid => 48,
            Resolution::High => 96,
        }
    }

    /// `noto_{name}.png`
    pub fn png_file_name(self) -> String {
        format!("{}{}.png", OUTPUT_PREFIX, self.name())
    }

    /// `noto_{name}.bin`
    pub fn index_file_name(self) -> String {
        format!("{}{}.bin", OUTPUT_PREFIX, self.name())
    }

    /// Parse a list of requested names.
    ///
    /// An empty request selects every resolution. The result is
    /// de-duplicated and in canonical order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Resolution>> {
        if names.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        let mut out = names
            .iter()
            .map(|n| n.as_ref().parse::<Resolution>())
            .collect::<Result<Vec<_>>>()?;
        out.sort();
        out.dedup();
        Ok(out)
    }
}

impl FromStr for Resolution {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Resolution::Low),
            "mid" => Ok(Resolution::Mid),
            "high" => Ok(Resolution::High),
            _ => Err(AtlasError::UnknownResolution(s.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
