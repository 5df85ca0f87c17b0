//! `.nurbs` format versions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Length of the ASCII header, `VERSION 200` or `VERSION 300`
pub const HEADER_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Surfaces only, expanded knot vectors
    V200,
    /// Named and colored shape units with trimming curves, distinct knots
    #[default]
    V300,
}

impl FormatVersion {
    pub fn number(self) -> u32 {
        match self {
            FormatVersion::V200 => 200,
            FormatVersion::V300 => 300,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            200 => Some(FormatVersion::V200),
            300 => Some(FormatVersion::V300),
            _ => None,
        }
    }

    pub fn header(self) -> [u8; HEADER_LEN] {
        match self {
            FormatVersion::V200 => *b"VERSION 200",
            FormatVersion::V300 => *b"VERSION 300",
        }
    }

    pub fn from_header(header: &[u8]) -> Option<Self> {
        let number = header.strip_prefix(b"VERSION ")?;
        let number = std::str::from_utf8(number).ok()?.parse().ok()?;
        Self::from_number(number)
    }

    /// Whether trimming curves, names and colors are written
    pub fn has_shape_units(self) -> bool {
        matches!(self, FormatVersion::V300)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| format!("unsupported format version '{s}', expected 200 or 300"))
    }
}
