//! Register width (XLEN) of the simulated target.

use std::fmt;
use std::str::FromStr;

/// Register width of the architecture description in use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Xlen {
    Rv32,
    #[default]
    Rv64,
}

impl Xlen {
    /// XLEN value (32 or 64).
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rv32 => 32,
            Self::Rv64 => 64,
        }
    }

    /// Bytes per register (4 or 8).
    #[must_use]
    pub const fn reg_bytes(self) -> usize {
        match self {
            Self::Rv32 => 4,
            Self::Rv64 => 8,
        }
    }

    /// Subdirectory of the architecture root holding this width's tables.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Rv32 => "rv32",
            Self::Rv64 => "rv64",
        }
    }

    /// Build from a bit count.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(Self::Rv32),
            64 => Some(Self::Rv64),
            _ => None,
        }
    }
}

impl fmt::Display for Xlen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Xlen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "32" | "rv32" => Ok(Self::Rv32),
            "64" | "rv64" => Ok(Self::Rv64),
            _ => Err(format!("unknown xlen: {s}")),
        }
    }
}
