//! Register groups as numbered by the trace producer.

use std::fmt;

use serde::Serialize;

use crate::TraceError;

/// Architectural register group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterGroup {
    /// General-purpose integer registers (`x0`..`x31`).
    Int,
    /// Floating-point registers (`f0`..`f31`).
    Fp,
    /// Vector registers (`v0`..`v31`).
    Vec,
    /// Control/status registers, addressed by name.
    Csr,
}

impl RegisterGroup {
    /// Group number stored in the `RegType` column.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Int => 0,
            Self::Fp => 1,
            Self::Vec => 2,
            Self::Csr => 3,
        }
    }

    /// Decode a stored group number.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidRegisterGroup`] for numbers outside `0..=3`.
    pub const fn from_number(num: i64) -> Result<Self, TraceError> {
        match num {
            0 => Ok(Self::Int),
            1 => Ok(Self::Fp),
            2 => Ok(Self::Vec),
            3 => Ok(Self::Csr),
            other => Err(TraceError::InvalidRegisterGroup(other)),
        }
    }

    /// Name prefix of indexed groups (`x`, `f`, `v`). CSRs have none.
    #[must_use]
    pub const fn prefix(self) -> Option<char> {
        match self {
            Self::Int => Some('x'),
            Self::Fp => Some('f'),
            Self::Vec => Some('v'),
            Self::Csr => None,
        }
    }
}

impl fmt::Display for RegisterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Fp => write!(f, "fp"),
            Self::Vec => write!(f, "vec"),
            Self::Csr => write!(f, "csr"),
        }
    }
}

impl TryFrom<i64> for RegisterGroup {
    type Error = TraceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_number(value)
    }
}
