use std::fmt;

use serde::Serialize;

use crate::TraceError;

/// Privilege level an instruction executed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Privilege {
    U,
    S,
    /// Reserved, never produced by current simulators.
    H,
    M,
    VU,
    VS,
}

impl Privilege {
    /// Decode the stored `Priv` column.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidPrivilege`] for values outside `0..=5`.
    pub const fn from_raw(raw: i64) -> Result<Self, TraceError> {
        match raw {
            0 => Ok(Self::U),
            1 => Ok(Self::S),
            2 => Ok(Self::H),
            3 => Ok(Self::M),
            4 => Ok(Self::VU),
            5 => Ok(Self::VS),
            other => Err(TraceError::InvalidPrivilege(other)),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::U => 0,
            Self::S => 1,
            Self::H => 2,
            Self::M => 3,
            Self::VU => 4,
            Self::VS => 5,
        }
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::U => "U",
            Self::S => "S",
            Self::H => "H",
            Self::M => "M",
            Self::VU => "VU",
            Self::VS => "VS",
        }
    }
}

impl fmt::Display for Privilege {
    /// Renders as `M(3)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.mnemonic(), self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_display() {
        assert_eq!(
            Privilege::from_raw(3).map(|p| p.to_string()),
            Ok("M(3)".into())
        );
        assert_eq!(
            Privilege::from_raw(5).map(|p| p.to_string()),
            Ok("VS(5)".into())
        );
        assert_eq!(Privilege::from_raw(6), Err(TraceError::InvalidPrivilege(6)));
    }
}
