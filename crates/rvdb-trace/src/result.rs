//! Result codes attached to every instruction record.
//!
//! A result code is a 32-bit value. The high half selects a category; for the
//! exception category the low half indexes [`ExceptionCause`].

use std::fmt;

use serde::Serialize;

use crate::ExceptionCause;

/// Category selected by the high 16 bits of a result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    /// Instruction retired and matched the reference.
    Success,
    /// Instruction trapped.
    Exception,
    /// Model diverged from the reference on control flow.
    PcMismatch,
    /// Destination value differs from the reference.
    RegValueMismatch,
    /// Instruction is not implemented by the model.
    Unimplemented,
    /// Instruction is not implemented, explicitly tolerated by the producer.
    UnimplementedTolerated,
    /// Category number with no assigned meaning.
    Unknown(u16),
}

impl ResultCategory {
    /// Decode a raw category number.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::Exception,
            2 => Self::PcMismatch,
            3 => Self::RegValueMismatch,
            4 => Self::Unimplemented,
            5 => Self::UnimplementedTolerated,
            other => Self::Unknown(other),
        }
    }

    /// Raw category number.
    #[must_use]
    pub const fn raw(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::Exception => 1,
            Self::PcMismatch => 2,
            Self::RegValueMismatch => 3,
            Self::Unimplemented => 4,
            Self::UnimplementedTolerated => 5,
            Self::Unknown(other) => other,
        }
    }

    /// Trace data past a record of this category is unreliable, so replay
    /// stops on it.
    ///
    /// Categories 2, 3 and 5.
    #[must_use]
    pub const fn halts_replay(self) -> bool {
        matches!(
            self,
            Self::PcMismatch | Self::RegValueMismatch | Self::UnimplementedTolerated
        )
    }

    /// A record of this category marks its whole test as failing under the
    /// recorded-category policy.
    ///
    /// Categories 2, 3 and 4. Category 5 is excluded even though the
    /// per-instruction classifier labels it failing.
    #[must_use]
    pub const fn fails_test(self) -> bool {
        matches!(
            self,
            Self::PcMismatch | Self::RegValueMismatch | Self::Unimplemented
        )
    }
}

/// Raw 32-bit result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ResultCode(pub u32);

impl ResultCode {
    /// Success code.
    pub const OK: Self = Self(0);

    /// Build a code from a category and a low payload.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn new(category: ResultCategory, low: u16) -> Self {
        Self(((category.raw() as u32) << 16) | low as u32)
    }

    /// Build an exception code for `cause`.
    #[must_use]
    pub const fn exception(cause: ExceptionCause) -> Self {
        Self::new(ResultCategory::Exception, cause.index())
    }

    /// Raw category number (`code >> 16`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn category_raw(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Decoded category.
    #[must_use]
    pub const fn category(self) -> ResultCategory {
        ResultCategory::from_raw(self.category_raw())
    }

    /// Low 16 bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn low(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Exception cause, for exception codes with an in-range cause index.
    #[must_use]
    pub fn cause(self) -> Option<ExceptionCause> {
        match self.category() {
            ResultCategory::Exception => ExceptionCause::from_index(self.low()),
            _ => None,
        }
    }

    /// Human-readable label for the result.
    #[must_use]
    pub fn label(self) -> String {
        match self.category() {
            ResultCategory::Success => "OKAY".to_string(),
            ResultCategory::Exception => self.cause().map_or_else(
                || format!("UNKNOWN_CAUSE({})", self.low()),
                |cause| cause.name().to_string(),
            ),
            ResultCategory::PcMismatch => "PC INVALID".to_string(),
            ResultCategory::RegValueMismatch => "REG VAL INVALID".to_string(),
            ResultCategory::Unimplemented => "UNIMPLEMENTED".to_string(),
            ResultCategory::UnimplementedTolerated => "UNIMPLEMENTED (TOLERATED)".to_string(),
            ResultCategory::Unknown(raw) => format!("UNKNOWN({raw})"),
        }
    }
}

impl From<u32> for ResultCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_high_bits() {
        assert_eq!(ResultCode(0).category(), ResultCategory::Success);
        assert_eq!(
            ResultCode(0x0001_0002).category(),
            ResultCategory::Exception
        );
        assert_eq!(
            ResultCode(0x0002_0000).category(),
            ResultCategory::PcMismatch
        );
        assert_eq!(
            ResultCode(0x0003_0000).category(),
            ResultCategory::RegValueMismatch
        );
        assert_eq!(
            ResultCode(0x0004_0000).category(),
            ResultCategory::Unimplemented
        );
        assert_eq!(
            ResultCode(0x0005_0000).category(),
            ResultCategory::UnimplementedTolerated
        );
        assert_eq!(
            ResultCode(0x0009_0000).category(),
            ResultCategory::Unknown(9)
        );
    }

    #[test]
    fn test_exception_cause_decoding() {
        let code = ResultCode::exception(ExceptionCause::MachineEcall);
        assert_eq!(code.0, 0x0001_000b);
        assert_eq!(code.cause(), Some(ExceptionCause::MachineEcall));
        assert_eq!(code.label(), "MACHINE_ECALL");

        // Low bits are ignored outside the exception category.
        assert_eq!(ResultCode(0x0003_0002).cause(), None);
        assert_eq!(ResultCode(0x0001_0040).label(), "UNKNOWN_CAUSE(64)");
    }

    #[test]
    fn test_replay_and_failure_sets_differ() {
        let halts: Vec<u16> = (0..7)
            .filter(|&c| ResultCategory::from_raw(c).halts_replay())
            .collect();
        let fails: Vec<u16> = (0..7)
            .filter(|&c| ResultCategory::from_raw(c).fails_test())
            .collect();
        assert_eq!(halts, vec![2, 3, 5]);
        assert_eq!(fails, vec![2, 3, 4]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ResultCode::OK.label(), "OKAY");
        assert_eq!(ResultCode(0x0002_0000).label(), "PC INVALID");
        assert_eq!(ResultCode(0x0003_0000).label(), "REG VAL INVALID");
        assert_eq!(ResultCode(0x0004_0000).label(), "UNIMPLEMENTED");
        assert_eq!(ResultCode(0x0007_0000).label(), "UNKNOWN(7)");
    }
}
