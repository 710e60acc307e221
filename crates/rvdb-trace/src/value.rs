//! Width-aware helpers for interpreting stored 64-bit values.
//!
//! Values are stored unsigned; whether a register is read as signed depends on
//! the register and the caller.

/// Sign-extend the low `bits` bits of `value`.
///
/// `bits` outside `1..=64` returns `value` reinterpreted unchanged.
#[must_use]
pub const fn sext(value: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return value.cast_signed();
    }
    let shift = 64 - bits;
    (value << shift).cast_signed() >> shift
}

/// Zero-extend the low `bits` bits of `value`.
#[must_use]
pub const fn zext(value: u64, bits: u32) -> u64 {
    if bits == 0 || bits >= 64 {
        return value;
    }
    let shift = 64 - bits;
    (value << shift) >> shift
}

/// Sign-extend the low 32 bits.
#[must_use]
pub const fn sext32(value: u64) -> i64 {
    sext(value, 32)
}

/// Zero-extend the low 32 bits.
#[must_use]
pub const fn zext32(value: u64) -> u64 {
    zext(value, 32)
}

/// Fixed-width upper-case hex, as printed in every report.
#[must_use]
pub fn hex64(value: u64) -> String {
    format!("0x{value:016X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sext32() {
        assert_eq!(sext32(0x8000_0000), -0x8000_0000);
        assert_eq!(sext32(0xFFFF_FFFF_7FFF_FFFF), 0x7FFF_FFFF);
    }

    #[test]
    fn test_zext() {
        assert_eq!(zext32(0xFFFF_FFFF_8000_0000), 0x8000_0000);
        assert_eq!(zext(0xFF, 4), 0xF);
        assert_eq!(zext(u64::MAX, 64), u64::MAX);
    }

    #[test]
    fn test_sext_narrow() {
        assert_eq!(sext(0b1000, 4), -8);
        assert_eq!(sext(0b0111, 4), 7);
    }

    #[test]
    fn test_hex64() {
        assert_eq!(hex64(0xdead_beef), "0x00000000DEADBEEF");
    }
}
