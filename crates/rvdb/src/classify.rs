//! Per-instruction pass/fail classification.

use std::fmt;

use serde::Serialize;

use crate::{
    CsrComparison, HartId, InstructionRecord, ResultCategory, StoreError, TestId, TraceStore,
};

/// Status of one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstStatus {
    Pass,
    MismatchPc,
    MismatchRegVal,
    /// Unimplemented instruction (category 4).
    UnimplPassing,
    /// Tolerated unimplemented instruction (category 5).
    UnimplFailing,
    /// Trapped, and every tracked CSR matches the reference afterwards.
    ExceptionPassing,
    /// Trapped, and at least one tracked CSR differs from the reference.
    ExceptionFailing,
    Unspecified,
}

/// Presentation tier of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Neutral,
    Alert,
    Warning,
    Muted,
}

impl InstStatus {
    pub const ALL: [Self; 8] = [
        Self::Pass,
        Self::MismatchPc,
        Self::MismatchRegVal,
        Self::UnimplPassing,
        Self::UnimplFailing,
        Self::ExceptionPassing,
        Self::ExceptionFailing,
        Self::Unspecified,
    ];

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Pass | Self::ExceptionPassing => Severity::Neutral,
            Self::MismatchPc
            | Self::MismatchRegVal
            | Self::UnimplFailing
            | Self::ExceptionFailing => Severity::Alert,
            Self::UnimplPassing => Severity::Warning,
            Self::Unspecified => Severity::Muted,
        }
    }

    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self.severity(), Severity::Alert)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::MismatchPc => "pc mismatch",
            Self::MismatchRegVal => "reg value mismatch",
            Self::UnimplPassing => "unimplemented",
            Self::UnimplFailing => "unimplemented (tolerated)",
            Self::ExceptionPassing => "exception",
            Self::ExceptionFailing => "exception (csr mismatch)",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for InstStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a record given the CSR comparisons recorded at its PC.
///
/// The comparisons only matter for exceptions.
#[must_use]
pub fn classify(record: &InstructionRecord, csr_comparisons: &[CsrComparison]) -> InstStatus {
    match record.category() {
        ResultCategory::Success => InstStatus::Pass,
        ResultCategory::Exception => {
            if csr_comparisons.iter().any(CsrComparison::mismatch) {
                InstStatus::ExceptionFailing
            } else {
                InstStatus::ExceptionPassing
            }
        }
        ResultCategory::PcMismatch => InstStatus::MismatchPc,
        ResultCategory::RegValueMismatch => InstStatus::MismatchRegVal,
        ResultCategory::Unimplemented => InstStatus::UnimplPassing,
        ResultCategory::UnimplementedTolerated => InstStatus::UnimplFailing,
        ResultCategory::Unknown(_) => InstStatus::Unspecified,
    }
}

/// A record with its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRecord {
    pub record: InstructionRecord,
    pub status: InstStatus,
}

/// Classify every record of a (test, hart), in replay order.
///
/// CSR comparisons are only fetched for exception records.
///
/// # Errors
///
/// Returns an error if the records or comparisons cannot be read.
pub fn classify_trace<S: TraceStore + ?Sized>(
    store: &S,
    test: TestId,
    hart: HartId,
) -> Result<Vec<ClassifiedRecord>, StoreError> {
    store
        .instructions(test, hart, None)?
        .into_iter()
        .map(|record| {
            let status = if record.category() == ResultCategory::Exception {
                classify(&record, &store.csr_comparisons(test, hart, record.pc)?)
            } else {
                classify(&record, &[])
            };
            Ok(ClassifiedRecord { record, status })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExceptionCause, Privilege, ResultCode};

    fn record(result: ResultCode) -> InstructionRecord {
        InstructionRecord {
            seq: 1,
            pc: 0x100,
            mnemonic: "ecall".to_string(),
            disasm: "ecall".to_string(),
            opcode: 0x73,
            privilege: Privilege::M,
            rs1: None,
            rs2: None,
            imm: None,
            rd: None,
            result,
        }
    }

    fn cmp(csr: &str, model: u64, reference: u64) -> CsrComparison {
        CsrComparison {
            pc: 0x100,
            csr: csr.to_string(),
            model_value: model,
            reference_value: reference,
        }
    }

    #[test]
    fn test_categories() {
        let cases = [
            (ResultCode::OK, InstStatus::Pass),
            (
                ResultCode::new(ResultCategory::PcMismatch, 0),
                InstStatus::MismatchPc,
            ),
            (
                ResultCode::new(ResultCategory::RegValueMismatch, 0),
                InstStatus::MismatchRegVal,
            ),
            (
                ResultCode::new(ResultCategory::Unimplemented, 0),
                InstStatus::UnimplPassing,
            ),
            (
                ResultCode::new(ResultCategory::UnimplementedTolerated, 0),
                InstStatus::UnimplFailing,
            ),
            (ResultCode(9 << 16), InstStatus::Unspecified),
        ];
        for (code, expected) in cases {
            assert_eq!(classify(&record(code), &[]), expected, "{code}");
        }
    }

    #[test]
    fn test_exception_without_comparisons_passes() {
        let rec = record(ResultCode::exception(ExceptionCause::IllegalInstruction));
        assert_eq!(classify(&rec, &[]), InstStatus::ExceptionPassing);
    }

    #[test]
    fn test_exception_with_csr_mismatch_fails() {
        let rec = record(ResultCode::exception(ExceptionCause::MachineEcall));
        let matching = [cmp("mcause", 11, 11), cmp("mepc", 0x100, 0x100)];
        assert_eq!(classify(&rec, &matching), InstStatus::ExceptionPassing);

        let mismatching = [cmp("mcause", 11, 11), cmp("mtval", 0, 4)];
        assert_eq!(classify(&rec, &mismatching), InstStatus::ExceptionFailing);
    }

    #[test]
    fn test_severity() {
        assert_eq!(InstStatus::Pass.severity(), Severity::Neutral);
        assert_eq!(InstStatus::ExceptionPassing.severity(), Severity::Neutral);
        assert_eq!(InstStatus::UnimplPassing.severity(), Severity::Warning);
        assert_eq!(InstStatus::Unspecified.severity(), Severity::Muted);
        let alerts: Vec<_> = InstStatus::ALL
            .into_iter()
            .filter(|s| s.is_alert())
            .collect();
        assert_eq!(
            alerts,
            vec![
                InstStatus::MismatchPc,
                InstStatus::MismatchRegVal,
                InstStatus::UnimplFailing,
                InstStatus::ExceptionFailing,
            ]
        );
    }
}
