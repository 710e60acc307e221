//! Read-only projections of trace records for display.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::{
    ClassifiedRecord, CsrComparison, FieldValue, InstStatus, InstructionRecord, Privilege,
    RegisterRef, ResultCategory, ResultCode, hex64,
};

static CSR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// CSR number named by a `CSR=0x..` token in a disassembly string.
///
/// # Panics
///
/// Panics if the built-in token pattern fails to compile.
#[must_use]
pub fn csr_number(disasm: &str) -> Option<u32> {
    let pattern = CSR_PATTERN.get_or_init(|| {
        Regex::new(r"CSR=0x([0-9a-fA-F]+)").expect("CSR token pattern is valid")
    });
    let caps = pattern.captures(disasm)?;
    u32::from_str_radix(&caps[1], 16).ok()
}

/// An operand shown in the instruction detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    Source {
        role: &'static str,
        name: String,
        value: u64,
    },
    Immediate {
        value: u64,
    },
    Csr {
        number: u32,
    },
    Dest {
        name: String,
        before: u64,
        after: u64,
        expected: u64,
    },
}

/// Everything recorded about one executed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionDetail {
    pub pc: u64,
    pub seq: i64,
    pub mnemonic: String,
    pub disasm: String,
    pub opcode: u32,
    pub privilege: Privilege,
    pub result: ResultCode,
    pub result_label: String,
    pub operands: Vec<Operand>,
}

impl InstructionDetail {
    #[must_use]
    pub fn from_record(record: &InstructionRecord) -> Self {
        let mut operands = Vec::new();
        for (role, src) in [("rs1", &record.rs1), ("rs2", &record.rs2)] {
            if let Some(src) = src {
                operands.push(Operand::Source {
                    role,
                    name: src.name.clone(),
                    value: src.value,
                });
            }
        }
        if let Some(value) = record.imm {
            operands.push(Operand::Immediate { value });
        }
        if let Some(number) = csr_number(&record.disasm) {
            operands.push(Operand::Csr { number });
        }
        if let Some(rd) = &record.rd {
            operands.push(Operand::Dest {
                name: rd.name.clone(),
                before: rd.before,
                after: rd.after,
                expected: rd.truth_after,
            });
        }

        Self {
            pc: record.pc,
            seq: record.seq,
            mnemonic: record.mnemonic.clone(),
            disasm: record.disasm.clone(),
            opcode: record.opcode,
            privilege: record.privilege,
            result: record.result,
            result_label: record.result.label(),
            operands,
        }
    }

    /// Operand lines in three aligned columns.
    ///
    /// ```text
    /// rs1: x7        0x00000000EFEFEFEF
    /// imm:           0x0000000000001234
    /// rd:  x7
    ///      before:   0x00000000DEADBEEF
    ///      after:    0x00000000BAADF00D
    ///      expected: 0x00000000BAADF00D
    /// ```
    #[must_use]
    pub fn operand_text(&self) -> String {
        let mut lines: Vec<[String; 3]> = Vec::new();
        for op in &self.operands {
            match op {
                Operand::Source { role, name, value } => {
                    lines.push([format!("{role}:"), name.clone(), hex64(*value)]);
                }
                Operand::Immediate { value } => {
                    lines.push(["imm:".to_string(), String::new(), hex64(*value)]);
                }
                Operand::Csr { number } => {
                    lines.push(["csr:".to_string(), number.to_string(), String::new()]);
                }
                Operand::Dest {
                    name,
                    before,
                    after,
                    expected,
                } => {
                    lines.push(["rd:".to_string(), name.clone(), String::new()]);
                    lines.push([String::new(), "before:".to_string(), hex64(*before)]);
                    lines.push([String::new(), "after:".to_string(), hex64(*after)]);
                    lines.push([String::new(), "expected:".to_string(), hex64(*expected)]);
                }
            }
        }
        align_columns(&lines)
    }
}

fn align_columns(lines: &[[String; 3]]) -> String {
    let width = |col: usize| lines.iter().map(|l| l[col].len()).max().unwrap_or(0);
    let (w0, w1) = (width(0), width(1));
    let mut out = String::new();
    for [a, b, c] in lines {
        let _ = writeln!(out, "{a:<w0$} {b:<w1$} {c}");
    }
    out
}

/// Kind of a listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Instruction,
    /// Follows an exception record and names its cause.
    Cause,
}

/// One row of an instruction listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub kind: RowKind,
    pub pc: u64,
    pub seq: i64,
    pub text: String,
    pub status: InstStatus,
}

/// A test's records in replay order, with cause rows after exceptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstructionListing {
    pub rows: Vec<ListingRow>,
}

impl InstructionListing {
    #[must_use]
    pub fn new(classified: &[ClassifiedRecord]) -> Self {
        let mut rows = Vec::with_capacity(classified.len());
        for ClassifiedRecord { record, status } in classified {
            rows.push(ListingRow {
                kind: RowKind::Instruction,
                pc: record.pc,
                seq: record.seq,
                text: record.disasm.replace('\t', " "),
                status: *status,
            });
            if record.category() == ResultCategory::Exception {
                rows.push(ListingRow {
                    kind: RowKind::Cause,
                    pc: record.pc,
                    seq: record.seq,
                    text: format!("  {}", record.result.label()),
                    status: *status,
                });
            }
        }
        Self { rows }
    }

    pub fn instructions(&self) -> impl Iterator<Item = &ListingRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Instruction)
    }
}

/// One CSR after an instruction, model vs. reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrRow {
    pub csr: String,
    pub model: u64,
    pub reference: u64,
    pub mismatch: bool,
}

/// Post-instruction CSR comparisons at one PC, sorted by CSR name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrComparisonView {
    pub pc: u64,
    pub rows: Vec<CsrRow>,
}

impl CsrComparisonView {
    #[must_use]
    pub fn new(pc: u64, comparisons: &[CsrComparison]) -> Self {
        let mut rows: Vec<_> = comparisons
            .iter()
            .map(|c| CsrRow {
                csr: c.csr.clone(),
                model: c.model_value,
                reference: c.reference_value,
                mismatch: c.mismatch(),
            })
            .collect();
        rows.sort_by(|a, b| a.csr.cmp(&b.csr));
        Self { pc, rows }
    }

    #[must_use]
    pub fn has_mismatch(&self) -> bool {
        self.rows.iter().any(|r| r.mismatch)
    }
}

/// A register's value together with its write mask and field decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterMaskView {
    pub register: RegisterRef,
    pub value: u64,
    pub mask: u64,
    /// Field decode of `value`; empty for non-CSR registers.
    pub fields: Vec<FieldValue>,
    /// Value after a masked software write, when one was requested.
    pub written: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DestOperand, ExceptionCause, SourceOperand};

    fn csrrw() -> InstructionRecord {
        InstructionRecord {
            seq: 4,
            pc: 0x8000_0010,
            mnemonic: "csrrw".to_string(),
            disasm: "csrrw\tx5, CSR=0x305, x6".to_string(),
            opcode: 0x3053_12f3,
            privilege: Privilege::M,
            rs1: Some(SourceOperand {
                name: "x6".to_string(),
                value: 0x8000_0100,
            }),
            rs2: None,
            imm: None,
            rd: Some(DestOperand {
                name: "x5".to_string(),
                before: 1,
                after: 0,
                truth_after: 0,
            }),
            result: ResultCode::OK,
        }
    }

    #[test]
    fn test_csr_number_from_disasm() {
        assert_eq!(csr_number("csrrs x1, CSR=0x300, x0"), Some(0x300));
        assert_eq!(csr_number("csrrs x1, CSR=0xF14, x0"), Some(0xF14));
        assert_eq!(csr_number("addi x1, x1, 1"), None);
    }

    #[test]
    fn test_detail_operands() {
        let detail = InstructionDetail::from_record(&csrrw());
        assert_eq!(detail.result_label, "OKAY");
        assert_eq!(detail.operands.len(), 3);
        assert!(matches!(detail.operands[1], Operand::Csr { number: 0x305 }));

        let text = detail.operand_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("rs1: x6"));
        assert!(lines[0].ends_with("0x0000000080000100"));
        assert!(lines[1].starts_with("csr: 773"));
        assert!(lines[5].contains("expected:"));
    }

    #[test]
    fn test_listing_adds_cause_rows() {
        let ok = csrrw();
        let mut trap = csrrw();
        trap.pc = 0x8000_0014;
        trap.disasm = "ecall".to_string();
        trap.result = ResultCode::exception(ExceptionCause::MachineEcall);

        let listing = InstructionListing::new(&[
            ClassifiedRecord {
                record: ok,
                status: InstStatus::Pass,
            },
            ClassifiedRecord {
                record: trap,
                status: InstStatus::ExceptionFailing,
            },
        ]);
        assert_eq!(listing.rows.len(), 3);
        assert_eq!(listing.rows[0].text, "csrrw x5, CSR=0x305, x6");
        let cause = &listing.rows[2];
        assert_eq!(cause.kind, RowKind::Cause);
        assert_eq!(cause.pc, 0x8000_0014);
        assert_eq!(cause.text, "  MACHINE_ECALL");
        assert_eq!(cause.status, InstStatus::ExceptionFailing);
        assert_eq!(listing.instructions().count(), 2);
    }

    #[test]
    fn test_csr_view_sorted_with_mismatch() {
        let cmps = [
            CsrComparison {
                pc: 0x10,
                csr: "mtval".to_string(),
                model_value: 1,
                reference_value: 2,
            },
            CsrComparison {
                pc: 0x10,
                csr: "mcause".to_string(),
                model_value: 2,
                reference_value: 2,
            },
        ];
        let view = CsrComparisonView::new(0x10, &cmps);
        assert_eq!(view.rows[0].csr, "mcause");
        assert!(!view.rows[0].mismatch);
        assert!(view.rows[1].mismatch);
        assert!(view.has_mismatch());
    }
}
