//! Row types of a persisted trace.

use std::fmt;

use serde::Serialize;

use crate::{Privilege, RegisterGroup, ResultCategory, ResultCode};

/// Identifier of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TestId(pub i64);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware thread within a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct HartId(pub u32);

impl fmt::Display for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A test as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestInfo {
    pub id: TestId,
    pub name: String,
}

/// Initial value of one register for a (test, hart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterSnapshot {
    pub name: String,
    pub group: RegisterGroup,
    pub index: u32,
    /// Value the reference model starts with.
    pub expected_init: u64,
    /// Value the model under test started with.
    pub actual_init: u64,
}

impl RegisterSnapshot {
    #[must_use]
    pub const fn differs(&self) -> bool {
        self.expected_init != self.actual_init
    }
}

/// A source register read by an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOperand {
    pub name: String,
    pub value: u64,
}

/// The destination register written by an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestOperand {
    pub name: String,
    /// Value before the instruction executed.
    pub before: u64,
    /// Value the model under test produced.
    pub after: u64,
    /// Value the reference says the register should hold.
    pub truth_after: u64,
}

impl DestOperand {
    #[must_use]
    pub const fn matches_truth(&self) -> bool {
        self.after == self.truth_after
    }
}

/// One dynamically executed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionRecord {
    /// Store-assigned position in program order.
    pub seq: i64,
    pub pc: u64,
    pub mnemonic: String,
    pub disasm: String,
    pub opcode: u32,
    pub privilege: Privilege,
    pub rs1: Option<SourceOperand>,
    pub rs2: Option<SourceOperand>,
    pub imm: Option<u64>,
    pub rd: Option<DestOperand>,
    pub result: ResultCode,
}

impl InstructionRecord {
    #[must_use]
    pub const fn category(&self) -> ResultCategory {
        self.result.category()
    }
}

/// Model vs. reference value of one CSR after an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrComparison {
    pub pc: u64,
    pub csr: String,
    pub model_value: u64,
    pub reference_value: u64,
}

impl CsrComparison {
    #[must_use]
    pub const fn mismatch(&self) -> bool {
        self.model_value != self.reference_value
    }
}
