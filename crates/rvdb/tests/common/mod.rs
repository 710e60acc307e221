//! Fixture traces written to a temporary workload database.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rvdb::{
    ArchDescription, CsrComparison, DestOperand, ExceptionCause, HartId, InstructionRecord,
    MemoryTrace, Privilege, RegisterGroup, RegisterSnapshot, ReplayConfig, ResultCategory,
    ResultCode, TestId, TraceSession, write_trace,
};
use tempfile::TempDir;

pub const HART: HartId = HartId(0);

pub const MSTATUS_JSON: &str = r#"[
    {"name": "mstatus", "num": 768, "desc": "Machine status",
     "fields": {
        "MIE":  {"low_bit": 3,  "high_bit": 3,  "readonly": false, "desc": "M int enable"},
        "MPIE": {"low_bit": 7,  "high_bit": 7,  "readonly": false, "desc": "M prev int enable"},
        "MPP":  {"low_bit": 11, "high_bit": 12, "readonly": false, "desc": "M previous priv"},
        "SD":   {"low_bit": 63, "high_bit": 63, "readonly": true,  "desc": "dirty summary"}
     }},
    {"name": "mcause", "num": 834, "desc": "Trap cause",
     "fields": {"CAUSE": {"low_bit": 0, "high_bit": 63, "readonly": false, "desc": "cause"}}},
    {"name": "mepc", "num": 833, "desc": "Trap PC",
     "fields": {"EPC": {"low_bit": 1, "high_bit": 63, "readonly": false, "desc": "exception pc"}}},
    {"name": "mhartid", "num": 3860, "desc": "Hart id"}
]"#;

/// A workload database plus an architecture description directory.
pub struct Fixture {
    dir: TempDir,
    pub db: PathBuf,
}

impl Fixture {
    pub fn new(trace: &MemoryTrace) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = dir.path().join("workloads.db");
        let conn = rusqlite::Connection::open(&db).expect("create database");
        write_trace(&conn, trace).expect("write trace");
        drop(conn);

        let rv64 = dir.path().join("arch").join("rv64");
        fs::create_dir_all(&rv64).expect("create arch dir");
        fs::write(rv64.join(ArchDescription::CSR_FILE), MSTATUS_JSON).expect("write csr table");

        Self { dir, db }
    }

    pub fn arch_dir(&self) -> PathBuf {
        self.dir.path().join("arch")
    }

    pub fn config(&self) -> ReplayConfig {
        ReplayConfig::default().with_arch_dir(self.arch_dir())
    }

    pub fn session(&self) -> TraceSession {
        self.session_with(self.config())
    }

    pub fn session_with(&self, config: ReplayConfig) -> TraceSession {
        TraceSession::open(Path::new(&self.db), config).expect("open session")
    }
}

pub fn snap(
    name: &str,
    group: RegisterGroup,
    index: u32,
    expected: u64,
    actual: u64,
) -> RegisterSnapshot {
    RegisterSnapshot {
        name: name.to_string(),
        group,
        index,
        expected_init: expected,
        actual_init: actual,
    }
}

/// A record that writes `rd`, or none.
pub fn inst(
    pc: u64,
    disasm: &str,
    rd: Option<(&str, u64, u64)>,
    result: ResultCode,
) -> InstructionRecord {
    InstructionRecord {
        seq: 0,
        pc,
        mnemonic: disasm
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        disasm: disasm.to_string(),
        opcode: 0x13,
        privilege: Privilege::M,
        rs1: None,
        rs2: None,
        imm: None,
        rd: rd.map(|(name, before, after)| DestOperand {
            name: name.to_string(),
            before,
            after,
            truth_after: after,
        }),
        result,
    }
}

/// A successful record writing `rd`.
pub fn ok(pc: u64, disasm: &str, rd: (&str, u64, u64)) -> InstructionRecord {
    inst(pc, disasm, Some(rd), ResultCode::OK)
}

/// A machine-mode `ecall` trap.
pub fn ecall(pc: u64) -> InstructionRecord {
    let trap = ResultCode::exception(ExceptionCause::MachineEcall);
    inst(pc, "ecall", None, trap)
}

pub fn csr(pc: u64, name: &str, model: u64, reference: u64) -> CsrComparison {
    CsrComparison {
        pc,
        csr: name.to_string(),
        model_value: model,
        reference_value: reference,
    }
}

fn base_registers(trace: &mut MemoryTrace, test: TestId) {
    for (name, index) in [("x0", 0), ("x1", 1), ("x5", 5), ("x6", 6)] {
        let (expected, actual) = if name == "x5" && test == TestId(1) {
            (0x10, 0x20)
        } else {
            (0, 0)
        };
        let reg = snap(name, RegisterGroup::Int, index, expected, actual);
        trace.add_register(test, HART, reg);
    }
    for (name, index) in [("mstatus", 0x300), ("mepc", 0x341), ("mcause", 0x342)] {
        trace.add_register(test, HART, snap(name, RegisterGroup::Csr, index, 0, 0));
    }
}

/// Four tests on hart 0:
///
/// - `add`: clean run with one matching trap; x5 starts at 0x20 instead of 0x10
/// - `mismatch`: register value mismatch at 0x104
/// - `tolerated`: tolerated unimplemented instruction at 0x104
/// - `trap`: trap whose mcause differs from the reference
pub fn conformance_trace() -> MemoryTrace {
    let mut trace = MemoryTrace::new();

    let add = trace.add_test("add");
    base_registers(&mut trace, add);
    trace.add_instruction(add, HART, ok(0x100, "addi x1, x0, 5", ("x1", 0, 5)));
    trace.add_instruction(add, HART, ok(0x104, "addi x5, x0, 48", ("x5", 0x20, 0x30)));
    trace.add_instruction(add, HART, ecall(0x108));
    trace.add_csr_comparison(add, HART, csr(0x108, "mepc", 0x108, 0x108));
    trace.add_csr_comparison(add, HART, csr(0x108, "mcause", 11, 11));
    trace.add_instruction(add, HART, ok(0x10c, "add x6, x1, x5", ("x6", 0, 0x35)));

    let mismatch = trace.add_test("mismatch");
    base_registers(&mut trace, mismatch);
    trace.add_instruction(mismatch, HART, ok(0x100, "addi x1, x0, 1", ("x1", 0, 1)));
    let reg_mismatch = ResultCode::new(ResultCategory::RegValueMismatch, 0);
    let bad = inst(0x104, "addi x1, x1, 1", Some(("x1", 1, 3)), reg_mismatch);
    trace.add_instruction(mismatch, HART, bad);
    trace.add_instruction(mismatch, HART, ok(0x108, "addi x6, x0, 7", ("x6", 0, 7)));

    let tolerated = trace.add_test("tolerated");
    base_registers(&mut trace, tolerated);
    trace.add_instruction(tolerated, HART, ok(0x100, "addi x1, x0, 1", ("x1", 0, 1)));
    let unimpl = ResultCode::new(ResultCategory::UnimplementedTolerated, 0);
    trace.add_instruction(tolerated, HART, inst(0x104, "fence.i", None, unimpl));

    let trap = trace.add_test("trap");
    base_registers(&mut trace, trap);
    trace.add_instruction(trap, HART, ecall(0x100));
    trace.add_csr_comparison(trap, HART, csr(0x100, "mcause", 11, 8));
    trace.add_instruction(trap, HART, ok(0x104, "addi x1, x0, 2", ("x1", 0, 2)));

    trace
}
