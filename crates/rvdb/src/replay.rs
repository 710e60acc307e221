//! Register state reconstruction.
//!
//! The state at a point of the trace is rebuilt from the model's initial
//! register values by re-applying every recorded effect in program-counter
//! order:
//!
//! - successful instructions overwrite their destination register with the
//!   value the model produced;
//! - exceptions overwrite every tracked CSR with the model's post-exception
//!   value;
//! - a PC mismatch, register-value mismatch or tolerated unimplemented
//!   instruction ends the replay, since nothing after it is reliable.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    HartId, InstructionRecord, RegisterRef, RegisterSnapshot, RegisterTable, ResultCategory,
    StoreError, TestId, TraceStore, metrics,
};

/// Where a replay ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayTarget {
    /// Every record with a PC at or below this address. When the PC executed
    /// more than once, this is its last occurrence in the ordered stream.
    Pc(u64),
    /// The n-th record (0-based) of the PC-ordered stream.
    Record(usize),
}

impl fmt::Display for ReplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc(pc) => write!(f, "PC {pc:#x}"),
            Self::Record(n) => write!(f, "record #{n}"),
        }
    }
}

/// Replay errors.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("could not replay all the way to {target} ({replayed} records replayed)")]
    Incomplete {
        target: ReplayTarget,
        replayed: usize,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Typed access to a register file.
pub trait RegisterAccess {
    fn read(&self, reg: &RegisterRef) -> Option<u64>;

    fn write(&mut self, reg: &RegisterRef, value: u64);

    /// Write only the bits of `value` selected by `mask`; the other bits keep
    /// their current value.
    fn masked_write(&mut self, reg: &RegisterRef, value: u64, mask: u64) {
        let old = self.read(reg).unwrap_or_default();
        self.write(reg, (old & !mask) | (value & mask));
    }
}

/// Register values by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegisterState {
    values: BTreeMap<String, u64>,
}

impl RegisterState {
    /// State holding every register's actual initial value.
    #[must_use]
    pub fn from_snapshots(snapshots: &[RegisterSnapshot]) -> Self {
        Self {
            values: snapshots
                .iter()
                .map(|s| (s.name.clone(), s.actual_init))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: u64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl RegisterAccess for RegisterState {
    fn read(&self, reg: &RegisterRef) -> Option<u64> {
        self.get(&reg.name)
    }

    fn write(&mut self, reg: &RegisterRef, value: u64) {
        self.set(&reg.name, value);
    }
}

/// Replays one (test, hart) of a store.
pub struct Replayer<'a, S: TraceStore + ?Sized> {
    store: &'a S,
    test: TestId,
    hart: HartId,
    snapshots: &'a [RegisterSnapshot],
    table: &'a RegisterTable,
}

impl<'a, S: TraceStore + ?Sized> Replayer<'a, S> {
    #[must_use]
    pub const fn new(
        store: &'a S,
        test: TestId,
        hart: HartId,
        snapshots: &'a [RegisterSnapshot],
        table: &'a RegisterTable,
    ) -> Self {
        Self {
            store,
            test,
            hart,
            snapshots,
            table,
        }
    }

    /// Reconstruct the register state at `target`.
    ///
    /// Fails with [`ReplayError::Incomplete`] when the replay stops before the
    /// target: the target is not in the trace, or an unreliable record
    /// precedes it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Incomplete`] as above, or a store error if the
    /// records cannot be read.
    pub fn reconstruct(&self, target: ReplayTarget) -> Result<RegisterState, ReplayError> {
        let start = Instant::now();
        let records = self.records_up_to(target)?;

        let mut state = RegisterState::from_snapshots(self.snapshots);
        let mut last: Option<(usize, u64)> = None;
        for (index, record) in records.iter().enumerate() {
            last = Some((index, record.pc));
            self.apply(&mut state, record)?;

            let category = record.category();
            if category.halts_replay() {
                debug!(
                    test = %self.test,
                    pc = %format_args!("{:#x}", record.pc),
                    category = category.raw(),
                    "replay stopped at unreliable record"
                );
                break;
            }
        }

        let replayed = last.map_or(0, |(index, _)| index + 1);
        let reached = match (target, last) {
            (ReplayTarget::Pc(pc), Some((_, last_pc))) => last_pc == pc,
            (ReplayTarget::Record(n), Some((index, _))) => index == n,
            (_, None) => false,
        };
        metrics::record_replay(replayed, start.elapsed().as_secs_f64(), reached);

        if !reached {
            return Err(ReplayError::Incomplete { target, replayed });
        }
        debug!(test = %self.test, %target, replayed, "reconstructed register state");
        Ok(state)
    }

    fn records_up_to(&self, target: ReplayTarget) -> Result<Vec<InstructionRecord>, StoreError> {
        match target {
            ReplayTarget::Pc(pc) => self.store.instructions(self.test, self.hart, Some(pc)),
            ReplayTarget::Record(n) => {
                let mut records = self.store.instructions(self.test, self.hart, None)?;
                records.truncate(n.saturating_add(1));
                Ok(records)
            }
        }
    }

    fn apply(
        &self,
        state: &mut RegisterState,
        record: &InstructionRecord,
    ) -> Result<(), StoreError> {
        match record.category() {
            ResultCategory::Success => {
                if let Some(rd) = &record.rd {
                    if !self.table.contains(&rd.name) {
                        debug!(
                            register = %rd.name,
                            pc = %format_args!("{:#x}", record.pc),
                            "write to unlisted register"
                        );
                    }
                    state.set(&rd.name, rd.after);
                }
            }
            ResultCategory::Exception => {
                for cmp in self.store.csr_comparisons(self.test, self.hart, record.pc)? {
                    state.set(&cmp.csr, cmp.model_value);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsrComparison, DestOperand, MemoryTrace, Privilege, RegisterGroup, ResultCode};

    const HART: HartId = HartId(0);

    fn snap(name: &str, group: RegisterGroup, index: u32, init: u64) -> RegisterSnapshot {
        RegisterSnapshot {
            name: name.to_string(),
            group,
            index,
            expected_init: init,
            actual_init: init,
        }
    }

    fn write(pc: u64, rd: &str, after: u64, result: ResultCode) -> InstructionRecord {
        InstructionRecord {
            seq: 0,
            pc,
            mnemonic: "addi".to_string(),
            disasm: format!("addi {rd}, {rd}, 1"),
            opcode: 0x13,
            privilege: Privilege::M,
            rs1: None,
            rs2: None,
            imm: Some(1),
            rd: Some(DestOperand {
                name: rd.to_string(),
                before: 0,
                after,
                truth_after: after,
            }),
            result,
        }
    }

    struct Fixture {
        trace: MemoryTrace,
        test: TestId,
        snapshots: Vec<RegisterSnapshot>,
        table: RegisterTable,
    }

    impl Fixture {
        fn new() -> Self {
            let mut trace = MemoryTrace::new();
            let test = trace.add_test("t");
            let snapshots = vec![
                snap("x0", RegisterGroup::Int, 0, 0),
                snap("x1", RegisterGroup::Int, 1, 0x11),
                snap("x2", RegisterGroup::Int, 2, 0x22),
                snap("mcause", RegisterGroup::Csr, 0x342, 0),
            ];
            for s in &snapshots {
                trace.add_register(test, HART, s.clone());
            }
            let table = RegisterTable::from_snapshots(&snapshots).unwrap();
            Self {
                trace,
                test,
                snapshots,
                table,
            }
        }

        fn push(&mut self, record: InstructionRecord) {
            self.trace.add_instruction(self.test, HART, record);
        }

        fn replay(&self, target: ReplayTarget) -> Result<RegisterState, ReplayError> {
            Replayer::new(&self.trace, self.test, HART, &self.snapshots, &self.table)
                .reconstruct(target)
        }
    }

    #[test]
    fn test_seeds_from_actual_initial_values() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x1", 0x99, ResultCode::OK));

        let state = fx.replay(ReplayTarget::Pc(0x100)).unwrap();
        assert_eq!(state.get("x1"), Some(0x99));
        assert_eq!(state.get("x2"), Some(0x22));
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn test_final_state_reproduces_every_write() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x1", 1, ResultCode::OK));
        fx.push(write(0x104, "x2", 2, ResultCode::OK));
        fx.push(write(0x108, "x1", 3, ResultCode::OK));

        let state = fx.replay(ReplayTarget::Pc(0x108)).unwrap();
        assert_eq!(state.get("x1"), Some(3));
        assert_eq!(state.get("x2"), Some(2));
    }

    #[test]
    fn test_exception_applies_model_csr_values() {
        let mut fx = Fixture::new();
        let cause = crate::ExceptionCause::MachineEcall;
        let mut ecall = write(0x100, "x1", 0xdead, ResultCode::exception(cause));
        ecall.rd = None;
        fx.push(ecall);
        fx.trace.add_csr_comparison(
            fx.test,
            HART,
            CsrComparison {
                pc: 0x100,
                csr: "mcause".to_string(),
                model_value: 11,
                reference_value: 8,
            },
        );

        let state = fx.replay(ReplayTarget::Pc(0x100)).unwrap();
        assert_eq!(state.get("mcause"), Some(11));
        assert_eq!(state.get("x1"), Some(0x11));
    }

    #[test]
    fn test_mismatch_halts_replay() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x1", 1, ResultCode::OK));
        let mismatch = ResultCode::new(ResultCategory::RegValueMismatch, 0);
        fx.push(write(0x104, "x1", 2, mismatch));
        fx.push(write(0x108, "x2", 3, ResultCode::OK));

        // The halting record itself is the last one replayed.
        let at = fx.replay(ReplayTarget::Pc(0x104)).unwrap();
        assert_eq!(at.get("x1"), Some(1));

        assert!(matches!(
            fx.replay(ReplayTarget::Pc(0x108)),
            Err(ReplayError::Incomplete { replayed: 2, .. })
        ));
    }

    #[test]
    fn test_tolerated_unimplemented_halts_but_unimplemented_does_not() {
        let mut fx = Fixture::new();
        let unimplemented = ResultCode::new(ResultCategory::Unimplemented, 0);
        fx.push(write(0x100, "x1", 1, unimplemented));
        fx.push(write(0x104, "x1", 2, ResultCode::OK));
        let state = fx.replay(ReplayTarget::Pc(0x104)).unwrap();
        assert_eq!(state.get("x1"), Some(2));

        let mut fx = Fixture::new();
        let tolerated = ResultCode::new(ResultCategory::UnimplementedTolerated, 0);
        fx.push(write(0x100, "x1", 1, tolerated));
        fx.push(write(0x104, "x1", 2, ResultCode::OK));
        assert!(fx.replay(ReplayTarget::Pc(0x104)).is_err());
    }

    #[test]
    fn test_missing_target_is_incomplete() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x1", 1, ResultCode::OK));

        assert!(matches!(
            fx.replay(ReplayTarget::Pc(0x104)),
            Err(ReplayError::Incomplete { replayed: 1, .. })
        ));
        assert!(matches!(
            fx.replay(ReplayTarget::Pc(0x0fc)),
            Err(ReplayError::Incomplete { replayed: 0, .. })
        ));
        assert!(fx.replay(ReplayTarget::Record(5)).is_err());
    }

    #[test]
    fn test_repeated_pc_targets() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x1", 1, ResultCode::OK));
        fx.push(write(0x104, "x2", 2, ResultCode::OK));
        fx.push(write(0x100, "x1", 5, ResultCode::OK));

        // PC order: 0x100 (seq 1), 0x100 (seq 3), 0x104.
        let by_pc = fx.replay(ReplayTarget::Pc(0x100)).unwrap();
        assert_eq!(by_pc.get("x1"), Some(5));
        assert_eq!(by_pc.get("x2"), Some(0x22));

        let first = fx.replay(ReplayTarget::Record(0)).unwrap();
        assert_eq!(first.get("x1"), Some(1));
    }

    #[test]
    fn test_unlisted_destination_is_still_written() {
        let mut fx = Fixture::new();
        fx.push(write(0x100, "x9", 9, ResultCode::OK));
        let state = fx.replay(ReplayTarget::Pc(0x100)).unwrap();
        assert_eq!(state.get("x9"), Some(9));
    }

    #[test]
    fn test_masked_write() {
        let reg = RegisterRef::new(RegisterGroup::Csr, 0x300, "mstatus");
        let mut state = RegisterState::default();
        state.write(&reg, 0xF0F0);
        state.masked_write(&reg, 0x0FFF, 0x00FF);
        assert_eq!(state.read(&reg), Some(0xF0FF));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(ReplayTarget::Pc(0x8000_0000).to_string(), "PC 0x80000000");
        assert_eq!(ReplayTarget::Record(3).to_string(), "record #3");
    }
}
