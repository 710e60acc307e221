//! In-memory trace store.

use rvdb_trace::{
    CsrComparison, HartId, InstructionRecord, RegisterSnapshot, ResultCode, TestId, TestInfo,
};

use crate::{StoreError, TraceStore, sort_records};

/// A trace held in memory.
///
/// Rows keep insertion order; instruction sequence numbers are assigned on
/// insertion starting at 1, the way SQLite assigns rowids.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    pub(crate) tests: Vec<TestInfo>,
    pub(crate) registers: Vec<(TestId, HartId, RegisterSnapshot)>,
    pub(crate) instructions: Vec<(TestId, HartId, InstructionRecord)>,
    pub(crate) csr_values: Vec<(TestId, HartId, CsrComparison)>,
}

impl MemoryTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a test and return its id.
    pub fn add_test(&mut self, name: impl Into<String>) -> TestId {
        let id = TestId(self.next_id());
        self.tests.push(TestInfo {
            id,
            name: name.into(),
        });
        id
    }

    pub fn add_register(&mut self, test: TestId, hart: HartId, snapshot: RegisterSnapshot) {
        self.registers.push((test, hart, snapshot));
    }

    /// Append an instruction record. Its `seq` is overwritten and returned.
    pub fn add_instruction(
        &mut self,
        test: TestId,
        hart: HartId,
        mut record: InstructionRecord,
    ) -> i64 {
        let seq = self.next_seq();
        record.seq = seq;
        self.instructions.push((test, hart, record));
        seq
    }

    pub fn add_csr_comparison(&mut self, test: TestId, hart: HartId, comparison: CsrComparison) {
        self.csr_values.push((test, hart, comparison));
    }

    fn next_id(&self) -> i64 {
        self.tests.iter().map(|t| t.id.0).max().unwrap_or(0) + 1
    }

    fn next_seq(&self) -> i64 {
        self.instructions
            .last()
            .map_or(1, |(_, _, record)| record.seq + 1)
    }

    fn records(&self, test: TestId, hart: HartId) -> impl Iterator<Item = &InstructionRecord> {
        self.instructions
            .iter()
            .filter(move |(t, h, _)| *t == test && *h == hart)
            .map(|(_, _, record)| record)
    }
}

impl TraceStore for MemoryTrace {
    fn tests(&self) -> Result<Vec<TestInfo>, StoreError> {
        let mut tests = self.tests.clone();
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    fn register_snapshots(
        &self,
        test: TestId,
        hart: HartId,
    ) -> Result<Vec<RegisterSnapshot>, StoreError> {
        Ok(self
            .registers
            .iter()
            .filter(|(t, h, _)| *t == test && *h == hart)
            .map(|(_, _, snapshot)| snapshot.clone())
            .collect())
    }

    fn instructions(
        &self,
        test: TestId,
        hart: HartId,
        max_pc: Option<u64>,
    ) -> Result<Vec<InstructionRecord>, StoreError> {
        let mut records: Vec<_> = self
            .records(test, hart)
            .filter(|r| max_pc.is_none_or(|max| r.pc <= max))
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn instructions_at(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<InstructionRecord>, StoreError> {
        Ok(self
            .records(test, hart)
            .filter(|r| r.pc == pc)
            .cloned()
            .collect())
    }

    fn csr_comparisons(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<CsrComparison>, StoreError> {
        let mut cmps: Vec<_> = self
            .csr_values
            .iter()
            .filter(|(t, h, c)| *t == test && *h == hart && c.pc == pc)
            .map(|(_, _, c)| c.clone())
            .collect();
        cmps.sort_by(|a, b| a.csr.cmp(&b.csr));
        Ok(cmps)
    }

    fn result_codes(&self) -> Result<Vec<(TestId, ResultCode)>, StoreError> {
        Ok(self
            .instructions
            .iter()
            .map(|(test, _, record)| (*test, record.result))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvdb_trace::Privilege;

    fn nop(pc: u64) -> InstructionRecord {
        InstructionRecord {
            seq: 0,
            pc,
            mnemonic: "nop".to_string(),
            disasm: "nop".to_string(),
            opcode: 0x13,
            privilege: Privilege::M,
            rs1: None,
            rs2: None,
            imm: None,
            rd: None,
            result: ResultCode::OK,
        }
    }

    #[test]
    fn test_sequence_numbers_follow_insertion() {
        let mut trace = MemoryTrace::new();
        let test = trace.add_test("t");
        assert_eq!(trace.add_instruction(test, HartId(0), nop(0x10)), 1);
        assert_eq!(trace.add_instruction(test, HartId(0), nop(0x0c)), 2);

        let records = trace.instructions(test, HartId(0), None).unwrap();
        assert_eq!(records[0].pc, 0x0c);
        assert_eq!(records[0].seq, 2);
    }

    #[test]
    fn test_harts_are_separate() {
        let mut trace = MemoryTrace::new();
        let test = trace.add_test("t");
        trace.add_instruction(test, HartId(0), nop(0x10));
        trace.add_instruction(test, HartId(1), nop(0x10));
        trace.add_instruction(test, HartId(1), nop(0x14));

        assert_eq!(trace.instructions(test, HartId(1), None).unwrap().len(), 2);
        assert_eq!(
            trace.instructions_at(test, HartId(0), 0x10).unwrap().len(),
            1
        );
        assert_eq!(trace.result_codes().unwrap().len(), 3);
    }

    #[test]
    fn test_default_lookup_by_name() {
        let mut trace = MemoryTrace::new();
        trace.add_test("a");
        let b = trace.add_test("b");
        assert_eq!(trace.test_by_name("b").unwrap().id, b);
        assert!(trace.test_by_name("c").is_err());
    }
}
