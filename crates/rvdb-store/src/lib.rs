//! Trace store access.
//!
//! [`TraceStore`] is the read-only view the replay engine consumes. Two
//! implementations are provided: [`SqliteTraceStore`] over the simulator's
//! workload database, and [`MemoryTrace`] for synthetic traces. A
//! [`MemoryTrace`] can be written out to SQLite with [`write_trace`].

mod error;
mod memory;
pub mod schema;
mod sqlite;
mod writer;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use writer::*;

use rvdb_trace::{
    CsrComparison, HartId, InstructionRecord, RegisterSnapshot, ResultCode, TestId, TestInfo,
};

/// Read-only access to a persisted trace.
///
/// The trace never changes while a store is open, so every method is
/// deterministic.
///
/// # Errors
///
/// Every method returns an error if the backing store cannot be read or a
/// row fails validation.
pub trait TraceStore: Send + Sync {
    /// All tests, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the test table cannot be read.
    fn tests(&self) -> Result<Vec<TestInfo>, StoreError>;

    /// Look up a test by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TestNotFound`] if no test has that name.
    fn test_by_name(&self, name: &str) -> Result<TestInfo, StoreError> {
        self.tests()?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::TestNotFound(name.to_string()))
    }

    /// Register snapshots of a (test, hart), in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot row cannot be read or has an invalid group.
    fn register_snapshots(
        &self,
        test: TestId,
        hart: HartId,
    ) -> Result<Vec<RegisterSnapshot>, StoreError>;

    /// Instruction records of a (test, hart) with `pc <= max_pc` (all when
    /// `None`), ordered by ascending PC and then by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if an instruction row cannot be read or fails validation.
    fn instructions(
        &self,
        test: TestId,
        hart: HartId,
        max_pc: Option<u64>,
    ) -> Result<Vec<InstructionRecord>, StoreError>;

    /// Every record executed at `pc`, in sequence order.
    ///
    /// # Errors
    ///
    /// Returns an error if an instruction row cannot be read or fails validation.
    fn instructions_at(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<InstructionRecord>, StoreError>;

    /// Post-instruction CSR comparisons at `pc`, ordered by CSR name.
    ///
    /// # Errors
    ///
    /// Returns an error if a comparison row cannot be read.
    fn csr_comparisons(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<CsrComparison>, StoreError>;

    /// Result codes of every instruction in the store, across all harts.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be read or has no result code.
    fn result_codes(&self) -> Result<Vec<(TestId, ResultCode)>, StoreError>;
}

/// Order records by PC (as an unsigned address), then by sequence.
pub(crate) fn sort_records(records: &mut [InstructionRecord]) {
    records.sort_by_key(|r| (r.pc, r.seq));
}
