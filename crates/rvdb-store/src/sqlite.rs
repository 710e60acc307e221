//! SQLite-backed trace store.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Row, params};
use rvdb_trace::{
    CsrComparison, DestOperand, HartId, InstructionRecord, Privilege, RegisterGroup,
    RegisterSnapshot, ResultCode, SourceOperand, TestId, TestInfo, TraceError,
};
use tracing::{debug, info};

use crate::{StoreError, TraceStore, sort_records};

const INSTRUCTION_COLUMNS: &str = "rowid, PC, Mnemonic, Disasm, Opcode, Priv, \
     Rs1, Rs1Val, Rs2, Rs2Val, Rd, RdValBefore, RdValAfter, TruthRdValAfter, \
     HasImm, Imm, ResultCode";

/// Trace store over a workload database written by the simulator.
///
/// The connection is opened read-only and guarded by a mutex, so the store
/// can be shared between threads.
pub struct SqliteTraceStore {
    conn: Mutex<Connection>,
}

impl SqliteTraceStore {
    /// Open an existing database read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        info!(path = %path.display(), "opened trace database");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl std::fmt::Debug for SqliteTraceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTraceStore").finish_non_exhaustive()
    }
}

/// Instruction row as stored, before validation.
struct RawInstruction {
    rowid: i64,
    pc: i64,
    mnemonic: String,
    disasm: String,
    opcode: i64,
    privilege: Option<i64>,
    rs1: Option<String>,
    rs1_val: Option<i64>,
    rs2: Option<String>,
    rs2_val: Option<i64>,
    rd: Option<String>,
    rd_before: Option<i64>,
    rd_after: Option<i64>,
    truth_after: Option<i64>,
    has_imm: Option<i64>,
    imm: Option<i64>,
    result: Option<i64>,
}

impl RawInstruction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: row.get(0)?,
            pc: row.get(1)?,
            mnemonic: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            disasm: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            opcode: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
            privilege: row.get(5)?,
            rs1: row.get(6)?,
            rs1_val: row.get(7)?,
            rs2: row.get(8)?,
            rs2_val: row.get(9)?,
            rd: row.get(10)?,
            rd_before: row.get(11)?,
            rd_after: row.get(12)?,
            truth_after: row.get(13)?,
            has_imm: row.get(14)?,
            imm: row.get(15)?,
            result: row.get(16)?,
        })
    }

    fn into_record(self) -> Result<InstructionRecord, TraceError> {
        let rd = present(self.rd).map(|name| DestOperand {
            name,
            before: as_u64(self.rd_before),
            after: as_u64(self.rd_after),
            truth_after: as_u64(self.truth_after),
        });
        let privilege = required(self.privilege, "Priv", self.rowid)?;
        let result = required(self.result, "ResultCode", self.rowid)?;
        Ok(InstructionRecord {
            seq: self.rowid,
            pc: self.pc.cast_unsigned(),
            mnemonic: self.mnemonic,
            disasm: self.disasm,
            opcode: low_u32(self.opcode),
            privilege: Privilege::from_raw(privilege)?,
            rs1: source(self.rs1, self.rs1_val),
            rs2: source(self.rs2, self.rs2_val),
            imm: match self.has_imm {
                Some(flag) if flag != 0 => Some(as_u64(self.imm)),
                _ => None,
            },
            rd,
            result: ResultCode(low_u32(result)),
        })
    }
}

fn required(value: Option<i64>, column: &'static str, rowid: i64) -> Result<i64, TraceError> {
    value.ok_or(TraceError::MissingValue { column, rowid })
}

/// Empty register names mean "no operand".
fn present(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.is_empty())
}

fn source(name: Option<String>, value: Option<i64>) -> Option<SourceOperand> {
    present(name).map(|name| SourceOperand {
        name,
        value: as_u64(value),
    })
}

fn as_u64(value: Option<i64>) -> u64 {
    value.unwrap_or_default().cast_unsigned()
}

#[allow(clippy::cast_possible_truncation)]
const fn low_u32(value: i64) -> u32 {
    value.cast_unsigned() as u32
}

/// Whether `pc` is at or below `max` when both are read as unsigned.
///
/// SQLite compares signed integers, so addresses with bit 63 set need an
/// explicit split.
const PC_AT_MOST: &str = "((?3 >= 0 AND PC >= 0 AND PC <= ?3) \
     OR (?3 < 0 AND (PC >= 0 OR PC <= ?3)))";

impl TraceStore for SqliteTraceStore {
    fn tests(&self) -> Result<Vec<TestInfo>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT Id, TestName FROM RiscvTests ORDER BY Id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TestInfo {
                id: TestId(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn test_by_name(&self, name: &str) -> Result<TestInfo, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached("SELECT Id, TestName FROM RiscvTests WHERE TestName = ?1")?;
        let mut rows = stmt.query(params![name])?;
        match rows.next()? {
            Some(row) => Ok(TestInfo {
                id: TestId(row.get(0)?),
                name: row.get(1)?,
            }),
            None => Err(StoreError::TestNotFound(name.to_string())),
        }
    }

    fn register_snapshots(
        &self,
        test: TestId,
        hart: HartId,
    ) -> Result<Vec<RegisterSnapshot>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT RegName, RegType, RegIdx, ExpectedInitVal, ActualInitVal \
             FROM Registers WHERE TestId = ?1 AND HartId = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![test.0, hart.0], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;
        let raw: Vec<(String, i64, i64, i64, i64)> = rows.collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        let mut snapshots = Vec::with_capacity(raw.len());
        for (name, group, index, expected, actual) in raw {
            snapshots.push(RegisterSnapshot {
                name,
                group: RegisterGroup::from_number(group)?,
                index: low_u32(index),
                expected_init: expected.cast_unsigned(),
                actual_init: actual.cast_unsigned(),
            });
        }
        debug!(%test, %hart, count = snapshots.len(), "read register snapshots");
        Ok(snapshots)
    }

    fn instructions(
        &self,
        test: TestId,
        hart: HartId,
        max_pc: Option<u64>,
    ) -> Result<Vec<InstructionRecord>, StoreError> {
        let conn = self.conn.lock();
        let raw: Vec<RawInstruction> = if let Some(max_pc) = max_pc {
            let sql = format!(
                "SELECT {INSTRUCTION_COLUMNS} FROM Instructions \
                 WHERE TestId = ?1 AND HartId = ?2 AND {PC_AT_MOST} ORDER BY rowid"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(
                params![test.0, hart.0, max_pc.cast_signed()],
                RawInstruction::from_row,
            )?;
            rows.collect::<Result<_, _>>()?
        } else {
            let sql = format!(
                "SELECT {INSTRUCTION_COLUMNS} FROM Instructions \
                 WHERE TestId = ?1 AND HartId = ?2 ORDER BY rowid"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![test.0, hart.0], RawInstruction::from_row)?;
            rows.collect::<Result<_, _>>()?
        };
        drop(conn);

        let mut records = raw
            .into_iter()
            .map(RawInstruction::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        sort_records(&mut records);
        Ok(records)
    }

    fn instructions_at(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<InstructionRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {INSTRUCTION_COLUMNS} FROM Instructions \
             WHERE TestId = ?1 AND HartId = ?2 AND PC = ?3 ORDER BY rowid"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![test.0, hart.0, pc.cast_signed()],
            RawInstruction::from_row,
        )?;
        let raw: Vec<RawInstruction> = rows.collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        Ok(raw
            .into_iter()
            .map(RawInstruction::into_record)
            .collect::<Result<_, _>>()?)
    }

    fn csr_comparisons(
        &self,
        test: TestId,
        hart: HartId,
        pc: u64,
    ) -> Result<Vec<CsrComparison>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT CsrName, AtlasCsrVal, CosimCsrVal FROM PostInstCsrVals \
             WHERE TestId = ?1 AND HartId = ?2 AND PC = ?3 ORDER BY CsrName, rowid",
        )?;
        let rows = stmt.query_map(params![test.0, hart.0, pc.cast_signed()], |row| {
            Ok(CsrComparison {
                pc,
                csr: row.get(0)?,
                model_value: row.get::<_, i64>(1)?.cast_unsigned(),
                reference_value: row.get::<_, i64>(2)?.cast_unsigned(),
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn result_codes(&self) -> Result<Vec<(TestId, ResultCode)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT rowid, TestId, ResultCode FROM Instructions")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                TestId(row.get(1)?),
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;
        let raw: Vec<(i64, TestId, Option<i64>)> = rows.collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        let mut codes = Vec::with_capacity(raw.len());
        for (rowid, test, code) in raw {
            let code = required(code, "ResultCode", rowid)?;
            codes.push((test, ResultCode(low_u32(code))));
        }
        Ok(codes)
    }
}
