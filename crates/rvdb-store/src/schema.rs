//! Table layout of the workload database.
//!
//! Column names follow the simulator that writes the database. Only the
//! columns read by the store are listed; extra producer columns are ignored.

use rusqlite::Connection;

pub const TESTS_TABLE: &str = "RiscvTests";
pub const REGISTERS_TABLE: &str = "Registers";
pub const INSTRUCTIONS_TABLE: &str = "Instructions";
pub const CSR_VALUES_TABLE: &str = "PostInstCsrVals";

/// DDL for an empty trace database.
pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS RiscvTests (
    Id INTEGER PRIMARY KEY,
    TestName TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS Registers (
    TestId INTEGER NOT NULL,
    HartId INTEGER NOT NULL,
    RegName TEXT NOT NULL,
    RegType INTEGER NOT NULL,
    RegIdx INTEGER NOT NULL,
    ExpectedInitVal INTEGER NOT NULL,
    ActualInitVal INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS Instructions (
    TestId INTEGER NOT NULL,
    HartId INTEGER NOT NULL,
    PC INTEGER NOT NULL,
    Mnemonic TEXT NOT NULL,
    Disasm TEXT NOT NULL,
    Opcode INTEGER NOT NULL,
    Priv INTEGER NOT NULL,
    Rs1 TEXT,
    Rs1Val INTEGER,
    Rs2 TEXT,
    Rs2Val INTEGER,
    Rd TEXT,
    RdValBefore INTEGER,
    RdValAfter INTEGER,
    TruthRdValAfter INTEGER,
    HasImm INTEGER NOT NULL DEFAULT 0,
    Imm INTEGER,
    ResultCode INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS PostInstCsrVals (
    TestId INTEGER NOT NULL,
    HartId INTEGER NOT NULL,
    PC INTEGER NOT NULL,
    CsrName TEXT NOT NULL,
    AtlasCsrVal INTEGER NOT NULL,
    CosimCsrVal INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS InstructionsByPc ON Instructions (TestId, HartId, PC);
CREATE INDEX IF NOT EXISTS CsrValsByPc ON PostInstCsrVals (TestId, HartId, PC);
";

/// Create the trace tables if they do not exist.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }
}
