//! Writing a [`MemoryTrace`] out as a workload database.

use rusqlite::{Connection, params};

use crate::{MemoryTrace, StoreError, schema};

/// Create the trace tables on `conn` and insert every row of `trace`.
///
/// Instruction rows are inserted with their sequence number as rowid.
///
/// # Errors
///
/// Returns an error if the tables cannot be created or an insert fails.
pub fn write_trace(conn: &Connection, trace: &MemoryTrace) -> Result<(), StoreError> {
    schema::create_tables(conn)?;
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO RiscvTests (Id, TestName) VALUES (?1, ?2)")?;
        for test in &trace.tests {
            stmt.execute(params![test.id.0, test.name])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO Registers (TestId, HartId, RegName, RegType, RegIdx, \
             ExpectedInitVal, ActualInitVal) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (test, hart, reg) in &trace.registers {
            stmt.execute(params![
                test.0,
                hart.0,
                reg.name,
                reg.group.number(),
                reg.index,
                reg.expected_init.cast_signed(),
                reg.actual_init.cast_signed(),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO Instructions (rowid, TestId, HartId, PC, Mnemonic, Disasm, Opcode, \
             Priv, Rs1, Rs1Val, Rs2, Rs2Val, Rd, RdValBefore, RdValAfter, TruthRdValAfter, \
             HasImm, Imm, ResultCode) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
             ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )?;
        for (test, hart, rec) in &trace.instructions {
            let rs1 = rec.rs1.as_ref();
            let rs2 = rec.rs2.as_ref();
            let rd = rec.rd.as_ref();
            stmt.execute(params![
                rec.seq,
                test.0,
                hart.0,
                rec.pc.cast_signed(),
                rec.mnemonic,
                rec.disasm,
                rec.opcode,
                rec.privilege.raw(),
                rs1.map(|op| op.name.as_str()),
                rs1.map(|op| op.value.cast_signed()),
                rs2.map(|op| op.name.as_str()),
                rs2.map(|op| op.value.cast_signed()),
                rd.map(|op| op.name.as_str()),
                rd.map(|op| op.before.cast_signed()),
                rd.map(|op| op.after.cast_signed()),
                rd.map(|op| op.truth_after.cast_signed()),
                rec.imm.is_some(),
                rec.imm.map(u64::cast_signed),
                rec.result.0,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO PostInstCsrVals (TestId, HartId, PC, CsrName, AtlasCsrVal, \
             CosimCsrVal) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (test, hart, cmp) in &trace.csr_values {
            stmt.execute(params![
                test.0,
                hart.0,
                cmp.pc.cast_signed(),
                cmp.csr,
                cmp.model_value.cast_signed(),
                cmp.reference_value.cast_signed(),
            ])?;
        }
    }
    tx.commit()?;
    tracing::debug!(
        tests = trace.tests.len(),
        instructions = trace.instructions.len(),
        "wrote trace"
    );
    Ok(())
}
