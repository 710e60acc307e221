use thiserror::Error;

/// Trace store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("trace database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("test not found: {0}")]
    TestNotFound(String),
    #[error("no instruction recorded at PC {pc:#x}")]
    InstructionNotFound { pc: u64 },
    #[error("malformed trace row: {0}")]
    Trace(#[from] rvdb_trace::TraceError),
}
