use thiserror::Error;

use crate::RegisterGroup;

/// Errors raised while interpreting raw trace rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("invalid register group: {0}")]
    InvalidRegisterGroup(i64),
    #[error("invalid privilege level: {0}")]
    InvalidPrivilege(i64),
    #[error("register {name} is declared twice ({group}:{index})")]
    DuplicateRegister {
        name: String,
        group: RegisterGroup,
        index: u32,
    },
    #[error("{column} is NULL in row {rowid}")]
    MissingValue { column: &'static str, rowid: i64 },
}
