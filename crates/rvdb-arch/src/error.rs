use thiserror::Error;

use crate::Xlen;

/// Register metadata errors.
#[derive(Error, Debug)]
pub enum ArchError {
    #[error("register not found: {0}")]
    RegisterNotFound(String),
    #[error("no architecture description for {xlen}: {reason}")]
    MissingArchDescription { xlen: Xlen, reason: String },
    #[error("CSR {0} is not in the architecture description")]
    UndescribedCsr(String),
    #[error("CSR {csr} field {field}: invalid bit range {low_bit}..={high_bit}")]
    InvalidField {
        csr: String,
        field: String,
        low_bit: u32,
        high_bit: u32,
    },
    #[error("failed to parse architecture description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Trace(#[from] rvdb_trace::TraceError),
}
