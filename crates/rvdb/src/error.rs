use thiserror::Error;

use crate::{ArchError, ReplayError, StoreError, TraceError};

/// Errors surfaced by trace sessions.
#[derive(Error, Debug)]
pub enum Error {
    #[error("trace store error: {0}")]
    Store(#[from] StoreError),
    #[error("register metadata error: {0}")]
    Arch(#[from] ArchError),
    #[error("malformed trace: {0}")]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

pub type Result<T> = std::result::Result<T, Error>;
