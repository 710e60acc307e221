//! rvdb - trace replay and state reconstruction for RISC-V conformance runs.
//!
//! Opens the workload database a simulator writes while running a conformance
//! suite, reconstructs the architectural register state at any point of a
//! test's trace, and classifies every executed instruction against the
//! reference model.
//!
//! # Example
//!
//! ```ignore
//! use rvdb::{ReplayConfig, ReplayTarget, TraceSession};
//!
//! let session = TraceSession::open("workloads.db".as_ref(), ReplayConfig::default())?;
//! let test = session.load_test("rv64ui-p-add")?;
//! let state = test.reconstruct(ReplayTarget::Pc(0x8000_0104))?;
//! println!("x5 = {:#x}", state.get("x5").unwrap_or_default());
//! ```

pub use rvdb_arch::{
    ArchDescription, ArchError, CsrDescription, CsrField, FieldValue, RegisterMetadata,
    RegisterRef, RegisterTable, Xlen,
};
pub use rvdb_store::{MemoryTrace, SqliteTraceStore, StoreError, TraceStore, write_trace};
pub use rvdb_trace::{
    CsrComparison, DestOperand, ExceptionCause, HartId, InstructionRecord, Privilege,
    RegisterGroup, RegisterSnapshot, ResultCategory, ResultCode, SourceOperand, TestId, TestInfo,
    TraceError, hex64,
};

mod cache;
mod classify;
mod config;
mod diff;
mod error;
mod outcome;
mod replay;
mod session;

pub mod metrics;
pub mod views;

pub use cache::*;
pub use classify::*;
pub use config::*;
pub use diff::*;
pub use error::*;
pub use outcome::*;
pub use replay::*;
pub use session::*;
