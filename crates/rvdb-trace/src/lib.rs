//! Trace data model for recorded simulator runs.
//!
//! This crate provides the plain types shared by the store, the register
//! metadata resolver and the replay engine. It has no knowledge of how the
//! trace is persisted.

mod cause;
mod error;
mod group;
mod privilege;
mod record;
mod result;
mod value;

pub use cause::*;
pub use error::*;
pub use group::*;
pub use privilege::*;
pub use record::*;
pub use result::*;
pub use value::*;
