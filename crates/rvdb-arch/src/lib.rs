//! Register metadata resolution.
//!
//! Maps register names to their group and index for one loaded test, and
//! computes architecturally writable bit masks. CSR masks come from the
//! per-XLEN field tables of the architecture description (`reg_csr.json`).

mod csr;
mod error;
mod metadata;
mod register;
mod xlen;

pub use csr::*;
pub use error::*;
pub use metadata::*;
pub use register::*;
pub use xlen::*;
