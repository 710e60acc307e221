//! Per-test register metadata: name resolution plus writable-bit masks.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use rvdb_trace::RegisterGroup;

use crate::{
    ArchDescription, ArchError, CsrDescription, FieldValue, RegisterRef, RegisterTable, Xlen,
};

/// Register metadata for one loaded (test, hart).
///
/// CSR masks are computed on first use and kept for the lifetime of the
/// value. Safe to share between threads.
#[derive(Debug)]
pub struct RegisterMetadata {
    table: RegisterTable,
    xlen: Xlen,
    arch: Option<Arc<ArchDescription>>,
    masks: RwLock<FxHashMap<String, u64>>,
}

impl RegisterMetadata {
    #[must_use]
    pub fn new(table: RegisterTable, xlen: Xlen, arch: Option<Arc<ArchDescription>>) -> Self {
        Self {
            table,
            xlen,
            arch,
            masks: RwLock::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &RegisterTable {
        &self.table
    }

    #[must_use]
    pub const fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Resolve a symbolic name to its group and index.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::RegisterNotFound`] if the test has no such register.
    pub fn resolve(&self, name: &str) -> Result<&RegisterRef, ArchError> {
        self.table.resolve(name)
    }

    /// Bits of `reg` that software can write.
    ///
    /// `x0` is hardwired to zero; other integer, FP and vector registers are
    /// fully writable. CSR masks come from the architecture description.
    ///
    /// # Errors
    ///
    /// Returns an error if `reg` is a CSR and the architecture description is
    /// missing or does not describe it.
    pub fn write_mask(&self, reg: &RegisterRef) -> Result<u64, ArchError> {
        match reg.group {
            RegisterGroup::Int if reg.index == 0 => Ok(0),
            RegisterGroup::Int | RegisterGroup::Fp | RegisterGroup::Vec => Ok(u64::MAX),
            RegisterGroup::Csr => self.csr_mask(&reg.name),
        }
    }

    /// Resolve `name` and return its write mask.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` does not resolve or its mask is unavailable.
    pub fn write_mask_of(&self, name: &str) -> Result<u64, ArchError> {
        let reg = self.table.resolve(name)?;
        self.write_mask(reg)
    }

    /// Field description of a CSR.
    ///
    /// # Errors
    ///
    /// Returns an error if no architecture description is loaded or it does
    /// not describe `name`.
    pub fn csr_description(&self, name: &str) -> Result<&CsrDescription, ArchError> {
        let arch = self.arch()?;
        arch.csr(name)
            .ok_or_else(|| ArchError::UndescribedCsr(name.to_string()))
    }

    /// Decode `value` into the fields of CSR `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field description of `name` is unavailable.
    pub fn decode_csr(&self, name: &str, value: u64) -> Result<Vec<FieldValue>, ArchError> {
        Ok(self.csr_description(name)?.decode(value))
    }

    fn arch(&self) -> Result<&ArchDescription, ArchError> {
        self.arch.as_deref().ok_or_else(|| ArchError::MissingArchDescription {
            xlen: self.xlen,
            reason: "no architecture directory configured".to_string(),
        })
    }

    fn csr_mask(&self, name: &str) -> Result<u64, ArchError> {
        let cached = self.masks.read().get(name).copied();
        if let Some(mask) = cached {
            return Ok(mask);
        }
        let mask = self.csr_description(name)?.write_mask();
        self.masks.write().insert(name.to_string(), mask);
        Ok(mask)
    }
}
