//! Register references and the per-test name table.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use rvdb_trace::{RegisterGroup, RegisterSnapshot, TraceError};
use serde::Serialize;

use crate::ArchError;

/// A resolved register: group, index within the group, and symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RegisterRef {
    pub group: RegisterGroup,
    pub index: u32,
    pub name: String,
}

impl RegisterRef {
    #[must_use]
    pub fn new(group: RegisterGroup, index: u32, name: impl Into<String>) -> Self {
        Self {
            group,
            index,
            name: name.into(),
        }
    }

    /// `x0`, which always reads zero.
    #[must_use]
    pub const fn is_hardwired_zero(&self) -> bool {
        matches!(self.group, RegisterGroup::Int) && self.index == 0
    }

    #[must_use]
    pub const fn is_csr(&self) -> bool {
        matches!(self.group, RegisterGroup::Csr)
    }
}

impl fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Bijection between register names and (group, index) for one (test, hart).
#[derive(Debug, Clone, Default)]
pub struct RegisterTable {
    by_name: BTreeMap<String, RegisterRef>,
    by_key: FxHashMap<(RegisterGroup, u32), String>,
}

impl RegisterTable {
    /// Build the table from a test's register snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::DuplicateRegister`] if a name or a (group, index)
    /// pair appears twice.
    pub fn from_snapshots(snapshots: &[RegisterSnapshot]) -> Result<Self, TraceError> {
        let mut table = Self::default();
        for snap in snapshots {
            table.insert(RegisterRef::new(snap.group, snap.index, snap.name.clone()))?;
        }
        Ok(table)
    }

    fn insert(&mut self, reg: RegisterRef) -> Result<(), TraceError> {
        let key = (reg.group, reg.index);
        if self.by_name.contains_key(&reg.name) || self.by_key.contains_key(&key) {
            return Err(TraceError::DuplicateRegister {
                name: reg.name,
                group: key.0,
                index: key.1,
            });
        }
        self.by_key.insert(key, reg.name.clone());
        self.by_name.insert(reg.name.clone(), reg);
        Ok(())
    }

    /// Resolve a symbolic name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::RegisterNotFound`] for names not in the table.
    pub fn resolve(&self, name: &str) -> Result<&RegisterRef, ArchError> {
        self.by_name
            .get(name)
            .ok_or_else(|| ArchError::RegisterNotFound(name.to_string()))
    }

    /// Name registered for a (group, index) pair.
    #[must_use]
    pub fn name_of(&self, group: RegisterGroup, index: u32) -> Option<&str> {
        self.by_key.get(&(group, index)).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All register names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// CSR registers in name order.
    pub fn csrs(&self) -> impl Iterator<Item = &RegisterRef> {
        self.by_name.values().filter(|r| r.is_csr())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterRef> {
        self.by_name.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
