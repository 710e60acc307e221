//! CSR field tables from the architecture description.
//!
//! The description is the JSON array written by the register definition
//! generator (`arch/<rv32|rv64>/reg_csr.json`):
//!
//! ```json
//! [{"name": "mstatus", "num": 768, "desc": "...",
//!   "fields": {"MIE": {"low_bit": 3, "high_bit": 3, "readonly": false, "desc": "..."}}}]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{ArchError, Xlen};

/// One bit field of a CSR.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CsrField {
    pub low_bit: u32,
    pub high_bit: u32,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub desc: String,
}

impl CsrField {
    /// Bits `low_bit..=high_bit` set.
    #[must_use]
    pub const fn span_mask(&self) -> u64 {
        if self.low_bit > self.high_bit || self.low_bit >= 64 {
            return 0;
        }
        let width = self.high_bit - self.low_bit + 1;
        if width >= 64 {
            u64::MAX
        } else {
            ((1u64 << width) - 1) << self.low_bit
        }
    }

    /// Field value shifted down to bit 0.
    #[must_use]
    pub const fn extract(&self, value: u64) -> u64 {
        match (value & self.span_mask()).checked_shr(self.low_bit) {
            Some(v) => v,
            None => 0,
        }
    }

    const fn is_valid(&self) -> bool {
        self.low_bit <= self.high_bit && self.high_bit < 64
    }
}

/// A CSR entry of the description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CsrDescription {
    pub name: String,
    #[serde(default)]
    pub num: Option<u32>,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub fields: BTreeMap<String, CsrField>,
}

/// Decoded value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub name: String,
    pub value: u64,
    pub low_bit: u32,
    pub high_bit: u32,
    pub readonly: bool,
    pub desc: String,
}

impl CsrDescription {
    /// Union of all writable field spans.
    #[must_use]
    pub fn write_mask(&self) -> u64 {
        self.fields
            .values()
            .filter(|f| !f.readonly)
            .fold(0, |mask, f| mask | f.span_mask())
    }

    /// Split `value` into its fields, in field-name order.
    #[must_use]
    pub fn decode(&self, value: u64) -> Vec<FieldValue> {
        self.fields
            .iter()
            .map(|(name, f)| FieldValue {
                name: name.clone(),
                value: f.extract(value),
                low_bit: f.low_bit,
                high_bit: f.high_bit,
                readonly: f.readonly,
                desc: f.desc.clone(),
            })
            .collect()
    }
}

/// CSR field tables for one XLEN.
#[derive(Debug, Clone)]
pub struct ArchDescription {
    xlen: Xlen,
    csrs: FxHashMap<String, CsrDescription>,
}

impl ArchDescription {
    /// File name of the CSR table inside a width directory.
    pub const CSR_FILE: &'static str = "reg_csr.json";

    /// Parse a description from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has an invalid bit range.
    pub fn from_json(xlen: Xlen, json: &str) -> Result<Self, ArchError> {
        let entries: Vec<CsrDescription> = serde_json::from_str(json)?;
        let mut csrs = FxHashMap::default();
        for entry in entries {
            for (field, def) in &entry.fields {
                if !def.is_valid() {
                    return Err(ArchError::InvalidField {
                        csr: entry.name.clone(),
                        field: field.clone(),
                        low_bit: def.low_bit,
                        high_bit: def.high_bit,
                    });
                }
            }
            csrs.insert(entry.name.clone(), entry);
        }
        Ok(Self { xlen, csrs })
    }

    /// Load `<arch_dir>/<rv32|rv64>/reg_csr.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::MissingArchDescription`] if the file cannot be read,
    /// or any error of [`ArchDescription::from_json`].
    pub fn load(arch_dir: &Path, xlen: Xlen) -> Result<Self, ArchError> {
        let path = arch_dir.join(xlen.dir_name()).join(Self::CSR_FILE);
        let json = fs::read_to_string(&path).map_err(|e| ArchError::MissingArchDescription {
            xlen,
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        let desc = Self::from_json(xlen, &json)?;
        tracing::debug!(
            path = %path.display(),
            csrs = desc.len(),
            "loaded architecture description"
        );
        Ok(desc)
    }

    #[must_use]
    pub const fn xlen(&self) -> Xlen {
        self.xlen
    }

    #[must_use]
    pub fn csr(&self, name: &str) -> Option<&CsrDescription> {
        self.csrs.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.csrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.csrs.is_empty()
    }
}
