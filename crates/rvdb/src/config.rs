//! Session configuration.

use std::path::PathBuf;

use crate::{HartId, OutcomePolicy, Xlen};

/// Settings shared by every test loaded through a session.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Hardware thread whose trace is replayed.
    pub hart: HartId,
    /// Width of the architecture description used for CSR masks.
    pub xlen: Xlen,
    /// Root of the architecture description (`<dir>/rv64/reg_csr.json`).
    /// Without it, CSR masks and field decodes are unavailable.
    pub arch_dir: Option<PathBuf>,
    /// Memoize reconstructed states.
    pub cache: bool,
    /// How a test's pass/fail outcome is decided.
    pub policy: OutcomePolicy,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            hart: HartId(0),
            xlen: Xlen::Rv64,
            arch_dir: None,
            cache: true,
            policy: OutcomePolicy::default(),
        }
    }
}

impl ReplayConfig {
    #[must_use]
    pub const fn with_hart(mut self, hart: HartId) -> Self {
        self.hart = hart;
        self
    }

    #[must_use]
    pub const fn with_xlen(mut self, xlen: Xlen) -> Self {
        self.xlen = xlen;
        self
    }

    #[must_use]
    pub fn with_arch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.arch_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: OutcomePolicy) -> Self {
        self.policy = policy;
        self
    }
}
