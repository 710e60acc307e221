//! Trace sessions and per-test contexts.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::views::{CsrComparisonView, InstructionDetail, InstructionListing, RegisterMaskView};
use crate::{
    ArchDescription, ArchError, ClassifiedRecord, HartId, InitialDiff, InitialValue,
    InstructionRecord, OutcomePolicy, RegisterAccess, RegisterMetadata, RegisterSnapshot,
    RegisterState, RegisterTable, ReplayCache, ReplayConfig, ReplayError, ReplayTarget, Replayer,
    Result, SqliteTraceStore, StoreError, TestId, TestInfo, TestPartition, TestSummary, TraceStore,
    classify_trace, failing_by_category, failing_by_status, initial_diffs, initial_state, metrics,
};

/// An open trace store plus the settings used to analyze it.
///
/// Sessions are `Sync`; tests loaded from the same session share its replay
/// cache and architecture description.
pub struct TraceSession<S: TraceStore = SqliteTraceStore> {
    store: S,
    config: ReplayConfig,
    arch: Option<Arc<ArchDescription>>,
    cache: ReplayCache,
}

impl TraceSession<SqliteTraceStore> {
    /// Open a workload database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the architecture
    /// description cannot be loaded.
    pub fn open(path: &Path, config: ReplayConfig) -> Result<Self> {
        Self::new(SqliteTraceStore::open(path)?, config)
    }
}

impl<S: TraceStore> TraceSession<S> {
    /// Create a session over `store`, loading the architecture description if
    /// `config.arch_dir` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the architecture description cannot be loaded.
    pub fn new(store: S, config: ReplayConfig) -> Result<Self> {
        let arch = match &config.arch_dir {
            Some(dir) => Some(Arc::new(ArchDescription::load(dir, config.xlen)?)),
            None => None,
        };
        info!(
            hart = %config.hart,
            xlen = %config.xlen,
            csr_tables = arch.is_some(),
            "opened trace session"
        );
        Ok(Self {
            store,
            config,
            arch,
            cache: ReplayCache::new(),
        })
    }

    /// Use an already parsed architecture description.
    #[must_use]
    pub fn with_arch(mut self, arch: ArchDescription) -> Self {
        self.arch = Some(Arc::new(arch));
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &ReplayConfig {
        &self.config
    }

    #[must_use]
    pub const fn cache(&self) -> &ReplayCache {
        &self.cache
    }

    #[must_use]
    pub const fn hart(&self) -> HartId {
        self.config.hart
    }

    /// All tests of the store, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the test table cannot be read.
    pub fn tests(&self) -> Result<Vec<TestInfo>> {
        Ok(self.store.tests()?)
    }

    /// Load a test by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no test has that name or its registers cannot be
    /// loaded.
    pub fn load_test(&self, name: &str) -> Result<LoadedTest<'_, S>> {
        let info = self.store.test_by_name(name)?;
        self.load(info)
    }

    /// Load a test listed by the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the register snapshots cannot be read or declare a
    /// register twice.
    pub fn load(&self, info: TestInfo) -> Result<LoadedTest<'_, S>> {
        let snapshots = self.store.register_snapshots(info.id, self.config.hart)?;
        let table = RegisterTable::from_snapshots(&snapshots)?;
        let metadata = RegisterMetadata::new(table, self.config.xlen, self.arch.clone());
        info!(test = %info.name, registers = snapshots.len(), "loaded test");
        Ok(LoadedTest {
            session: self,
            info,
            snapshots,
            metadata,
        })
    }

    /// Ids of failing tests under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn failing_tests(&self) -> Result<FxHashSet<TestId>> {
        match self.config.policy {
            OutcomePolicy::RecordedCategories => {
                Ok(failing_by_category(&self.store.result_codes()?))
            }
            OutcomePolicy::ClassifiedStatus => {
                let tests = self.store.tests()?;
                let failing = tests
                    .par_iter()
                    .map(|t| Ok((t.id, failing_by_status(&self.classify(t.id)?))))
                    .collect::<Result<Vec<_>>>()?;
                let ids = failing
                    .into_iter()
                    .filter_map(|(id, failing)| failing.then_some(id))
                    .collect();
                Ok(ids)
            }
        }
    }

    /// Whether a test fails under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn is_failing(&self, test: TestId) -> Result<bool> {
        match self.config.policy {
            OutcomePolicy::RecordedCategories => {
                let codes = self.store.result_codes()?;
                let failing = codes
                    .iter()
                    .any(|(id, code)| *id == test && code.category().fails_test());
                Ok(failing)
            }
            OutcomePolicy::ClassifiedStatus => Ok(failing_by_status(&self.classify(test)?)),
        }
    }

    /// All test names split by outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the tests or their records cannot be read.
    pub fn partition(&self) -> Result<TestPartition> {
        let tests = self.store.tests()?;
        let failing = self.failing_tests()?;
        let partition = TestPartition::from_failing(&tests, &failing);
        metrics::record_test_summary(
            u64::try_from(partition.passing.len()).unwrap_or(u64::MAX),
            u64::try_from(partition.failing.len()).unwrap_or(u64::MAX),
        );
        debug!(
            passing = partition.passing.len(),
            failing = partition.failing.len(),
            policy = ?self.config.policy,
            "partitioned tests"
        );
        Ok(partition)
    }

    /// Sorted names of failing tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the tests or their records cannot be read.
    pub fn failing_test_names(&self) -> Result<Vec<String>> {
        Ok(self.partition()?.failing)
    }

    /// Sorted names of passing tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the tests or their records cannot be read.
    pub fn passing_test_names(&self) -> Result<Vec<String>> {
        Ok(self.partition()?.passing)
    }

    /// Per-status instruction counts of every test, in test id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tests or their records cannot be read.
    pub fn summaries(&self) -> Result<Vec<TestSummary>> {
        let tests = self.store.tests()?;
        let failing = self.failing_tests()?;
        tests
            .into_par_iter()
            .map(|test| {
                let classified = self.classify(test.id)?;
                let is_failing = failing.contains(&test.id);
                Ok(TestSummary::new(test, &classified, is_failing))
            })
            .collect()
    }

    fn classify(&self, test: TestId) -> Result<Vec<ClassifiedRecord>> {
        Ok(classify_trace(&self.store, test, self.config.hart)?)
    }
}

/// A test loaded for inspection: its register table, initial values and
/// CSR masks for the session's hart.
pub struct LoadedTest<'s, S: TraceStore> {
    session: &'s TraceSession<S>,
    info: TestInfo,
    snapshots: Vec<RegisterSnapshot>,
    metadata: RegisterMetadata,
}

impl<S: TraceStore> LoadedTest<'_, S> {
    #[must_use]
    pub const fn info(&self) -> &TestInfo {
        &self.info
    }

    #[must_use]
    pub const fn id(&self) -> TestId {
        self.info.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[must_use]
    pub const fn hart(&self) -> HartId {
        self.session.config.hart
    }

    #[must_use]
    pub fn snapshots(&self) -> &[RegisterSnapshot] {
        &self.snapshots
    }

    #[must_use]
    pub const fn metadata(&self) -> &RegisterMetadata {
        &self.metadata
    }

    /// Register state at `target`, served from the session cache when
    /// caching is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Incomplete`] if the replay stops before `target`.
    pub fn reconstruct(
        &self,
        target: ReplayTarget,
    ) -> std::result::Result<Arc<RegisterState>, ReplayError> {
        metrics::record_replay_request();
        let replayer = Replayer::new(
            &self.session.store,
            self.info.id,
            self.hart(),
            &self.snapshots,
            self.metadata.table(),
        );
        if self.session.config.cache {
            let replay = || replayer.reconstruct(target);
            self.session
                .cache
                .get_or_replay(self.info.id, self.hart(), target, replay)
        } else {
            Ok(Arc::new(replayer.reconstruct(target)?))
        }
    }

    /// Value of one register at `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the register is unknown or the replay fails.
    pub fn read(&self, name: &str, target: ReplayTarget) -> Result<u64> {
        let reg = self.metadata.resolve(name)?;
        let state = self.reconstruct(target)?;
        let value = state
            .read(reg)
            .ok_or_else(|| ArchError::RegisterNotFound(name.to_string()))?;
        Ok(value)
    }

    /// Records in replay order.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn records(&self) -> Result<Vec<InstructionRecord>> {
        let records = self
            .session
            .store
            .instructions(self.info.id, self.hart(), None)?;
        Ok(records)
    }

    /// Records in replay order with their status.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn classified(&self) -> Result<Vec<ClassifiedRecord>> {
        self.session.classify(self.info.id)
    }

    /// Instruction listing with per-status counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn listing(&self) -> Result<InstructionListing> {
        Ok(InstructionListing::new(&self.classified()?))
    }

    /// Detail of the first record executed at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InstructionNotFound`] if nothing executed at `pc`.
    pub fn instruction_detail(&self, pc: u64) -> Result<InstructionDetail> {
        let records = self
            .session
            .store
            .instructions_at(self.info.id, self.hart(), pc)?;
        let record = records
            .first()
            .ok_or(StoreError::InstructionNotFound { pc })?;
        Ok(InstructionDetail::from_record(record))
    }

    /// CSR comparisons recorded after the instruction at `pc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the comparisons cannot be read.
    pub fn csr_view(&self, pc: u64) -> Result<CsrComparisonView> {
        let comparisons = self
            .session
            .store
            .csr_comparisons(self.info.id, self.hart(), pc)?;
        Ok(CsrComparisonView::new(pc, &comparisons))
    }

    #[must_use]
    pub fn initial_diffs(&self) -> Vec<InitialDiff> {
        initial_diffs(&self.snapshots)
    }

    #[must_use]
    pub fn initial_state(&self) -> Vec<InitialValue> {
        initial_state(&self.snapshots)
    }

    /// Whether this test fails under the session's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    pub fn is_failing(&self) -> Result<bool> {
        self.session.is_failing(self.info.id)
    }

    /// Write mask of a register.
    ///
    /// # Errors
    ///
    /// Returns an error if the register is unknown or its mask is unavailable.
    pub fn write_mask(&self, name: &str) -> Result<u64> {
        Ok(self.metadata.write_mask_of(name)?)
    }

    /// Value, write mask and field decode of a register.
    ///
    /// The value is taken at `target`, or from the initial state when no
    /// target is given. With `write`, also computes the value a software
    /// write of `write` would leave behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the register is unknown, its mask or fields are
    /// unavailable, or the replay fails.
    pub fn mask_view(
        &self,
        name: &str,
        target: Option<ReplayTarget>,
        write: Option<u64>,
    ) -> Result<RegisterMaskView> {
        let reg = self.metadata.resolve(name)?.clone();
        let mask = self.metadata.write_mask(&reg)?;
        let mut state = match target {
            Some(target) => Arc::unwrap_or_clone(self.reconstruct(target)?),
            None => RegisterState::from_snapshots(&self.snapshots),
        };
        let value = state
            .read(&reg)
            .ok_or_else(|| ArchError::RegisterNotFound(name.to_string()))?;
        let fields = if reg.is_csr() {
            self.metadata.decode_csr(&reg.name, value)?
        } else {
            Vec::new()
        };
        let written = write.map(|w| {
            state.masked_write(&reg, w, mask);
            state.read(&reg).unwrap_or_default()
        });
        Ok(RegisterMaskView {
            register: reg,
            value,
            mask,
            fields,
            written,
        })
    }
}
