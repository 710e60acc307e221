//! Metrics collection and reporting using metrics-rs.
//!
//! Replay and outcome code records through the `metrics` facade; the CLI
//! installs [`CliRecorder`] when `--metrics` is given and prints the collected
//! values on exit.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Initialize metric descriptions.
///
/// Call this once at startup to register metric descriptions.
pub fn init() {
    describe_counter!(
        "rvdb_replays_total",
        Unit::Count,
        "Register state reconstructions requested"
    );
    describe_counter!(
        "rvdb_replay_cache_hits_total",
        Unit::Count,
        "Reconstructions served from the replay cache"
    );
    describe_counter!(
        "rvdb_replayed_instructions_total",
        Unit::Count,
        "Instruction records re-applied during replays"
    );
    describe_counter!(
        "rvdb_replay_incomplete_total",
        Unit::Count,
        "Replays that stopped before their target"
    );
    describe_counter!(
        "rvdb_tests_passed_total",
        Unit::Count,
        "Tests classified as passing"
    );
    describe_counter!(
        "rvdb_tests_failed_total",
        Unit::Count,
        "Tests classified as failing"
    );

    describe_gauge!(
        "rvdb_cached_states",
        Unit::Count,
        "Register states held by the replay cache"
    );

    describe_histogram!(
        "rvdb_replay_duration_seconds",
        Unit::Seconds,
        "Replay duration distribution"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Record a reconstruction request, before the cache is consulted.
pub fn record_replay_request() {
    counter!("rvdb_replays_total").increment(1);
}

/// Record a reconstruction served from the cache.
pub fn record_cache_hit() {
    counter!("rvdb_replay_cache_hits_total").increment(1);
}

/// Record the number of states held by the cache.
#[allow(clippy::cast_precision_loss)]
pub fn record_cache_size(entries: usize) {
    gauge!("rvdb_cached_states").set(entries as f64);
}

/// Record a finished replay.
pub fn record_replay(replayed: usize, secs: f64, complete: bool) {
    counter!("rvdb_replayed_instructions_total")
        .increment(u64::try_from(replayed).unwrap_or(u64::MAX));
    histogram!("rvdb_replay_duration_seconds").record(secs);
    if !complete {
        counter!("rvdb_replay_incomplete_total").increment(1);
    }
}

/// Record pass/fail totals of an outcome partition.
pub fn record_test_summary(passed: u64, failed: u64) {
    counter!("rvdb_tests_passed_total").absolute(passed);
    counter!("rvdb_tests_failed_total").absolute(failed);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

#[derive(Default)]
struct GaugeStorage {
    values: RwLock<HashMap<String, f64>>,
}

#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

struct CliGauge {
    key: String,
    storage: Arc<GaugeStorage>,
}

impl metrics::GaugeFn for CliGauge {
    fn increment(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// Recorder that keeps metrics in memory for a summary at exit.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install this recorder as the global metrics recorder.
    ///
    /// Returns `None` if a recorder is already installed.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = CliRecorderHandle {
            counters: Arc::clone(&self.counters),
            gauges: Arc::clone(&self.gauges),
            histograms: Arc::clone(&self.histograms),
        };
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }
}

fn key_to_string(key: &Key) -> String {
    let name = key.name();
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{}}}", labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(CliGauge {
            key: key_to_string(key),
            storage: Arc::clone(&self.gauges),
        }))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Handle for reading metrics after the recorder is installed.
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    #[must_use]
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    #[must_use]
    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.gauges.values.read().get(key).copied()
    }

    /// Print all collected metrics to stderr.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_summary(&self) {
        let counters = self.counters.values.read().clone();
        let gauges = self.gauges.values.read().clone();
        let histograms = self.histograms.values.read().clone();

        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            eprintln!("No metrics collected.");
            return;
        }

        eprintln!();
        eprintln!("## Metrics Summary");
        eprintln!();

        if !counters.is_empty() {
            eprintln!("### Counters");
            let mut keys: Vec<_> = counters.keys().collect();
            keys.sort();
            for key in keys {
                eprintln!("  {key}: {}", counters[key]);
            }
            eprintln!();
        }

        if !gauges.is_empty() {
            eprintln!("### Gauges");
            let mut keys: Vec<_> = gauges.keys().collect();
            keys.sort();
            for key in keys {
                eprintln!("  {key}: {:.0}", gauges[key]);
            }
            eprintln!();
        }

        if !histograms.is_empty() {
            eprintln!("### Histograms");
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                let values = &histograms[key];
                if values.is_empty() {
                    continue;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                eprintln!(
                    "  {key}: count={}, min={min:.6}, max={max:.6}, avg={avg:.6}",
                    values.len()
                );
            }
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::Label;

    #[test]
    fn test_key_to_string() {
        let key = Key::from_name("rvdb_replays_total");
        assert_eq!(key_to_string(&key), "rvdb_replays_total");

        let key = Key::from_parts("rvdb_replays_total", vec![Label::new("test", "add")]);
        assert_eq!(key_to_string(&key), "rvdb_replays_total{test=add}");
    }

    #[test]
    fn test_cli_recorder_storage() {
        let recorder = CliRecorder::new();

        let counter = CliCounter {
            key: "rvdb_replays_total".to_string(),
            storage: Arc::clone(&recorder.counters),
        };
        metrics::CounterFn::increment(&counter, 2);
        metrics::CounterFn::increment(&counter, 3);
        assert_eq!(
            recorder.counters.values.read().get("rvdb_replays_total"),
            Some(&5)
        );

        let histogram = CliHistogram {
            key: "rvdb_replay_duration_seconds".to_string(),
            storage: Arc::clone(&recorder.histograms),
        };
        metrics::HistogramFn::record(&histogram, 0.5);
        assert_eq!(
            recorder
                .histograms
                .values
                .read()
                .get("rvdb_replay_duration_seconds")
                .map(Vec::len),
            Some(1)
        );
    }
}
