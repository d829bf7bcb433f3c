//! Metric reporting.
//!
//! A [`MetricReporter`] wraps a [`MetricSink`] with the configuration's
//! enabled flag: every emission is gated, unbuffered, and written through
//! immediately. Sinks never fail the training loop; a write error is
//! reported to stderr and dropped.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

/// Named scalar sink. Implementations must not buffer.
pub trait MetricSink {
    fn emit(&mut self, key: &str, value: f64, step: u64);
}

/// Gate in front of a sink.
pub struct MetricReporter {
    enabled: bool,
    sink: Box<dyn MetricSink>,
}

impl MetricReporter {
    pub fn new(enabled: bool, sink: Box<dyn MetricSink>) -> Self {
        Self { enabled, sink }
    }

    /// A reporter that drops everything.
    pub fn disabled() -> Self {
        Self::new(false, Box::new(NullSink))
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Emit one scalar iff logging is enabled.
    pub fn log(&mut self, key: &str, value: f64, step: u64) {
        if self.enabled {
            self.sink.emit(key, value, step);
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl MetricSink for NullSink {
    fn emit(&mut self, _key: &str, _value: f64, _step: u64) {}
}

#[derive(Serialize)]
struct MetricRecord<'a> {
    ts: String,
    key: &'a str,
    value: f64,
    step: u64,
}

/// Append-only JSON-lines sink.
///
/// The file is opened and closed per write; no handle is held across
/// batches.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_emit(&self, key: &str, value: f64, step: u64) -> std::io::Result<()> {
        let record = MetricRecord {
            ts: chrono::Utc::now().to_rfc3339(),
            key,
            value,
            step,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl MetricSink for JsonlSink {
    fn emit(&mut self, key: &str, value: f64, step: u64) {
        if let Err(e) = self.try_emit(key, value, step) {
            eprintln!("metric sink write failed for '{key}': {e}");
        }
    }
}

/// One captured emission.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    pub key: String,
    pub value: f64,
    pub step: u64,
}

/// In-memory sink for tests. Clones share the same buffer, so a test can
/// keep a handle while the reporter owns the sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<MetricEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.borrow().clone()
    }

    /// Events matching a key, in emission order.
    pub fn values_for(&self, key: &str) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.key == key)
            .map(|e| e.value)
            .collect()
    }
}

impl MetricSink for MemorySink {
    fn emit(&mut self, key: &str, value: f64, step: u64) {
        self.events.borrow_mut().push(MetricEvent {
            key: key.to_string(),
            value,
            step,
        });
    }
}
