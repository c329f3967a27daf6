// Metrics Port
//
// Constructed once by the composition root and handed to every component
// that records; there is no process-global collector.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Sink for database and entity metrics
pub trait Metrics: Send + Sync {
    /// Wall-clock duration of a database command (ping, begin, query, exec, ...)
    fn observe_command_duration(&self, command: &str, elapsed: Duration);

    fn track_command_error(&self, command: &str);

    /// Rows created, updated or deleted
    fn track_objects_changed(&self, entity: &str, operation: &str, amount: usize);

    fn track_objects_retrieved(&self, entity: &str, amount: usize);

    fn track_object_error(&self, entity: &str, operation: &str);
}

/// Discards everything (tests, tools)
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn observe_command_duration(&self, _command: &str, _elapsed: Duration) {}
    fn track_command_error(&self, _command: &str) {}
    fn track_objects_changed(&self, _entity: &str, _operation: &str, _amount: usize) {}
    fn track_objects_retrieved(&self, _entity: &str, _amount: usize) {}
    fn track_object_error(&self, _entity: &str, _operation: &str) {}
}

/// Per-command counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandStats {
    pub count: u64,
    pub errors: u64,
    pub total_micros: u64,
}

/// Point-in-time copy of [`InMemoryMetrics`].
///
/// Entity keys are `"<entity>.<operation>"`, e.g. `"artist.upsert"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub commands: BTreeMap<String, CommandStats>,
    pub objects_changed: BTreeMap<String, u64>,
    pub objects_retrieved: BTreeMap<String, u64>,
    pub object_errors: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    pub fn command(&self, command: &str) -> CommandStats {
        self.commands.get(command).cloned().unwrap_or_default()
    }

    pub fn changed(&self, entity: &str, operation: &str) -> u64 {
        lookup(&self.objects_changed, &format!("{}.{}", entity, operation))
    }

    pub fn retrieved(&self, entity: &str) -> u64 {
        lookup(&self.objects_retrieved, entity)
    }

    pub fn errors(&self, entity: &str, operation: &str) -> u64 {
        lookup(&self.object_errors, &format!("{}.{}", entity, operation))
    }
}

fn lookup(map: &BTreeMap<String, u64>, key: &str) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

/// In-process metrics registry, served by the admin API
#[derive(Default)]
pub struct InMemoryMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.with(|m| m.clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut MetricsSnapshot) -> R) -> R {
        // A panic while holding the lock cannot leave counters half-written
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl Metrics for InMemoryMetrics {
    fn observe_command_duration(&self, command: &str, elapsed: Duration) {
        self.with(|m| {
            let stats = m.commands.entry(command.to_string()).or_default();
            stats.count += 1;
            stats.total_micros += elapsed.as_micros() as u64;
        });
    }

    fn track_command_error(&self, command: &str) {
        self.with(|m| m.commands.entry(command.to_string()).or_default().errors += 1);
    }

    fn track_objects_changed(&self, entity: &str, operation: &str, amount: usize) {
        self.with(|m| {
            *m.objects_changed
                .entry(format!("{}.{}", entity, operation))
                .or_default() += amount as u64
        });
    }

    fn track_objects_retrieved(&self, entity: &str, amount: usize) {
        self.with(|m| *m.objects_retrieved.entry(entity.to_string()).or_default() += amount as u64);
    }

    fn track_object_error(&self, entity: &str, operation: &str) {
        self.with(|m| {
            *m.object_errors
                .entry(format!("{}.{}", entity, operation))
                .or_default() += 1
        });
    }
}
