use std::collections::BTreeMap;
use std::sync::Mutex;

/// Emitted before a command is applied.
pub const EVENT_EDIT_BEGIN: &str = "edit.begin";
/// Emitted after a command is applied or rejected.
pub const EVENT_EDIT_END: &str = "edit.end";
/// Emitted for each overlap left behind by a permissive move.
pub const EVENT_EDIT_OVERLAP: &str = "edit.overlap";

/// One entry of the edit audit log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    /// Event name, e.g. [`EVENT_EDIT_BEGIN`].
    pub name: String,
    /// Event fields in key order.
    pub fields: BTreeMap<String, String>,
}

impl TraceEvent {
    /// Event with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insert.
    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(key.into(), value.to_string());
        self
    }

    /// Field value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Append-only destination for edit trace events.
///
/// Sinks are shared across threads; `emit` takes `&self`.
pub trait TraceSink: Send + Sync {
    /// Record one event.
    fn emit(&self, event: TraceEvent);
}

/// Forwards events to `tracing` under the `montage::edit` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, event: TraceEvent) {
        tracing::info!(
            target: "montage::edit",
            event = %event.name,
            fields = ?event.fields
        );
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&self, _event: TraceEvent) {}
}

/// In-memory sink for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemoryTraceSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in emission order.
    pub fn events(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of recorded events in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl TraceSink for MemoryTraceSink {
    fn emit(&self, event: TraceEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
