use serde::Serialize;

/// Kind tag carried by download descriptors and progress events.
/// The reconciliation engine only ever emits `Resource`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Resource,
}

/// Batch notification emitted while a reconciliation pass runs.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    pub kind: FileKind,
    pub done: bool,
    pub name: String,
    pub total: usize,
    pub processed: usize,
}

/// Injected progress reporter. Called synchronously at each batch
/// boundary; an absent sink suppresses notification and changes
/// nothing else.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

impl<F: Fn(ProgressEvent) + Send + Sync> ProgressSink for F {
    fn notify(&self, event: ProgressEvent) {
        self(event)
    }
}
