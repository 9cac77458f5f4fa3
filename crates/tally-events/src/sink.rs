use std::sync::mpsc::{self, Receiver, Sender};

use crate::DbEvent;

/// Trait for consuming diagnostics.
///
/// Each frontend provides its own implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DbEvent);
}

/// Channel-based event sink.
///
/// Sends events through a standard mpsc channel. The receiver end
/// can be drained by any consumer (CLI renderer, IPC bridge, test harness).
pub struct ChannelSink {
    sender: Sender<DbEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<DbEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: DbEvent) {
        let _ = self.sender.send(event);
    }
}

/// No-op event sink for headless operation.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: DbEvent) {}
}

/// Collector sink that stores all events for inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: std::sync::Mutex<Vec<DbEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<DbEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: DbEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
