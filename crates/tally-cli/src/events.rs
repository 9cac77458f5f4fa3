use std::{sync::mpsc::Receiver, thread::JoinHandle};

use tally_events::DbEvent;
use tracing::warn;

/// Owns the thread spawned by [`spawn_event_handler`].
///
/// Every sender (each clone of the database handle) must be dropped before
/// [`finish`](EventGuard::finish), otherwise the join never returns.
pub struct EventGuard {
    handle: Option<JoinHandle<()>>,
}

impl EventGuard {
    /// Waits for the remaining events to be rendered.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

/// Renders library diagnostics through the installed subscriber.
pub fn spawn_event_handler(receiver: Receiver<DbEvent>) -> EventGuard {
    let handle = std::thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            warn!("{}", event.describe());
        }
    });

    EventGuard {
        handle: Some(handle),
    }
}
