use std::io::{self, Result as IoResult};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::event::EngineEvent;

/// Output target that consumes full [`EngineEvent`] objects.
pub trait EventSink: Send + Sync {
    /// Handle one event. The sink decides how to format or forward it.
    fn handle(&mut self, event: &EngineEvent) -> IoResult<()>;
}

/// Sink that forwards events to the `tracing` subscriber.
///
/// Errors are logged at `warn`, everything else at `info`, all under the
/// `convoflow::events` target so deployments can filter them independently.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn handle(&mut self, event: &EngineEvent) -> IoResult<()> {
        match event {
            EngineEvent::Error { session_id, report } => {
                tracing::warn!(
                    target: "convoflow::events",
                    session_id,
                    error = %report.error,
                    "session error"
                );
            }
            other => {
                tracing::info!(
                    target: "convoflow::events",
                    session_id = other.session_id(),
                    kind = other.kind(),
                    "{other}"
                );
            }
        }
        Ok(())
    }
}

/// In-memory sink for testing and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<EngineEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    pub fn snapshot(&self) -> Vec<EngineEvent> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &EngineEvent) -> IoResult<()> {
        self.entries.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Channel-based sink for streaming to async consumers.
///
/// Events are forwarded to a tokio mpsc channel without blocking, which suits
/// SSE endpoints or a live chat transcript view.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &EngineEvent) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
