use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::{sync::oneshot, task};

use super::hub::{EventHub, EventStream, HubEmitter};
use super::sink::{EventSink, TracingSink};

const DEFAULT_CAPACITY: usize = 1024;

/// Owns the [`EventHub`] and fans events out to a set of sinks.
///
/// Sessions publish through [`EventBus::emitter`]; external consumers either
/// [`subscribe`](EventBus::subscribe) directly or register an [`EventSink`]
/// that the background listener feeds.
pub struct EventBus {
    hub: Arc<EventHub>,
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    listener: Arc<Mutex<Option<ListenerState>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(DEFAULT_CAPACITY, TracingSink)
    }
}

impl EventBus {
    /// Bus with no sinks; events only reach direct subscribers.
    pub fn new(capacity: usize) -> Self {
        Self {
            hub: EventHub::new(capacity),
            sinks: Arc::new(Mutex::new(Vec::new())),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_sink<T>(capacity: usize, sink: T) -> Self
    where
        T: EventSink + 'static,
    {
        let bus = Self::new(capacity);
        bus.add_sink(sink);
        bus
    }

    /// Dynamically add a sink (useful for per-request streaming).
    pub fn add_sink<T: EventSink + 'static>(&self, sink: T) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// Cloneable producer handle for session drivers.
    pub fn emitter(&self) -> HubEmitter {
        self.hub.emitter()
    }

    /// Direct subscription bypassing the sinks.
    pub fn subscribe(&self) -> EventStream {
        self.hub.subscribe()
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Spawn a background task forwarding hub events to all sinks.
    /// Idempotent: calling multiple times has no effect.
    pub fn listen_for_events(&self) {
        let mut guard = self.listener.lock().expect("listener poisoned");
        if guard.is_some() {
            return;
        }

        let mut stream = self.hub.subscribe();
        let sinks = self.sinks.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = stream.recv() => match recv {
                        Ok(event) => {
                            let mut sinks_guard = sinks.lock().unwrap();
                            for sink in sinks_guard.iter_mut() {
                                if let Err(e) = sink.handle(&event) {
                                    tracing::warn!(error = %e, "event sink failed");
                                }
                            }
                        }
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener task.
    pub async fn stop_listener(&self) {
        let state = {
            let mut guard = self.listener.lock().expect("listener poisoned");
            guard.take()
        };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(state) = guard.take() {
                let _ = state.shutdown_tx.send(());
                state.handle.abort();
            }
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::action::OutboundAction;
    use crate::event_bus::event::EngineEvent;
    use crate::event_bus::sink::MemorySink;

    #[tokio::test]
    async fn listener_feeds_registered_sinks() {
        let sink = MemorySink::new();
        let bus = EventBus::with_sink(16, sink.clone());
        bus.listen_for_events();

        use crate::event_bus::emitter::EventEmitter;
        let emitter = bus.emitter();
        emitter
            .emit(EngineEvent::outbound("s", 0, OutboundAction::text("hi")))
            .unwrap();

        // Let the listener task drain the hub.
        for _ in 0..50 {
            if !sink.snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sink.snapshot().len(), 1);
        bus.stop_listener().await;
    }

    #[tokio::test]
    async fn subscribe_bypasses_sinks() {
        let bus = EventBus::new(16);
        let mut stream = bus.subscribe();
        bus.hub()
            .publish(EngineEvent::outbound("s", 7, OutboundAction::text("hi")))
            .unwrap();
        let event = stream.next_timeout(Duration::from_secs(1)).await.unwrap();
        assert!(matches!(event, EngineEvent::Outbound { sequence: 7, .. }));
    }
}
