use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::stream;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::time::timeout;

use super::emitter::{EmitterError, EventEmitter};
use super::event::EngineEvent;

/// Broadcast fan-out point for [`EngineEvent`]s.
///
/// A single hub is shared by every session a runner drives. Subscribers that
/// fall behind the ring buffer lose the oldest events; the hub counts those
/// drops so operators can size the capacity.
#[derive(Debug)]
pub struct EventHub {
    sender: Sender<EngineEvent>,
    dropped_events: AtomicUsize,
    capacity: usize,
}

impl EventHub {
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Arc::new(Self {
            sender,
            dropped_events: AtomicUsize::new(0),
            capacity,
        })
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns `Closed` when no subscriber exists to receive the event.
    pub fn publish(&self, event: EngineEvent) -> Result<(), EmitterError> {
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(event)) => {
                drop(event);
                Err(EmitterError::Closed)
            }
        }
    }

    pub fn subscribe(self: &Arc<Self>) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            hub: Arc::clone(self),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events lost across all lagged subscribers.
    pub fn dropped(&self) -> usize {
        self.dropped_events.load(Ordering::Relaxed)
    }

    pub fn emitter(self: &Arc<Self>) -> HubEmitter {
        HubEmitter {
            hub: Arc::clone(self),
        }
    }
}

/// Cloneable handle implementing [`EventEmitter`] on top of a shared hub.
#[derive(Clone, Debug)]
pub struct HubEmitter {
    hub: Arc<EventHub>,
}

impl EventEmitter for HubEmitter {
    fn emit(&self, event: EngineEvent) -> Result<(), EmitterError> {
        self.hub.publish(event)
    }
}

/// Consumer side of a hub subscription.
#[derive(Debug)]
pub struct EventStream {
    receiver: Receiver<EngineEvent>,
    hub: Arc<EventHub>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Result<EngineEvent, broadcast::error::RecvError> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                self.hub
                    .dropped_events
                    .fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::RecvError::Lagged(missed))
            }
            Err(err) => Err(err),
        }
    }

    pub fn try_recv(&mut self) -> Result<EngineEvent, broadcast::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                self.hub
                    .dropped_events
                    .fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::TryRecvError::Lagged(missed))
            }
            Err(err) => Err(err),
        }
    }

    /// Next event, skipping over lag gaps, or `None` on close/timeout.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<EngineEvent> {
        loop {
            match timeout(duration, self.recv()).await {
                Ok(Ok(event)) => return Some(event),
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
                Err(_) => return None,
            }
        }
    }

    /// Adapt the subscription into a `futures` stream, silently skipping lag.
    pub fn into_async_stream(self) -> impl futures_util::stream::Stream<Item = EngineEvent> {
        stream::unfold(self, |mut stream| async move {
            loop {
                match stream.recv().await {
                    Ok(event) => return Some((event, stream)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::OutboundAction;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let hub = EventHub::new(8);
        let mut stream = hub.subscribe();
        hub.publish(EngineEvent::outbound("s", 0, OutboundAction::text("hi")))
            .unwrap();
        let event = stream.recv().await.unwrap();
        assert_eq!(event.session_id(), "s");
    }

    #[tokio::test]
    async fn lag_is_counted() {
        let hub = EventHub::new(1);
        let mut stream = hub.subscribe();
        for seq in 0..4 {
            hub.publish(EngineEvent::outbound("s", seq, OutboundAction::text("x")))
                .unwrap();
        }
        // The first recv observes the lag before yielding the survivor.
        let _ = stream.recv().await;
        assert!(hub.dropped() >= 1);
    }

    #[tokio::test]
    async fn next_timeout_returns_none_when_idle() {
        let hub = EventHub::new(4);
        let mut stream = hub.subscribe();
        assert!(stream.next_timeout(Duration::from_millis(10)).await.is_none());
    }

    #[test]
    fn capacity_is_clamped_to_one() {
        let hub = EventHub::new(0);
        assert_eq!(hub.capacity(), 1);
    }
}
