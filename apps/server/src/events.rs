use bookshelf_core::events::{FxEvent, FxEventSink};
use serde_json::Value;
use tokio::sync::broadcast;

/// Event published when the server is ready to take requests.
pub const SERVER_READY: &str = "server:ready";

/// Serializable envelope that carries event names and optional payloads.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn with_payload(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

/// Forwards rate store events to the SSE bus.
#[derive(Clone)]
pub struct BroadcastFxEventSink {
    bus: EventBus,
}

impl BroadcastFxEventSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl FxEventSink for BroadcastFxEventSink {
    fn emit(&self, event: FxEvent) {
        let name = event.name();
        match serde_json::to_value(&event) {
            Ok(payload) => self.bus.publish(ServerEvent::with_payload(name, payload)),
            Err(e) => tracing::warn!("Dropping {} event: {}", name, e),
        }
    }
}
