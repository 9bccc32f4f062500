//! Event sink trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::FxEvent;

/// Receives rate store events.
///
/// `emit()` must be fast and non-blocking. Failing to deliver an event must
/// not affect the operation that produced it.
pub trait FxEventSink: Send + Sync {
    fn emit(&self, event: FxEvent);
}

/// Discards events.
#[derive(Clone, Default)]
pub struct NoOpFxEventSink;

impl FxEventSink for NoOpFxEventSink {
    fn emit(&self, _event: FxEvent) {}
}

/// Collects emitted events for assertions.
#[derive(Clone, Default)]
pub struct MockFxEventSink {
    events: Arc<Mutex<Vec<FxEvent>>>,
}

impl MockFxEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FxEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<FxEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl FxEventSink for MockFxEventSink {
    fn emit(&self, event: FxEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_panic() {
        NoOpFxEventSink.emit(FxEvent::soft_error("offline"));
    }

    #[test]
    fn test_mock_sink_collects_events() {
        let sink = MockFxEventSink::new();
        assert!(sink.is_empty());

        sink.emit(FxEvent::selected_currency_changed("USD"));
        sink.emit(FxEvent::soft_error("offline"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[0], FxEvent::selected_currency_changed("USD"));

        sink.clear();
        assert!(sink.is_empty());
    }
}
