//! Change notification for the rate store.
//!
//! Services emit [`FxEvent`]s through an [`FxEventSink`] after state
//! changes. Adapters implement the sink to forward events to their clients.

mod fx_event;
mod sink;

pub use fx_event::*;
pub use sink::*;
