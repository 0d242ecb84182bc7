//! Event dispatch.
//!
//! Two engine-level events cross the narrow host/core boundary (spec §6):
//! `resolution_change` (canvas resize, triggering persistent-resource
//! re-creation) and material-data-change (`Buffer.write` with
//! `dispatch: true`). Both are modeled as a flat [`Event`] enum pushed
//! through a `flume` channel rather than the teacher's "listener registry"
//! pattern (spec §9: "replace with a registry mapping buffer-name-hash to
//! set of material IDs" is one valid shape, but a single bounded channel is
//! simpler to reason about for a frame-driver thread that drains it once per
//! frame, and `flume` is already in the dependency stack for the mesh task
//! queue's submission channel).

use crate::name::Name;

/// An engine-level event.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// The canvas/swapchain was resized; persistent resources tied to
    /// extent must be re-created with `force: true`.
    ResolutionChange { width: u32, height: u32 },
    /// A buffer configured with `dispatch: true` was just written.
    BufferWritten { name: Name },
}

/// A bounded multi-producer multi-consumer event bus.
///
/// Producers (e.g. [`crate::gpu::buffer::Buffer::write`]) push events;
/// the frame driver drains them once per frame between `begin()` and
/// `submit()`.
pub struct EventBus {
    tx: flume::Sender<Event>,
    rx: flume::Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    pub fn emit(&self, event: Event) {
        // An unbounded channel never blocks; a full channel cannot happen.
        let _ = self.tx.send(event);
    }

    /// Drains every event currently queued without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_all_emitted_events_in_order() {
        let bus = EventBus::new();
        bus.emit(Event::ResolutionChange {
            width: 800,
            height: 600,
        });
        bus.emit(Event::BufferWritten {
            name: Name::new("x"),
        });
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::ResolutionChange { .. }));
        assert!(matches!(events[1], Event::BufferWritten { .. }));
        assert!(bus.drain().is_empty());
    }
}
