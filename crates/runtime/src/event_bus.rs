/// An event stamped with its emission sequence number.
///
/// Sequence numbers are strictly increasing for the lifetime of the bus, so a
/// consumer can tell which of two requests is newer even after draining.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub seq: u64,
    pub payload: E,
}

/// Ordered outbox of events for an external consumer (renderer, network glue).
///
/// Producers push tagged-union payloads; the consumer drains them in emission
/// order and dispatches with a `match`.
#[derive(Debug)]
pub struct EventBus<E> {
    next_seq: u64,
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            events: Vec::new(),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `payload` and returns its sequence number.
    pub fn emit(&mut self, payload: E) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event { seq, payload });
        seq
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_with_sequence() {
        let mut bus = EventBus::new();
        assert_eq!(bus.emit("a"), 0);
        assert_eq!(bus.emit("b"), 1);
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[1].payload, "b");
    }

    #[test]
    fn drain_clears_events_but_keeps_sequence() {
        let mut bus = EventBus::new();
        bus.emit(1);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
        assert_eq!(bus.emit(2), 1);
    }
}
