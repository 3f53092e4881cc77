//! Change notifications for view layers.

use nc_core::{EdgeId, NodeId, SuperBlockId};

/// What changed in a [`crate::Session`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    NodeAdded(NodeId),
    NodeChanged(NodeId),
    NodeDeleted(NodeId),
    EdgeAdded { edge: EdgeId, valid: bool },
    EdgeDeleted(EdgeId),
    SelectionChanged,
    GraphReplaced,
    CanvasCleared,
    HistoryChanged { can_undo: bool, can_redo: bool },
    GroupsChanged(Option<SuperBlockId>),
    GenerationStarted,
    GenerationFinished,
    GenerationFailed(String),
    Highlighted(Option<NodeId>),
    SettingsChanged,
}

pub type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next: u64,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.listeners.push((id, listener));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: SessionEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listeners.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_receive_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::default();
        let sink = seen.clone();
        let id = bus.subscribe(Box::new(move |e: &SessionEvent| sink.borrow_mut().push(e.clone())));

        bus.emit(SessionEvent::CanvasCleared);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(SessionEvent::SelectionChanged);

        assert_eq!(*seen.borrow(), vec![SessionEvent::CanvasCleared]);
        assert!(bus.is_empty());
    }
}
