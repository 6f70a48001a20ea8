//! Typed change notifications the metadata box reacts to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    DateTimeFormatChanged,
    MetadataBoxActiveChanged,
    SelectedEntryChanged,
}

impl ChangeEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::DateTimeFormatChanged => "date-time-format-changed",
            Self::MetadataBoxActiveChanged => "metadata-box-active-changed",
            Self::SelectedEntryChanged => "selected-entry-changed",
        }
    }
}

pub type Listener = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Returned by `add_listener`; pass it back to `remove_listener` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry owned by each observable state holder.
#[derive(Default)]
pub struct EventTarget {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl EventTarget {
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Returns false when `id` was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Calls every listener in registration order.
    ///
    /// The list is copied first, so a listener may register further
    /// listeners or dispatch again without deadlocking.
    pub fn dispatch(&self, event: ChangeEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        trace!(event = event.name(), listeners = listeners.len(), "dispatch");
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn dispatch_reaches_every_listener() {
        let target = EventTarget::default();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            target.add_listener(Arc::new(move |event| {
                assert_eq!(event, ChangeEvent::SelectedEntryChanged);
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        target.dispatch(ChangeEvent::SelectedEntryChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_may_register_during_dispatch() {
        let target = Arc::new(EventTarget::default());
        let inner = target.clone();
        target.add_listener(Arc::new(move |_| {
            inner.add_listener(Arc::new(|_| {}));
        }));
        target.dispatch(ChangeEvent::MetadataBoxActiveChanged);
        assert_eq!(target.listener_count(), 2);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let target = EventTarget::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = target.add_listener(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let other = target.add_listener(Arc::new(|_| {}));
        assert_ne!(id, other);

        assert!(target.remove_listener(id));
        assert!(!target.remove_listener(id));
        target.dispatch(ChangeEvent::SelectedEntryChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(target.listener_count(), 1);
    }

    #[test]
    fn event_names_match_wire_names() {
        assert_eq!(
            ChangeEvent::DateTimeFormatChanged.name(),
            "date-time-format-changed"
        );
        assert_eq!(
            ChangeEvent::MetadataBoxActiveChanged.name(),
            "metadata-box-active-changed"
        );
    }
}
