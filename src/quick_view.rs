//! Observable quick-view state: panel visibility and the previewed entry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rusqlite::Connection;
use tracing::debug;

use crate::db::{self, DbResult};
use crate::entry::Entry;
use crate::events::{ChangeEvent, EventTarget, Listener, ListenerId};

pub const METADATA_BOX_ACTIVE_KEY: &str = "metadataBoxActive";

/// The quick-view panel. Only its metadata-box toggle matters here.
#[derive(Default)]
pub struct QuickView {
    metadata_box_active: AtomicBool,
    events: EventTarget,
}

impl QuickView {
    pub fn new(metadata_box_active: bool) -> Self {
        Self {
            metadata_box_active: AtomicBool::new(metadata_box_active),
            events: EventTarget::default(),
        }
    }

    /// Restores the toggle saved by [`QuickView::persist`], inactive if unset.
    pub fn from_settings(conn: &Connection) -> DbResult<Self> {
        let active = db::get_setting_bool(conn, METADATA_BOX_ACTIVE_KEY)?.unwrap_or(false);
        Ok(Self::new(active))
    }

    pub fn persist(&self, conn: &Connection) -> DbResult<()> {
        db::set_setting_bool(conn, METADATA_BOX_ACTIVE_KEY, self.metadata_box_active())
    }

    pub fn metadata_box_active(&self) -> bool {
        self.metadata_box_active.load(Ordering::SeqCst)
    }

    pub fn set_metadata_box_active(&self, active: bool) {
        if self.metadata_box_active.swap(active, Ordering::SeqCst) == active {
            return;
        }
        debug!(active, "metadata box toggled");
        self.events.dispatch(ChangeEvent::MetadataBoxActiveChanged);
    }

    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}

/// Holds the entry currently shown in the quick view.
#[derive(Default)]
pub struct QuickViewModel {
    selected: RwLock<Option<Arc<Entry>>>,
    events: EventTarget,
}

impl QuickViewModel {
    pub fn selected_entry(&self) -> Option<Arc<Entry>> {
        self.selected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the selection and always notifies, even for the same entry.
    pub fn set_selected_entry(&self, entry: Option<Arc<Entry>>) {
        {
            let mut slot = self.selected.write().unwrap_or_else(PoisonError::into_inner);
            *slot = entry;
        }
        self.events.dispatch(ChangeEvent::SelectedEntryChanged);
    }

    pub fn is_selected(&self, entry: &Entry) -> bool {
        self.selected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(entry)
    }

    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}
