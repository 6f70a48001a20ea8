//! Keeps the quick-view metadata box in sync with the selected entry.
//!
//! Any of the three change notifications (clock format, metadata box
//! toggled, selection changed) starts a new refresh cycle: the box is
//! cleared, the general fields are fetched, and once they arrive up to three
//! independent follow-up fetches fill in the MIME type, media details and,
//! for directories, the aggregate size. The follow-ups are unordered and each
//! writes only its own fields.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::dir_size::DirectorySizeProvider;
use crate::entry::Entry;
use crate::errors::DomainError;
use crate::events::{Listener, ListenerId};
use crate::file_type::TypeClassifier;
use crate::formatter::FileMetadataFormatter;
use crate::metadata::{MetadataField, MetadataItem, MetadataModel};
use crate::metadata_box::{BoxField, MetadataBox};
use crate::quick_view::{QuickView, QuickViewModel};

mod config;
mod error;

pub use config::{ControllerConfig, StaleGuard, STALE_GUARD_KEY};
pub use error::{ControllerError, ControllerErrorCode, ControllerResult};

/// Fetched at the start of every cycle. `hosted` and `externalFileUrl` only
/// steer the follow-up fetches.
pub const GENERAL_FIELDS: &[MetadataField] = &[
    MetadataField::Size,
    MetadataField::ModificationTime,
    MetadataField::Hosted,
    MetadataField::ExternalFileUrl,
];

/// Media fields for entries backed by a remote document.
pub const HOSTED_MEDIA_FIELDS: &[MetadataField] =
    &[MetadataField::ImageHeight, MetadataField::ImageWidth];

pub const LOCAL_MEDIA_FIELDS: &[MetadataField] = &[
    MetadataField::Ifd,
    MetadataField::ImageHeight,
    MetadataField::ImageWidth,
    MetadataField::MediaAlbum,
    MetadataField::MediaArtist,
    MetadataField::MediaDuration,
    MetadataField::MediaGenre,
    MetadataField::MediaTitle,
    MetadataField::MediaTrack,
];

/// Everything the controller talks to.
pub struct Collaborators {
    pub metadata_model: Arc<dyn MetadataModel>,
    pub metadata_box: Arc<dyn MetadataBox>,
    pub quick_view: Arc<QuickView>,
    pub quick_view_model: Arc<QuickViewModel>,
    pub formatter: Arc<FileMetadataFormatter>,
    pub classifier: Arc<dyn TypeClassifier>,
    pub directory_size: Arc<dyn DirectorySizeProvider>,
}

pub struct MetadataBoxController {
    inner: Arc<Inner>,
    subscriptions: Subscriptions,
}

/// One registration per event source, removed again on drop.
struct Subscriptions {
    formatter: ListenerId,
    quick_view: ListenerId,
    quick_view_model: ListenerId,
}

struct Inner {
    metadata_model: Arc<dyn MetadataModel>,
    metadata_box: Arc<dyn MetadataBox>,
    quick_view: Arc<QuickView>,
    quick_view_model: Arc<QuickViewModel>,
    formatter: Arc<FileMetadataFormatter>,
    classifier: Arc<dyn TypeClassifier>,
    directory_size: Arc<dyn DirectorySizeProvider>,
    config: ControllerConfig,
    latest_cycle: AtomicU64,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

/// The refresh a fetch was issued for.
#[derive(Clone)]
struct Cycle {
    id: u64,
    entry: Arc<Entry>,
}

impl MetadataBoxController {
    /// Wires the controller to its event sources.
    ///
    /// Fetches run on the tokio runtime current at construction time.
    /// Dropping the controller unregisters its listeners; fetches already in
    /// flight still complete.
    pub fn new(collaborators: Collaborators, config: ControllerConfig) -> ControllerResult<Self> {
        let runtime = Handle::try_current().map_err(|error| {
            ControllerError::new(
                ControllerErrorCode::RuntimeUnavailable,
                format!("Metadata box needs a tokio runtime: {error}"),
            )
        })?;

        let Collaborators {
            metadata_model,
            metadata_box,
            quick_view,
            quick_view_model,
            formatter,
            classifier,
            directory_size,
        } = collaborators;

        let inner = Arc::new(Inner {
            metadata_model,
            metadata_box,
            quick_view,
            quick_view_model,
            formatter,
            classifier,
            directory_size,
            config,
            latest_cycle: AtomicU64::new(0),
            runtime,
            pending: Mutex::new(Vec::new()),
        });

        let subscriptions = Subscriptions {
            formatter: inner.formatter.add_listener(refresh_listener(&inner)),
            quick_view: inner.quick_view.add_listener(refresh_listener(&inner)),
            quick_view_model: inner
                .quick_view_model
                .add_listener(refresh_listener(&inner)),
        };

        Ok(Self {
            inner,
            subscriptions,
        })
    }

    pub fn config(&self) -> ControllerConfig {
        self.inner.config
    }

    /// Runs the same refresh the change notifications trigger.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Waits until every fetch issued so far has completed, including the
    /// follow-up fetches they start.
    pub async fn settle(&self) {
        self.inner.settle().await;
    }
}

impl Drop for MetadataBoxController {
    fn drop(&mut self) {
        let inner = &self.inner;
        inner.formatter.remove_listener(self.subscriptions.formatter);
        inner.quick_view.remove_listener(self.subscriptions.quick_view);
        inner
            .quick_view_model
            .remove_listener(self.subscriptions.quick_view_model);
        trace!("metadata box controller detached");
    }
}

fn refresh_listener(inner: &Arc<Inner>) -> Listener {
    let weak = Arc::downgrade(inner);
    Arc::new(move |event| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        trace!(event = event.name(), "metadata box refresh requested");
        inner.refresh();
    })
}

fn first_item(items: Vec<MetadataItem>) -> MetadataItem {
    items.into_iter().next().unwrap_or_default()
}

/// Display value for a requested media field, substituting the box default
/// when the backend returned nothing: 0 for numbers, "" for text and no
/// descriptor for `ifd`.
fn media_display_value(field: MetadataField, item: &MetadataItem) -> Option<BoxField> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let value = match field {
        MetadataField::Ifd => BoxField::Ifd(item.ifd.clone()),
        MetadataField::ImageHeight => BoxField::ImageHeight(item.image_height.unwrap_or(0)),
        MetadataField::ImageWidth => BoxField::ImageWidth(item.image_width.unwrap_or(0)),
        MetadataField::MediaAlbum => BoxField::MediaAlbum(text(&item.media_album)),
        MetadataField::MediaArtist => BoxField::MediaArtist(text(&item.media_artist)),
        MetadataField::MediaDuration => BoxField::MediaDuration(item.media_duration.unwrap_or(0.0)),
        MetadataField::MediaGenre => BoxField::MediaGenre(text(&item.media_genre)),
        MetadataField::MediaTitle => BoxField::MediaTitle(text(&item.media_title)),
        MetadataField::MediaTrack => BoxField::MediaTrack(item.media_track.unwrap_or(0)),
        _ => return None,
    };
    Some(value)
}

impl Inner {
    fn refresh(self: &Arc<Self>) {
        if !self.quick_view.metadata_box_active() {
            return;
        }
        let id = self.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        self.metadata_box.clear();
        let Some(entry) = self.quick_view_model.selected_entry() else {
            debug!(cycle = id, "metadata box cleared, nothing selected");
            return;
        };
        debug!(cycle = id, path = %entry.path().display(), "metadata box refresh");

        let cycle = Cycle { id, entry };
        let fetch = self
            .metadata_model
            .get(vec![cycle.entry.clone()], GENERAL_FIELDS.to_vec());
        let this = self.clone();
        self.spawn(async move {
            match fetch.await {
                Ok(items) => {
                    if this.accepts(&cycle, "general") {
                        this.apply_general(&cycle, first_item(items));
                    }
                }
                Err(error) => {
                    warn!(cycle = cycle.id, error = %error.describe(), "general metadata fetch failed");
                }
            }
        });
    }

    fn apply_general(self: &Arc<Self>, cycle: &Cycle, item: MetadataItem) {
        let kind = self.classifier.classify(&cycle.entry);
        self.metadata_box.set(BoxField::Type(kind.as_str().to_string()));

        if let Some(size) = item.size {
            self.metadata_box.set(BoxField::Size(
                self.formatter.format_size(size, item.is_hosted()),
            ));
        }
        if cycle.entry.is_directory() {
            self.start_directory_size(cycle.clone());
        }
        if let Some(time) = item.modification_time {
            self.metadata_box
                .set(BoxField::ModificationTime(self.formatter.format_mod_date(time)));
        }

        let external = item.has_external_url();
        self.fetch_mime_type(cycle.clone(), external);
        if kind.is_media() {
            self.fetch_media(cycle.clone(), external);
        }
    }

    fn fetch_mime_type(self: &Arc<Self>, cycle: Cycle, external: bool) {
        let field = if external {
            MetadataField::ContentMimeType
        } else {
            MetadataField::MediaMimeType
        };
        let fetch = self
            .metadata_model
            .get(vec![cycle.entry.clone()], vec![field]);
        let this = self.clone();
        self.spawn(async move {
            let item = match fetch.await {
                Ok(items) => first_item(items),
                Err(error) => {
                    warn!(cycle = cycle.id, error = %error.describe(), "mime type fetch failed");
                    return;
                }
            };
            if !this.accepts(&cycle, "mime") {
                return;
            }
            let mime = if external {
                item.content_mime_type
            } else {
                item.media_mime_type
            };
            this.metadata_box.set(BoxField::MediaMimeType(mime));
        });
    }

    fn fetch_media(self: &Arc<Self>, cycle: Cycle, external: bool) {
        let fields = if external {
            HOSTED_MEDIA_FIELDS
        } else {
            LOCAL_MEDIA_FIELDS
        };
        let fetch = self
            .metadata_model
            .get(vec![cycle.entry.clone()], fields.to_vec());
        let this = self.clone();
        self.spawn(async move {
            let item = match fetch.await {
                Ok(items) => first_item(items),
                Err(error) => {
                    warn!(cycle = cycle.id, error = %error.describe(), "media metadata fetch failed");
                    return;
                }
            };
            if !this.accepts(&cycle, "media") {
                return;
            }
            for field in fields {
                if let Some(value) = media_display_value(*field, &item) {
                    this.metadata_box.set(value);
                }
            }
        });
    }

    fn start_directory_size(self: &Arc<Self>, cycle: Cycle) {
        self.metadata_box.set(BoxField::SizeLoading(true));
        let fetch = self.directory_size.directory_size(cycle.entry.clone());
        let this = self.clone();
        self.spawn(async move {
            let result = fetch.await;
            // Unlike the other branches this check always applies. A stale
            // result leaves the loading flag untouched.
            if !this.quick_view_model.is_selected(&cycle.entry) {
                debug!(cycle = cycle.id, "discarding directory size for old selection");
                return;
            }
            if !this.accepts(&cycle, "directory size") {
                return;
            }
            match result {
                Ok(bytes) => {
                    this.metadata_box.set(BoxField::SizeLoading(false));
                    this.metadata_box
                        .set(BoxField::Size(this.formatter.format_size(bytes, true)));
                }
                Err(error) => {
                    debug!(cycle = cycle.id, error = %error.describe(), "directory size unavailable");
                    this.metadata_box.set(BoxField::SizeLoading(false));
                }
            }
        });
    }

    /// Applies the configured guard to a completed fetch.
    fn accepts(&self, cycle: &Cycle, branch: &'static str) -> bool {
        if self.config.stale_guard == StaleGuard::DirectorySizeOnly {
            return true;
        }
        let current = self.latest_cycle.load(Ordering::SeqCst) == cycle.id
            && self.quick_view_model.is_selected(&cycle.entry);
        if !current {
            debug!(cycle = cycle.id, branch, "discarding stale metadata");
        }
        current
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(task);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(error) = handle.await {
                    warn!(%error, "metadata box task failed");
                }
            }
        }
    }
}
