//! Metadata lookups for quick-view entries.

pub mod error;
pub mod local;
pub mod providers;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::entry::Entry;

pub use error::{MetadataError, MetadataErrorCode, MetadataResult};
pub use local::LocalMetadataModel;
pub use types::{Ifd, MetadataField, MetadataItem};

/// Boxed future returned by the asynchronous collaborators.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Batch metadata lookup.
///
/// Returns one item per entry, in order, with only the requested fields
/// filled in. A field the backend cannot determine is left `None` rather
/// than reported as an error.
pub trait MetadataModel: Send + Sync {
    fn get(
        &self,
        entries: Vec<Arc<Entry>>,
        fields: Vec<MetadataField>,
    ) -> FetchFuture<MetadataResult<Vec<MetadataItem>>>;
}
