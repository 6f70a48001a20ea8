//! Quick-view metadata box: selection-driven metadata lookups and the
//! controller that keeps the box in sync.

pub mod binary_resolver;
pub mod controller;
pub mod db;
pub mod dir_size;
pub mod entry;
pub mod errors;
pub mod events;
pub mod file_type;
pub mod formatter;
pub mod metadata;
pub mod metadata_box;
pub mod quick_view;

pub use controller::{Collaborators, ControllerConfig, MetadataBoxController, StaleGuard};
pub use entry::Entry;
pub use metadata_box::{BoxField, MetadataBox, MetadataBoxState, SharedMetadataBox};
