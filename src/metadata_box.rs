//! The metadata box widget the controller writes into.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

use crate::metadata::Ifd;

/// One settable field of the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxField {
    Type(String),
    Size(String),
    ModificationTime(String),
    MediaMimeType(Option<String>),
    SizeLoading(bool),
    ImageHeight(u32),
    ImageWidth(u32),
    MediaAlbum(String),
    MediaArtist(String),
    MediaDuration(f64),
    MediaGenre(String),
    MediaTitle(String),
    MediaTrack(u32),
    Ifd(Option<Ifd>),
}

/// Display sink. Implementations decide how default values render, e.g.
/// hiding an empty artist row.
pub trait MetadataBox: Send + Sync {
    fn clear(&self);
    fn set(&self, field: BoxField);
}

/// Everything the box currently shows. `None` means never written since the
/// last clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBoxState {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub modification_time: String,
    pub media_mime_type: Option<String>,
    pub is_size_loading: bool,
    pub image_height: Option<u32>,
    pub image_width: Option<u32>,
    pub media_album: Option<String>,
    pub media_artist: Option<String>,
    pub media_duration: Option<f64>,
    pub media_genre: Option<String>,
    pub media_title: Option<String>,
    pub media_track: Option<u32>,
    pub ifd: Option<Ifd>,
}

impl MetadataBoxState {
    pub fn apply(&mut self, field: BoxField) {
        match field {
            BoxField::Type(kind) => self.kind = kind,
            BoxField::Size(size) => self.size = size,
            BoxField::ModificationTime(time) => self.modification_time = time,
            BoxField::MediaMimeType(mime) => self.media_mime_type = mime,
            BoxField::SizeLoading(loading) => self.is_size_loading = loading,
            BoxField::ImageHeight(v) => self.image_height = Some(v),
            BoxField::ImageWidth(v) => self.image_width = Some(v),
            BoxField::MediaAlbum(v) => self.media_album = Some(v),
            BoxField::MediaArtist(v) => self.media_artist = Some(v),
            BoxField::MediaDuration(v) => self.media_duration = Some(v),
            BoxField::MediaGenre(v) => self.media_genre = Some(v),
            BoxField::MediaTitle(v) => self.media_title = Some(v),
            BoxField::MediaTrack(v) => self.media_track = Some(v),
            BoxField::Ifd(v) => self.ifd = v,
        }
    }
}

/// In-memory widget; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedMetadataBox {
    state: Arc<Mutex<MetadataBoxState>>,
}

impl SharedMetadataBox {
    pub fn snapshot(&self) -> MetadataBoxState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MetadataBox for SharedMetadataBox {
    fn clear(&self) {
        trace!("metadata box cleared");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = MetadataBoxState::default();
    }

    fn set(&self, field: BoxField) {
        trace!(?field, "metadata box write");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_every_field() {
        let widget = SharedMetadataBox::default();
        widget.set(BoxField::Type("image".into()));
        widget.set(BoxField::SizeLoading(true));
        widget.set(BoxField::MediaArtist(String::new()));
        assert_eq!(widget.snapshot().media_artist.as_deref(), Some(""));
        widget.clear();
        assert_eq!(widget.snapshot(), MetadataBoxState::default());
    }

    #[test]
    fn serializes_for_frontends() {
        let widget = SharedMetadataBox::default();
        widget.set(BoxField::Type("audio".into()));
        widget.set(BoxField::MediaTrack(3));
        let json = serde_json::to_value(widget.snapshot()).unwrap();
        assert_eq!(json["type"], "audio");
        assert_eq!(json["mediaTrack"], 3);
        assert_eq!(json["isSizeLoading"], false);
        assert!(json["ifd"].is_null());
    }
}
