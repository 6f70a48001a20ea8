use chrono::{DateTime, Utc};
use serde::Serialize;

/// Independently fetchable attributes of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Size,
    ModificationTime,
    Hosted,
    ExternalFileUrl,
    ContentMimeType,
    MediaMimeType,
    Ifd,
    ImageHeight,
    ImageWidth,
    MediaAlbum,
    MediaArtist,
    MediaDuration,
    MediaGenre,
    MediaTitle,
    MediaTrack,
}

impl MetadataField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::ModificationTime => "modificationTime",
            Self::Hosted => "hosted",
            Self::ExternalFileUrl => "externalFileUrl",
            Self::ContentMimeType => "contentMimeType",
            Self::MediaMimeType => "mediaMimeType",
            Self::Ifd => "ifd",
            Self::ImageHeight => "imageHeight",
            Self::ImageWidth => "imageWidth",
            Self::MediaAlbum => "mediaAlbum",
            Self::MediaArtist => "mediaArtist",
            Self::MediaDuration => "mediaDuration",
            Self::MediaGenre => "mediaGenre",
            Self::MediaTitle => "mediaTitle",
            Self::MediaTrack => "mediaTrack",
        }
    }

    pub fn is_media_tag(self) -> bool {
        matches!(
            self,
            Self::MediaAlbum
                | Self::MediaArtist
                | Self::MediaDuration
                | Self::MediaGenre
                | Self::MediaTitle
                | Self::MediaTrack
        )
    }

    pub fn is_image_field(self) -> bool {
        matches!(self, Self::Ifd | Self::ImageHeight | Self::ImageWidth)
    }
}

/// Summary of the embedded image metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ifd {
    pub format: Option<String>,
    pub color_model: String,
    pub bit_depth: u16,
    pub orientation: Option<String>,
    pub exif_bytes: Option<usize>,
}

/// Sparse metadata record. `None` means unknown or not requested, which is
/// not the same as an explicit zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataItem {
    pub size: Option<u64>,
    pub modification_time: Option<DateTime<Utc>>,
    pub hosted: Option<bool>,
    pub external_file_url: Option<String>,
    pub content_mime_type: Option<String>,
    pub media_mime_type: Option<String>,
    pub ifd: Option<Ifd>,
    pub image_height: Option<u32>,
    pub image_width: Option<u32>,
    pub media_album: Option<String>,
    pub media_artist: Option<String>,
    pub media_duration: Option<f64>,
    pub media_genre: Option<String>,
    pub media_title: Option<String>,
    pub media_track: Option<u32>,
}

impl MetadataItem {
    /// Drops every field not listed in `fields`.
    pub fn only(self, fields: &[MetadataField]) -> Self {
        let keep = |field: MetadataField| fields.contains(&field);
        Self {
            size: self.size.filter(|_| keep(MetadataField::Size)),
            modification_time: self
                .modification_time
                .filter(|_| keep(MetadataField::ModificationTime)),
            hosted: self.hosted.filter(|_| keep(MetadataField::Hosted)),
            external_file_url: self
                .external_file_url
                .filter(|_| keep(MetadataField::ExternalFileUrl)),
            content_mime_type: self
                .content_mime_type
                .filter(|_| keep(MetadataField::ContentMimeType)),
            media_mime_type: self
                .media_mime_type
                .filter(|_| keep(MetadataField::MediaMimeType)),
            ifd: self.ifd.filter(|_| keep(MetadataField::Ifd)),
            image_height: self.image_height.filter(|_| keep(MetadataField::ImageHeight)),
            image_width: self.image_width.filter(|_| keep(MetadataField::ImageWidth)),
            media_album: self.media_album.filter(|_| keep(MetadataField::MediaAlbum)),
            media_artist: self.media_artist.filter(|_| keep(MetadataField::MediaArtist)),
            media_duration: self
                .media_duration
                .filter(|_| keep(MetadataField::MediaDuration)),
            media_genre: self.media_genre.filter(|_| keep(MetadataField::MediaGenre)),
            media_title: self.media_title.filter(|_| keep(MetadataField::MediaTitle)),
            media_track: self.media_track.filter(|_| keep(MetadataField::MediaTrack)),
        }
    }

    pub fn is_hosted(&self) -> bool {
        self.hosted.unwrap_or(false)
    }

    pub fn has_external_url(&self) -> bool {
        self.external_file_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_keeps_requested_fields() {
        let item = MetadataItem {
            size: Some(10),
            media_artist: Some("Nina".into()),
            image_width: Some(640),
            ..Default::default()
        }
        .only(&[MetadataField::Size, MetadataField::ImageWidth]);
        assert_eq!(item.size, Some(10));
        assert_eq!(item.image_width, Some(640));
        assert_eq!(item.media_artist, None);
    }

    #[test]
    fn empty_external_url_does_not_count() {
        let item = MetadataItem {
            external_file_url: Some(String::new()),
            ..Default::default()
        };
        assert!(!item.has_external_url());
        assert!(!item.is_hosted());
    }
}
