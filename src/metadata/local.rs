use chrono::{DateTime, Utc};
use mime_guess::MimeGuess;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{MetadataError, MetadataErrorCode, MetadataResult};
use super::providers::{hosted, image, media_probe};
use super::types::{MetadataField, MetadataItem};
use super::{FetchFuture, MetadataModel};
use crate::db::{self, DbResult};
use crate::entry::Entry;
use crate::file_type::{ExtensionClassifier, FileKind, TypeClassifier};
use crate::errors::DomainError;

pub const FFPROBE_PATH_KEY: &str = "ffprobePath";

/// Reads metadata straight from the local filesystem.
///
/// Each batch runs on the blocking pool; nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct LocalMetadataModel {
    ffprobe: Option<PathBuf>,
}

impl LocalMetadataModel {
    pub fn new() -> Self {
        Self::with_ffprobe(media_probe::resolve_ffprobe_bin(None))
    }

    /// Media tags are skipped when `ffprobe` is `None`.
    pub fn with_ffprobe(ffprobe: Option<PathBuf>) -> Self {
        Self { ffprobe }
    }

    pub fn from_settings(conn: &Connection) -> DbResult<Self> {
        let configured = db::get_setting_string(conn, FFPROBE_PATH_KEY)?
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        Ok(Self::with_ffprobe(media_probe::resolve_ffprobe_bin(
            configured,
        )))
    }
}

impl MetadataModel for LocalMetadataModel {
    fn get(
        &self,
        entries: Vec<Arc<Entry>>,
        fields: Vec<MetadataField>,
    ) -> FetchFuture<MetadataResult<Vec<MetadataItem>>> {
        let ffprobe = self.ffprobe.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                entries
                    .iter()
                    .map(|entry| collect_item(entry, &fields, ffprobe.as_deref()))
                    .collect()
            })
            .await
            .map_err(|error| {
                MetadataError::new(
                    MetadataErrorCode::TaskFailed,
                    format!("Metadata task failed: {error}"),
                )
            })
        })
    }
}

fn collect_item(entry: &Entry, fields: &[MetadataField], ffprobe: Option<&Path>) -> MetadataItem {
    let wants = |field: MetadataField| fields.contains(&field);
    let mut item = MetadataItem::default();

    let meta = match fs::metadata(entry.path()) {
        Ok(meta) => meta,
        Err(error) => {
            debug!(path = %entry.path().display(), %error, "metadata unavailable");
            return item;
        }
    };

    let ext = entry.extension();
    let stub = if meta.is_file() {
        hosted::read_stub(entry.path(), &ext)
    } else {
        None
    };

    if wants(MetadataField::Size) && meta.is_file() {
        // Hosted documents own no local bytes; the stub size is meaningless.
        item.size = Some(if stub.is_some() { 0 } else { meta.len() });
    }
    if wants(MetadataField::ModificationTime) {
        item.modification_time = meta.modified().ok().map(DateTime::<Utc>::from);
    }
    if wants(MetadataField::Hosted) {
        item.hosted = Some(stub.is_some());
    }
    if wants(MetadataField::ExternalFileUrl) {
        item.external_file_url = stub.as_ref().and_then(|stub| stub.url.clone());
    }
    if wants(MetadataField::ContentMimeType) {
        item.content_mime_type = stub.as_ref().map(|stub| stub.content_mime_type.clone());
    }
    if wants(MetadataField::MediaMimeType) && meta.is_file() && stub.is_none() {
        item.media_mime_type = MimeGuess::from_path(entry.path())
            .first()
            .map(|mime| mime.essence_str().to_string());
    }

    let kind = ExtensionClassifier.classify(entry);
    if fields.iter().any(|f| f.is_image_field()) && kind == FileKind::Image {
        if let Some(probe) = image::probe(entry.path()) {
            item.image_width = Some(probe.width);
            item.image_height = Some(probe.height);
            item.ifd = Some(probe.ifd);
        }
    }

    let wants_media = fields
        .iter()
        .any(|f| f.is_media_tag() || matches!(f, MetadataField::ImageHeight | MetadataField::ImageWidth));
    if wants_media && matches!(kind, FileKind::Video | FileKind::Audio) {
        if let Some(ffprobe) = ffprobe {
            apply_media_probe(&mut item, ffprobe, entry.path());
        }
    }

    item.only(fields)
}

fn apply_media_probe(item: &mut MetadataItem, ffprobe: &Path, path: &Path) {
    let probe = match media_probe::probe(ffprobe, path) {
        Ok(probe) => probe,
        Err(error) if error.is_expected() => {
            debug!(path = %path.display(), error = %error.describe(), "not a media file");
            return;
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error.describe(), "media probe failed");
            return;
        }
    };
    if let Some(video) = probe.first_video_stream() {
        item.image_width = video.width;
        item.image_height = video.height;
    }
    item.media_duration = probe.duration();
    item.media_album = probe.tags.album;
    item.media_artist = probe.tags.artist;
    item.media_genre = probe.tags.genre;
    item.media_title = probe.tags.title;
    item.media_track = probe.tags.track;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::{Duration, SystemTime};

    fn uniq_dir(label: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let dir = env::temp_dir().join(format!("metabox-local-{label}-{ts}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn fetch(path: &Path, fields: Vec<MetadataField>) -> MetadataItem {
        let entry = Arc::new(Entry::from_path(path).unwrap());
        let mut items = LocalMetadataModel::with_ffprobe(None)
            .get(vec![entry], fields)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        items.remove(0)
    }

    #[tokio::test]
    async fn general_fields_for_plain_file() {
        let dir = uniq_dir("plain");
        let path = dir.join("notes.txt");
        fs::write(&path, vec![b'x'; 2048]).unwrap();

        let item = fetch(
            &path,
            vec![
                MetadataField::Size,
                MetadataField::ModificationTime,
                MetadataField::Hosted,
                MetadataField::ExternalFileUrl,
            ],
        )
        .await;
        assert_eq!(item.size, Some(2048));
        assert!(item.modification_time.is_some());
        assert_eq!(item.hosted, Some(false));
        assert_eq!(item.external_file_url, None);
        assert_eq!(item.media_mime_type, None, "not requested");

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn hosted_stub_reports_url_and_zero_size() {
        let dir = uniq_dir("hosted");
        let path = dir.join("Budget.gsheet");
        fs::write(&path, br#"{"url": "https://docs.google.com/spreadsheets/d/1"}"#).unwrap();

        let item = fetch(
            &path,
            vec![
                MetadataField::Size,
                MetadataField::Hosted,
                MetadataField::ExternalFileUrl,
                MetadataField::ContentMimeType,
            ],
        )
        .await;
        assert_eq!(item.size, Some(0));
        assert!(item.is_hosted());
        assert!(item.has_external_url());
        assert_eq!(
            item.content_mime_type.as_deref(),
            Some("application/vnd.google-apps.spreadsheet")
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn image_fields_for_png() {
        let dir = uniq_dir("png");
        let path = dir.join("pixel.png");
        ::image::RgbaImage::new(4, 2).save(&path).unwrap();

        let item = fetch(
            &path,
            vec![
                MetadataField::MediaMimeType,
                MetadataField::ImageHeight,
                MetadataField::ImageWidth,
                MetadataField::Ifd,
                MetadataField::MediaArtist,
            ],
        )
        .await;
        assert_eq!(item.media_mime_type.as_deref(), Some("image/png"));
        assert_eq!(item.image_width, Some(4));
        assert_eq!(item.image_height, Some(2));
        assert_eq!(item.ifd.map(|ifd| ifd.color_model), Some("RGBA".to_string()));
        assert_eq!(item.media_artist, None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn directories_have_no_size_or_mime() {
        let dir = uniq_dir("dir");
        let item = fetch(
            &dir,
            vec![MetadataField::Size, MetadataField::MediaMimeType],
        )
        .await;
        assert_eq!(item.size, None);
        assert_eq!(item.media_mime_type, None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_entry_yields_empty_item() {
        let entry = Arc::new(Entry::file("/definitely/not/here.jpg"));
        let items = LocalMetadataModel::with_ffprobe(None)
            .get(vec![entry], vec![MetadataField::Size])
            .await
            .unwrap();
        assert_eq!(items, vec![MetadataItem::default()]);
    }
}
