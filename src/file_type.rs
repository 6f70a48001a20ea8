use mime::{AUDIO, IMAGE, TEXT, VIDEO};
use mime_guess::MimeGuess;
use serde::Serialize;

use crate::entry::Entry;

/// Extensions of hosted-document stubs (the bytes live on a remote service).
pub const HOSTED_EXTENSIONS: &[&str] = &[
    "gdoc", "gsheet", "gslides", "gdraw", "gtable", "gform", "gmap", "gsite",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Hosted,
    Directory,
    Other,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Hosted => "hosted",
            Self::Directory => "directory",
            Self::Other => "other",
        }
    }

    /// Kinds that carry dimensions or audio/video tags.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Audio)
    }
}

pub trait TypeClassifier: Send + Sync {
    fn classify(&self, entry: &Entry) -> FileKind;
}

/// Classifies by extension tables first, then by the guessed MIME type.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

impl TypeClassifier for ExtensionClassifier {
    fn classify(&self, entry: &Entry) -> FileKind {
        if entry.is_directory() {
            return FileKind::Directory;
        }
        let ext = entry.extension();
        if let Some(kind) = kind_for_extension(&ext) {
            return kind;
        }
        match MimeGuess::from_path(entry.path()).first() {
            Some(guess) if guess.type_() == IMAGE => FileKind::Image,
            Some(guess) if guess.type_() == VIDEO => FileKind::Video,
            Some(guess) if guess.type_() == AUDIO => FileKind::Audio,
            Some(guess) if guess.type_() == TEXT => FileKind::Document,
            _ => FileKind::Other,
        }
    }
}

fn kind_for_extension(ext: &str) -> Option<FileKind> {
    if HOSTED_EXTENSIONS.contains(&ext) {
        return Some(FileKind::Hosted);
    }
    let kind = match ext {
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "svg" | "tiff" | "tif" | "tga"
        | "ico" | "avif" => FileKind::Image,
        "mp4" | "mkv" | "webm" | "mov" | "avi" | "wmv" | "m4v" | "mpeg" | "mpg" | "3gp" => {
            FileKind::Video
        }
        "mp3" | "flac" | "wav" | "ogg" | "m4a" | "aac" | "opus" | "wma" => FileKind::Audio,
        "pdf" | "txt" | "md" | "doc" | "docx" | "odt" | "rtf" | "xls" | "xlsx" | "ods" | "ppt"
        | "pptx" | "odp" | "csv" => FileKind::Document,
        "zip" | "tar" | "gz" | "bz2" | "xz" | "zst" | "tgz" | "tbz2" | "txz" | "7z" | "rar" => {
            FileKind::Archive
        }
        _ => return None,
    };
    Some(kind)
}
