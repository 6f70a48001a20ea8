//! Hosted-document stubs: small JSON files whose content lives on a remote
//! service, e.g. `{"url": "https://docs.google.com/...", "doc_id": "..."}`.

use serde::Deserialize;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedStub {
    pub url: Option<String>,
    pub content_mime_type: String,
}

#[derive(Deserialize)]
struct StubFile {
    url: Option<String>,
}

pub fn content_mime_type(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "gdoc" => "application/vnd.google-apps.document",
        "gsheet" => "application/vnd.google-apps.spreadsheet",
        "gslides" => "application/vnd.google-apps.presentation",
        "gdraw" => "application/vnd.google-apps.drawing",
        "gtable" => "application/vnd.google-apps.fusiontable",
        "gform" => "application/vnd.google-apps.form",
        "gmap" => "application/vnd.google-apps.map",
        "gsite" => "application/vnd.google-apps.site",
        _ => return None,
    };
    Some(mime)
}

/// `None` when the extension is not a hosted kind. An unreadable stub still
/// counts as hosted, just without a URL.
pub fn read_stub(path: &Path, ext: &str) -> Option<HostedStub> {
    let content_mime_type = content_mime_type(ext)?.to_string();
    let url = std::fs::read(path)
        .ok()
        .and_then(|raw| serde_json::from_slice::<StubFile>(&raw).ok())
        .and_then(|stub| stub.url)
        .and_then(|raw| Url::parse(raw.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from);
    Some(HostedStub {
        url,
        content_mime_type,
    })
}
