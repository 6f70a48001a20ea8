//! Audio/video stream and tag probing through `ffprobe`.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::errors::DomainError;
use crate::metadata::error::{MetadataError, MetadataErrorCode, MetadataResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaTags {
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub title: Option<String>,
    pub track: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaProbe {
    pub duration_secs: Option<f64>,
    pub streams: Vec<MediaStream>,
    pub tags: MediaTags,
}

impl MediaProbe {
    pub fn first_video_stream(&self) -> Option<&MediaStream> {
        self.streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some("video"))
    }

    /// Container duration, falling back to the first stream that has one.
    pub fn duration(&self) -> Option<f64> {
        self.duration_secs
            .or_else(|| self.streams.iter().find_map(|s| s.duration_secs))
    }
}

pub fn probe(ffprobe: &Path, path: &Path) -> MetadataResult<MediaProbe> {
    let output = Command::new(ffprobe)
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .output()
        .map_err(|error| {
            MetadataError::new(
                MetadataErrorCode::ProbeFailed,
                format!("Failed to run ffprobe: {error}"),
            )
        })?;

    if !output.status.success() {
        let error = MetadataError::from_probe_stderr(&String::from_utf8_lossy(&output.stderr));
        debug!(
            path = %path.display(),
            status = ?output.status,
            code = error.code_str(),
            "ffprobe rejected file"
        );
        return Err(error);
    }

    let parsed: Value = serde_json::from_slice(&output.stdout).map_err(|error| {
        MetadataError::new(
            MetadataErrorCode::ProbeFailed,
            format!("Failed to parse ffprobe output: {error}"),
        )
    })?;
    Ok(parse_probe(&parsed))
}

/// `FFPROBE_BIN` and the configured path are explicit overrides.
pub fn resolve_ffprobe_bin(configured: Option<PathBuf>) -> Option<PathBuf> {
    let env_probe = std::env::var("FFPROBE_BIN").ok().map(PathBuf::from);
    crate::binary_resolver::resolve_binary_with_overrides(
        "ffprobe",
        [env_probe, configured].into_iter().flatten(),
    )
}

pub fn parse_probe(root: &Value) -> MediaProbe {
    let mut out = MediaProbe::default();

    if let Some(format_obj) = root.get("format").and_then(Value::as_object) {
        out.duration_secs = parse_f64(format_obj.get("duration"));
        if let Some(tags) = format_obj.get("tags").and_then(Value::as_object) {
            merge_tags(&mut out.tags, tags);
        }
    }

    if let Some(streams) = root.get("streams").and_then(Value::as_array) {
        for stream in streams {
            out.streams.push(parse_stream(stream));
            // Ogg/Opus keep their tags on the stream, not the container.
            if let Some(tags) = stream.get("tags").and_then(Value::as_object) {
                merge_tags(&mut out.tags, tags);
            }
        }
    }

    out
}

fn parse_stream(stream: &Value) -> MediaStream {
    MediaStream {
        codec_type: get_string(stream.get("codec_type")),
        width: parse_u32(stream.get("width")),
        height: parse_u32(stream.get("height")),
        duration_secs: parse_f64(stream.get("duration")),
    }
}

/// Fills only the tags still missing. Tag keys are case-insensitive.
fn merge_tags(tags: &mut MediaTags, raw: &Map<String, Value>) {
    for (key, value) in raw {
        let slot = match key.to_ascii_lowercase().as_str() {
            "album" => &mut tags.album,
            "artist" => &mut tags.artist,
            "genre" => &mut tags.genre,
            "title" => &mut tags.title,
            "track" | "tracknumber" => {
                if tags.track.is_none() {
                    tags.track = get_string(Some(value)).as_deref().and_then(parse_track);
                }
                continue;
            }
            _ => continue,
        };
        if slot.is_none() {
            *slot = get_string(Some(value));
        }
    }
}

/// `"3"` and `"3/12"` both mean track 3.
pub fn parse_track(raw: &str) -> Option<u32> {
    raw.split('/').next()?.trim().parse::<u32>().ok()
}

fn get_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_u64(value: Option<&Value>) -> Option<u64> {
    match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn parse_u32(value: Option<&Value>) -> Option<u32> {
    parse_u64(value).and_then(|v| u32::try_from(v).ok())
}

fn parse_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
