use crate::errors::domain::{classify_message_by_patterns, DomainError, ErrorCode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorCode {
    ProbeFailed,
    ProbeNotFound,
    ProbePermissionDenied,
    UnsupportedMedia,
    TaskFailed,
}

impl ErrorCode for MetadataErrorCode {
    fn as_code_str(self) -> &'static str {
        match self {
            Self::ProbeFailed => "probe_failed",
            Self::ProbeNotFound => "probe_not_found",
            Self::ProbePermissionDenied => "probe_permission_denied",
            Self::UnsupportedMedia => "unsupported_media",
            Self::TaskFailed => "task_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataError {
    code: MetadataErrorCode,
    message: String,
}

impl MetadataError {
    pub fn new(code: MetadataErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> MetadataErrorCode {
        self.code
    }

    /// Classifies what `ffprobe` wrote to stderr before exiting non-zero.
    pub fn from_probe_stderr(stderr: &str) -> Self {
        let message = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("ffprobe failed without output");
        let code = classify_message_by_patterns(
            message,
            PROBE_STDERR_RULES,
            MetadataErrorCode::ProbeFailed,
        );
        Self::new(code, format!("ffprobe: {message}"))
    }

    /// Files that are simply not media are expected and not worth a warning.
    pub fn is_expected(&self) -> bool {
        self.code == MetadataErrorCode::UnsupportedMedia
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MetadataError {}

impl DomainError for MetadataError {
    fn code_str(&self) -> &'static str {
        self.code.as_code_str()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

pub type MetadataResult<T> = Result<T, MetadataError>;

const PROBE_STDERR_RULES: &[(MetadataErrorCode, &[&str])] = &[
    (
        MetadataErrorCode::ProbeNotFound,
        &["no such file or directory"],
    ),
    (
        MetadataErrorCode::ProbePermissionDenied,
        &["permission denied"],
    ),
    (
        MetadataErrorCode::UnsupportedMedia,
        &[
            "invalid data found when processing input",
            "moov atom not found",
            "end of file",
            "could not find codec parameters",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_stderr_line_decides_the_code() {
        let err = MetadataError::from_probe_stderr(
            "[mov,mp4 @ 0x55] moov atom not found\n/tmp/broken.mp4: Invalid data found when processing input\n",
        );
        assert_eq!(err.code(), MetadataErrorCode::UnsupportedMedia);
        assert!(err.is_expected());
        assert_eq!(
            err.to_string(),
            "ffprobe: /tmp/broken.mp4: Invalid data found when processing input"
        );
    }

    #[test]
    fn access_problems_are_not_expected() {
        let err = MetadataError::from_probe_stderr("/root/x.mp3: Permission denied");
        assert_eq!(err.code(), MetadataErrorCode::ProbePermissionDenied);
        assert!(!err.is_expected());

        let err = MetadataError::from_probe_stderr("/gone.ogg: No such file or directory");
        assert_eq!(err.code(), MetadataErrorCode::ProbeNotFound);
    }

    #[test]
    fn silent_failure_falls_back() {
        let err = MetadataError::from_probe_stderr("  \n");
        assert_eq!(err.code(), MetadataErrorCode::ProbeFailed);
        assert_eq!(err.to_string(), "ffprobe: ffprobe failed without output");
    }
}
