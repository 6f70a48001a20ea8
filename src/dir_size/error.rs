use crate::errors::domain::{classify_io_error, DomainError, ErrorCode, IoErrorHint};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSizeErrorCode {
    NotFound,
    PermissionDenied,
    NotADirectory,
    ReadFailed,
    TaskFailed,
}

impl ErrorCode for DirSizeErrorCode {
    fn as_code_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::NotADirectory => "not_a_directory",
            Self::ReadFailed => "read_failed",
            Self::TaskFailed => "task_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirSizeError {
    code: DirSizeErrorCode,
    message: String,
}

impl DirSizeError {
    pub fn new(code: DirSizeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> DirSizeErrorCode {
        self.code
    }

    pub fn from_io_error(context: &str, error: std::io::Error) -> Self {
        let code = match classify_io_error(&error) {
            IoErrorHint::NotFound => DirSizeErrorCode::NotFound,
            IoErrorHint::PermissionDenied => DirSizeErrorCode::PermissionDenied,
            _ => DirSizeErrorCode::ReadFailed,
        };
        Self::new(code, format!("{context}: {error}"))
    }
}

impl fmt::Display for DirSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DirSizeError {}

impl DomainError for DirSizeError {
    fn code_str(&self) -> &'static str {
        self.code.as_code_str()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

pub type DirSizeResult<T> = Result<T, DirSizeError>;
