use crate::errors::domain::{DomainError, ErrorCode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerErrorCode {
    RuntimeUnavailable,
}

impl ErrorCode for ControllerErrorCode {
    fn as_code_str(self) -> &'static str {
        match self {
            Self::RuntimeUnavailable => "runtime_unavailable",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerError {
    code: ControllerErrorCode,
    message: String,
}

impl ControllerError {
    pub fn new(code: ControllerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ControllerErrorCode {
        self.code
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ControllerError {}

impl DomainError for ControllerError {
    fn code_str(&self) -> &'static str {
        self.code.as_code_str()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
