pub mod domain;

pub use domain::{classify_io_error, classify_message_by_patterns, DomainError, ErrorCode, IoErrorHint};
