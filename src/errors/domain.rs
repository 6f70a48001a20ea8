//! Shared plumbing for the per-domain error types.
//!
//! Every module that can fail owns a small `Copy` code enum and an error
//! struct carrying that code plus a human readable message. The helpers here
//! keep the classification of foreign errors (I/O, provider messages) in one
//! place.

use std::io::ErrorKind;

pub trait ErrorCode {
    #[allow(clippy::wrong_self_convention)]
    fn as_code_str(self) -> &'static str;
}

pub trait DomainError: std::error::Error {
    fn code_str(&self) -> &'static str;
    fn message(&self) -> &str;

    /// `code: message`, the shape used in log lines.
    fn describe(&self) -> String {
        format!("{}: {}", self.code_str(), self.message())
    }
}

pub fn classify_message_by_patterns<C: Copy>(
    message: &str,
    rules: &[(C, &[&str])],
    fallback: C,
) -> C {
    let normalized = message.to_ascii_lowercase();
    for &(code, patterns) in rules {
        if patterns.iter().any(|pattern| normalized.contains(pattern)) {
            return code;
        }
    }
    fallback
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorHint {
    NotFound,
    PermissionDenied,
    ReadOnlyFilesystem,
    Other,
}

pub fn classify_io_error(error: &std::io::Error) -> IoErrorHint {
    match error.kind() {
        ErrorKind::NotFound => return IoErrorHint::NotFound,
        ErrorKind::PermissionDenied => return IoErrorHint::PermissionDenied,
        _ => {}
    }
    error
        .raw_os_error()
        .map(classify_raw_os_error)
        .unwrap_or(IoErrorHint::Other)
}

fn classify_raw_os_error(raw: i32) -> IoErrorHint {
    #[cfg(windows)]
    {
        return match raw {
            5 => IoErrorHint::PermissionDenied, // ERROR_ACCESS_DENIED
            2 | 3 => IoErrorHint::NotFound,     // ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND
            19 => IoErrorHint::ReadOnlyFilesystem, // ERROR_WRITE_PROTECT
            _ => IoErrorHint::Other,
        };
    }

    #[cfg(unix)]
    {
        return match raw {
            1 | 13 => IoErrorHint::PermissionDenied, // EPERM | EACCES
            2 => IoErrorHint::NotFound,              // ENOENT
            30 => IoErrorHint::ReadOnlyFilesystem,   // EROFS
            _ => IoErrorHint::Other,
        };
    }

    #[allow(unreachable_code)]
    IoErrorHint::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Code {
        Missing,
        Denied,
        Unknown,
    }

    const RULES: &[(Code, &[&str])] = &[
        (Code::Missing, &["not found", "no such file"]),
        (Code::Denied, &["permission denied"]),
    ];

    #[test]
    fn classifies_case_insensitively() {
        assert_eq!(
            classify_message_by_patterns("No such file or directory", RULES, Code::Unknown),
            Code::Missing
        );
        assert_eq!(
            classify_message_by_patterns("Permission Denied (os error 13)", RULES, Code::Unknown),
            Code::Denied
        );
        assert_eq!(
            classify_message_by_patterns("disk on fire", RULES, Code::Unknown),
            Code::Unknown
        );
    }

    #[test]
    fn io_kind_wins_over_raw_code() {
        let err = std::io::Error::new(ErrorKind::NotFound, "gone");
        assert_eq!(classify_io_error(&err), IoErrorHint::NotFound);
        let other = std::io::Error::new(ErrorKind::Other, "odd");
        assert_eq!(classify_io_error(&other), IoErrorHint::Other);
    }
}
