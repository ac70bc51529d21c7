use std::{io, num::{ParseFloatError, ParseIntError}, str::Utf8Error, string::FromUtf8Error};
use quick_xml::events::attributes::AttrError;
use log::SetLoggerError;

/// Failure categories surfaced to the caller. Every kind is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadUserInput,
    BadXml,
    DuplicateTags,
    VersionMismatch,
    PreconditionFailed,
    ChangesetMissing,
    UserChangesetMismatch,
    ChangesetAlreadyClosed,
    TooManyRelationMembers,
    TooManyWayNodes,
    Invalid,
    Forbidden,
    Unauthorized,
    NotFound,
    Gone,
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// External status code the kind maps to.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadUserInput
            | ErrorKind::BadXml
            | ErrorKind::DuplicateTags
            | ErrorKind::TooManyRelationMembers
            | ErrorKind::TooManyWayNodes
            | ErrorKind::Invalid
            | ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::VersionMismatch
            | ErrorKind::ChangesetMissing
            | ErrorKind::UserChangesetMismatch
            | ErrorKind::ChangesetAlreadyClosed => 409,
            ErrorKind::Gone => 410,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_user_input(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::BadUserInput, message)
    }

    pub fn bad_xml(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::BadXml, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::PreconditionFailed, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, message)
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::new(ErrorKind::Internal, value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::new(ErrorKind::BadXml, value.to_string())
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::new(ErrorKind::BadXml, value.to_string())
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Error::new(ErrorKind::BadUserInput, value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::new(ErrorKind::BadXml, value.to_string())
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::new(ErrorKind::BadXml, value.to_string())
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::new(ErrorKind::Internal, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Internal, value.to_string())
    }
}

impl From<SetLoggerError> for Error {
    fn from(value: SetLoggerError) -> Self {
        Error::new(ErrorKind::Internal, value.to_string())
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::new(ErrorKind::Internal, value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::new(ErrorKind::Internal, value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::not_found("x").status(), 404);
        assert_eq!(Error::new(ErrorKind::VersionMismatch, "x").status(), 409);
        assert_eq!(Error::precondition_failed("x").status(), 412);
        assert_eq!(Error::new(ErrorKind::Gone, "x").status(), 410);
        assert_eq!(Error::new(ErrorKind::TooManyRelationMembers, "x").status(), 400);
    }

    #[test]
    fn test_display_is_message() {
        let err = Error::bad_xml("tag is missing key");
        assert_eq!(err.to_string(), "tag is missing key");
    }

    #[test]
    fn test_foreign_errors_keep_kind() {
        let err: Error = "abc".parse::<f64>().unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::BadXml);
        let err: Error = "abc".parse::<i64>().unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::BadUserInput);
    }
}
