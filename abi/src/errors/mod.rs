use std::error::Error as StdError;
use std::fmt;

use bson::document::ValueAccessError;
use serde::Serialize;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// the referenced record does not resolve in the store
    NotFound,
    /// self-referential friend request or accept, or a request that is not pending
    InvalidOperation,
    /// a pending request between the same pair already exists
    DuplicateRequest,
    /// versioned save lost against a concurrent writer
    Conflict,
    /// store unreachable
    Unavailable,
    InternalServer,
    ConfigReadError,
    ConfigParseError,
    MongoDbValueAccessError,
    MongoDbBsonSerError,
    MongoDbBsonDeError,
    MongoDbOperateError,
    IOError,
}

#[derive(Debug, Serialize)]
pub struct Error {
    kind: ErrorKind,
    details: Option<String>,
    #[serde(skip)]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    #[inline]
    pub fn new(
        kind: ErrorKind,
        details: impl Into<String>,
        source: impl StdError + 'static + Send + Sync,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            details: Some(details.into()),
        }
    }

    #[inline]
    pub fn with_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            details: None,
        }
    }

    #[inline]
    pub fn with_details(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            details: Some(details.into()),
        }
    }

    #[inline]
    pub fn internal_with_details(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::InternalServer, details)
    }

    #[inline]
    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::Unavailable, details)
    }

    #[inline]
    pub fn not_found() -> Self {
        Self::with_kind(ErrorKind::NotFound)
    }

    #[inline]
    pub fn not_found_with_details(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::NotFound, details)
    }

    #[inline]
    pub fn invalid_operation(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::InvalidOperation, details)
    }

    #[inline]
    pub fn duplicate_request(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::DuplicateRequest, details)
    }

    #[inline]
    pub fn conflict(details: impl Into<String>) -> Self {
        Self::with_details(ErrorKind::Conflict, details)
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// HTTP status the transport layer is expected to answer with
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidOperation => 400,
            ErrorKind::DuplicateRequest | ErrorKind::Conflict => 409,
            ErrorKind::Unavailable => 503,
            ErrorKind::InternalServer
            | ErrorKind::ConfigReadError
            | ErrorKind::ConfigParseError
            | ErrorKind::MongoDbValueAccessError
            | ErrorKind::MongoDbBsonSerError
            | ErrorKind::MongoDbBsonDeError
            | ErrorKind::MongoDbOperateError
            | ErrorKind::IOError => {
                error!("store or server failure surfaced to transport: {:?}", self);
                500
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{:?}: {}", self.kind, details),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value.to_string(), value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::ConfigParseError, value.to_string(), value)
    }
}

impl From<ValueAccessError> for Error {
    fn from(value: ValueAccessError) -> Self {
        Self::new(ErrorKind::MongoDbValueAccessError, value.to_string(), value)
    }
}

impl From<bson::ser::Error> for Error {
    fn from(value: bson::ser::Error) -> Self {
        Self::new(ErrorKind::MongoDbBsonSerError, value.to_string(), value)
    }
}

impl From<bson::de::Error> for Error {
    fn from(value: bson::de::Error) -> Self {
        Self::new(ErrorKind::MongoDbBsonDeError, value.to_string(), value)
    }
}

/// connection level failures are reported as `Unavailable`, everything else as an operate error
impl From<mongodb::error::Error> for Error {
    fn from(value: mongodb::error::Error) -> Self {
        let kind = match *value.kind {
            mongodb::error::ErrorKind::ServerSelection { .. }
            | mongodb::error::ErrorKind::Io(_)
            | mongodb::error::ErrorKind::ConnectionPoolCleared { .. }
            | mongodb::error::ErrorKind::DnsResolve { .. } => ErrorKind::Unavailable,
            _ => ErrorKind::MongoDbOperateError,
        };
        Self::new(kind, value.to_string(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_follows_kind() {
        assert_eq!(Error::not_found().status_code(), 404);
        assert_eq!(Error::invalid_operation("self").status_code(), 400);
        assert_eq!(Error::duplicate_request("dup").status_code(), 409);
        assert_eq!(Error::unavailable("down").status_code(), 503);
        assert_eq!(Error::internal_with_details("boom").status_code(), 500);
    }

    #[test]
    fn display_includes_details() {
        let err = Error::not_found_with_details("post p1");
        assert_eq!(err.to_string(), "NotFound: post p1");
        assert_eq!(Error::not_found().to_string(), "NotFound");
    }

    #[test]
    fn io_error_keeps_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.kind(), ErrorKind::IOError);
        assert!(err.source().is_some());
    }
}
