use std::{io, path::PathBuf};

use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Authentication,
    NotFound,
    Status,
    LocalIo,
    Protocol,
    InvalidConfig,
    InvalidUri,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ConnectionError: {method} {url}: {source}")]
    Connection {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("AuthenticationError: {method} {url}: {status} (realm \"{realm}\", {attempts} attempt(s))")]
    Authentication {
        method: String,
        url: String,
        status: StatusCode,
        realm: String,
        attempts: u32,
    },
    #[error("{method} {url}: {status}")]
    Status {
        method: String,
        url: String,
        status: StatusCode,
    },
    #[error("IOError: {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ProtocolError: {0}")]
    Protocol(String),
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),
    #[error("InvalidUri: {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                ErrorKind::NotFound
            }
            Error::Status { .. } => ErrorKind::Status,
            Error::LocalIo { .. } => ErrorKind::LocalIo,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::InvalidUri { .. } => ErrorKind::InvalidUri,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } | Error::Authentication { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }
}
