//! Request-level error types.
//!
//! Every failure while handling a request ends up as a `ServerError`, and
//! every `ServerError` maps to the status code the client receives.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::parser::ParseError;
use crate::http::response::StatusCode;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed request: {0}")]
    Malformed(#[from] ParseError),

    #[error("no route for key {0:?}")]
    RouteNotFound(String),

    #[error("invalid files path: {0:?}")]
    BadFilesPath(String),

    #[error("failed to read {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("request exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("failed to encode body: {0}")]
    Encoding(#[source] io::Error),
}

impl ServerError {
    /// The status code sent to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Malformed(_) => StatusCode::InternalServerError,
            ServerError::RouteNotFound(_) => StatusCode::NotFound,
            ServerError::BadFilesPath(_) => StatusCode::BadRequest,
            ServerError::FileNotFound { .. } => StatusCode::NotFound,
            ServerError::FileWrite { .. } => StatusCode::InternalServerError,
            ServerError::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
            ServerError::PayloadTooLarge(_) => StatusCode::PayloadTooLarge,
            ServerError::Encoding(_) => StatusCode::InternalServerError,
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
