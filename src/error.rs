//! Error handling for the slurp library.
//!
//! Errors fall into two groups. Per-order errors (network, status, sink) are
//! caught by the transfer worker, logged and counted; they never stop the
//! pool. Listing errors are fatal to the run because the set of files to
//! fetch cannot be determined without the listing.

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when using slurp.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Captures internal failures that don't fit into other categories,
    /// such as a worker task that could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The address could not be turned into a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the connection failed.
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// Error from the Reqwest library, typically while reading a body.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// The server answered with a status outside of 200, 206 and 416.
    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { url: String, status: StatusCode },

    /// I/O Error.
    ///
    /// Wraps local filesystem failures while writing destinations, temporary
    /// spool files or the archive container.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// The output sink refused an operation.
    #[error("Sink error: {0}")]
    Sink(String),

    /// A directory listing page could not be fetched or read.
    #[error("Failed to list {url}: {message}")]
    Listing { url: String, message: String },

    /// The filename filter is not a valid regular expression.
    #[error("Invalid filename pattern: {source}")]
    InvalidPattern {
        #[from]
        source: regex::Error,
    },
}

/// Result type alias for operations that can fail with a slurp error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_names_url() {
        let err = Error::UnexpectedStatus {
            url: "http://example/dir/a.txt".into(),
            status: StatusCode::NOT_FOUND,
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("http://example/dir/a.txt"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, Error::IOError { .. }));
    }
}
