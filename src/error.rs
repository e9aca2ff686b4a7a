use std::io;

use http::header::InvalidHeaderValue;
use thiserror::Error;

/// Errors produced while writing a response through a writer chain.
#[derive(Debug, Error)]
pub enum Error {
    /// The encoder or the underlying transport failed.
    #[error("io error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A header value built by the middleware is not a valid HTTP header value.
    #[error("invalid header value: {source}")]
    InvalidHeaderValue {
        /// The rejected conversion.
        #[from]
        source: InvalidHeaderValue,
    },

    /// Body bytes were written after the gzip stream was finished.
    #[error("gzip stream already finished")]
    StreamFinished,
}

/// Reasons an `Authorization` header cannot be read as Basic credentials.
///
/// The `Display` text is sent verbatim as the body of the 400 response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    /// The header is not made of exactly two space-separated tokens.
    #[error("Bad authorization header")]
    Malformed,

    /// The credentials token is not valid base64, or does not decode to UTF-8.
    #[error("Bad credentials encoding")]
    Encoding,

    /// The scheme is not `Basic`.
    #[error("Bad authorization header")]
    UnsupportedScheme,

    /// The decoded credentials have no `:` between username and password.
    #[error("Bad authorization header")]
    MissingSeparator,
}
