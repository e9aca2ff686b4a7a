//! The response writer abstraction and the capability decorators use to
//! expose the writer they wrap.

use std::any::Any;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};

use crate::error::Error;

/// Marker identifying what a writer in a chain contributes.
///
/// Middleware compare markers to detect whether their own decoration was
/// already applied further out in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterKind {
    /// A terminal writer, or a decorator with no self-awareness needs.
    Plain,
    /// A writer that gzip-encodes body bytes.
    Gzip,
    /// A writer carrying an authenticated identity.
    Authenticated,
}

/// Sink for one HTTP response: headers, a single status commit, then body bytes.
pub trait ResponseWriter {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    ///
    /// Changes made after the status is committed are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line together with the current headers.
    ///
    /// Only the first commit takes effect.
    fn write_status(&mut self, status: StatusCode);

    /// Appends bytes to the body, committing `200 OK` first if no status
    /// has been committed yet.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Pushes any buffered body bytes towards the client.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Returns the marker for this writer.
    fn kind(&self) -> WriterKind {
        WriterKind::Plain
    }

    /// Returns this writer as a [`WrappedWriter`] if it decorates another writer.
    fn as_wrapped_writer(&self) -> Option<&dyn WrappedWriter> {
        None
    }

    /// Returns the identity attached to this writer, if any.
    fn identity(&self) -> Option<&dyn Any> {
        None
    }
}

/// Capability of a decorator that wraps exactly one [`ResponseWriter`].
pub trait WrappedWriter {
    /// Returns the writer directly beneath this one.
    fn wrapped_writer(&self) -> &dyn ResponseWriter;
}

/// An in-memory [`ResponseWriter`].
///
/// Headers are snapshotted when the status is committed, so the recorded
/// response reflects exactly what a client would have received.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|(status, _)| *status)
    }

    /// Returns whether the status line was committed.
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Returns the body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the recording into a response.
    ///
    /// A recorder that was never committed yields `200 OK` with its current headers.
    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers) = self
            .committed
            .unwrap_or((StatusCode::OK, self.headers));

        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        if let Some((committed, _)) = &self.committed {
            tracing::warn!(%committed, ignored = %status, "superfluous write_status call");
            return;
        }
        self.committed = Some((status, self.headers.clone()));
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.committed.is_none() {
            self.write_status(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}
