//! Response-writer decorators for HTTP middleware.
//!
//! Handlers write their response into a [`ResponseWriter`]. Middleware can
//! wrap that writer in a decorator before calling the handler it protects,
//! adding behavior without the handler knowing about it. Decorators expose
//! the writer they wrap through [`WrappedWriter`], so any code holding the
//! outermost writer can walk the chain with [`find`] to see what was applied
//! further out.
//!
//! Two middleware are provided:
//!
//! - [`gzip`] / [`GzipLayer`]: compresses response bodies for clients that
//!   send an `Accept-Encoding` allowing gzip.
//! - [`basic_auth`] / [`BasicAuthLayer`]: requires HTTP Basic credentials and
//!   attaches the authenticated identity to the writer, where downstream code
//!   reads it with [`get_user`].
//!
//! Both detect their own decorator further out in the chain and step aside,
//! so composing either one more than once is harmless.
//!
//! # Example
//!
//! ```ignore
//! use http_writer_middleware::{basic_auth, get_user, gzip, handler_fn, static_credentials};
//!
//! let handler = gzip(basic_auth(
//!     handler_fn(|w, _req: &http::Request<()>| {
//!         let user = get_user::<String>(w).cloned().unwrap_or_default();
//!         let _ = w.write(format!("hello {user}").as_bytes());
//!     }),
//!     static_credentials([("alice", "secret")]),
//!     "Private",
//! ));
//! ```
//!
//! # Response Modifications
//!
//! When compression is applied:
//! - `Content-Encoding` is set to `gzip`
//! - `Content-Length` is removed (compressed size is unknown)
//!
//! `Vary: Accept-Encoding` is added whether or not the body is compressed,
//! unless it is already listed.

#![deny(missing_docs)]

mod auth;
mod codec;
mod error;
mod gzip;
mod handler;
mod layer;
mod service;
mod unwrap;
mod writer;

pub use auth::{
    AuthWriter, Credentials, DEFAULT_REALM, bad_request, get_user, static_credentials,
    unauthorized,
};
pub use codec::accepts_gzip;
pub use error::{CredentialsError, Error};
pub use gzip::GzipWriter;
pub use handler::{Handler, HandlerFn, handler_fn};
pub use layer::{BasicAuthLayer, GzipLayer};
pub use service::{BasicAuthHandler, GzipHandler, basic_auth, gzip};
pub use unwrap::{MAX_UNWRAP_DEPTH, find};
pub use writer::{ResponseRecorder, ResponseWriter, WrappedWriter, WriterKind};

/// Compression level for [`GzipLayer`] and [`GzipHandler`].
pub use compression_core::Level;
