use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use compression_core::Level;
use http::{Method, Request, header};

use crate::auth::{self, AuthWriter, Credentials, DEFAULT_REALM};
use crate::codec;
use crate::gzip::GzipWriter;
use crate::handler::Handler;
use crate::unwrap;
use crate::writer::{ResponseWriter, WriterKind};

/// Wraps `inner` so that responses are gzip-compressed for clients that accept it.
pub fn gzip<H>(inner: H) -> GzipHandler<H> {
    GzipHandler::new(inner)
}

/// Wraps `inner` so that it is only reached with valid Basic credentials.
///
/// `authenticate` receives the username and password and returns the identity
/// to attach to the response writer, or `None` to reject the request. An empty
/// `realm` is replaced with [`DEFAULT_REALM`].
pub fn basic_auth<H, F, U>(inner: H, authenticate: F, realm: &str) -> BasicAuthHandler<H, F, U>
where
    F: Fn(&str, &str) -> Option<U>,
{
    BasicAuthHandler::new(inner, Arc::new(authenticate), realm)
}

pub(crate) fn normalize_realm(realm: &str) -> Arc<str> {
    if realm.is_empty() {
        Arc::from(DEFAULT_REALM)
    } else {
        Arc::from(realm)
    }
}

/// A handler that gzip-compresses the responses of the handler it wraps.
#[derive(Debug, Clone)]
pub struct GzipHandler<H> {
    inner: H,
    level: Level,
}

impl<H> GzipHandler<H> {
    /// Creates a new compression handler wrapping the given inner handler.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            level: Level::Default,
        }
    }

    /// Sets the gzip compression level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Returns a reference to the inner handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Consumes this handler, returning the inner handler.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H, B> Handler<B> for GzipHandler<H>
where
    H: Handler<B>,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        if unwrap::find(&*writer, |w| w.kind() == WriterKind::Gzip).is_some() {
            tracing::trace!("response already gzip-encoded, passing through");
            return self.inner.serve(writer, req);
        }

        codec::ensure_vary_accept_encoding(writer.headers_mut());

        if *req.method() == Method::HEAD || !req.headers().contains_key(header::ACCEPT_ENCODING) {
            return self.inner.serve(writer, req);
        }
        if !codec::accepts_gzip(req.headers().get_all(header::ACCEPT_ENCODING)) {
            tracing::trace!("client does not accept gzip, passing through");
            return self.inner.serve(writer, req);
        }

        codec::set_gzip_headers(writer.headers_mut());

        let mut gz = GzipWriter::new(writer, self.level);
        self.inner.serve(&mut gz, req);
        if let Err(err) = gz.finish() {
            tracing::warn!(%err, "failed to finish gzip stream");
        }
    }
}

/// A handler that requires HTTP Basic authentication before reaching the
/// handler it wraps.
///
/// On success the inner handler receives an [`AuthWriter`] holding the
/// identity, retrievable with [`get_user`](crate::get_user).
pub struct BasicAuthHandler<H, F, U> {
    inner: H,
    authenticate: Arc<F>,
    realm: Arc<str>,
    _identity: PhantomData<fn() -> U>,
}

impl<H, F, U> BasicAuthHandler<H, F, U> {
    pub(crate) fn new(inner: H, authenticate: Arc<F>, realm: &str) -> Self {
        Self {
            inner,
            authenticate,
            realm: normalize_realm(realm),
            _identity: PhantomData,
        }
    }

    /// Returns the realm sent in authentication challenges.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns a reference to the inner handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Consumes this handler, returning the inner handler.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn challenge(&self, writer: &mut dyn ResponseWriter) {
        if let Err(err) = auth::unauthorized(writer, &self.realm) {
            tracing::warn!(%err, realm = %self.realm, "failed to write authentication challenge");
        }
    }
}

impl<H: Clone, F, U> Clone for BasicAuthHandler<H, F, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            authenticate: Arc::clone(&self.authenticate),
            realm: Arc::clone(&self.realm),
            _identity: PhantomData,
        }
    }
}

impl<H: fmt::Debug, F, U> fmt::Debug for BasicAuthHandler<H, F, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthHandler")
            .field("inner", &self.inner)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl<H, F, U, B> Handler<B> for BasicAuthHandler<H, F, U>
where
    H: Handler<B>,
    F: Fn(&str, &str) -> Option<U>,
    U: 'static,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        if unwrap::find(&*writer, |w| w.kind() == WriterKind::Authenticated).is_some() {
            tracing::trace!("request already authenticated, skipping challenge");
            return self.inner.serve(writer, req);
        }

        let Some(value) = req
            .headers()
            .get(header::AUTHORIZATION)
            .filter(|v| !v.is_empty())
        else {
            tracing::debug!(realm = %self.realm, "missing authorization header");
            return self.challenge(writer);
        };

        let credentials = match Credentials::parse(value) {
            Ok(credentials) => credentials,
            Err(err) => {
                tracing::debug!(%err, "rejecting malformed authorization header");
                if let Err(err) = auth::bad_request(writer, &err.to_string()) {
                    tracing::warn!(%err, "failed to write bad request response");
                }
                return;
            }
        };

        match (self.authenticate)(&credentials.username, &credentials.password) {
            Some(user) => {
                tracing::trace!(username = %credentials.username, "authenticated");
                let mut aw = AuthWriter::new(writer, user);
                self.inner.serve(&mut aw, req);
            }
            None => {
                tracing::debug!(username = %credentials.username, "authentication rejected");
                self.challenge(writer);
            }
        }
    }
}
