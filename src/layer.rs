use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use compression_core::Level;
use tower::Layer;

use crate::auth::DEFAULT_REALM;
use crate::service::{BasicAuthHandler, GzipHandler, normalize_realm};

/// A Tower layer that gzip-compresses the responses of the handlers it wraps.
#[derive(Debug, Clone, Copy)]
pub struct GzipLayer {
    level: Level,
}

impl GzipLayer {
    /// Creates a new compression layer with default settings.
    pub fn new() -> Self {
        Self {
            level: Level::Default,
        }
    }

    /// Sets the gzip compression level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for GzipLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Layer<H> for GzipLayer {
    type Service = GzipHandler<H>;

    fn layer(&self, inner: H) -> Self::Service {
        GzipHandler::new(inner).with_level(self.level)
    }
}

/// A Tower layer that puts HTTP Basic authentication in front of the
/// handlers it wraps.
pub struct BasicAuthLayer<F, U> {
    authenticate: Arc<F>,
    realm: Arc<str>,
    _identity: PhantomData<fn() -> U>,
}

impl<F, U> BasicAuthLayer<F, U>
where
    F: Fn(&str, &str) -> Option<U>,
{
    /// Creates a new authentication layer using `authenticate` to validate
    /// credentials, with the realm set to [`DEFAULT_REALM`].
    pub fn new(authenticate: F) -> Self {
        Self {
            authenticate: Arc::new(authenticate),
            realm: Arc::from(DEFAULT_REALM),
            _identity: PhantomData,
        }
    }
}

impl<F, U> BasicAuthLayer<F, U> {
    /// Sets the realm sent in `WWW-Authenticate` challenges.
    ///
    /// An empty realm falls back to [`DEFAULT_REALM`].
    pub fn realm(mut self, realm: impl AsRef<str>) -> Self {
        self.realm = normalize_realm(realm.as_ref());
        self
    }
}

impl<F, U> Clone for BasicAuthLayer<F, U> {
    fn clone(&self) -> Self {
        Self {
            authenticate: Arc::clone(&self.authenticate),
            realm: Arc::clone(&self.realm),
            _identity: PhantomData,
        }
    }
}

impl<F, U> fmt::Debug for BasicAuthLayer<F, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthLayer")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl<H, F, U> Layer<H> for BasicAuthLayer<F, U> {
    type Service = BasicAuthHandler<H, F, U>;

    fn layer(&self, inner: H) -> Self::Service {
        BasicAuthHandler::new(inner, Arc::clone(&self.authenticate), &self.realm)
    }
}
