//! HTTP Basic authentication: credential parsing, the writer that carries the
//! authenticated identity, and the response helpers used to reject requests.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use http::header::{self, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::error::{CredentialsError, Error};
use crate::unwrap;
use crate::writer::{ResponseWriter, WrappedWriter, WriterKind};

/// Realm used when none is configured.
pub const DEFAULT_REALM: &str = "Authorization Required";

const BASIC_SCHEME: &str = "Basic";

/// Username and password carried by a Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The part before the first `:`.
    pub username: String,
    /// Everything after the first `:`.
    pub password: String,
}

impl Credentials {
    /// Parses the value of an `Authorization` header.
    ///
    /// The value must be `Basic <base64(username:password)>` with a single
    /// space between scheme and credentials. Credentials that are valid
    /// base64 but do not decode to UTF-8 are rejected with
    /// [`CredentialsError::Encoding`], which the middleware answers with a
    /// 400 `Bad credentials encoding`.
    pub fn parse(value: &HeaderValue) -> Result<Self, CredentialsError> {
        let value = value.to_str().map_err(|_| CredentialsError::Malformed)?;

        let mut parts = value.split(' ');
        let (Some(scheme), Some(encoded), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CredentialsError::Malformed);
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| CredentialsError::Encoding)?;
        if scheme != BASIC_SCHEME {
            return Err(CredentialsError::UnsupportedScheme);
        }

        let decoded = String::from_utf8(decoded).map_err(|_| CredentialsError::Encoding)?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(CredentialsError::MissingSeparator)?;

        Ok(Self {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A writer carrying the identity returned by a successful authentication.
///
/// Everything else is forwarded untouched to the wrapped writer. Downstream
/// code recovers the identity with [`get_user`].
pub struct AuthWriter<'a, U> {
    inner: &'a mut dyn ResponseWriter,
    user: U,
}

impl<'a, U> AuthWriter<'a, U> {
    /// Attaches `user` to `inner`.
    pub fn new(inner: &'a mut dyn ResponseWriter, user: U) -> Self {
        Self { inner, user }
    }

    /// Returns the attached identity.
    pub fn user(&self) -> &U {
        &self.user
    }
}

impl<U: fmt::Debug> fmt::Debug for AuthWriter<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthWriter").field("user", &self.user).finish()
    }
}

impl<U: 'static> ResponseWriter for AuthWriter<'_, U> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.inner.write_status(status)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()
    }

    fn kind(&self) -> WriterKind {
        WriterKind::Authenticated
    }

    fn as_wrapped_writer(&self) -> Option<&dyn WrappedWriter> {
        Some(self)
    }

    fn identity(&self) -> Option<&dyn Any> {
        Some(&self.user)
    }
}

impl<U: 'static> WrappedWriter for AuthWriter<'_, U> {
    fn wrapped_writer(&self) -> &dyn ResponseWriter {
        &*self.inner
    }
}

/// Returns the identity attached by the Basic authentication middleware
/// anywhere in `writer`'s chain.
///
/// `U` must be the type returned by the authentication function; an identity
/// of any other type is not found.
pub fn get_user<U: 'static>(writer: &dyn ResponseWriter) -> Option<&U> {
    unwrap::find(writer, |w| {
        w.kind() == WriterKind::Authenticated && w.identity().is_some_and(|id| id.is::<U>())
    })
    .and_then(|w| w.identity())
    .and_then(|id| id.downcast_ref::<U>())
}

/// Writes a `401 Unauthorized` response challenging the client for Basic
/// credentials in `realm`.
///
/// When `realm` cannot be used in a header value the 401 is still written,
/// without the challenge, and the error is returned.
pub fn unauthorized(writer: &mut dyn ResponseWriter, realm: &str) -> Result<(), Error> {
    let challenge = match HeaderValue::from_str(&format!("{BASIC_SCHEME} realm=\"{realm}\"")) {
        Ok(value) => {
            writer.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            Ok(())
        }
        Err(source) => Err(Error::from(source)),
    };
    writer.write_status(StatusCode::UNAUTHORIZED);
    writer.write(b"Unauthorized")?;
    challenge
}

/// Writes a `400 Bad Request` response with `message` as its body, or
/// `Bad Request` when `message` is empty.
pub fn bad_request(writer: &mut dyn ResponseWriter, message: &str) -> Result<(), Error> {
    let message = if message.is_empty() { "Bad Request" } else { message };
    writer.write_status(StatusCode::BAD_REQUEST);
    writer.write(message.as_bytes())?;
    Ok(())
}

/// Builds an authentication function over a fixed table of usernames and
/// passwords. The identity is the username.
pub fn static_credentials<I, T, P>(pairs: I) -> impl Fn(&str, &str) -> Option<String> + Clone + Send + Sync + 'static
where
    I: IntoIterator<Item = (T, P)>,
    T: Into<String>,
    P: Into<String>,
{
    let users: Arc<HashMap<String, String>> = Arc::new(
        pairs
            .into_iter()
            .map(|(u, p)| (u.into(), p.into()))
            .collect(),
    );

    move |username: &str, password: &str| {
        users
            .get(username)
            .filter(|expected| expected.as_str() == password)
            .map(|_| username.to_owned())
    }
}
