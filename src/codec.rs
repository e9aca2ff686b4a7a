use compression_codecs::{EncodeV2, gzip::GzipEncoder};
use compression_core::Level;
use http::header::{self, HeaderMap, HeaderValue};

/// `Content-Encoding` value for gzip-encoded bodies.
pub(crate) const GZIP: &str = "gzip";

/// Token the compression middleware keeps in the `Vary` header.
const VARY_ACCEPT_ENCODING: &str = "Accept-Encoding";

/// Creates a new gzip encoder.
pub(crate) fn gzip_encoder(level: Level) -> Box<dyn EncodeV2 + Send> {
    Box::new(GzipEncoder::new(level.into()))
}

/// Returns whether any of the `Accept-Encoding` values allows a gzip body.
///
/// Each header value is trimmed and lowercased as a whole; it allows gzip when
/// it is exactly `*` or mentions `gzip` anywhere.
pub fn accepts_gzip<'a, I>(values: I) -> bool
where
    I: IntoIterator<Item = &'a HeaderValue>,
{
    values
        .into_iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.trim_matches(' ').to_ascii_lowercase())
        .any(|v| v == "*" || v.contains(GZIP))
}

/// Adds `Accept-Encoding` to the `Vary` header unless it is already listed.
pub(crate) fn ensure_vary_accept_encoding(headers: &mut HeaderMap) {
    let listed = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case(VARY_ACCEPT_ENCODING))
        });

    if !listed {
        headers.append(header::VARY, HeaderValue::from_static(VARY_ACCEPT_ENCODING));
    }
}

/// Marks the response as gzip-encoded. The length is unknown once the body
/// is transformed.
pub(crate) fn set_gzip_headers(headers: &mut HeaderMap) {
    headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP));
    headers.remove(header::CONTENT_LENGTH);
}
