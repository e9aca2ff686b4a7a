use crate::writer::ResponseWriter;

/// Maximum number of decorators [`find`] walks through before giving up.
pub const MAX_UNWRAP_DEPTH: usize = 64;

/// Walks a writer chain from the outermost writer inwards and returns the
/// first writer matching `predicate`.
///
/// Each step follows [`WrappedWriter::wrapped_writer`](crate::WrappedWriter::wrapped_writer);
/// the walk ends at the first writer that does not wrap another one.
pub fn find<'w, P>(writer: &'w dyn ResponseWriter, mut predicate: P) -> Option<&'w dyn ResponseWriter>
where
    P: FnMut(&dyn ResponseWriter) -> bool,
{
    let mut current = writer;

    for _ in 0..MAX_UNWRAP_DEPTH {
        if predicate(current) {
            return Some(current);
        }
        current = current.as_wrapped_writer()?.wrapped_writer();
    }

    tracing::warn!(
        max_depth = MAX_UNWRAP_DEPTH,
        "writer chain exceeds maximum unwrap depth"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::writer::{ResponseRecorder, WrappedWriter, WriterKind};
    use http::{HeaderMap, StatusCode};

    /// A decorator that only forwards, tagged so tests can tell layers apart.
    struct Layered<'a> {
        inner: &'a mut dyn ResponseWriter,
        tag: u32,
    }

    impl ResponseWriter for Layered<'_> {
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

        fn identity(&self) -> Option<&dyn std::any::Any> {
            Some(&self.tag)
        }

        fn as_wrapped_writer(&self) -> Option<&dyn WrappedWriter> {
            Some(self)
        }
    }

    impl WrappedWriter for Layered<'_> {
        fn wrapped_writer(&self) -> &dyn ResponseWriter {
            &*self.inner
        }
    }

    fn tag_of(writer: &dyn ResponseWriter) -> Option<u32> {
        writer
            .identity()
            .and_then(|id| id.downcast_ref::<u32>())
            .copied()
    }

    #[test]
    fn test_matches_outermost_writer() {
        let rec = ResponseRecorder::new();
        let found = find(&rec, |w| w.kind() == WriterKind::Plain);
        assert!(found.is_some());
    }

    #[test]
    fn test_walks_to_inner_decorator() {
        let mut rec = ResponseRecorder::new();
        let mut first = Layered { inner: &mut rec, tag: 1 };
        let second = Layered { inner: &mut first, tag: 2 };

        let found = find(&second, |w| tag_of(w) == Some(1)).unwrap();
        assert_eq!(tag_of(found), Some(1));

        // the terminal writer is reachable too
        let terminal = find(&second, |w| w.as_wrapped_writer().is_none()).unwrap();
        assert_eq!(tag_of(terminal), None);
    }

    #[test]
    fn test_returns_first_match_from_outside() {
        let mut rec = ResponseRecorder::new();
        let mut first = Layered { inner: &mut rec, tag: 1 };
        let second = Layered { inner: &mut first, tag: 2 };

        let found = find(&second, |w| tag_of(w).is_some()).unwrap();
        assert_eq!(tag_of(found), Some(2));
    }

    #[test]
    fn test_not_found_when_chain_ends() {
        let mut rec = ResponseRecorder::new();
        let layered = Layered { inner: &mut rec, tag: 1 };

        assert!(find(&layered, |w| w.kind() == WriterKind::Gzip).is_none());
    }

    #[test]
    fn test_gives_up_past_max_depth() {
        fn nest(depth: usize, writer: &mut dyn ResponseWriter, check: &mut dyn FnMut(&dyn ResponseWriter)) {
            if depth == 0 {
                check(&*writer);
                return;
            }
            let mut layered = Layered { inner: writer, tag: depth as u32 };
            nest(depth - 1, &mut layered, check);
        }

        let mut rec = ResponseRecorder::new();
        let mut within = false;
        nest(MAX_UNWRAP_DEPTH - 1, &mut rec, &mut |w: &dyn ResponseWriter| {
            within = find(w, |w| w.as_wrapped_writer().is_none()).is_some();
        });
        assert!(within);

        let mut rec = ResponseRecorder::new();
        let mut beyond = true;
        nest(MAX_UNWRAP_DEPTH, &mut rec, &mut |w: &dyn ResponseWriter| {
            beyond = find(w, |w| w.as_wrapped_writer().is_none()).is_some();
        });
        assert!(!beyond);
    }
}
