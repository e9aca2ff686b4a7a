use std::io;

use compression_codecs::EncodeV2;
use compression_core::Level;
use compression_core::util::{PartialBuffer, WriteBuffer};
use http::{HeaderMap, StatusCode};

use crate::codec;
use crate::error::Error;
use crate::writer::{ResponseWriter, WrappedWriter, WriterKind};

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// A writer that gzip-encodes every body byte before handing it to the
/// writer it wraps.
///
/// Headers and the status line go straight to the wrapped writer. Right
/// before the status is committed, explicitly or by the first body bytes,
/// `Content-Encoding: gzip` is set and any `Content-Length` is removed. The
/// gzip trailer is written by [`GzipWriter::finish`], or when the writer is
/// dropped if `finish` was never called.
pub struct GzipWriter<'a> {
    inner: &'a mut dyn ResponseWriter,
    encoder: Box<dyn EncodeV2 + Send>,
    output_buffer: Vec<u8>,
    headers_prepared: bool,
    finished: bool,
}

impl<'a> GzipWriter<'a> {
    /// Creates a gzip writer on top of `inner`.
    pub fn new(inner: &'a mut dyn ResponseWriter, level: Level) -> Self {
        Self::with_encoder(inner, codec::gzip_encoder(level))
    }

    pub(crate) fn with_encoder(
        inner: &'a mut dyn ResponseWriter,
        encoder: Box<dyn EncodeV2 + Send>,
    ) -> Self {
        Self {
            inner,
            encoder,
            output_buffer: vec![0u8; OUTPUT_BUFFER_SIZE],
            headers_prepared: false,
            finished: false,
        }
    }

    /// Returns whether the gzip trailer has been written.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Completes the gzip stream, writing any pending output and the trailer.
    ///
    /// Calling it again is a no-op.
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.prepare_headers();

        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.finish(&mut output)?;

            let written = output.written_len();
            if written > 0 {
                self.inner.write(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }

    // Runs once, before anything reaches the wrapped writer.
    fn prepare_headers(&mut self) {
        if !self.headers_prepared {
            codec::set_gzip_headers(self.inner.headers_mut());
            self.headers_prepared = true;
        }
    }

    fn encode(&mut self, input: &[u8]) -> Result<(), Error> {
        self.prepare_headers();
        let mut input_buf = PartialBuffer::new(input);

        // Keep encoding until all input is consumed
        loop {
            let consumed = input_buf.written_len();
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            self.encoder.encode(&mut input_buf, &mut output)?;

            let written = output.written_len();
            if written > 0 {
                self.inner.write(&self.output_buffer[..written])?;
            }

            if input_buf.written_len() >= input.len() {
                return Ok(());
            }

            // no progress at all, the encoder will not take more input
            if written == 0 && input_buf.written_len() == consumed {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "gzip encoder made no progress",
                )
                .into());
            }
        }
    }

    fn sync_flush(&mut self) -> Result<(), Error> {
        self.prepare_headers();
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.flush(&mut output)?;

            let written = output.written_len();
            if written > 0 {
                self.inner.write(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }
}

impl ResponseWriter for GzipWriter<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.prepare_headers();
        self.inner.write_status(status)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.finished {
            return Err(Error::StreamFinished);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.encode(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Error> {
        if !self.finished {
            self.sync_flush()?;
        }
        self.inner.flush()
    }

    fn kind(&self) -> WriterKind {
        WriterKind::Gzip
    }

    fn as_wrapped_writer(&self) -> Option<&dyn WrappedWriter> {
        Some(self)
    }
}

impl WrappedWriter for GzipWriter<'_> {
    fn wrapped_writer(&self) -> &dyn ResponseWriter {
        &*self.inner
    }
}

impl Drop for GzipWriter<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.finish() {
            tracing::warn!(%err, "failed to finish gzip stream on drop");
        }
    }
}
