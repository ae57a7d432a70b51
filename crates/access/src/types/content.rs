//! Lazily opened record content.
//!
//! Backends hand out a [`ContentOpener`] with every row instead of an open
//! stream. Nothing is opened until [`ContentOpener::open`] is called, and the
//! returned [`ContentStream`] releases the underlying reader when dropped,
//! whether it was read to the end or abandoned early.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

/// A reader produced by a content opener.
pub type BoxedReader = Box<dyn Read + Send>;

type OpenFn = dyn Fn() -> io::Result<BoxedReader> + Send + Sync;

/// Zero-argument function producing a byte stream.
#[derive(Clone)]
pub struct ContentOpener {
    open: Arc<OpenFn>,
}

impl ContentOpener {
    /// Creates an opener from a function.
    pub fn new<F>(open: F) -> Self
    where
        F: Fn() -> io::Result<BoxedReader> + Send + Sync + 'static,
    {
        Self {
            open: Arc::new(open),
        }
    }

    /// Creates an opener over an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self::new(move || Ok(Box::new(Cursor::new(SharedBytes(bytes.clone()))) as BoxedReader))
    }

    /// Creates an opener for records without content.
    pub fn empty() -> Self {
        Self::new(|| Ok(Box::new(io::empty()) as BoxedReader))
    }

    /// Opens the content.
    pub fn open(&self) -> io::Result<ContentStream> {
        let reader = (self.open)()?;
        tracing::trace!("record content opened");
        Ok(ContentStream {
            reader: Some(reader),
        })
    }

    /// Opens the content and reads it to the end.
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut stream = self.open()?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

impl fmt::Debug for ContentOpener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentOpener").finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An open content stream.
///
/// The underlying reader is released when the stream is dropped.
pub struct ContentStream {
    reader: Option<BoxedReader>,
}

impl ContentStream {
    /// Releases the underlying reader now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            tracing::trace!("record content released");
        }
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for ContentStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("open", &self.reader.is_some())
            .finish()
    }
}
