//! Document payloads streamed to the analyze endpoint.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::Result;

/// Media type declared for every submitted document.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A document of possibly unknown length, consumed exactly once by a submission.
///
/// The payload is kept as a byte stream so transports can forward it without
/// buffering or knowing its length upfront.
pub struct DocumentStream {
    inner: BoxStream<'static, std::io::Result<Bytes>>,
    size_hint: Option<u64>,
}

impl DocumentStream {
    /// Creates a document from an existing byte stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: futures::Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
            size_hint: None,
        }
    }

    /// Creates a document from any async reader.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::from_stream(ReaderStream::new(reader))
    }

    /// Creates a document from an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let size_hint = Some(bytes.len() as u64);
        Self {
            inner: stream::once(async move { Ok(bytes) }).boxed(),
            size_hint,
        }
    }

    /// Opens a file and streams its contents.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        let size_hint = file.metadata().await.ok().map(|m| m.len());
        Ok(Self {
            size_hint,
            ..Self::from_reader(file)
        })
    }

    /// Returns the known length of the document, if any.
    ///
    /// Informational only: transports must not rely on it.
    pub fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }

    /// Consumes the document, returning the underlying byte stream.
    pub fn into_stream(self) -> BoxStream<'static, std::io::Result<Bytes>> {
        self.inner
    }
}

impl fmt::Debug for DocumentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStream")
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

impl From<Bytes> for DocumentStream {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for DocumentStream {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}
