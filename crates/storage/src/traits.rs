//! Storage trait definitions.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::io::SeekFrom;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Seekable reader over a stored object.
pub trait ObjectReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> ObjectReader for T {}

/// Byte store abstraction for media files.
#[async_trait]
pub trait ByteStore: Send + Sync + 'static {
    /// Open an object for seekable reads.
    ///
    /// The returned metadata describes the object at the moment it was
    /// opened and is authoritative for the lifetime of the handle.
    async fn open(&self, key: &str) -> StorageResult<OpenObject>;

    /// Put an object atomically.
    ///
    /// Media arrives through the upload service; this is for seeding
    /// fixtures and the default profile image.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend availability.
    ///
    /// Called at startup and by the health endpoint.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<time::OffsetDateTime>,
}

/// An object opened for reading.
///
/// Dropping it (or the stream made from it) closes the underlying handle.
pub struct OpenObject {
    pub meta: ObjectMeta,
    reader: Box<dyn ObjectReader>,
}

impl OpenObject {
    pub fn new(meta: ObjectMeta, reader: Box<dyn ObjectReader>) -> Self {
        Self { meta, reader }
    }

    /// Read up to `max` leading bytes and rewind to the start.
    pub async fn peek_head(&mut self, max: usize) -> StorageResult<Vec<u8>> {
        let mut head = Vec::with_capacity(max);
        (&mut self.reader)
            .take(max as u64)
            .read_to_end(&mut head)
            .await?;
        self.reader.seek(SeekFrom::Start(0)).await?;
        Ok(head)
    }

    /// Stream the whole object.
    pub fn into_full_stream(self, chunk_size: usize) -> ByteStream {
        let size = self.meta.size;
        self.into_window_stream(0, size, chunk_size)
    }

    /// Stream the inclusive byte window `start..=end`.
    pub fn into_range_stream(
        self,
        start: u64,
        end: u64,
        chunk_size: usize,
    ) -> StorageResult<ByteStream> {
        if end < start {
            return Err(StorageError::InvalidRange(format!(
                "end ({end}) < start ({start})"
            )));
        }
        if end >= self.meta.size {
            return Err(StorageError::InvalidRange(format!(
                "end ({end}) beyond object size {}",
                self.meta.size
            )));
        }
        Ok(self.into_window_stream(start, end - start + 1, chunk_size))
    }

    fn into_window_stream(self, start: u64, len: u64, chunk_size: usize) -> ByteStream {
        let chunk_size = chunk_size.max(1);
        let mut reader = self.reader;

        // Read lazily so a dropped body never touches the rest of the file.
        let stream = async_stream::try_stream! {
            if start > 0 {
                reader.seek(SeekFrom::Start(start)).await?;
            }
            let mut remaining = len;
            let mut buf = vec![0u8; chunk_size];
            while remaining > 0 {
                let want = usize::try_from(remaining).map_or(chunk_size, |r| r.min(chunk_size));
                let n = reader.read(&mut buf[..want]).await?;
                if n == 0 {
                    Err::<(), _>(StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("object truncated with {remaining} bytes left to send"),
                    )))?;
                }
                remaining -= n as u64;
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Box::pin(stream)
    }
}

impl std::fmt::Debug for OpenObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenObject")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
