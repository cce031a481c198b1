//! Byte store abstraction and backends for Marquee.
//!
//! This crate provides:
//! - The [`ByteStore`] trait the stream server reads media through
//! - Seekable object handles that turn into windowed byte streams
//! - A local filesystem backend

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStore, ByteStream, ObjectMeta, ObjectReader, OpenObject};

use marquee_core::config::StorageConfig;
use std::sync::Arc;

/// Create a byte store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ByteStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            tracing::info!(root = %path.display(), "Using filesystem byte store");
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("assets"),
        };

        let store = from_config(&config).await.unwrap();
        assert_eq!(store.backend_name(), "filesystem");
        store
            .put("users/default_picture.jpg", Bytes::from_static(b"hi"))
            .await
            .unwrap();
        let object = store.open("users/default_picture.jpg").await.unwrap();
        assert_eq!(object.meta.size, 2);
    }
}
