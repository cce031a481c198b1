//! Local filesystem byte store.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStore, ObjectMeta, OpenObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Media files stored under a root directory.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve a key to a path inside the root.
    ///
    /// Runs the canonicalization in `spawn_blocking` so it never stalls the
    /// runtime.
    async fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::key_path_sync(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Reject keys that would resolve outside the root, including through
    /// symlinks.
    fn key_path_sync(root: &Path, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!("not a relative key: {key}")));
        }
        if !Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(format!(
                "contains unsafe path component: {key}"
            )));
        }

        let path = root.join(key);
        let root_canonical = root.canonicalize().map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize root: {e}"),
            ))
        })?;

        // Check the path itself if it exists, else its nearest existing
        // ancestor, so a symlinked directory cannot be written through either.
        let mut probe = path.as_path();
        loop {
            match std::fs::symlink_metadata(probe) {
                Ok(meta) => {
                    let canonical = probe.canonicalize().map_err(|e| {
                        if meta.file_type().is_symlink() {
                            StorageError::InvalidKey(format!("dangling symlink: {key}"))
                        } else {
                            StorageError::Io(e)
                        }
                    })?;
                    if !canonical.starts_with(&root_canonical) {
                        return Err(StorageError::InvalidKey(format!(
                            "resolved path escapes storage root: {key}"
                        )));
                    }
                    return Ok(path);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(StorageError::Io(err)),
            }
            match probe.parent() {
                Some(parent) if parent.starts_with(root) => probe = parent,
                _ => return Ok(path),
            }
        }
    }

    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn not_found_or_io(key: &str, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

fn object_meta(metadata: &std::fs::Metadata) -> ObjectMeta {
    ObjectMeta {
        size: metadata.len(),
        last_modified: metadata.modified().ok().map(|t| t.into()),
    }
}

#[async_trait]
impl ByteStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn open(&self, key: &str) -> StorageResult<OpenObject> {
        let path = self.key_path(key).await?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(key, e))?;
        // Size comes from the open handle, not a separate stat of the path.
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(OpenObject::new(object_meta(&metadata), Box::new(file)))
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_path(key).await?;
        self.ensure_parent(&path).await?;

        // Write to a uniquely named sibling, fsync, then rename.
        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn read_all(backend: &FilesystemBackend, key: &str) -> StorageResult<Vec<u8>> {
        let object = backend.open(key).await?;
        let chunks: Vec<Bytes> = object.into_full_stream(4096).try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn test_put_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend
            .put("videos/clip.mp4", Bytes::from("hello world"))
            .await
            .unwrap();
        let object = backend.open("videos/clip.mp4").await.unwrap();
        assert_eq!(object.meta.size, 11);
        assert_eq!(
            read_all(&backend, "videos/clip.mp4").await.unwrap(),
            b"hello world"
        );
    }

    #[tokio::test]
    async fn test_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        let err = backend.open("nope.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref k) if k == "nope.mp4"));
        assert!(err.is_missing());
    }

    #[tokio::test]
    async fn test_directory_is_not_an_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("videos")).unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        assert!(matches!(
            backend.open("videos").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        for key in ["../escape", "/absolute/path", "foo/../bar", "./x", ""] {
            assert!(
                matches!(backend.open(key).await, Err(StorageError::InvalidKey(_))),
                "{key:?}"
            );
        }
        assert!(matches!(
            backend.open("valid/nested/key").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_symlink_traversal_rejected() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let outside_dir = tempfile::tempdir().unwrap();
        std::fs::write(outside_dir.path().join("secret.txt"), "secret data").unwrap();

        let backend = FilesystemBackend::new(dir.path()).await.unwrap();
        symlink(
            outside_dir.path().join("secret.txt"),
            dir.path().join("malicious_link"),
        )
        .unwrap();
        symlink(outside_dir.path(), dir.path().join("link_to_outside")).unwrap();

        match backend.open("malicious_link").await {
            Err(StorageError::InvalidKey(msg)) => assert!(msg.contains("escapes storage root")),
            other => panic!("expected InvalidKey error, got: {other:?}"),
        }
        assert!(backend.open("link_to_outside/secret.txt").await.is_err());

        let result = backend
            .put("link_to_outside/nested/file.txt", Bytes::from("data"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(!outside_dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("media")).await.unwrap();
        backend.health_check().await.unwrap();

        std::fs::remove_dir(dir.path().join("media")).unwrap();
        assert!(backend.health_check().await.is_err());
    }
}
