//! Server test utilities.

use bytes::Bytes;
use marquee_catalog::{NewUser, NewVideo, ResourceCatalog, SqliteCatalog, UserRow, VideoRow};
use marquee_core::PrincipalId;
use marquee_core::config::{AppConfig, CatalogConfig, StorageConfig};
use marquee_server::{AppState, create_router};
use marquee_storage::{ByteStore, FilesystemBackend};
use std::path::PathBuf;
use marquee_token::{SigningKey, TokenCodec};
use std::sync::Arc;
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    assets_dir: PathBuf,
    _temp_dir: TempDir,
}

/// Description of a video to seed.
#[allow(dead_code)]
pub struct VideoSeed<'a> {
    pub owner_id: i64,
    pub video_path: &'a str,
    pub data: Bytes,
    pub thumbnail: Option<(&'a str, Bytes)>,
    pub is_public: bool,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        // Create byte store
        let storage_path = temp_dir.path().join("assets");
        std::fs::create_dir_all(&storage_path).expect("Failed to create storage directory");
        let storage: Arc<dyn ByteStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        // Create catalog
        let db_path = temp_dir.path().join("catalog.db");
        let catalog: Arc<dyn ResourceCatalog> = Arc::new(
            SqliteCatalog::new(&db_path)
                .await
                .expect("Failed to create catalog"),
        );

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: storage_path.clone(),
        };
        config.catalog = CatalogConfig::Sqlite { path: db_path };

        // Apply user modifications
        modifier(&mut config);

        let key = SigningKey::generate("test").expect("Failed to generate signing key");
        let state = AppState::new(config, storage, catalog, TokenCodec::new(key));

        let router = create_router(state.clone());

        Self {
            router,
            state,
            assets_dir: storage_path,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying catalog.
    pub fn catalog(&self) -> Arc<dyn ResourceCatalog> {
        self.state.catalog.clone()
    }

    /// Write a file into the byte store.
    pub async fn put_file(&self, key: &str, data: Bytes) {
        self.state
            .storage
            .put(key, data)
            .await
            .expect("Failed to write file");
    }

    /// Remove a file from the byte store's directory, leaving its catalog
    /// record in place.
    pub fn remove_file(&self, key: &str) {
        std::fs::remove_file(self.assets_dir.join(key)).expect("Failed to remove file");
    }

    /// Create a user record.
    pub async fn create_user(&self, username: &str, profile_image_path: Option<&str>) -> UserRow {
        self.state
            .catalog
            .create_user(&NewUser {
                username: username.to_string(),
                profile_image_path: profile_image_path.map(str::to_string),
            })
            .await
            .expect("Failed to create user")
    }

    /// Create a video record and write its files.
    ///
    /// `video_path` is recorded as given (it may carry the `assets/`
    /// prefix); the file is written under the normalized key.
    pub async fn create_video(&self, seed: VideoSeed<'_>) -> VideoRow {
        self.put_file(strip_assets(seed.video_path), seed.data.clone())
            .await;
        if let Some((path, data)) = &seed.thumbnail {
            self.put_file(strip_assets(path), data.clone()).await;
        }

        self.state
            .catalog
            .create_video(&NewVideo {
                owner_id: seed.owner_id,
                title: "test video".to_string(),
                video_path: seed.video_path.to_string(),
                thumbnail_path: seed.thumbnail.as_ref().map(|(p, _)| p.to_string()),
                content_type: None,
                size_bytes: seed.data.len() as i64,
                is_public: seed.is_public,
            })
            .await
            .expect("Failed to create video")
    }

    /// Current view count of a video.
    pub async fn views(&self, video_id: i64) -> i64 {
        self.state
            .catalog
            .get_video(video_id)
            .await
            .expect("Failed to load video")
            .expect("video exists")
            .views_count
    }

    /// Issue a valid token for a user.
    pub fn token_for(&self, user_id: i64) -> String {
        self.state
            .tokens
            .issue(PrincipalId::new(user_id), Duration::hours(1))
            .token
    }

    /// Issue a token for a user that expired an hour ago.
    pub fn expired_token_for(&self, user_id: i64) -> String {
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);
        self.state
            .tokens
            .issue_at(PrincipalId::new(user_id), Duration::hours(1), issued_at)
            .token
    }
}

fn strip_assets(path: &str) -> &str {
    path.strip_prefix("assets/").unwrap_or(path)
}
