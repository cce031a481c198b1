//! Resource catalog trait and SQLite implementation.

use crate::error::{CatalogError, CatalogResult};
use crate::repos::{UserRepo, VideoRepo};
use async_trait::async_trait;
use marquee_core::{AssetKind, Principal, PrincipalId, ResourceDescriptor};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined catalog trait consumed by the stream server.
#[async_trait]
pub trait ResourceCatalog: UserRepo + VideoRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> CatalogResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> CatalogResult<()>;

    /// Look up the descriptor for an asset.
    ///
    /// Videos and thumbnails are keyed by video id, profile images by user
    /// id. `storage_path` is the path as recorded and may be empty when the
    /// record has no file of that kind.
    async fn get_resource(
        &self,
        kind: AssetKind,
        id: i64,
    ) -> CatalogResult<Option<ResourceDescriptor>> {
        let descriptor = match kind {
            AssetKind::Video => self.get_video(id).await?.map(|v| v.video_descriptor()),
            AssetKind::Thumbnail => self.get_video(id).await?.map(|v| v.thumbnail_descriptor()),
            AssetKind::ProfileImage => self
                .get_user(id)
                .await?
                .map(|u| u.profile_image_descriptor()),
        };
        Ok(descriptor)
    }

    /// Resolve a verified principal id to a live principal.
    async fn resolve_principal(&self, id: PrincipalId) -> CatalogResult<Option<Principal>> {
        Ok(self.get_user(id.get()).await?.map(|u| u.principal()))
    }
}

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    pool: Pool<Sqlite>,
}

impl SqliteCatalog {
    /// Open (creating if needed) the catalog database and migrate it.
    pub async fn new(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One connection keeps concurrent writers from tripping "database is locked".
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "Opened SQLite catalog");

        Ok(store)
    }
}

#[async_trait]
impl ResourceCatalog for SqliteCatalog {
    async fn migrate(&self) -> CatalogResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;

    fn map_insert_error(e: sqlx::Error, what: &str) -> CatalogError {
        if let sqlx::Error::Database(db) = &e
            && (db.is_foreign_key_violation() || db.is_unique_violation())
        {
            return CatalogError::Constraint(format!("{what}: {}", db.message()));
        }
        CatalogError::Database(e)
    }

    #[async_trait]
    impl UserRepo for SqliteCatalog {
        async fn create_user(&self, user: &NewUser) -> CatalogResult<UserRow> {
            let result = sqlx::query(
                "INSERT INTO users (username, profile_image_path, created_at) VALUES (?, ?, ?)",
            )
            .bind(&user.username)
            .bind(&user.profile_image_path)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "user"))?;

            let user_id = result.last_insert_rowid();
            self.get_user(user_id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("user {user_id}")))
        }

        async fn get_user(&self, user_id: i64) -> CatalogResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn set_profile_image(&self, user_id: i64, path: Option<&str>) -> CatalogResult<()> {
            let result = sqlx::query("UPDATE users SET profile_image_path = ? WHERE user_id = ?")
                .bind(path)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(CatalogError::NotFound(format!("user {user_id}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl VideoRepo for SqliteCatalog {
        async fn create_video(&self, video: &NewVideo) -> CatalogResult<VideoRow> {
            let result = sqlx::query(
                "INSERT INTO videos (owner_id, title, video_path, thumbnail_path, content_type, size_bytes, is_public, views_count, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
            )
            .bind(video.owner_id)
            .bind(&video.title)
            .bind(&video.video_path)
            .bind(&video.thumbnail_path)
            .bind(&video.content_type)
            .bind(video.size_bytes)
            .bind(video.is_public)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "video"))?;

            let video_id = result.last_insert_rowid();
            self.get_video(video_id)
                .await?
                .ok_or_else(|| CatalogError::NotFound(format!("video {video_id}")))
        }

        async fn get_video(&self, video_id: i64) -> CatalogResult<Option<VideoRow>> {
            let row = sqlx::query_as::<_, VideoRow>("SELECT * FROM videos WHERE video_id = ?")
                .bind(video_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn increment_view_count(&self, video_id: i64) -> CatalogResult<()> {
            let result =
                sqlx::query("UPDATE videos SET views_count = views_count + 1 WHERE video_id = ?")
                    .bind(video_id)
                    .execute(&self.pool)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(CatalogError::NotFound(format!("video {video_id}")));
            }
            Ok(())
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    profile_image_path TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    video_id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    video_path TEXT NOT NULL,
    thumbnail_path TEXT,
    content_type TEXT,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    is_public INTEGER NOT NULL DEFAULT 1,
    views_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos(owner_id);
"#;
