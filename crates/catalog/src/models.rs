//! Database models mapping to the catalog schema.

use marquee_core::{AssetKind, Principal, PrincipalId, ResourceDescriptor};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User account record.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    /// Profile image path as recorded; bare file names live in the profile
    /// image directory.
    pub profile_image_path: Option<String>,
    pub created_at: OffsetDateTime,
}

impl UserRow {
    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.username.clone())
    }

    /// Descriptor for the user's avatar.
    ///
    /// `storage_path` is empty when no image is configured.
    pub fn profile_image_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            id: self.user_id,
            kind: AssetKind::ProfileImage,
            storage_path: self.profile_image_path.clone().unwrap_or_default(),
            total_length: 0,
            content_type_hint: None,
            is_public: false,
            owner_id: PrincipalId::new(self.user_id),
        }
    }
}

/// Video record.
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    pub video_id: i64,
    pub owner_id: i64,
    pub title: String,
    pub video_path: String,
    pub thumbnail_path: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub is_public: bool,
    pub views_count: i64,
    pub created_at: OffsetDateTime,
}

impl VideoRow {
    pub fn video_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            id: self.video_id,
            kind: AssetKind::Video,
            storage_path: self.video_path.clone(),
            total_length: u64::try_from(self.size_bytes).unwrap_or(0),
            content_type_hint: self.content_type.clone(),
            is_public: self.is_public,
            owner_id: PrincipalId::new(self.owner_id),
        }
    }

    /// Thumbnails share the video's visibility and owner.
    pub fn thumbnail_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            id: self.video_id,
            kind: AssetKind::Thumbnail,
            storage_path: self.thumbnail_path.clone().unwrap_or_default(),
            total_length: 0,
            content_type_hint: None,
            is_public: self.is_public,
            owner_id: PrincipalId::new(self.owner_id),
        }
    }
}

/// Fields for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub profile_image_path: Option<String>,
}

/// Fields for inserting a video.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: i64,
    pub title: String,
    pub video_path: String,
    pub thumbnail_path: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub is_public: bool,
}
