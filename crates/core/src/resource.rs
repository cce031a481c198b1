//! Streamable asset metadata.

use crate::principal::PrincipalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by catalog paths written relative to the application's
/// working directory rather than to the byte store root.
const LEGACY_ASSET_PREFIX: &str = "assets/";

/// Kind of streamable asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Video file, served with byte-range support.
    Video,
    /// Still image attached to a video.
    Thumbnail,
    /// A user's avatar.
    ProfileImage,
}

impl AssetKind {
    /// Content type used when neither the extension nor the leading bytes
    /// identify the file.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::Thumbnail | Self::ProfileImage => "image/jpeg",
        }
    }

    /// Whether byte-range requests are honored for this kind.
    pub fn supports_ranges(&self) -> bool {
        matches!(self, Self::Video)
    }

    /// Get the string representation (used as a metrics label).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::ProfileImage => "profile_image",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the delivery path needs to know about one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Catalog id of the owning record (video id or user id).
    pub id: i64,
    pub kind: AssetKind,
    /// Path as recorded in the catalog; see [`normalize_storage_key`].
    pub storage_path: String,
    /// Length recorded in the catalog. The byte store's length wins when
    /// the two disagree.
    pub total_length: u64,
    pub content_type_hint: Option<String>,
    pub is_public: bool,
    pub owner_id: PrincipalId,
}

/// Turn a catalog path into a byte store key.
///
/// Strips the legacy `assets/` prefix and any leading slashes. Returns `None`
/// for blank paths.
pub fn normalize_storage_key(path: &str) -> Option<String> {
    let trimmed = path.trim();
    let key = trimmed
        .strip_prefix(LEGACY_ASSET_PREFIX)
        .unwrap_or(trimmed)
        .trim_start_matches('/');
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Resolve a user's configured profile image path to a byte store key.
///
/// Paths with the legacy prefix are taken as-is; bare file names live under
/// `profile_dir`.
pub fn profile_image_key(path: &str, profile_dir: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(LEGACY_ASSET_PREFIX) {
        return normalize_storage_key(trimmed);
    }
    let dir = profile_dir.trim_matches('/');
    let name = trimmed.trim_start_matches('/');
    if dir.is_empty() || name.starts_with(&format!("{dir}/")) {
        normalize_storage_key(name)
    } else {
        normalize_storage_key(&format!("{dir}/{name}"))
    }
}
