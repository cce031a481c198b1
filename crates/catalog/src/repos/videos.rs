//! Video repository trait.

use crate::error::CatalogResult;
use crate::models::{NewVideo, VideoRow};
use async_trait::async_trait;

/// Repository for video records.
#[async_trait]
pub trait VideoRepo: Send + Sync {
    /// Insert a video and return the stored row.
    async fn create_video(&self, video: &NewVideo) -> CatalogResult<VideoRow>;

    /// Get a video by ID.
    async fn get_video(&self, video_id: i64) -> CatalogResult<Option<VideoRow>>;

    /// Add one to the video's view counter.
    ///
    /// A single atomic UPDATE; returns `NotFound` if the video is gone.
    async fn increment_view_count(&self, video_id: i64) -> CatalogResult<()>;
}
