//! User repository trait.

use crate::error::CatalogResult;
use crate::models::{NewUser, UserRow};
use async_trait::async_trait;

/// Repository for user accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user and return the stored row.
    async fn create_user(&self, user: &NewUser) -> CatalogResult<UserRow>;

    /// Get a user by ID.
    async fn get_user(&self, user_id: i64) -> CatalogResult<Option<UserRow>>;

    /// Point a user at a new profile image (or clear it).
    async fn set_profile_image(&self, user_id: i64, path: Option<&str>) -> CatalogResult<()>;
}
