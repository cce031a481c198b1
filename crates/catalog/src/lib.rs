//! Resource catalog abstraction and SQLite adapter for Marquee.
//!
//! This crate provides the metadata the stream server consults:
//! - User accounts (principal resolution, profile images)
//! - Video records (visibility, ownership, storage paths, view counts)

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use models::{NewUser, NewVideo, UserRow, VideoRow};
pub use store::{ResourceCatalog, SqliteCatalog};

use marquee_core::config::CatalogConfig;
use std::sync::Arc;

/// Create a resource catalog from configuration.
pub async fn from_config(config: &CatalogConfig) -> CatalogResult<Arc<dyn ResourceCatalog>> {
    match config {
        CatalogConfig::Sqlite { path } => {
            let store = SqliteCatalog::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn ResourceCatalog>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_sqlite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("data").join("catalog.db");
        let config = CatalogConfig::Sqlite {
            path: db_path.clone(),
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }
}
