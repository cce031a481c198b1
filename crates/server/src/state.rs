//! Application state shared across handlers.

use marquee_catalog::ResourceCatalog;
use marquee_core::config::AppConfig;
use marquee_storage::ByteStore;
use marquee_token::TokenCodec;
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Byte store holding the media files.
    pub storage: Arc<dyn ByteStore>,
    /// Catalog of videos and users.
    pub catalog: Arc<dyn ResourceCatalog>,
    /// Bearer token codec. The signing key inside never changes.
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ByteStore>,
        catalog: Arc<dyn ResourceCatalog>,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            catalog,
            tokens: Arc::new(tokens),
        }
    }

    /// Chunk size used when streaming bodies.
    pub fn chunk_size(&self) -> usize {
        self.config.server.stream_chunk_size
    }
}
