//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Smallest accepted stream chunk size.
const MIN_STREAM_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted stream chunk size.
const MAX_STREAM_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// Restrict it at the network level in production.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Size of each body chunk read from the byte store, in bytes.
    #[serde(default = "default_stream_chunk_size")]
    pub stream_chunk_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_stream_chunk_size() -> usize {
    crate::DEFAULT_STREAM_CHUNK_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            stream_chunk_size: default_stream_chunk_size(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_STREAM_CHUNK_SIZE..=MAX_STREAM_CHUNK_SIZE).contains(&self.stream_chunk_size) {
            return Err(format!(
                "server.stream_chunk_size must be between {MIN_STREAM_CHUNK_SIZE} and {MAX_STREAM_CHUNK_SIZE} bytes (got {})",
                self.stream_chunk_size
            ));
        }
        Ok(())
    }
}

/// Byte store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory holding the media files.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./assets"),
        }
    }
}

/// Resource catalog configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/catalog.db"),
        }
    }
}

/// Signing key source configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SigningKeyConfig {
    /// Key stored in a file.
    File {
        /// Path to the key file.
        path: PathBuf,
    },
    /// Key stored in environment variable.
    Env {
        /// Environment variable name.
        var: String,
    },
    /// Key provided directly as a value (NOT recommended for production).
    Value {
        /// The signing key in `name:base64` format.
        key: String,
    },
    /// Generate a new key on every start (development only).
    ///
    /// Tokens do not survive a restart.
    Generate,
}

/// Token authentication configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of issued tokens in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Source of the token signing key (required).
    pub signing_key: SigningKeyConfig,
}

fn default_token_ttl_secs() -> u64 {
    86400 // 24 hours
}

impl AuthConfig {
    /// Get the token lifetime as a Duration.
    pub fn token_ttl(&self) -> Duration {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        let secs = i64::try_from(self.token_ttl_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Asset layout inside the byte store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Key of the image served when a user has no usable profile image.
    #[serde(default = "default_profile_image")]
    pub default_profile_image: String,
    /// Directory holding profile images referenced by bare file name.
    #[serde(default = "default_profile_image_dir")]
    pub profile_image_dir: String,
}

fn default_profile_image() -> String {
    "users/default_picture.jpg".to_string()
}

fn default_profile_image_dir() -> String {
    "users".to_string()
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            default_profile_image: default_profile_image(),
            profile_image_dir: default_profile_image_dir(),
        }
    }
}

impl AssetConfig {
    pub fn validate(&self) -> Result<(), String> {
        if crate::resource::normalize_storage_key(&self.default_profile_image).is_none() {
            return Err("assets.default_profile_image must not be empty".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Byte store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Resource catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Token authentication configuration (required).
    pub auth: AuthConfig,
    /// Asset layout.
    #[serde(default)]
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Generates an ephemeral signing key.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            catalog: CatalogConfig::default(),
            auth: AuthConfig {
                token_ttl_secs: default_token_ttl_secs(),
                signing_key: SigningKeyConfig::Generate,
            },
            assets: AssetConfig::default(),
        }
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.auth.validate()?;
        self.assets.validate()?;
        Ok(())
    }
}
