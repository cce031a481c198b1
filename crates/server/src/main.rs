//! Marquee server binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use marquee_core::PrincipalId;
use marquee_core::config::{AppConfig, SigningKeyConfig};
use marquee_server::{AppState, create_router};
use marquee_token::{SigningKey, TokenCodec};
use std::net::SocketAddr;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "MARQUEE_";

/// Environment variable holding the config file path.
const CONFIG_ENV: &str = "MARQUEE_CONFIG";

/// Marquee - media delivery server
#[derive(Parser, Debug)]
#[command(name = "marqueed")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "MARQUEE_CONFIG", default_value = "config/server.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Issue a bearer token for an existing user
    IssueToken {
        /// Catalog id of the user
        #[arg(long)]
        user_id: i64,

        /// Token lifetime in seconds (defaults to auth.token_ttl_secs)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `issue-token` output stays pipeable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args.config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::IssueToken { user_id, ttl_secs } => issue_token(config, user_id, ttl_secs).await,
    }
}

/// Load configuration from the optional TOML file and `MARQUEE_` env vars.
fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX) && key != CONFIG_ENV);

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: marqueed --config /path/to/config.toml\n  \
             2. Environment variables: MARQUEE_AUTH__SIGNING_KEY__TYPE=env \
             MARQUEE_AUTH__SIGNING_KEY__VAR=MARQUEE_KEY marqueed\n\n\
             See config/server.example.toml for example configuration.\n\
             Set MARQUEE_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    Ok(config)
}

async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("Marquee v{}", env!("CARGO_PKG_VERSION"));

    marquee_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let storage = marquee_storage::from_config(&config.storage)
        .await
        .context("failed to initialize byte store")?;
    storage
        .health_check()
        .await
        .context("byte store health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Byte store connectivity verified");

    let catalog = marquee_catalog::from_config(&config.catalog)
        .await
        .context("failed to initialize catalog")?;
    tracing::info!("Catalog initialized");

    let key = load_signing_key(&config.auth.signing_key).await?;
    let tokens = TokenCodec::new(key);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    let state = AppState::new(config, storage, catalog, tokens);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Print a token for `user_id` to stdout.
async fn issue_token(config: AppConfig, user_id: i64, ttl_secs: Option<u64>) -> Result<()> {
    let catalog = marquee_catalog::from_config(&config.catalog)
        .await
        .context("failed to initialize catalog")?;

    let principal = catalog
        .resolve_principal(PrincipalId::new(user_id))
        .await
        .context("failed to look up user")?
        .with_context(|| format!("no user with id {user_id}"))?;

    if matches!(config.auth.signing_key, SigningKeyConfig::Generate) {
        tracing::warn!("Signing key is generated per process; this token will not verify anywhere");
    }

    let key = load_signing_key(&config.auth.signing_key).await?;
    let codec = TokenCodec::new(key);

    let ttl = match ttl_secs {
        Some(0) => anyhow::bail!("--ttl-secs must be greater than 0"),
        Some(secs) => time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)),
        None => config.auth.token_ttl(),
    };

    let issued = codec.issue(principal.id, ttl);
    tracing::info!(
        user_id,
        username = %principal.display_name,
        expires_at = %issued.claims.expires_at.format(&Rfc3339).unwrap_or_default(),
        "Issued token"
    );
    println!("{}", issued.token);

    Ok(())
}

/// Load the token signing key from configuration.
async fn load_signing_key(config: &SigningKeyConfig) -> Result<SigningKey> {
    match config {
        SigningKeyConfig::File { path } => {
            let key_data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read key file: {}", path.display()))?;
            let key =
                SigningKey::from_text(key_data.trim()).context("failed to parse signing key")?;
            tracing::info!("Loaded signing key: {}", key.name());
            Ok(key)
        }
        SigningKeyConfig::Env { var } => {
            let key_data = std::env::var(var)
                .with_context(|| format!("signing key env var not set: {var}"))?;
            let key =
                SigningKey::from_text(key_data.trim()).context("failed to parse signing key")?;
            tracing::info!("Loaded signing key from env: {}", key.name());
            Ok(key)
        }
        SigningKeyConfig::Value { key } => {
            tracing::warn!("Using inline signing key (not recommended for production)");
            let key = SigningKey::from_text(key.trim()).context("failed to parse signing key")?;
            tracing::info!("Loaded signing key: {}", key.name());
            Ok(key)
        }
        SigningKeyConfig::Generate => {
            tracing::warn!("Generating ephemeral signing key (not suitable for production)");
            let key = SigningKey::generate("ephemeral").context("failed to generate signing key")?;
            tracing::info!("Generated signing key: {}", key.name());
            Ok(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_catalog::NewUser;
    use marquee_catalog::repos::UserRepo;
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_signing_key_from_env() {
        let key = SigningKey::generate("env-key").unwrap();
        let prev = std::env::var("MARQUEE_TEST_SIGNING_KEY").ok();
        // SAFETY: this is the only test touching this variable
        unsafe { std::env::set_var("MARQUEE_TEST_SIGNING_KEY", key.to_text()) };

        let config = SigningKeyConfig::Env {
            var: "MARQUEE_TEST_SIGNING_KEY".to_string(),
        };

        let loaded = load_signing_key(&config).await.unwrap();
        assert_eq!(loaded.name(), "env-key");

        // SAFETY: this is the only test touching this variable
        unsafe {
            if let Some(value) = prev {
                std::env::set_var("MARQUEE_TEST_SIGNING_KEY", value);
            } else {
                std::env::remove_var("MARQUEE_TEST_SIGNING_KEY");
            }
        }
    }

    #[tokio::test]
    async fn load_signing_key_missing_env_fails() {
        let config = SigningKeyConfig::Env {
            var: "MARQUEE_TEST_SIGNING_KEY_UNSET".to_string(),
        };
        assert!(load_signing_key(&config).await.is_err());
    }

    #[tokio::test]
    async fn load_signing_key_from_file() {
        let key = SigningKey::generate("file-key").unwrap();
        let temp = tempdir().unwrap();
        let key_path = temp.path().join("signing.key");
        tokio::fs::write(&key_path, format!("{}\n", key.to_text()))
            .await
            .unwrap();

        let config = SigningKeyConfig::File { path: key_path };

        let loaded = load_signing_key(&config).await.unwrap();
        assert_eq!(loaded.name(), "file-key");
    }

    #[tokio::test]
    async fn load_signing_key_from_value() {
        let key = SigningKey::generate("inline").unwrap();
        let config = SigningKeyConfig::Value { key: key.to_text() };

        let loaded = load_signing_key(&config).await.unwrap();
        assert_eq!(loaded.name(), "inline");
    }

    #[tokio::test]
    async fn load_signing_key_generate() {
        let loaded = load_signing_key(&SigningKeyConfig::Generate).await.unwrap();
        assert_eq!(loaded.name(), "ephemeral");
    }

    #[tokio::test]
    async fn load_signing_key_rejects_garbage() {
        let config = SigningKeyConfig::Value {
            key: "not-a-key".to_string(),
        };
        assert!(load_signing_key(&config).await.is_err());
    }

    #[test]
    fn load_config_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"

[auth]
token_ttl_secs = 600

[auth.signing_key]
type = "generate"

[assets]
default_profile_image = "users/fallback.png"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert!(matches!(config.auth.signing_key, SigningKeyConfig::Generate));
        assert_eq!(config.assets.default_profile_image, "users/fallback.png");
        assert_eq!(config.assets.profile_image_dir, "users");
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[auth]
token_ttl_secs = 0

[auth.signing_key]
type = "generate"
"#,
        )
        .unwrap();

        assert!(load_config(path.to_str().unwrap()).is_err());
    }

    #[tokio::test]
    async fn issue_token_requires_known_user() {
        let temp = tempdir().unwrap();
        let mut config = AppConfig::for_testing();
        config.catalog = marquee_core::config::CatalogConfig::Sqlite {
            path: temp.path().join("catalog.db"),
        };

        let err = issue_token(config.clone(), 42, None).await.unwrap_err();
        assert!(err.to_string().contains("no user with id 42"));

        let catalog = marquee_catalog::SqliteCatalog::new(temp.path().join("catalog.db"))
            .await
            .unwrap();
        let user = catalog
            .create_user(&NewUser {
                username: "alice".to_string(),
                profile_image_path: None,
            })
            .await
            .unwrap();

        issue_token(config, user.user_id, Some(60)).await.unwrap();
    }
}
