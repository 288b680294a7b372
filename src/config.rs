// Server configuration
//
// Read from environment variables with local-development defaults.
// Server deployments set these via the service environment.

use std::path::PathBuf;

use rand::{distributions::Alphanumeric, Rng};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Root of uploaded blobs
    pub media_dir: PathBuf,
    /// URL prefix uploaded blobs are served under
    pub public_media_url: String,
    pub admin_token: String,
    /// Where unauthenticated admin visitors are sent
    pub login_url: String,
    /// Seed default content when the store has no registry at startup
    pub seed_on_empty: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));

        let media_dir = std::env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("media"));

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let admin_token = match std::env::var("ADMIN_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => {
                let token = generate_token();
                tracing::warn!("ADMIN_TOKEN not set, generated one for this run: {}", token);
                token
            }
        };

        let seed_on_empty = std::env::var("SEED_ON_EMPTY")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Self {
            port,
            data_dir,
            media_dir,
            public_media_url: env_or("PUBLIC_MEDIA_URL", "/media"),
            admin_token,
            login_url: env_or("LOGIN_URL", "/login"),
            seed_on_empty,
        }
    }

    /// Config rooted at `data_dir` with a fixed token (tests, previews).
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, admin_token: impl Into<String>) -> Self {
        let data_dir = data_dir.into();
        Self {
            port: 0,
            media_dir: data_dir.join("media"),
            data_dir,
            public_media_url: "/media".to_string(),
            admin_token: admin_token.into(),
            login_url: "/login".to_string(),
            seed_on_empty: true,
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  MEDIA_DIR: {}", self.media_dir.display());
        tracing::info!("  PUBLIC_MEDIA_URL: {}", self.public_media_url);
        tracing::info!("  ADMIN_TOKEN: {}", mask(&self.admin_token));
        tracing::info!("  LOGIN_URL: {}", self.login_url);
        tracing::info!("  SEED_ON_EMPTY: {}", self.seed_on_empty);
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn mask(token: &str) -> String {
    let shown: String = token.chars().take(4).collect();
    format!("{}…({} chars)", shown, token.chars().count())
}
