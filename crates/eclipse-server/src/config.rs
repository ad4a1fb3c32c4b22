//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::path::PathBuf;

/// Server configuration. Built once in `main` and passed down explicitly;
/// nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host. Env: `ECLIPSE_HOST`. Default: `0.0.0.0`
    pub host: String,

    /// Bind port. Env: `ECLIPSE_PORT`. Default: `3000`
    pub port: u16,

    /// SQLite database path. Env: `ECLIPSE_DB_PATH`. Default: `eclipse.db`
    pub db_path: PathBuf,

    /// Directory where media objects are written.
    /// Env: `ECLIPSE_MEDIA_DIR`. Default: `./media`
    pub media_dir: PathBuf,

    /// Public URL prefix persisted for uploaded media.
    /// Env: `ECLIPSE_MEDIA_BASE_URL`. Default: `http://localhost:3000/media`
    pub media_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("eclipse.db"),
            media_dir: PathBuf::from("./media"),
            media_base_url: "http://localhost:3000/media".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("ECLIPSE_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("ECLIPSE_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                config.port = parsed;
            } else {
                tracing::warn!(value = %port, "Invalid ECLIPSE_PORT, using default");
            }
        }

        if let Ok(path) = std::env::var("ECLIPSE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("ECLIPSE_MEDIA_DIR") {
            config.media_dir = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("ECLIPSE_MEDIA_BASE_URL") {
            config.media_base_url = url;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("eclipse.db"));
        assert_eq!(config.media_base_url, "http://localhost:3000/media");
    }
}
