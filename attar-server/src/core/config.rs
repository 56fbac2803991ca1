//! Server configuration
//!
//! All settings come from environment variables with development defaults:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/attar | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | DATABASE_PATH | `<WORK_DIR>/attar.db` | SQLite database file |
//! | CURRENCY | usd | Gateway settlement currency |
//! | STRIPE_SECRET_KEY | (unset) | Live gateway key; mock gateway when absent |
//! | STRIPE_WEBHOOK_SECRET | (unset) | Webhook signing secret |
//! | ENVIRONMENT | development | Runtime environment label |

use std::path::PathBuf;

/// Immutable server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database file; defaults to `<work_dir>/attar.db`
    pub database_path: Option<String>,
    /// Currency passed to the payment gateway
    pub currency: String,
    /// Gateway secret key; the in-process mock gateway is used when unset
    pub stripe_secret_key: Option<String>,
    /// Webhook signing secret
    pub stripe_webhook_secret: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/attar".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH").ok(),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok().filter(|k| !k.is_empty()),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                .ok()
                .filter(|k| !k.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the working directory and port, commonly for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Resolved database file path
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir).join("attar.db"),
        }
    }

    /// Create the working directory structure if missing
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }
}
