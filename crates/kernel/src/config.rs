//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Kernel configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment tag stamped onto snapshots created here (default: "production").
    pub environment: String,

    /// Server-held secret used to sign snapshot exports.
    ///
    /// Injected, never compiled in: rotating it must stay an operational
    /// change.
    pub snapshot_secret: String,

    /// Maximum entries in the durable content cache (default: 10000).
    pub content_cache_capacity: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let environment =
            env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string());

        let snapshot_secret = env::var("SNAPSHOT_SECRET")
            .context("SNAPSHOT_SECRET environment variable is required")?;

        let content_cache_capacity = env::var("CONTENT_CACHE_CAPACITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("CONTENT_CACHE_CAPACITY must be a valid u64")?;

        Ok(Self {
            environment,
            snapshot_secret,
            content_cache_capacity,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_required() {
        // Serialize env mutation: tests in this module share the process.
        unsafe {
            env::remove_var("SNAPSHOT_SECRET");
        }
        assert!(Config::from_env().is_err());

        unsafe {
            env::set_var("SNAPSHOT_SECRET", "test-secret");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.snapshot_secret, "test-secret");
        assert_eq!(config.content_cache_capacity, 10_000);

        unsafe {
            env::remove_var("SNAPSHOT_SECRET");
        }
    }
}
