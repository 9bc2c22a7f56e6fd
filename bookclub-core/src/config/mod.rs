//! Configuration management for the bookclub backend

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session cookie and lifetime
    pub session: SessionConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
    /// Directory served under the `/assets/` prefix route
    pub static_assets_dir: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed session lifetime. Sessions are never extended.
    pub ttl_secs: i64,
    /// Emit the `Secure` attribute on the session cookie
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            cookie_secure: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `text` or `json`
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let ttl_secs: i64 = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .context("Invalid SESSION_TTL_SECS")?;
        if ttl_secs <= 0 {
            anyhow::bail!("SESSION_TTL_SECS must be positive");
        }

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                run_migrations: env_bool("RUN_MIGRATIONS", true),
            },
            session: SessionConfig {
                ttl_secs,
                cookie_secure: env_bool("SESSION_COOKIE_SECURE", true),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: env_bool("METRICS_ENABLED", false),
            },
            static_assets_dir: env::var("STATIC_ASSETS_DIR")
                .unwrap_or_else(|_| "web/assets".to_string()),
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
