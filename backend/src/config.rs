//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Listing configuration
    pub listing: ListingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Which storage driver backs the chat namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDriver {
    /// Volatile in-process map
    Memory,
    /// SQLite database file under the data directory
    Sqlite,
}

impl StorageDriver {
    /// Parse a driver name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(StorageDriver::Memory),
            "sqlite" => Some(StorageDriver::Sqlite),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected driver
    pub driver: StorageDriver,
    /// Base directory for the SQLite database
    pub data_dir: String,
}

impl StorageConfig {
    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("chats.db")
    }
}

/// Listing configuration
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Maximum concurrent title lookups (0 = unbounded)
    pub concurrency: usize,
}

impl ListingConfig {
    /// Concurrency limit, `None` when unbounded
    pub fn limit(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.concurrency)
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let driver = match env::var("STORAGE_DRIVER") {
            Ok(name) => StorageDriver::parse(&name).unwrap_or_else(|| {
                tracing::warn!(driver = %name, "Unknown STORAGE_DRIVER, using memory");
                StorageDriver::Memory
            }),
            Err(_) => StorageDriver::Memory,
        };

        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            storage: StorageConfig {
                driver,
                data_dir: env::var("DATA_DIR").unwrap_or_else(|_| {
                    // Default to ~/.chat-store or current directory
                    if let Some(home) = env::var_os("HOME") {
                        format!("{}/.chat-store", home.to_string_lossy())
                    } else {
                        ".chat-store".to_string()
                    }
                }),
            },
            listing: ListingConfig {
                concurrency: env::var("LIST_CONCURRENCY")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
