mod file_config;

pub use file_config::{FileConfig, QueryCacheConfig};

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_QUERY_CACHE_TTL_SEC: u64 = 60;
pub const DEFAULT_QUERY_CACHE_MAX_ENTRIES: usize = 1000;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub query_cache_ttl_sec: Option<u64>,
    pub query_cache_max_entries: Option<usize>,
    pub admin_token: Option<String>,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub query_cache_ttl_sec: u64,
    pub query_cache_max_entries: usize,
    pub admin_token: Option<String>,
    pub frontend_dir_path: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified on the command line or in config file")
            })?;

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let cache_file = file.query_cache.unwrap_or_default();
        let query_cache_ttl_sec = cache_file
            .ttl_sec
            .or(cli.query_cache_ttl_sec)
            .unwrap_or(DEFAULT_QUERY_CACHE_TTL_SEC);
        let query_cache_max_entries = cache_file
            .max_entries
            .or(cli.query_cache_max_entries)
            .unwrap_or(DEFAULT_QUERY_CACHE_MAX_ENTRIES);

        let admin_token = file
            .admin_token
            .or_else(|| cli.admin_token.clone())
            .filter(|t| !t.trim().is_empty());
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        Ok(Self {
            db_path,
            port,
            metrics_port,
            logging_level,
            query_cache_ttl_sec,
            query_cache_max_entries,
            admin_token,
            frontend_dir_path,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            query_cache_ttl_sec: self.query_cache_ttl_sec,
            query_cache_max_entries: self.query_cache_max_entries,
            frontend_dir_path: self.frontend_dir_path.clone(),
            admin_token: self.admin_token.clone(),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
