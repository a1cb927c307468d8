//! Application configuration
//!
//! Loads settings using the following priority (later wins):
//! 1. Built-in defaults
//! 2. JSON file (~/.config/deskmail/deskmail.json)
//! 3. Environment variables (`DESKMAIL_*`)
//!
//! The command line's `--backend` flag is applied by the binary on top.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::query::DEFAULT_CHUNK_SIZE;

/// Config filename in the Deskmail config directory
pub const CONFIG_FILE: &str = "deskmail.json";

/// Audit log filename in the Deskmail data directory
const AUDIT_LOG_FILE: &str = "audit.log";

/// Maildir location used when none is configured, relative to home
const DEFAULT_MAILDIR: &str = "Maildir";

pub const ENV_BACKEND: &str = "DESKMAIL_BACKEND";
pub const ENV_MAILDIR: &str = "DESKMAIL_MAILDIR";
pub const ENV_AUDIT_ENABLED: &str = "DESKMAIL_AUDIT_ENABLED";
pub const ENV_AUDIT_LOG: &str = "DESKMAIL_AUDIT_LOG";
pub const ENV_MAX_MEMORY_MB: &str = "DESKMAIL_MAX_MEMORY_MB";
pub const ENV_PAGE_SIZE: &str = "DESKMAIL_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Resident memory ceiling for streamed output
    pub max_memory_mb: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 1024.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Defaults to `audit.log` in the data directory
    pub log_file: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: None,
        }
    }
}

/// Settings for the Deskmail CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `mock` or `real`; unset means the platform default
    pub backend: Option<String>,
    /// Root of the Maildir++ store read by the real backend
    pub maildir: Option<PathBuf>,
    pub page_size: usize,
    pub chunk_size: usize,
    pub limits: LimitsConfig,
    pub audit: AuditConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: None,
            maildir: None,
            page_size: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
            limits: LimitsConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file (if any) and the environment
    pub fn load() -> Result<Self> {
        let mut config = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = config::load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DESKMAIL_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = Some(backend);
        }
        if let Some(maildir) = lookup(ENV_MAILDIR) {
            self.maildir = Some(PathBuf::from(maildir));
        }
        if let Some(enabled) = lookup(ENV_AUDIT_ENABLED) {
            self.audit.enabled = parse_bool(&enabled)
                .with_context(|| format!("{} must be true or false", ENV_AUDIT_ENABLED))?;
        }
        if let Some(path) = lookup(ENV_AUDIT_LOG) {
            self.audit.log_file = Some(PathBuf::from(path));
        }
        if let Some(limit) = lookup(ENV_MAX_MEMORY_MB) {
            self.limits.max_memory_mb = limit
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number", ENV_MAX_MEMORY_MB))?;
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            self.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number", ENV_PAGE_SIZE))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be greater than 0");
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than 0");
        }
        let limit = self.limits.max_memory_mb;
        if !limit.is_finite() || limit <= 0.0 {
            bail!("limits.max_memory_mb must be greater than 0");
        }
        Ok(())
    }

    /// Resolve the backend selector, with `cli` taking precedence
    pub fn backend_kind(&self, cli: Option<&str>) -> crate::error::Result<BackendKind> {
        BackendKind::resolve(cli.or(self.backend.as_deref()))
    }

    /// Configured Maildir root, else `~/Maildir`
    pub fn maildir_root(&self) -> Option<PathBuf> {
        self.maildir
            .clone()
            .or_else(|| config::home_path(DEFAULT_MAILDIR))
    }

    /// Configured audit log path, else `audit.log` in the data directory
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.audit
            .log_file
            .clone()
            .or_else(|| config::data_path(AUDIT_LOG_FILE))
    }

    /// Get the default config file path (~/.config/deskmail/deskmail.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
