//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{AuditError, AuditResult};

use super::types::{AppConfig, RateCard};

/// Loads and provides access to the engine configuration.
///
/// # File Layout
///
/// ```text
/// server:
///   host: 0.0.0.0
///   port: 5001
/// database:
///   url: sqlite://gigworkers.db
///   max_connections: 5
/// audit:
///   rate_card:          # optional nominal payout schedule
///     base_fare: "25.00"
///     per_km: "8.00"
///     per_minute: "0.50"
/// grievance:
///   payout_tolerance: "100"
/// ```
///
/// # Example
///
/// ```no_run
/// use gig_audit::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/gig_audit.yaml")?;
/// println!("Listening on {}", loader.config().server.bind_address());
/// # Ok::<(), gig_audit::error::AuditError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the YAML file at `path`.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file is not valid YAML or has mistyped fields (`ConfigParseError`)
    /// - A value is out of range (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> AuditResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| AuditError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse(&content, &path_str)
    }

    /// Parses configuration from YAML text.
    ///
    /// # Example
    ///
    /// ```
    /// use gig_audit::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::from_yaml_str("server:\n  port: 8080\n").unwrap();
    /// assert_eq!(loader.config().server.port, 8080);
    /// assert!(loader.rate_card().is_none());
    /// ```
    pub fn from_yaml_str(content: &str) -> AuditResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> AuditResult<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|e| AuditError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Self::validate(&config).map_err(|message| AuditError::ConfigParseError {
            path: origin.to_string(),
            message,
        })?;

        Ok(Self { config })
    }

    fn validate(config: &AppConfig) -> Result<(), String> {
        if config.database.url.trim().is_empty() {
            return Err("database.url must not be empty".to_string());
        }
        if config.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if config.grievance.payout_tolerance.is_sign_negative() {
            return Err("grievance.payout_tolerance must not be negative".to_string());
        }
        if let Some(card) = &config.audit.rate_card {
            let rates = [card.base_fare, card.per_km, card.per_minute];
            if rates.iter().any(|rate| rate.is_sign_negative()) {
                return Err("audit.rate_card rates must not be negative".to_string());
            }
        }
        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// Returns the configured rate card, if any.
    pub fn rate_card(&self) -> Option<&RateCard> {
        self.config.audit.rate_card.as_ref()
    }
}
