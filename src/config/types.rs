//! Configuration types for the audit engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every section has
//! defaults, so a partial file is valid.

use rust_decimal::Decimal;
use serde::Deserialize;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Data store settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g. `sqlite://gigworkers.db`).
    pub url: String,
    /// Maximum pooled connections. In-memory databases always use one.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://gigworkers.db".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 30,
        }
    }
}

/// An operator-supplied nominal payout schedule.
///
/// Expected payout is `base_fare + per_km * distance_km + per_minute * duration_min`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateCard {
    /// Label shown in reports.
    #[serde(default = "default_rate_card_name")]
    pub name: String,
    /// Flat amount per order.
    pub base_fare: Decimal,
    /// Amount per kilometre.
    #[serde(default)]
    pub per_km: Decimal,
    /// Amount per minute.
    #[serde(default)]
    pub per_minute: Decimal,
}

fn default_rate_card_name() -> String {
    "rate_card".to_string()
}

/// Audit evaluator settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Nominal payout schedule; without one, reports carry no withheld amount
    /// unless the request supplies expected payouts.
    pub rate_card: Option<RateCard>,
}

/// Grievance intake settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrievanceConfig {
    /// A claimed amount further than this from the latest payout contradicts
    /// the record.
    pub payout_tolerance: Decimal,
}

impl Default for GrievanceConfig {
    fn default() -> Self {
        Self {
            payout_tolerance: Decimal::new(100, 0),
        }
    }
}

/// The complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Data store settings.
    pub database: DatabaseConfig,
    /// Audit evaluator settings.
    pub audit: AuditConfig,
    /// Grievance intake settings.
    pub grievance: GrievanceConfig,
}
