//! Configuration loading and management for the audit engine.
//!
//! This module loads the YAML configuration file: listener address, data
//! store URL, the optional nominal payout rate card, and grievance intake
//! settings.
//!
//! # Example
//!
//! ```no_run
//! use gig_audit::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/gig_audit.yaml").unwrap();
//! println!("Store: {}", config.config().database.url);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, AuditConfig, DatabaseConfig, GrievanceConfig, RateCard, ServerConfig};
