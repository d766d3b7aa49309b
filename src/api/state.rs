//! Application state for the audit engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{AppConfig, RateCard};
use crate::grievance::{GrievanceValidator, RecordDiscrepancyValidator};
use crate::store::Store;

/// Shared application state.
///
/// Contains the data store handle, the loaded configuration and the
/// grievance validator.
#[derive(Clone)]
pub struct AppState {
    store: Store,
    config: Arc<AppConfig>,
    validator: Arc<dyn GrievanceValidator>,
}

impl AppState {
    /// Creates the state with the record-discrepancy grievance validator.
    pub fn new(store: Store, config: AppConfig) -> Self {
        let validator = Arc::new(RecordDiscrepancyValidator::from_config(&config.grievance));
        Self {
            store,
            config: Arc::new(config),
            validator,
        }
    }

    /// Replaces the grievance validator.
    pub fn with_validator(mut self, validator: Arc<dyn GrievanceValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Returns the data store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the configured nominal payout schedule, if any.
    pub fn rate_card(&self) -> Option<&RateCard> {
        self.config.audit.rate_card.as_ref()
    }

    /// Returns the grievance validator.
    pub fn validator(&self) -> &dyn GrievanceValidator {
        self.validator.as_ref()
    }
}
