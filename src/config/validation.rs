//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Reject empty location fields
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.collector.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "collector.interval_secs" });
    }
    if config.provider.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "provider.timeout_secs" });
    }
    if config.server.port == 0 {
        errors.push(ValidationError::Zero { field: "server.port" });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "server.request_timeout_secs" });
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "database.max_connections" });
    }
    if config.provider.city.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "provider.city" });
    }
    if config.provider.country.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "provider.country" });
    }
    if config.provider.base_url.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "provider.base_url" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
