//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts and intervals > 0)
//! - Check the metrics address parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `FleetConfig -> Result<(), Vec<ValidationError>>`
//! - Runs before a config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::FleetConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.refresh.wait_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "refresh.wait_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.reconcile.interval_secs == 0 {
        errors.push(ValidationError::new(
            "reconcile.interval_secs",
            "must be greater than zero",
        ));
    }

    if config.reconcile.unhealthy_label.trim().is_empty() {
        errors.push(ValidationError::new(
            "reconcile.unhealthy_label",
            "must not be empty",
        ));
    }

    if let Some(path) = &config.store.path {
        if path.trim().is_empty() {
            errors.push(ValidationError::new(
                "store.path",
                "must not be empty when set",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a valid socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
