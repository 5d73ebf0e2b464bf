//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, NATIVE_MESSAGE_LIMIT};

/// Windows above this are accepted but unlikely to be intended.
const LONG_DEBOUNCE_MS: u64 = 10_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], for callers that refuse invalid configs.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors
            .into_iter()
            .next()
            .map(|e| ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_capture(config, &mut result);
        Self::validate_relay(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_capture(config: &Config, result: &mut ValidationResult) {
        if config.capture.debounce_ms == 0 {
            result.add_error(ValidationError::new(
                "capture.debounce_ms",
                "debounce_ms must be greater than 0",
            ));
        } else if config.capture.debounce_ms > LONG_DEBOUNCE_MS {
            result.add_warning(ValidationWarning::new(
                "capture.debounce_ms",
                "debounce_ms is very high (>10s), typed values will be reported late",
            ));
        }

        let attr = config.capture.identity_attribute.as_str();
        if attr.trim().is_empty() {
            result.add_error(ValidationError::new(
                "capture.identity_attribute",
                "identity_attribute cannot be empty",
            ));
        } else if attr.chars().any(char::is_whitespace) {
            result.add_error(ValidationError::new(
                "capture.identity_attribute",
                format!("'{}' is not a valid attribute name", attr),
            ));
        }
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        let max = config.relay.max_message_bytes;
        if max == 0 {
            result.add_error(ValidationError::new(
                "relay.max_message_bytes",
                "max_message_bytes must be greater than 0",
            ));
        } else if max > NATIVE_MESSAGE_LIMIT {
            result.add_error(ValidationError::new(
                "relay.max_message_bytes",
                format!(
                    "max_message_bytes cannot exceed the native messaging limit ({} bytes)",
                    NATIVE_MESSAGE_LIMIT
                ),
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
