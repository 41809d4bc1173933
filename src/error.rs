// src/error.rs

use thiserror::Error;

/// Rejected configuration, surfaced by component constructors before any
/// frame is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("configuration `{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ConfigError {
    pub fn invalid<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Small validation helpers shared by the per-section `validate()` methods.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be zero or positive, got {value}"),
        ))
    }
}

pub(crate) fn require_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

pub(crate) fn require_ordered(
    low_field: &'static str,
    low: f64,
    high_field: &'static str,
    high: f64,
) -> Result<(), ConfigError> {
    if low < high {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            low_field,
            format!("must be smaller than `{high_field}` ({low} >= {high})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_field() {
        let err = require_positive("tracker.fps", 0.0).unwrap_err();
        assert!(err.to_string().contains("tracker.fps"));

        let err = require_range("fusion.ceiling", 1.5, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                field: "fusion.ceiling",
                value: 1.5,
                min: 0.0,
                max: 1.0
            }
        );
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(require_non_negative("x", f64::NAN).is_err());
        assert!(require_positive("x", f64::INFINITY).is_err());
        assert!(require_ordered("lo", 2.0, "hi", 1.0).is_err());
    }
}
