//! Construction-time errors.
//!
//! Everything that can go wrong with a scheduler goes wrong while it is
//! being built. Once [`Danmaku::new`](crate::Danmaku::new) succeeds, lane
//! saturation, empty bodies and exhausted priority lanes are absorbed into
//! deferral, no-op and drop policies instead of surfacing as errors.

use thiserror::Error;

/// Convenience alias for results carrying a [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A malformed construction option.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The scheduler needs at least one lane.
    #[error("line count must be at least 1")]
    ZeroLanes,

    /// A value that must be finite and strictly positive was not.
    #[error("{option} must be a finite positive number (got {value})")]
    NotPositive {
        /// Name of the offending option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A value that must be finite and non-negative was not.
    #[error("{option} must be a finite non-negative number (got {value})")]
    Negative {
        /// Name of the offending option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Centered messages would never expire.
    #[error("centered duration must be longer than zero")]
    ZeroCenteredDuration,

    /// The wrapper class was set to an empty or whitespace-only name.
    #[error("wrapper class must not be blank")]
    BlankWrapperClass,

    /// The stage has no usable area to animate in.
    #[error("stage has no usable area ({width}x{height})")]
    StageUnavailable {
        /// Reported stage width.
        width: f64,
        /// Reported stage height.
        height: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_option() {
        let err = ConfigError::NotPositive {
            option: "coefficient",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "coefficient must be a finite positive number (got -1)"
        );

        let err = ConfigError::StageUnavailable {
            width: 0.0,
            height: 24.0,
        };
        assert_eq!(err.to_string(), "stage has no usable area (0x24)");
    }
}
