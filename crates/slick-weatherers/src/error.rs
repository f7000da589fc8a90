//! Errors raised by weatherers.

use slick_core::{EnvError, StoreError};

/// Weatherer failures.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WeathererError {
    /// An environment query failed.
    #[error("environment query failed: {0}")]
    Env(#[from] EnvError),
    /// A particle array was missing or inconsistent.
    #[error("particle store: {0}")]
    Store(#[from] StoreError),
    /// Efficiency outside `[0, 1]`.
    #[error("efficiency {value} is outside [0, 1]")]
    InvalidEfficiency {
        /// Supplied value.
        value: f64,
    },
    /// A constructor parameter is out of range.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Supplied value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The population has no substance to convert amounts with.
    #[error("{weatherer} needs a substance but the population has none")]
    MissingSubstance {
        /// Name of the weatherer.
        weatherer: String,
    },
}
