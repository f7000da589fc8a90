//! Errors raised by movers.

use slick_core::{EnvError, StoreError};

/// Mover failures.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MoverError {
    /// An environment query failed.
    #[error("environment query failed: {0}")]
    Env(#[from] EnvError),
    /// A particle array was missing or inconsistent.
    #[error("particle store: {0}")]
    Store(#[from] StoreError),
    /// The uncertainty overlay has no row for some particle.
    #[error("uncertainty factors missing: {rows} rows for {particles} uncertain particles")]
    UncertaintyMissing {
        /// Rows in the overlay.
        rows: usize,
        /// Particles in the uncertain population.
        particles: usize,
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
}
