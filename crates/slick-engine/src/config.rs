//! Model configuration, validation, and error types.
//!
//! [`ModelConfig`] is the serde-deserializable run description. The
//! [`Model`](crate::Model) builder calls [`validate()`](ModelConfig::validate)
//! before anything else, so a model that builds has a usable clock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use slick_core::{add_seconds, EnvError, StoreError};
use slick_movers::MoverError;
use slick_release::ReleaseError;
use slick_weatherers::WeathererError;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while configuring a model.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `time_step_secs` is NaN, infinite, zero, or negative.
    #[error("time_step_secs must be finite and positive, got {value}")]
    InvalidTimeStep {
        /// The invalid value.
        value: f64,
    },
    /// `duration_secs` is NaN, infinite, or negative.
    #[error("duration_secs must be finite and non-negative, got {value}")]
    InvalidDuration {
        /// The invalid value.
        value: f64,
    },
    /// `mass_tolerance` is NaN, infinite, or negative.
    #[error("mass_tolerance must be finite and non-negative, got {value}")]
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
    /// `compact_every` is zero.
    #[error("compact_every must be at least 1")]
    InvalidCompaction,
    /// An element initializer rejected its parameters.
    #[error("invalid initializer: {reason}")]
    InvalidInitializer {
        /// What is wrong with it.
        reason: String,
    },
    /// The model has nothing to release.
    #[error("model has no spills")]
    NoSpills,
    /// A release or initializer rejected its parameters.
    #[error("release: {0}")]
    Release(#[from] ReleaseError),
    /// A mover rejected its parameters.
    #[error("mover: {0}")]
    Mover(#[from] MoverError),
    /// A weatherer rejected its parameters.
    #[error("weatherer: {0}")]
    Weatherer(#[from] WeathererError),
    /// Columns requested by components could not be declared.
    #[error("store: {0}")]
    Store(#[from] StoreError),
    /// An environment object rejected its parameters.
    #[error("environment: {0}")]
    Env(#[from] EnvError),
    /// A component description is structurally invalid.
    #[error("invalid {kind} description: {reason}")]
    Registry {
        /// Component category (`mover`, `weatherer`, `spill`).
        kind: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// A description named a type the registry does not know.
    #[error("unknown {kind} type {type_name:?}")]
    UnknownType {
        /// Component category.
        kind: &'static str,
        /// The unrecognised name.
        type_name: String,
    },
    /// A description could not be parsed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

// ── ModelConfig ────────────────────────────────────────────────────

/// Run clock and global knobs for a [`Model`](crate::Model).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model time of the first step.
    pub start_time: NaiveDateTime,
    /// Length of the run in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Step length in seconds. The last step is shortened when the
    /// duration is not a whole number of steps.
    #[serde(default = "default_time_step")]
    pub time_step_secs: f64,
    /// Run an uncertain population alongside the certain one.
    #[serde(default)]
    pub uncertain: bool,
    /// Seed for every stochastic component.
    #[serde(default)]
    pub seed: u64,
    /// Relative tolerance of the per-row `sum(components) == mass` check.
    #[serde(default = "default_mass_tolerance")]
    pub mass_tolerance: f64,
    /// Compact removed particles every this many steps. Default: 1.
    #[serde(default = "default_compact_every")]
    pub compact_every: usize,
}

fn default_duration() -> f64 {
    2.0 * 86400.0
}

fn default_time_step() -> f64 {
    900.0
}

fn default_mass_tolerance() -> f64 {
    1e-6
}

fn default_compact_every() -> usize {
    1
}

impl ModelConfig {
    /// Defaults for a run starting at `start_time`: two days in 15 minute
    /// steps, certain population only, seed 0.
    pub fn new(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            duration_secs: default_duration(),
            time_step_secs: default_time_step(),
            uncertain: false,
            seed: 0,
            mass_tolerance: default_mass_tolerance(),
            compact_every: default_compact_every(),
        }
    }

    /// Set the run length in seconds.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Set the step length in seconds.
    pub fn with_time_step(mut self, secs: f64) -> Self {
        self.time_step_secs = secs;
        self
    }

    /// Enable or disable the uncertain population.
    pub fn with_uncertain(mut self, uncertain: bool) -> Self {
        self.uncertain = uncertain;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.time_step_secs;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep { value: dt });
        }
        let d = self.duration_secs;
        if !d.is_finite() || d < 0.0 {
            return Err(ConfigError::InvalidDuration { value: d });
        }
        let tol = self.mass_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ConfigError::InvalidTolerance { value: tol });
        }
        if self.compact_every == 0 {
            return Err(ConfigError::InvalidCompaction);
        }
        Ok(())
    }

    /// Number of steps in the run, counting a trailing partial step.
    pub fn num_time_steps(&self) -> usize {
        // tolerance keeps an exact multiple from gaining a sliver step
        (self.duration_secs / self.time_step_secs - 1e-9).ceil().max(0.0) as usize
    }

    /// Length of step `step` in seconds.
    pub fn step_length(&self, step: usize) -> f64 {
        let elapsed = step as f64 * self.time_step_secs;
        (self.duration_secs - elapsed).clamp(0.0, self.time_step_secs)
    }

    /// Model time at the end of the run.
    pub fn end_time(&self) -> NaiveDateTime {
        add_seconds(self.start_time, self.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 5, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn defaults_validate() {
        let c = ModelConfig::new(t0());
        c.validate().unwrap();
        assert_eq!(c.num_time_steps(), 192);
    }

    #[test]
    fn rejects_bad_clock() {
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ModelConfig::new(t0()).with_time_step(dt).validate().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeStep { .. }));
        }
        let err = ModelConfig::new(t0()).with_duration(-5.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { value } if value == -5.0));
    }

    #[test]
    fn rejects_zero_compaction_interval() {
        let mut c = ModelConfig::new(t0());
        c.compact_every = 0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidCompaction)));
    }

    #[test]
    fn trailing_partial_step() {
        let c = ModelConfig::new(t0()).with_duration(2000.0).with_time_step(900.0);
        assert_eq!(c.num_time_steps(), 3);
        assert_eq!(c.step_length(0), 900.0);
        assert_eq!(c.step_length(2), 200.0);
        assert_eq!(c.step_length(3), 0.0);
    }

    #[test]
    fn deserializes_with_defaults() {
        let c: ModelConfig =
            serde_json::from_str(r#"{"start_time": "2015-05-14T00:00:00", "uncertain": true}"#)
                .unwrap();
        assert!(c.uncertain);
        assert_eq!(c.time_step_secs, 900.0);
        assert_eq!(c.mass_tolerance, 1e-6);
        assert_eq!(c.end_time(), add_seconds(t0(), 172800.0));
    }
}
