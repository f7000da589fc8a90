//! Element initializers: per-particle columns filled in at release.
//!
//! Each [`Initializer`] declares the optional columns it writes and fills
//! them for the rows a spill just appended. Random draws come from the
//! spill's per-population RNG, so the certain population never sees the
//! uncertain population's draws.

use std::f64::consts::PI;
use std::ops::Range;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use slick_core::{StoreError, Substance};
use slick_env::Water;
use slick_movers::rise_velocity_from_drop_size;
use slick_release::ReleaseError;
use slick_store::{names, ArrayDef, ParticleStore};

use crate::config::ConfigError;

// ── Distribution ───────────────────────────────────────────────────

/// A scalar distribution to draw per-particle values from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Uniform on `[low, high)`.
    Uniform {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Normal with the given mean and standard deviation.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        std_dev: f64,
    },
    /// `exp(N(mean, sigma))`.
    LogNormal {
        /// Mean of the underlying normal.
        mean: f64,
        /// Standard deviation of the underlying normal.
        sigma: f64,
    },
}

impl Distribution {
    /// Check the parameters are finite and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| {
            Err(ConfigError::InvalidInitializer {
                reason: reason.to_string(),
            })
        };
        match *self {
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return bad("uniform bounds must be finite with low <= high");
                }
            }
            Distribution::Normal { mean, std_dev: s }
            | Distribution::LogNormal { mean, sigma: s } => {
                if !mean.is_finite() || !s.is_finite() || s < 0.0 {
                    return bad("normal parameters must be finite with a non-negative spread");
                }
            }
        }
        Ok(())
    }

    /// Draw one value.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> f64 {
        match *self {
            Distribution::Uniform { low, high } => low + (high - low) * rng.random::<f64>(),
            Distribution::Normal { mean, std_dev } => mean + std_dev * standard_normal(rng),
            Distribution::LogNormal { mean, sigma } => (mean + sigma * standard_normal(rng)).exp(),
        }
    }
}

/// Box-Muller, one variate per call.
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

// ── InitWindages ───────────────────────────────────────────────────

/// Samples each particle's windage from a range and records how long
/// the sample persists.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitWindages {
    /// `[min, max]` windage fraction.
    pub windage_range: [f64; 2],
    /// Seconds a sample persists; `-1` means forever.
    pub windage_persist: f64,
}

impl Default for InitWindages {
    fn default() -> Self {
        Self {
            windage_range: [0.01, 0.04],
            windage_persist: 900.0,
        }
    }
}

impl InitWindages {
    /// Windages sampled from `range`, resampled every `persist` seconds.
    pub fn new(range: [f64; 2], persist: f64) -> Result<Self, ReleaseError> {
        let w = Self {
            windage_range: range,
            windage_persist: persist,
        };
        w.validate()?;
        Ok(w)
    }

    /// Reject a zero persistence and malformed ranges.
    pub fn validate(&self) -> Result<(), ReleaseError> {
        let [lo, hi] = self.windage_range;
        if !(lo >= 0.0 && hi >= lo && hi.is_finite()) {
            return Err(ReleaseError::InvalidWindage {
                reason: format!("range must be non-negative and ordered, got [{lo}, {hi}]"),
            });
        }
        if self.windage_persist == 0.0 || !self.windage_persist.is_finite() {
            return Err(ReleaseError::InvalidWindage {
                reason: format!(
                    "windage_persist must be non-zero and finite (-1 for infinite), got {}",
                    self.windage_persist
                ),
            });
        }
        Ok(())
    }

    fn initialize(
        &self,
        rows: Range<usize>,
        store: &mut ParticleStore,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), StoreError> {
        let [lo, hi] = self.windage_range;
        let range = store.array_mut(names::WINDAGE_RANGE)?;
        for row in rows.clone() {
            range[2 * row] = lo;
            range[2 * row + 1] = hi;
        }
        store.array_mut(names::WINDAGE_PERSIST)?[rows.clone()].fill(self.windage_persist);
        for w in &mut store.array_mut(names::WINDAGES)?[rows] {
            *w = lo + (hi - lo) * rng.random::<f64>();
        }
        Ok(())
    }
}

// ── Initializer ────────────────────────────────────────────────────

/// The closed set of initializers a spill can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum Initializer {
    /// Windage columns for the wind mover.
    Windages(InitWindages),
    /// Rise velocity drawn directly from a distribution.
    RiseVelFromDist(Distribution),
    /// Droplet diameter drawn from a distribution, rise velocity derived
    /// from it in `water`.
    RiseVelFromDropletSize {
        /// Diameter distribution in meters.
        distribution: Distribution,
        /// Ambient water for density and viscosity.
        water: Water,
    },
    /// Per-element mass taken from a plume's mass flux. Only valid on a
    /// vertical plume release.
    MassFromPlume,
}

impl Initializer {
    /// Validate parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Initializer::Windages(w) => Ok(w.validate()?),
            Initializer::RiseVelFromDist(d) => d.validate(),
            Initializer::RiseVelFromDropletSize { distribution, .. } => distribution.validate(),
            Initializer::MassFromPlume => Ok(()),
        }
    }

    /// Columns this initializer writes.
    pub fn array_types(&self) -> Vec<ArrayDef> {
        match self {
            Initializer::Windages(_) => vec![
                ArrayDef::windages(),
                ArrayDef::windage_range(),
                ArrayDef::windage_persist(),
            ],
            Initializer::RiseVelFromDist(_) => vec![ArrayDef::rise_vel()],
            Initializer::RiseVelFromDropletSize { .. } => {
                vec![ArrayDef::droplet_diameter(), ArrayDef::rise_vel()]
            }
            Initializer::MassFromPlume => Vec::new(),
        }
    }

    /// Fill this initializer's columns for `rows`.
    pub fn initialize(
        &self,
        rows: Range<usize>,
        store: &mut ParticleStore,
        substance: &dyn Substance,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), StoreError> {
        match self {
            Initializer::Windages(w) => w.initialize(rows, store, rng),
            Initializer::RiseVelFromDist(d) => {
                for v in &mut store.array_mut(names::RISE_VEL)?[rows] {
                    *v = d.sample(rng);
                }
                Ok(())
            }
            Initializer::RiseVelFromDropletSize {
                distribution,
                water,
            } => {
                let le_density = substance.density_at_temp(water.temperature());
                let diameters: Vec<f64> = rows.clone().map(|_| distribution.sample(rng)).collect();
                store.array_mut(names::DROPLET_DIAMETER)?[rows.clone()]
                    .copy_from_slice(&diameters);
                let rise = store.array_mut(names::RISE_VEL)?;
                for (v, d) in rise[rows].iter_mut().zip(&diameters) {
                    *v = rise_velocity_from_drop_size(
                        water.density(),
                        water.kinematic_viscosity(),
                        le_density,
                        *d,
                    );
                }
                Ok(())
            }
            Initializer::MassFromPlume => Ok(()),
        }
    }
}
