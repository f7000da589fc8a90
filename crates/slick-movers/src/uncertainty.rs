//! [`UncertaintyOverlay`]: persistent along/cross perturbation factors
//! for the uncertain population.
//!
//! Each uncertain particle owns a row `(alpha, beta)` drawn uniformly from
//! `[-along, along] x [-cross, cross]`. A velocity or displacement
//! `(u, v)` becomes `(u(1 + alpha) + v beta, v(1 + alpha) - u beta)`.
//!
//! Row lifecycle, evaluated by [`update`](UncertaintyOverlay::update):
//!
//! 1. Before `delay` seconds of run time nothing happens.
//! 2. Full resample when the list is empty, the population shrank, or
//!    run time moved backward.
//! 3. New particles get new rows; existing rows are left alone.
//! 4. Every `duration` seconds all rows are resampled.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::MoverError;

/// Tunables for the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyParams {
    /// Half-width of the along-flow factor.
    pub along: f64,
    /// Half-width of the cross-flow factor.
    pub cross: f64,
    /// Seconds between full resamples.
    pub duration: f64,
    /// Seconds of run time before any perturbation.
    pub delay: f64,
}

impl Default for UncertaintyParams {
    fn default() -> Self {
        Self {
            along: 0.5,
            cross: 0.25,
            duration: 24.0 * 3600.0,
            delay: 0.0,
        }
    }
}

impl UncertaintyParams {
    /// Reject negative widths or non-positive durations.
    pub fn validate(&self) -> Result<(), MoverError> {
        let check = |name, value: f64, ok: bool, reason| {
            if ok {
                Ok(())
            } else {
                Err(MoverError::InvalidParameter {
                    name,
                    value,
                    reason,
                })
            }
        };
        check("along", self.along, self.along >= 0.0, "must be non-negative")?;
        check("cross", self.cross, self.cross >= 0.0, "must be non-negative")?;
        check("duration", self.duration, self.duration > 0.0, "must be positive")?;
        check("delay", self.delay, self.delay >= 0.0, "must be non-negative")
    }
}

/// Per-particle perturbation rows for one mover.
#[derive(Clone, Debug)]
pub struct UncertaintyOverlay {
    params: UncertaintyParams,
    rows: Vec<[f64; 2]>,
    time_set: f64,
    salt: u64,
    rng: ChaCha8Rng,
}

impl UncertaintyOverlay {
    /// An overlay whose RNG stream is distinguished by `salt`.
    pub fn new(params: UncertaintyParams, salt: u64) -> Self {
        Self {
            params,
            rows: Vec::new(),
            time_set: 0.0,
            salt,
            rng: ChaCha8Rng::seed_from_u64(salt),
        }
    }

    /// The tunables.
    pub fn params(&self) -> &UncertaintyParams {
        &self.params
    }

    /// Current rows.
    pub fn rows(&self) -> &[[f64; 2]] {
        &self.rows
    }

    /// Run time at which rows were last fully resampled.
    pub fn time_set(&self) -> f64 {
        self.time_set
    }

    /// Drop all rows and reseed.
    pub fn reset(&mut self, seed: u64) {
        self.rows.clear();
        self.time_set = 0.0;
        self.rng = ChaCha8Rng::seed_from_u64(seed ^ self.salt);
    }

    fn sample_row(&mut self) -> [f64; 2] {
        let UncertaintyParams { along, cross, .. } = self.params;
        [
            -along + 2.0 * along * self.rng.random::<f64>(),
            -cross + 2.0 * cross * self.rng.random::<f64>(),
        ]
    }

    fn resample(&mut self, n: usize, elapsed: f64) {
        self.rows.clear();
        for _ in 0..n {
            let row = self.sample_row();
            self.rows.push(row);
        }
        self.time_set = elapsed;
        tracing::debug!(rows = n, elapsed, "uncertainty factors resampled");
    }

    /// Bring the rows in line with `num_particles` uncertain particles at
    /// `elapsed` seconds of run time.
    pub fn update(&mut self, num_particles: usize, elapsed: f64) {
        if elapsed < self.params.delay {
            return;
        }
        let size = self.rows.len();
        if size == 0 || elapsed < self.time_set || num_particles < size {
            self.resample(num_particles, elapsed);
        } else if num_particles > size {
            for _ in size..num_particles {
                let row = self.sample_row();
                self.rows.push(row);
            }
        } else if elapsed >= self.time_set + self.params.duration {
            self.resample(num_particles, elapsed);
        }
    }

    /// Perturb horizontal `deltas` in place. A no-op before the delay.
    pub fn apply(&self, deltas: &mut [[f64; 3]], elapsed: f64) -> Result<(), MoverError> {
        if elapsed < self.params.delay || deltas.is_empty() {
            return Ok(());
        }
        if self.rows.len() != deltas.len() {
            return Err(MoverError::UncertaintyMissing {
                rows: self.rows.len(),
                particles: deltas.len(),
            });
        }
        for (d, [alpha, beta]) in deltas.iter_mut().zip(&self.rows) {
            let (u, v) = (d[0], d[1]);
            d[0] = u * (1.0 + alpha) + v * beta;
            d[1] = v * (1.0 + alpha) - u * beta;
        }
        Ok(())
    }

    /// Drop the rows of particles about to be compacted away.
    pub fn remove_rows(&mut self, removed: &[bool]) {
        if removed.len() != self.rows.len() {
            return;
        }
        let mut flags = removed.iter();
        self.rows.retain(|_| !flags.next().copied().unwrap_or(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn overlay(delay: f64) -> UncertaintyOverlay {
        let params = UncertaintyParams {
            delay,
            duration: 3600.0,
            ..UncertaintyParams::default()
        };
        let mut o = UncertaintyOverlay::new(params, 0xC0FFEE);
        o.reset(42);
        o
    }

    #[test]
    fn nothing_before_delay() {
        let mut o = overlay(600.0);
        o.update(10, 0.0);
        assert!(o.rows().is_empty());
        let mut d = vec![[1.0, 2.0, 0.0]; 10];
        o.apply(&mut d, 0.0).unwrap();
        assert_eq!(d, vec![[1.0, 2.0, 0.0]; 10]);
    }

    #[test]
    fn growth_keeps_existing_rows() {
        let mut o = overlay(0.0);
        o.update(5, 0.0);
        let before = o.rows().to_vec();
        o.update(8, 900.0);
        assert_eq!(o.rows().len(), 8);
        assert_eq!(&o.rows()[..5], before.as_slice());
        assert_eq!(o.time_set(), 0.0);
    }

    #[test]
    fn shrink_or_time_reversal_resamples() {
        let mut o = overlay(0.0);
        o.update(5, 900.0);
        o.update(3, 1800.0);
        assert_eq!(o.rows().len(), 3);
        assert_eq!(o.time_set(), 1800.0);
        o.update(3, 0.0);
        assert_eq!(o.time_set(), 0.0);
    }

    #[test]
    fn duration_triggers_resample() {
        let mut o = overlay(0.0);
        o.update(4, 0.0);
        let before = o.rows().to_vec();
        o.update(4, 1800.0);
        assert_eq!(o.rows(), before.as_slice());
        o.update(4, 3600.0);
        assert_ne!(o.rows(), before.as_slice());
        assert_eq!(o.time_set(), 3600.0);
    }

    #[test]
    fn missing_rows_is_an_error() {
        let o = overlay(0.0);
        let mut d = vec![[1.0, 0.0, 0.0]; 2];
        let err = o.apply(&mut d, 10.0).unwrap_err();
        assert_eq!(
            err,
            MoverError::UncertaintyMissing {
                rows: 0,
                particles: 2
            }
        );
    }

    #[test]
    fn remove_rows_drops_flagged() {
        let mut o = overlay(0.0);
        o.update(3, 0.0);
        let keep = o.rows()[1];
        o.remove_rows(&[true, false, true]);
        assert_eq!(o.rows(), &[keep]);
    }

    #[test]
    fn same_seed_same_rows() {
        let mut a = overlay(0.0);
        let mut b = overlay(0.0);
        a.update(16, 0.0);
        b.update(16, 0.0);
        assert_eq!(a.rows(), b.rows());
    }

    proptest! {
        #[test]
        fn rows_stay_in_bounds(n in 1usize..200, seed in any::<u64>()) {
            let mut o = UncertaintyOverlay::new(UncertaintyParams::default(), 7);
            o.reset(seed);
            o.update(n, 0.0);
            for [a, c] in o.rows() {
                prop_assert!(a.abs() <= 0.5);
                prop_assert!(c.abs() <= 0.25);
            }
        }

        #[test]
        fn perturbation_preserves_zero(alpha in -0.5f64..0.5, beta in -0.25f64..0.25) {
            let mut o = overlay(0.0);
            o.rows = vec![[alpha, beta]];
            let mut d = [[0.0, 0.0, 5.0]];
            o.apply(&mut d, 0.0).unwrap();
            prop_assert_eq!(d[0], [0.0, 0.0, 5.0]);
        }
    }
}
