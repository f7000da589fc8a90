//! [`RandomMover`]: horizontal diffusion as a bounded random walk.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use slick_core::{ActiveWindow, FlatEarth};
use slick_store::SpillContainer;

use crate::error::MoverError;
use crate::mover::{in_water_rows, Displacement, MoveContext, Mover};

const RNG_SALT: u64 = 0x6469_6666_7573_6500;

/// Horizontal diffusion with displacement `sqrt(6 D dt) * U(-1, 1)` per
/// axis, which has the variance `2 D dt` of a Gaussian walk.
pub struct RandomMover {
    name: String,
    diffusion_coef: f64,
    uncertain_factor: f64,
    window: ActiveWindow,
    rngs: [ChaCha8Rng; 2],
}

impl RandomMover {
    /// Default diffusion coefficient in cm²/s.
    pub const DEFAULT_DIFFUSION_COEF: f64 = 100_000.0;
    /// Default multiplier on `D` for the uncertain population.
    pub const DEFAULT_UNCERTAIN_FACTOR: f64 = 2.0;

    /// A mover with diffusion coefficient `diffusion_coef` in cm²/s.
    pub fn new(diffusion_coef: f64) -> Result<Self, MoverError> {
        if !(diffusion_coef >= 0.0) {
            return Err(MoverError::InvalidParameter {
                name: "diffusion_coef",
                value: diffusion_coef,
                reason: "must be non-negative",
            });
        }
        Ok(Self {
            name: "diffusion".to_string(),
            diffusion_coef,
            uncertain_factor: Self::DEFAULT_UNCERTAIN_FACTOR,
            window: ActiveWindow::always(),
            rngs: [
                ChaCha8Rng::seed_from_u64(RNG_SALT),
                ChaCha8Rng::seed_from_u64(RNG_SALT ^ 1),
            ],
        })
    }

    /// Multiply `D` by `factor` for the uncertain population.
    pub fn with_uncertain_factor(mut self, factor: f64) -> Result<Self, MoverError> {
        if !(factor >= 1.0) {
            return Err(MoverError::InvalidParameter {
                name: "uncertain_factor",
                value: factor,
                reason: "must be at least 1",
            });
        }
        self.uncertain_factor = factor;
        Ok(self)
    }

    /// Restrict to `window`.
    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.window = window;
        self
    }

    /// Rename for logs and metrics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Diffusion coefficient in cm²/s.
    pub fn diffusion_coef(&self) -> f64 {
        self.diffusion_coef
    }

    /// Largest per-axis step in meters for a population over `dt`.
    pub fn max_step(&self, dt: f64, uncertain: bool) -> f64 {
        let d = if uncertain {
            self.diffusion_coef * self.uncertain_factor
        } else {
            self.diffusion_coef
        };
        (6.0 * (d / 1e4) * dt).sqrt()
    }
}

impl Default for RandomMover {
    fn default() -> Self {
        Self {
            name: "diffusion".to_string(),
            diffusion_coef: Self::DEFAULT_DIFFUSION_COEF,
            uncertain_factor: Self::DEFAULT_UNCERTAIN_FACTOR,
            window: ActiveWindow::always(),
            rngs: [
                ChaCha8Rng::seed_from_u64(RNG_SALT),
                ChaCha8Rng::seed_from_u64(RNG_SALT ^ 1),
            ],
        }
    }
}

impl Mover for RandomMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> ActiveWindow {
        self.window
    }

    fn prepare_for_model_run(&mut self, seed: u64) {
        self.rngs = [
            ChaCha8Rng::seed_from_u64(seed ^ RNG_SALT),
            ChaCha8Rng::seed_from_u64(seed ^ RNG_SALT ^ 1),
        ];
    }

    fn get_move(
        &mut self,
        ctx: &MoveContext,
        sc: &SpillContainer,
    ) -> Result<Displacement, MoverError> {
        let store = sc.store();
        let mut out = Displacement::zeros(store.len());
        if !self.window.overlaps(ctx.model_time, ctx.dt) {
            return Ok(out);
        }
        let dist = self.max_step(ctx.dt, sc.uncertain());
        let rng = &mut self.rngs[usize::from(sc.uncertain())];
        let positions = store.positions();
        for row in in_water_rows(store) {
            let dx = dist * (2.0 * rng.random::<f64>() - 1.0);
            let dy = dist * (2.0 * rng.random::<f64>() - 1.0);
            out.delta[row] = FlatEarth::meters_to_lonlat([dx, dy, 0.0], &positions[row]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use proptest::prelude::*;
    use slick_core::{LeStatus, SimpleSubstance, SpillId, Substance, SubstanceId};
    use std::sync::Arc;

    fn container(n: usize, uncertain: bool) -> SpillContainer {
        let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::non_weathering("oil", 900.0));
        let mut sc = SpillContainer::new(vec![oil], uncertain).unwrap();
        sc.store_mut().append(n, SpillId(0), SubstanceId(0));
        sc
    }

    fn ctx(dt: f64) -> MoveContext {
        MoveContext {
            model_time: NaiveDateTime::default(),
            dt,
            elapsed: 0.0,
        }
    }

    #[test]
    fn step_size_formula() {
        let m = RandomMover::default();
        // D = 10 m^2/s, dt = 600 s
        assert_relative_eq!(m.max_step(600.0, false), (6.0 * 10.0 * 600.0f64).sqrt());
        assert_relative_eq!(m.max_step(600.0, true), (6.0 * 20.0 * 600.0f64).sqrt());
    }

    #[test]
    fn only_in_water_rows_move() {
        let mut m = RandomMover::default();
        m.prepare_for_model_run(5);
        let mut sc = container(3, false);
        sc.store_mut().status_mut()[2] = LeStatus::OnLand;
        let d = m.get_move(&ctx(900.0), &sc).unwrap();
        assert_ne!(d.delta[0], [0.0; 3]);
        assert_eq!(d.delta[2], [0.0; 3]);
        assert!(d.delta.iter().all(|r| r[2] == 0.0));
    }

    #[test]
    fn reseeding_replays() {
        let sc = container(10, false);
        let mut m = RandomMover::default();
        m.prepare_for_model_run(77);
        let a = m.get_move(&ctx(900.0), &sc).unwrap();
        m.prepare_for_model_run(77);
        let b = m.get_move(&ctx(900.0), &sc).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn uncertain_draws_do_not_shift_certain_stream() {
        let certain = container(6, false);
        let uncertain = container(6, true);
        let mut alone = RandomMover::default();
        let mut paired = RandomMover::default();
        alone.prepare_for_model_run(3);
        paired.prepare_for_model_run(3);
        let a = alone.get_move(&ctx(900.0), &certain).unwrap();
        paired.get_move(&ctx(900.0), &uncertain).unwrap();
        let b = paired.get_move(&ctx(900.0), &certain).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_coefficient_is_rejected() {
        assert!(RandomMover::new(-1.0).is_err());
        assert!(RandomMover::new(f64::NAN).is_err());
        assert!(RandomMover::default().with_uncertain_factor(0.5).is_err());
    }

    proptest! {
        #[test]
        fn displacement_is_bounded(seed in any::<u64>(), dt in 1.0f64..7200.0) {
            let sc = container(20, false);
            let mut m = RandomMover::default();
            m.prepare_for_model_run(seed);
            let d = m.get_move(&ctx(dt), &sc).unwrap();
            let bound = m.max_step(dt, false);
            for r in &d.delta {
                let meters = FlatEarth::lonlat_to_meters(*r, &[0.0, 0.0, 0.0]);
                prop_assert!(meters[0].abs() <= bound + 1e-9);
                prop_assert!(meters[1].abs() <= bound + 1e-9);
            }
        }
    }
}
