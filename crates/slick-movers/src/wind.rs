//! [`WindMover`]: windage drift of surface particles.
//!
//! Each surface particle drifts with `windage * wind`. Windages are drawn
//! from the particle's `windage_range` and redrawn whenever its age
//! crosses a multiple of `windage_persist` (`-1` keeps the first draw
//! forever).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use slick_core::{ActiveWindow, FlatEarth, LeStatus, WorldPoint};
use slick_store::{names, ArrayDef, SpillContainer};

use crate::error::MoverError;
use crate::mover::{removed_mask, Displacement, MoveContext, Mover, VectorField};
use crate::uncertainty::{UncertaintyOverlay, UncertaintyParams};

const RNG_SALT: u64 = 0x7769_6e64_6167_6573;
const OVERLAY_SALT: u64 = 0x7769_6e64_756e_6365;

/// Whether a particle of `age` seconds redraws its windage during a
/// step of `dt` seconds.
pub fn windage_expires(age: f64, dt: f64, persist: f64) -> bool {
    if persist == -1.0 {
        return false;
    }
    if persist <= 0.0 {
        return true;
    }
    ((age + dt) / persist).floor() > (age / persist).floor()
}

/// Moves surface particles with a fraction of the wind.
pub struct WindMover {
    name: String,
    wind: VectorField,
    window: ActiveWindow,
    overlay: Option<UncertaintyOverlay>,
    rngs: [ChaCha8Rng; 2],
}

impl WindMover {
    /// A mover driven by `wind`, with no uncertainty overlay.
    pub fn new(wind: VectorField) -> Self {
        Self {
            name: "wind".to_string(),
            wind,
            window: ActiveWindow::always(),
            overlay: None,
            rngs: [
                ChaCha8Rng::seed_from_u64(RNG_SALT),
                ChaCha8Rng::seed_from_u64(RNG_SALT ^ 1),
            ],
        }
    }

    /// Rename for logs and metrics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restrict to `window`.
    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.window = window;
        self
    }

    /// Perturb the uncertain population with `params`.
    pub fn with_uncertainty(mut self, params: UncertaintyParams) -> Result<Self, MoverError> {
        params.validate()?;
        self.overlay = Some(UncertaintyOverlay::new(params, OVERLAY_SALT));
        Ok(self)
    }

    /// The overlay, when configured.
    pub fn overlay(&self) -> Option<&UncertaintyOverlay> {
        self.overlay.as_ref()
    }

    fn resample_windages(&mut self, dt: f64, sc: &mut SpillContainer) -> Result<(), MoverError> {
        let store = sc.store();
        let ranges = store.array(names::WINDAGE_RANGE)?.to_vec();
        let persist = store.array(names::WINDAGE_PERSIST)?.to_vec();
        let due: Vec<usize> = store
            .age()
            .iter()
            .zip(store.status())
            .enumerate()
            .filter(|(i, (age, s))| {
                **s == LeStatus::InWater && windage_expires(**age, dt, persist[*i])
            })
            .map(|(i, _)| i)
            .collect();
        if due.is_empty() {
            return Ok(());
        }
        let rng = &mut self.rngs[usize::from(sc.uncertain())];
        let windages = sc.store_mut().array_mut(names::WINDAGES)?;
        for &i in &due {
            let (lo, hi) = (ranges[2 * i], ranges[2 * i + 1]);
            windages[i] = lo + (hi - lo) * rng.random::<f64>();
        }
        tracing::trace!(rows = due.len(), "windages resampled");
        Ok(())
    }
}

impl Mover for WindMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn array_types(&self) -> Vec<ArrayDef> {
        vec![
            ArrayDef::windages(),
            ArrayDef::windage_range(),
            ArrayDef::windage_persist(),
        ]
    }

    fn window(&self) -> ActiveWindow {
        self.window
    }

    fn prepare_for_model_run(&mut self, seed: u64) {
        self.rngs = [
            ChaCha8Rng::seed_from_u64(seed ^ RNG_SALT),
            ChaCha8Rng::seed_from_u64(seed ^ RNG_SALT ^ 1),
        ];
        if let Some(o) = &mut self.overlay {
            o.reset(seed);
        }
    }

    fn prepare_for_model_step(
        &mut self,
        ctx: &MoveContext,
        sc: &mut SpillContainer,
    ) -> Result<(), MoverError> {
        self.resample_windages(ctx.dt, sc)?;
        if sc.uncertain() {
            if let Some(o) = &mut self.overlay {
                o.update(sc.len(), ctx.elapsed);
            }
        }
        Ok(())
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
        let all = store.positions();
        let rows: Vec<usize> = store
            .status()
            .iter()
            .zip(all)
            .enumerate()
            .filter(|(_, (s, p))| **s == LeStatus::InWater && p[2] == 0.0)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Ok(out);
        }
        let windages = store.array(names::WINDAGES)?;
        let positions: Vec<WorldPoint> = rows.iter().map(|&i| all[i]).collect();
        let winds = self.wind.at(&positions, ctx.model_time)?;
        for (&row, w) in rows.iter().zip(winds) {
            match w {
                Some([u, v]) => {
                    let k = windages[row] * ctx.dt;
                    out.delta[row] = [u * k, v * k, 0.0];
                }
                None => out.off_map.push(row),
            }
        }
        if sc.uncertain() {
            if let Some(o) = &self.overlay {
                o.apply(&mut out.delta, ctx.elapsed)?;
            }
        }
        FlatEarth::meters_to_lonlat_in_place(&mut out.delta, all);
        out.zero_inactive(store.status());
        Ok(out)
    }

    fn model_step_is_done(&mut self, sc: &SpillContainer) -> Result<(), MoverError> {
        if sc.uncertain() {
            if let Some(o) = &mut self.overlay {
                o.remove_rows(&removed_mask(sc.store()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use slick_core::{SimpleSubstance, SpillId, Substance, SubstanceId};
    use slick_env::Wind;
    use std::sync::Arc;

    fn container(n: usize, uncertain: bool) -> SpillContainer {
        let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::non_weathering("oil", 900.0));
        let mut sc = SpillContainer::new(vec![oil], uncertain).unwrap();
        let mover = WindMover::new(Arc::new(Wind::constant(10.0, 270.0)));
        sc.declare_all(&mover.array_types()).unwrap();
        let store = sc.store_mut();
        store.append(n, SpillId(0), SubstanceId(0));
        store.array_mut(names::WINDAGES).unwrap().fill(0.03);
        for r in store.array_mut(names::WINDAGE_RANGE).unwrap().chunks_mut(2) {
            r.copy_from_slice(&[0.01, 0.04]);
        }
        sc
    }

    fn ctx() -> MoveContext {
        MoveContext {
            model_time: NaiveDateTime::default(),
            dt: 900.0,
            elapsed: 0.0,
        }
    }

    #[test]
    fn persistence_rule() {
        assert!(!windage_expires(0.0, 900.0, -1.0));
        assert!(windage_expires(0.0, 900.0, 900.0));
        assert!(!windage_expires(0.0, 600.0, 900.0));
        assert!(windage_expires(600.0, 600.0, 900.0));
        assert!(windage_expires(100.0, 1.0, 0.0));
    }

    #[test]
    fn surface_rows_drift_with_windage() {
        // wind from the west blows eastward at 10 m/s
        let mut mover = WindMover::new(Arc::new(Wind::constant(10.0, 270.0)));
        let mut sc = container(2, false);
        sc.store_mut().positions_mut()[1][2] = 5.0;
        let d = mover.get_move(&ctx(), &sc).unwrap();
        assert_relative_eq!(
            d.delta[0][0],
            10.0 * 0.03 * 900.0 / FlatEarth::METERS_PER_DEGREE,
            max_relative = 1e-12
        );
        assert_eq!(d.delta[1], [0.0; 3]);
    }

    #[test]
    fn windages_stay_within_range_after_resampling() {
        let mut mover = WindMover::new(Arc::new(Wind::constant(5.0, 0.0)));
        mover.prepare_for_model_run(9);
        let mut sc = container(50, false);
        mover.prepare_for_model_step(&ctx(), &mut sc).unwrap();
        let w = sc.store().array(names::WINDAGES).unwrap();
        assert!(w.iter().all(|x| (0.01..=0.04).contains(x)));
        assert!(w.iter().any(|x| *x != 0.03));
    }

    #[test]
    fn infinite_persistence_never_resamples() {
        let mut mover = WindMover::new(Arc::new(Wind::constant(5.0, 0.0)));
        let mut sc = container(5, false);
        sc.store_mut()
            .array_mut(names::WINDAGE_PERSIST)
            .unwrap()
            .fill(-1.0);
        mover.prepare_for_model_step(&ctx(), &mut sc).unwrap();
        assert_eq!(sc.store().array(names::WINDAGES).unwrap(), &[0.03; 5]);
    }

    #[test]
    fn population_streams_are_independent() {
        let run = |with_uncertain: bool| {
            let mut mover = WindMover::new(Arc::new(Wind::constant(5.0, 0.0)));
            mover.prepare_for_model_run(1);
            let mut certain = container(8, false);
            let mut uncertain = container(8, true);
            mover.prepare_for_model_step(&ctx(), &mut certain).unwrap();
            if with_uncertain {
                mover.prepare_for_model_step(&ctx(), &mut uncertain).unwrap();
            }
            mover.prepare_for_model_step(&ctx(), &mut certain).unwrap();
            certain.store().array(names::WINDAGES).unwrap().to_vec()
        };
        assert_eq!(run(false), run(true));
    }
}
