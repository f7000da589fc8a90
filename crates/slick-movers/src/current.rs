//! [`CurrentMover`]: advection by a water current field.

use slick_core::{ActiveWindow, FlatEarth, WorldPoint};
use slick_store::SpillContainer;

use crate::error::MoverError;
use crate::mover::{in_water_rows, removed_mask, Displacement, MoveContext, Mover, VectorField};
use crate::num_method::NumMethod;
use crate::uncertainty::{UncertaintyOverlay, UncertaintyParams};

const OVERLAY_SALT: u64 = 0x6375_7272_656e_7473;

/// Moves in-water particles with a `(u, v)` current field.
pub struct CurrentMover {
    name: String,
    field: VectorField,
    scale: f64,
    method: NumMethod,
    window: ActiveWindow,
    overlay: UncertaintyOverlay,
}

/// Builder for [`CurrentMover`].
pub struct CurrentMoverBuilder {
    name: String,
    field: VectorField,
    scale: f64,
    method: NumMethod,
    window: ActiveWindow,
    uncertainty: UncertaintyParams,
}

impl CurrentMover {
    /// Start building a mover driven by `field`.
    pub fn builder(field: VectorField) -> CurrentMoverBuilder {
        CurrentMoverBuilder {
            name: "current".to_string(),
            field,
            scale: 1.0,
            method: NumMethod::default(),
            window: ActiveWindow::always(),
            uncertainty: UncertaintyParams::default(),
        }
    }

    /// Multiplier applied to every sampled velocity.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Integration scheme.
    pub fn method(&self) -> NumMethod {
        self.method
    }

    /// Swap the integration scheme. Particle state is unaffected.
    pub fn set_method(&mut self, method: NumMethod) {
        self.method = method;
    }

    /// The uncertainty overlay used for the uncertain population.
    pub fn overlay(&self) -> &UncertaintyOverlay {
        &self.overlay
    }
}

impl CurrentMoverBuilder {
    /// Name used in logs and metrics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Velocity multiplier.
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Integration scheme.
    pub fn method(mut self, method: NumMethod) -> Self {
        self.method = method;
        self
    }

    /// Active window.
    pub fn window(mut self, window: ActiveWindow) -> Self {
        self.window = window;
        self
    }

    /// Uncertainty overlay parameters.
    pub fn uncertainty(mut self, params: UncertaintyParams) -> Self {
        self.uncertainty = params;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<CurrentMover, MoverError> {
        if !self.scale.is_finite() {
            return Err(MoverError::InvalidParameter {
                name: "scale",
                value: self.scale,
                reason: "must be finite",
            });
        }
        self.uncertainty.validate()?;
        Ok(CurrentMover {
            name: self.name,
            field: self.field,
            scale: self.scale,
            method: self.method,
            window: self.window,
            overlay: UncertaintyOverlay::new(self.uncertainty, OVERLAY_SALT),
        })
    }
}

impl Mover for CurrentMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> ActiveWindow {
        self.window
    }

    fn prepare_for_model_run(&mut self, seed: u64) {
        self.overlay.reset(seed);
    }

    fn prepare_for_model_step(
        &mut self,
        ctx: &MoveContext,
        sc: &mut SpillContainer,
    ) -> Result<(), MoverError> {
        if sc.uncertain() {
            self.overlay.update(sc.len(), ctx.elapsed);
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
        let rows = in_water_rows(store);
        if rows.is_empty() {
            return Ok(out);
        }
        let all = store.positions();
        let positions: Vec<WorldPoint> = rows.iter().map(|&i| all[i]).collect();
        let field = &self.field;
        let scale = self.scale;
        let integrated = self
            .method
            .integrate(&positions, ctx.model_time, ctx.dt, |pts, t| {
                Ok(field
                    .at(pts, t)?
                    .into_iter()
                    .map(|v| v.map(|[u, w]| [u * scale, w * scale]))
                    .collect())
            })?;

        for (k, &row) in rows.iter().enumerate() {
            let [dx, dy] = integrated.meters[k];
            out.delta[row] = [dx, dy, 0.0];
            if integrated.off_map[k] {
                out.off_map.push(row);
            }
        }
        if sc.uncertain() {
            self.overlay.apply(&mut out.delta, ctx.elapsed)?;
        }
        FlatEarth::meters_to_lonlat_in_place(&mut out.delta, all);
        out.zero_inactive(store.status());
        Ok(out)
    }

    fn model_step_is_done(&mut self, sc: &SpillContainer) -> Result<(), MoverError> {
        if sc.uncertain() {
            self.overlay.remove_rows(&removed_mask(sc.store()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use slick_core::{LeStatus, SimpleSubstance, SpillId, Substance, SubstanceId};
    use slick_env::{ConstantField, GridField, GridSpec};
    use std::sync::Arc;

    fn container(n: usize, uncertain: bool) -> SpillContainer {
        let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::non_weathering("oil", 900.0));
        let mut sc = SpillContainer::new(vec![oil], uncertain).unwrap();
        let store = sc.store_mut();
        for row in store.append(n, SpillId(0), SubstanceId(0)) {
            store.positions_mut()[row] = [-70.0, 0.0, 0.0];
        }
        sc
    }

    fn ctx(elapsed: f64) -> MoveContext {
        MoveContext {
            model_time: NaiveDateTime::default(),
            dt: 3600.0,
            elapsed,
        }
    }

    fn uniform(u: f64, v: f64) -> VectorField {
        Arc::new(ConstantField::new("current", "m/s", [u, v]))
    }

    #[test]
    fn uniform_current_moves_in_water_rows_only() {
        let mut mover = CurrentMover::builder(uniform(1.0, 0.0))
            .scale(2.0)
            .build()
            .unwrap();
        let mut sc = container(2, false);
        sc.store_mut().status_mut()[1] = LeStatus::OnLand;
        let d = mover.get_move(&ctx(0.0), &sc).unwrap();
        assert_relative_eq!(d.delta[0][0], 7200.0 / FlatEarth::METERS_PER_DEGREE);
        assert_eq!(d.delta[0][1], 0.0);
        assert_eq!(d.delta[1], [0.0; 3]);
        assert!(d.off_map.is_empty());
    }

    #[test]
    fn inactive_window_gives_zero_deltas() {
        let mut mover = CurrentMover::builder(uniform(1.0, 1.0))
            .window(ActiveWindow {
                on: false,
                ..ActiveWindow::always()
            })
            .build()
            .unwrap();
        let d = mover.get_move(&ctx(0.0), &container(3, false)).unwrap();
        assert_eq!(d.delta, vec![[0.0; 3]; 3]);
    }

    #[test]
    fn leaving_the_grid_is_reported_off_map() {
        let spec = GridSpec {
            lon0: -71.0,
            lat0: -1.0,
            dlon: 0.5,
            dlat: 0.5,
            nlon: 3,
            nlat: 5,
        };
        let frames = vec![vec![[0.0, 1.0]; 15]];
        let grid = GridField::new(
            "grid",
            "m/s",
            spec,
            vec![NaiveDateTime::default()],
            frames,
            true,
        )
        .unwrap();
        let mut mover = CurrentMover::builder(Arc::new(grid)).build().unwrap();
        let mut sc = container(2, false);
        sc.store_mut().positions_mut()[1] = [-75.0, 0.0, 0.0];
        let d = mover.get_move(&ctx(0.0), &sc).unwrap();
        assert_eq!(d.off_map, vec![1]);
        assert_eq!(d.delta[1], [0.0; 3]);
        assert!(d.delta[0][1] > 0.0);
    }

    #[test]
    fn uncertain_population_is_perturbed() {
        let mut mover = CurrentMover::builder(uniform(1.0, 0.0)).build().unwrap();
        mover.prepare_for_model_run(11);
        let mut sc = container(4, true);
        mover.prepare_for_model_step(&ctx(0.0), &mut sc).unwrap();
        assert_eq!(mover.overlay().rows().len(), 4);
        let d = mover.get_move(&ctx(0.0), &sc).unwrap();
        let plain = 3600.0 / FlatEarth::METERS_PER_DEGREE;
        assert!(d.delta.iter().any(|r| (r[0] - plain).abs() > 1e-12));
    }

    #[test]
    fn certain_population_ignores_overlay() {
        let mut mover = CurrentMover::builder(uniform(1.0, 0.0)).build().unwrap();
        mover.prepare_for_model_run(11);
        let mut sc = container(4, false);
        mover.prepare_for_model_step(&ctx(0.0), &mut sc).unwrap();
        assert!(mover.overlay().rows().is_empty());
        let d = mover.get_move(&ctx(0.0), &sc).unwrap();
        for r in &d.delta {
            assert_relative_eq!(r[0], 3600.0 / FlatEarth::METERS_PER_DEGREE);
        }
    }

    #[test]
    fn step_done_drops_removed_rows() {
        let mut mover = CurrentMover::builder(uniform(1.0, 0.0)).build().unwrap();
        mover.prepare_for_model_run(3);
        let mut sc = container(3, true);
        mover.prepare_for_model_step(&ctx(0.0), &mut sc).unwrap();
        sc.store_mut().status_mut()[0] = LeStatus::ToBeRemoved;
        mover.model_step_is_done(&sc).unwrap();
        assert_eq!(mover.overlay().rows().len(), 2);
    }

    #[test]
    fn non_finite_scale_is_rejected() {
        let err = CurrentMover::builder(uniform(0.0, 0.0))
            .scale(f64::NAN)
            .build();
        assert!(matches!(
            err,
            Err(MoverError::InvalidParameter { name: "scale", .. })
        ));
    }
}
