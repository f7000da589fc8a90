//! [`RiseVelocityMover`]: buoyant rise of subsurface droplets.

use slick_core::ActiveWindow;
use slick_store::{names, ArrayDef, SpillContainer};

use crate::error::MoverError;
use crate::mover::{in_water_rows, Displacement, MoveContext, Mover};

/// Gravity used by the droplet rise formulas.
const G: f64 = 9.8;

/// Terminal rise velocity in m/s of an oil droplet of diameter `d` (m).
///
/// Small droplets follow Stokes' law; above the critical diameter
/// `9.52 nu^(2/3) / g'^(1/3)` the large-droplet form `sqrt(8/3 g' d)`
/// applies, where `g' = g (1 - rho_oil / rho_water)`. A droplet denser
/// than the water gets a negative (sinking) Stokes velocity.
pub fn rise_velocity_from_drop_size(
    water_density: f64,
    water_viscosity: f64,
    le_density: f64,
    diameter: f64,
) -> f64 {
    let g_reduced = G * (1.0 - le_density / water_density);
    let stokes = G * diameter * diameter * (1.0 - le_density / water_density)
        / (18.0 * water_viscosity);
    if g_reduced <= 0.0 {
        return stokes;
    }
    let critical = 9.52 * water_viscosity.powf(2.0 / 3.0) / g_reduced.cbrt();
    if diameter < critical {
        stokes
    } else {
        (8.0 / 3.0 * g_reduced * diameter).sqrt()
    }
}

/// Moves in-water particles up by their `rise_vel` column, stopping at
/// the surface.
pub struct RiseVelocityMover {
    name: String,
    window: ActiveWindow,
}

impl RiseVelocityMover {
    /// A mover active at all times.
    pub fn new() -> Self {
        Self {
            name: "rise_velocity".to_string(),
            window: ActiveWindow::always(),
        }
    }

    /// Restrict to `window`.
    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.window = window;
        self
    }
}

impl Default for RiseVelocityMover {
    fn default() -> Self {
        Self::new()
    }
}

impl Mover for RiseVelocityMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn array_types(&self) -> Vec<ArrayDef> {
        vec![ArrayDef::rise_vel()]
    }

    fn window(&self) -> ActiveWindow {
        self.window
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
        let rise = store.array(names::RISE_VEL)?;
        let positions = store.positions();
        for row in in_water_rows(store) {
            let z = positions[row][2];
            // depth is positive down; never rise above the surface
            out.delta[row][2] = (-rise[row] * ctx.dt).max(-z);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use slick_core::{SimpleSubstance, SpillId, Substance, SubstanceId};
    use std::sync::Arc;

    #[test]
    fn small_droplets_follow_stokes() {
        let d = 50e-6;
        let v = rise_velocity_from_drop_size(1020.0, 1e-6, 900.0, d);
        let expected = 9.8 * d * d * (1.0 - 900.0 / 1020.0) / 18e-6;
        assert_relative_eq!(v, expected, max_relative = 1e-12);
    }

    #[test]
    fn large_droplets_use_form_drag() {
        let d = 0.01;
        let v = rise_velocity_from_drop_size(1020.0, 1e-6, 900.0, d);
        let gp = 9.8 * (1.0 - 900.0 / 1020.0);
        assert_relative_eq!(v, (8.0 / 3.0 * gp * d).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn dense_droplets_sink() {
        assert!(rise_velocity_from_drop_size(1000.0, 1e-6, 1050.0, 1e-4) < 0.0);
    }

    #[test]
    fn rise_is_clamped_at_surface() {
        let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::non_weathering("oil", 900.0));
        let mut sc = SpillContainer::new(vec![oil], false).unwrap();
        sc.declare_all(&[ArrayDef::rise_vel()]).unwrap();
        let store = sc.store_mut();
        store.append(2, SpillId(0), SubstanceId(0));
        store.positions_mut()[0][2] = 100.0;
        store.positions_mut()[1][2] = 1.0;
        store.array_mut(names::RISE_VEL).unwrap().fill(0.01);
        let ctx = MoveContext {
            model_time: NaiveDateTime::default(),
            dt: 900.0,
            elapsed: 0.0,
        };
        let d = RiseVelocityMover::new().get_move(&ctx, &sc).unwrap();
        assert_relative_eq!(d.delta[0][2], -9.0);
        assert_relative_eq!(d.delta[1][2], -1.0);
    }
}
