//! [`ChemicalDispersion`]: dispersant application over a window.

use chrono::NaiveDateTime;
use slick_core::{ActiveWindow, FateFlags};
use slick_env::Waves;
use slick_store::{ArrayDef, SpillContainer};

use crate::cleanup::{
    any_marked, mark_for_cleanup, population, remove_mass, validate_efficiency, Activity,
};
use crate::error::WeathererError;
use crate::mass_balance::MassBalance;
use crate::weatherer::{WeatherContext, Weatherer};

/// Sprays `fraction_sprayed` of the released oil with dispersant between
/// `start` and `stop`.
///
/// The target is `released * fraction_sprayed * efficiency`, fixed on the
/// first active step and removed at a constant rate over the window.
/// Efficiency is either constant or derived from the sea state.
#[derive(Debug)]
pub struct ChemicalDispersion {
    name: String,
    fraction_sprayed: f64,
    efficiency: Option<f64>,
    window: ActiveWindow,
    waves: Option<Waves>,
    rate: [Option<f64>; 2],
    activity: [Activity; 2],
}

impl ChemicalDispersion {
    /// Disperse `fraction_sprayed` in `(0, 1]` of the oil with a fixed
    /// efficiency.
    pub fn new(
        fraction_sprayed: f64,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        efficiency: f64,
    ) -> Result<Self, WeathererError> {
        if !(fraction_sprayed > 0.0 && fraction_sprayed <= 1.0) {
            return Err(WeathererError::InvalidParameter {
                name: "fraction_sprayed",
                value: fraction_sprayed,
                reason: "must be in (0, 1]",
            });
        }
        let window = ActiveWindow::between(start, stop);
        let duration = window.duration().unwrap_or(0.0);
        if duration <= 0.0 {
            return Err(WeathererError::InvalidParameter {
                name: "active_stop",
                value: duration,
                reason: "must be after active_start",
            });
        }
        Ok(Self {
            name: "chem_dispersion".to_string(),
            fraction_sprayed,
            efficiency: Some(validate_efficiency(efficiency)?),
            window,
            waves: None,
            rate: [None; 2],
            activity: [Activity::default(); 2],
        })
    }

    /// Derive efficiency from the wave height of `waves`.
    pub fn with_waves(mut self, waves: Waves) -> Self {
        self.efficiency = None;
        self.waves = Some(waves);
        self
    }

    /// Rename for logs and metrics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Switch the operation on or off.
    pub fn set_on(&mut self, on: bool) {
        self.window.on = on;
    }

    /// Removal rate in kg/s for the certain population, once marked.
    pub fn rate(&self) -> Option<f64> {
        self.rate[0]
    }

    fn efficiency_at(&mut self, time: NaiveDateTime) -> Result<f64, WeathererError> {
        if let Some(e) = self.efficiency {
            return Ok(e);
        }
        match &self.waves {
            Some(waves) => Ok(waves.dispersion_efficiency(time)?),
            None => {
                tracing::warn!(
                    weatherer = %self.name,
                    "no efficiency or waves to compute it from; using 100%"
                );
                self.efficiency = Some(1.0);
                Ok(1.0)
            }
        }
    }
}

impl Weatherer for ChemicalDispersion {
    fn name(&self) -> &str {
        &self.name
    }

    fn ledger_key(&self) -> &'static str {
        "chem_dispersed"
    }

    fn array_types(&self) -> Vec<ArrayDef> {
        vec![ArrayDef::frac_water()]
    }

    fn window(&self) -> ActiveWindow {
        self.window
    }

    fn is_active(&self) -> bool {
        self.activity[0].active
    }

    fn prepare_for_model_run(&mut self, ledger: &mut MassBalance) {
        self.rate = [None; 2];
        self.activity = [Activity::default(); 2];
        if self.window.on {
            ledger.reset(self.ledger_key());
        }
    }

    fn prepare_for_model_step(
        &mut self,
        ctx: &WeatherContext,
        sc: &mut SpillContainer,
    ) -> Result<(), WeathererError> {
        let pop = population(sc);
        let activity = Activity::from_window(&self.window, ctx);
        self.activity[pop] = activity;
        if !activity.active || any_marked(sc, FateFlags::DISPERSE) {
            return Ok(());
        }
        let efficiency = self.efficiency_at(ctx.model_time)?;
        let target = ctx.total_spill_mass * self.fraction_sprayed * efficiency;
        // target is oil mass, not emulsion
        mark_for_cleanup(sc, FateFlags::DISPERSE, target, false, &self.name)?;
        let duration = self.window.duration().unwrap_or(ctx.dt);
        self.rate[pop] = Some(target / duration);
        Ok(())
    }

    fn weather_elements(
        &mut self,
        _ctx: &WeatherContext,
        sc: &mut SpillContainer,
        ledger: &mut MassBalance,
    ) -> Result<(), WeathererError> {
        let pop = population(sc);
        let activity = self.activity[pop];
        let Some(rate) = self.rate[pop] else {
            return Ok(());
        };
        if !activity.active || sc.is_empty() {
            return Ok(());
        }
        let mut data = sc.itersubstancedata(&[], Some(FateFlags::DISPERSE))?;
        for d in &mut data {
            if d.view.is_empty() {
                continue;
            }
            // rate already carries the efficiency
            let removed = remove_mass(&mut d.view, rate * activity.timestep);
            ledger.add(self.ledger_key(), removed);
            tracing::debug!(
                weatherer = %self.name,
                substance = d.substance.name(),
                removed,
                "chemically dispersed"
            );
        }
        sc.update_from_fatedataview(&data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::test_support::container;
    use approx::assert_relative_eq;
    use slick_core::add_seconds;
    use slick_env::{Water, Wind};

    fn t0() -> NaiveDateTime {
        NaiveDateTime::default()
    }

    fn ctx(offset: f64) -> WeatherContext {
        WeatherContext {
            model_time: add_seconds(t0(), offset),
            dt: 900.0,
            elapsed: offset,
            total_spill_mass: 100.0,
        }
    }

    #[test]
    fn disperses_fraction_of_spill_mass() {
        let mut c = ChemicalDispersion::new(0.2, t0(), add_seconds(t0(), 3600.0), 0.5).unwrap();
        let mut sc = container(100, 1.0, false, &c.array_types());
        let mut ledger = MassBalance::new();
        c.prepare_for_model_run(&mut ledger);
        for k in 0..5 {
            let cx = ctx(900.0 * k as f64);
            c.prepare_for_model_step(&cx, &mut sc).unwrap();
            c.weather_elements(&cx, &mut sc, &mut ledger).unwrap();
        }
        assert_relative_eq!(c.rate().unwrap(), 10.0 / 3600.0);
        assert_relative_eq!(ledger.get("chem_dispersed").unwrap(), 10.0, max_relative = 1e-9);
        assert_relative_eq!(sc.store().total_mass(), 90.0, max_relative = 1e-9);
    }

    #[test]
    fn wave_efficiency_is_used_when_no_constant() {
        let waves = Waves::new(Wind::constant(5.0, 0.0), Water::default());
        let expected = waves.dispersion_efficiency(t0()).unwrap();
        let mut c = ChemicalDispersion::new(1.0, t0(), add_seconds(t0(), 3600.0), 1.0)
            .unwrap()
            .with_waves(waves);
        assert_relative_eq!(c.efficiency_at(t0()).unwrap(), expected);
    }

    #[test]
    fn nothing_happens_before_the_window() {
        let mut c = ChemicalDispersion::new(
            0.5,
            add_seconds(t0(), 7200.0),
            add_seconds(t0(), 9000.0),
            1.0,
        )
        .unwrap();
        let mut sc = container(10, 1.0, false, &c.array_types());
        let mut ledger = MassBalance::new();
        c.prepare_for_model_step(&ctx(0.0), &mut sc).unwrap();
        c.weather_elements(&ctx(0.0), &mut sc, &mut ledger).unwrap();
        assert!(c.rate().is_none());
        assert_eq!(sc.store().total_mass(), 10.0);
    }

    #[test]
    fn fraction_must_be_positive() {
        assert!(ChemicalDispersion::new(0.0, t0(), add_seconds(t0(), 1.0), 1.0).is_err());
        assert!(ChemicalDispersion::new(1.5, t0(), add_seconds(t0(), 1.0), 1.0).is_err());
    }
}
