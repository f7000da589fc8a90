//! [`Skimmer`]: mechanical recovery at a constant rate over a window.

use chrono::NaiveDateTime;
use slick_core::{ActiveWindow, FateFlags};
use slick_env::Water;
use slick_store::{names, ArrayDef, SpillContainer};

use crate::cleanup::{
    any_marked, avg_frac_oil, mark_for_cleanup, oil_density, population, primary_substance,
    remove_mass, validate_efficiency, Activity, AmountUnit,
};
use crate::error::WeathererError;
use crate::mass_balance::MassBalance;
use crate::weatherer::{WeatherContext, Weatherer};

/// Skims `amount` of emulsion between `start` and `stop`.
///
/// The rate is `amount / (stop - start)`. Each active step removes
/// `rate * avg_frac_oil * active_seconds * efficiency` from the marked
/// particles, where `avg_frac_oil` discounts the water in the emulsion.
#[derive(Debug)]
pub struct Skimmer {
    name: String,
    amount: f64,
    unit: AmountUnit,
    efficiency: f64,
    window: ActiveWindow,
    water: Option<Water>,
    rate: f64,
    activity: [Activity; 2],
}

impl Skimmer {
    /// Skim `amount` in `units` (mass or volume) from `start` to `stop`.
    pub fn new(
        amount: f64,
        units: &str,
        efficiency: f64,
        start: NaiveDateTime,
        stop: NaiveDateTime,
    ) -> Result<Self, WeathererError> {
        if !(amount >= 0.0) {
            return Err(WeathererError::InvalidParameter {
                name: "amount",
                value: amount,
                reason: "must be non-negative",
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
        let (unit, amount) = AmountUnit::parse(amount, units)?;
        Ok(Self {
            name: "skimmer".to_string(),
            amount,
            unit,
            efficiency: validate_efficiency(efficiency)?,
            window,
            water: None,
            rate: amount / duration,
            activity: [Activity::default(); 2],
        })
    }

    /// Use `water` temperature for volume/mass conversion.
    pub fn with_water(mut self, water: Water) -> Self {
        self.water = Some(water);
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

    /// Amount per second, in SI mass or volume.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Weatherer for Skimmer {
    fn name(&self) -> &str {
        &self.name
    }

    fn ledger_key(&self) -> &'static str {
        "skimmed"
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
        let activity = Activity::from_window(&self.window, ctx);
        self.activity[population(sc)] = activity;
        if !activity.active || any_marked(sc, FateFlags::SKIM) {
            return Ok(());
        }
        let substance = primary_substance(sc, &self.name)?;
        let density = oil_density(substance.as_ref(), self.water.as_ref());
        let target = self.unit.to_kg(self.amount, density) * self.efficiency;
        mark_for_cleanup(
            sc,
            FateFlags::SKIM | FateFlags::SURFACE_WEATHER,
            target,
            true,
            &self.name,
        )?;
        Ok(())
    }

    fn weather_elements(
        &mut self,
        _ctx: &WeatherContext,
        sc: &mut SpillContainer,
        ledger: &mut MassBalance,
    ) -> Result<(), WeathererError> {
        let activity = self.activity[population(sc)];
        if !activity.active || sc.is_empty() {
            return Ok(());
        }
        let mut data = sc.itersubstancedata(&[names::FRAC_WATER], Some(FateFlags::SKIM))?;
        for d in &mut data {
            if d.view.is_empty() {
                continue;
            }
            let density = oil_density(d.substance.as_ref(), self.water.as_ref());
            let amount = self.rate * avg_frac_oil(&d.view, &self.name)? * activity.timestep;
            let target = self.unit.to_kg(amount, density) * self.efficiency;
            let removed = remove_mass(&mut d.view, target);
            ledger.add(self.ledger_key(), removed);
            tracing::debug!(
                weatherer = %self.name,
                substance = d.substance.name(),
                removed,
                "skimmed"
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

    fn t0() -> NaiveDateTime {
        NaiveDateTime::default()
    }

    fn ctx(offset: f64, dt: f64) -> WeatherContext {
        WeatherContext {
            model_time: add_seconds(t0(), offset),
            dt,
            elapsed: offset,
            total_spill_mass: 0.0,
        }
    }

    #[test]
    fn skims_the_full_amount_over_the_window() {
        let mut s = Skimmer::new(50.0, "kg", 1.0, t0(), add_seconds(t0(), 3600.0)).unwrap();
        let mut sc = container(100, 1.0, false, &s.array_types());
        let mut ledger = MassBalance::new();
        s.prepare_for_model_run(&mut ledger);
        // window edges fall mid-step; sub-step resolution still adds up
        for k in 0..6 {
            let c = ctx(-450.0 + 900.0 * k as f64, 900.0);
            s.prepare_for_model_step(&c, &mut sc).unwrap();
            s.weather_elements(&c, &mut sc, &mut ledger).unwrap();
        }
        assert_relative_eq!(ledger.get("skimmed").unwrap(), 50.0, max_relative = 1e-9);
        assert_relative_eq!(sc.store().total_mass(), 50.0, max_relative = 1e-9);
        sc.store().check_mass_invariant(1e-9).unwrap();
    }

    #[test]
    fn marks_only_once() {
        let mut s = Skimmer::new(5.0, "kg", 1.0, t0(), add_seconds(t0(), 3600.0)).unwrap();
        let mut sc = container(20, 1.0, false, &s.array_types());
        s.prepare_for_model_step(&ctx(0.0, 900.0), &mut sc).unwrap();
        s.prepare_for_model_step(&ctx(900.0, 900.0), &mut sc).unwrap();
        let marked = sc
            .store()
            .fate()
            .iter()
            .filter(|f| f.contains(FateFlags::SKIM))
            .count();
        assert_eq!(marked, 5);
    }

    #[test]
    fn inactive_outside_window() {
        let mut s = Skimmer::new(5.0, "kg", 1.0, t0(), add_seconds(t0(), 3600.0)).unwrap();
        let mut sc = container(5, 1.0, false, &s.array_types());
        s.prepare_for_model_step(&ctx(7200.0, 900.0), &mut sc).unwrap();
        assert!(!s.is_active());
        assert!(!any_marked(&sc, FateFlags::SKIM));
    }

    #[test]
    fn volume_amount_uses_oil_density() {
        let s = Skimmer::new(1.0, "m^3", 0.5, t0(), add_seconds(t0(), 100.0)).unwrap();
        assert_relative_eq!(s.rate(), 0.01);
        assert_eq!(s.unit, AmountUnit::Volume);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            Skimmer::new(1.0, "kg", 1.5, t0(), add_seconds(t0(), 10.0)),
            Err(WeathererError::InvalidEfficiency { .. })
        ));
        assert!(Skimmer::new(1.0, "kg", 1.0, t0(), t0()).is_err());
        assert!(matches!(
            Skimmer::new(1.0, "acres", 1.0, t0(), add_seconds(t0(), 10.0)),
            Err(WeathererError::Env(_))
        ));
    }
}
