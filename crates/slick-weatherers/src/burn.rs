//! [`Burn`]: in-situ burning of a contained slick.
//!
//! The slick is a layer of emulsion of known area and thickness. It burns
//! down at `0.000058 m/s` times the oil fraction of the emulsion, and the
//! burn stops once the layer is 2 mm thick. The end of the burn is
//! therefore derived from the thickness, not configured.

use chrono::NaiveDateTime;
use slick_core::{add_seconds, ActiveWindow, FateFlags};
use slick_env::{Quantity, Water, Wind};
use slick_store::{names, ArrayDef, SpillContainer};

use crate::cleanup::{
    any_marked, avg_frac_oil, mark_for_cleanup, oil_density, population, primary_substance,
    remove_mass, validate_efficiency, Activity,
};
use crate::error::WeathererError;
use crate::mass_balance::MassBalance;
use crate::weatherer::{WeatherContext, Weatherer};

/// Regression rate of the burning layer, m/s.
pub const BURN_CONSTANT: f64 = 0.000058;

/// Thickness at which a burn extinguishes, m.
pub const MIN_THICKNESS: f64 = 0.002;

// absorbs round-off in the accumulated thickness decrements
const THICKNESS_SLACK: f64 = 1e-12;

/// Burn efficiency for wind speed `ws` m/s: `1 - 0.07 ws`, zero above
/// about 14.3 m/s.
pub fn wind_efficiency(ws: f64) -> f64 {
    if ws > 1.0 / 0.07 {
        0.0
    } else {
        1.0 - 0.07 * ws
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct BurnState {
    activity: Activity,
    thickness: f64,
    thick_rate: f64,
    vol_rate: f64,
    stop: Option<NaiveDateTime>,
}

/// In-situ burn of `area` m² of emulsion `thickness` m thick, starting
/// at `start`.
#[derive(Debug)]
pub struct Burn {
    name: String,
    area: f64,
    thickness: f64,
    start: NaiveDateTime,
    on: bool,
    efficiency: Option<f64>,
    wind: Option<Wind>,
    water: Option<Water>,
    state: [BurnState; 2],
}

impl Burn {
    /// A burn of `area` in `area_units` and `thickness` in
    /// `thickness_units`, starting at `start`, with a fixed efficiency.
    pub fn new(
        area: f64,
        area_units: &str,
        thickness: f64,
        thickness_units: &str,
        start: NaiveDateTime,
        efficiency: f64,
    ) -> Result<Self, WeathererError> {
        let area = Quantity::Area.to_si(area, area_units)?;
        let thickness = Quantity::Length.to_si(thickness, thickness_units)?;
        if !(area > 0.0) {
            return Err(WeathererError::InvalidParameter {
                name: "area",
                value: area,
                reason: "must be positive",
            });
        }
        if !(thickness >= 0.0) {
            return Err(WeathererError::InvalidParameter {
                name: "thickness",
                value: thickness,
                reason: "must be non-negative",
            });
        }
        if thickness <= MIN_THICKNESS {
            tracing::warn!(
                thickness,
                min = MIN_THICKNESS,
                "burn thickness at or below the extinction threshold; burn will not occur"
            );
        }
        let mut burn = Self {
            name: "burn".to_string(),
            area,
            thickness,
            start,
            on: true,
            efficiency: Some(validate_efficiency(efficiency)?),
            wind: None,
            water: None,
            state: [BurnState::default(); 2],
        };
        burn.reset_state();
        Ok(burn)
    }

    /// Derive efficiency from `wind` instead of a constant.
    pub fn with_wind_efficiency(mut self, wind: Wind) -> Self {
        self.efficiency = None;
        self.wind = Some(wind);
        self
    }

    /// Compute efficiency from wind when available, else default to 1.
    pub fn with_computed_efficiency(mut self) -> Self {
        self.efficiency = None;
        self
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
        self.on = on;
    }

    /// Current thickness of the certain population's burning layer, m.
    pub fn thickness(&self) -> f64 {
        self.state[0].thickness
    }

    /// Derived end of the certain population's burn.
    pub fn active_stop(&self) -> Option<NaiveDateTime> {
        self.state[0].stop
    }

    fn init_rate_duration(&self, avg_frac_oil: f64) -> BurnState {
        let thick_rate = BURN_CONSTANT * avg_frac_oil;
        let duration = (self.thickness - MIN_THICKNESS) / thick_rate;
        BurnState {
            activity: Activity::default(),
            thickness: self.thickness,
            thick_rate,
            vol_rate: BURN_CONSTANT * avg_frac_oil * avg_frac_oil * self.area,
            stop: duration
                .is_finite()
                .then(|| add_seconds(self.start, duration.max(0.0))),
        }
    }

    fn reset_state(&mut self) {
        let s = self.init_rate_duration(1.0);
        self.state = [s, s];
    }

    fn window_for(&self, pop: usize) -> ActiveWindow {
        ActiveWindow {
            on: self.on,
            start: Some(self.start),
            stop: self.state[pop].stop.or(Some(self.start)),
        }
    }

    fn efficiency_at(&mut self, time: NaiveDateTime) -> Result<f64, WeathererError> {
        if let Some(e) = self.efficiency {
            return Ok(e);
        }
        match &self.wind {
            Some(wind) => Ok(wind_efficiency(wind.speed_at(time)?)),
            None => {
                tracing::warn!(
                    weatherer = %self.name,
                    "no efficiency or wind to compute it from; using 100%"
                );
                self.efficiency = Some(1.0);
                Ok(1.0)
            }
        }
    }
}

impl Weatherer for Burn {
    fn name(&self) -> &str {
        &self.name
    }

    fn ledger_key(&self) -> &'static str {
        "burned"
    }

    fn array_types(&self) -> Vec<ArrayDef> {
        vec![ArrayDef::frac_water()]
    }

    fn window(&self) -> ActiveWindow {
        self.window_for(0)
    }

    fn is_active(&self) -> bool {
        self.state[0].activity.active
    }

    fn prepare_for_model_run(&mut self, ledger: &mut MassBalance) {
        self.reset_state();
        if self.on {
            ledger.reset(self.ledger_key());
        }
    }

    fn prepare_for_model_step(
        &mut self,
        ctx: &WeatherContext,
        sc: &mut SpillContainer,
    ) -> Result<(), WeathererError> {
        let pop = population(sc);
        self.state[pop].activity = Activity::from_window(&self.window_for(pop), ctx);
        if !self.state[pop].activity.active {
            return Ok(());
        }
        if self.state[pop].thickness <= MIN_THICKNESS + THICKNESS_SLACK {
            self.state[pop].activity.active = false;
            return Ok(());
        }
        if any_marked(sc, FateFlags::BURN) {
            return Ok(());
        }

        let substance = primary_substance(sc, &self.name)?;
        let density = oil_density(substance.as_ref(), self.water.as_ref());
        let efficiency = self.efficiency.unwrap_or(1.0);
        let target = efficiency * self.area * self.thickness * density;
        mark_for_cleanup(sc, FateFlags::BURN, target, true, &self.name)?;

        // frac_water of the marked emulsion is fixed from here on
        let view = sc.store().view(
            &sc.store()
                .select(&slick_store::Selector::in_water().with_fate(FateFlags::BURN)),
            &[names::FRAC_WATER],
        )?;
        let afo = avg_frac_oil(&view, &self.name)?;
        let mut state = self.init_rate_duration(afo);
        state.activity = Activity::from_window(
            &ActiveWindow {
                stop: state.stop.or(Some(self.start)),
                ..self.window_for(pop)
            },
            ctx,
        );
        self.state[pop] = state;
        tracing::debug!(
            weatherer = %self.name,
            avg_frac_oil = afo,
            stop = ?state.stop,
            "burn parameters set"
        );
        Ok(())
    }

    fn weather_elements(
        &mut self,
        ctx: &WeatherContext,
        sc: &mut SpillContainer,
        ledger: &mut MassBalance,
    ) -> Result<(), WeathererError> {
        let pop = population(sc);
        let state = self.state[pop];
        if !state.activity.active || sc.is_empty() {
            return Ok(());
        }
        let efficiency = self.efficiency_at(ctx.model_time)?;
        let mut data = sc.itersubstancedata(&[names::FRAC_WATER], Some(FateFlags::BURN))?;
        let mut burning = false;
        for d in &mut data {
            if d.view.is_empty() {
                continue;
            }
            burning = true;
            let density = oil_density(d.substance.as_ref(), self.water.as_ref());
            let volume = state.vol_rate * efficiency * state.activity.timestep;
            let removed = remove_mass(&mut d.view, volume * density);
            ledger.add(self.ledger_key(), removed);
            tracing::debug!(
                weatherer = %self.name,
                substance = d.substance.name(),
                removed,
                "burned"
            );
        }
        sc.update_from_fatedataview(&data)?;
        // the slick only thins while there is oil under the fire
        if !burning {
            return Ok(());
        }

        let s = &mut self.state[pop];
        s.thickness -= s.thick_rate * efficiency * state.activity.timestep;
        if s.thickness <= MIN_THICKNESS + THICKNESS_SLACK {
            s.activity.active = false;
            tracing::info!(
                weatherer = %self.name,
                thickness = s.thickness,
                "burn extinguished at minimum thickness"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::test_support::container;
    use approx::assert_relative_eq;

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
    fn derived_stop_follows_thickness() {
        let b = Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0).unwrap();
        let expected = 0.001 / BURN_CONSTANT;
        let stop = b.active_stop().unwrap();
        assert_relative_eq!(
            slick_core::seconds_between(t0(), stop),
            expected,
            epsilon = 1e-3
        );
    }

    #[test]
    fn wind_efficiency_curve() {
        assert_eq!(wind_efficiency(0.0), 1.0);
        assert_relative_eq!(wind_efficiency(10.0), 0.3);
        assert_eq!(wind_efficiency(15.0), 0.0);
    }

    #[test]
    fn thin_slick_never_burns() {
        let mut b = Burn::new(10.0, "m^2", 2.0, "mm", t0(), 1.0).unwrap();
        let mut sc = container(10, 1.0, false, &b.array_types());
        b.prepare_for_model_step(&ctx(0.0, 60.0), &mut sc).unwrap();
        assert!(!b.is_active());
        assert!(!any_marked(&sc, FateFlags::BURN));
    }

    #[test]
    fn burn_self_terminates_below_two_millimeters() {
        // 10 m² x 3 mm of oil at 900 kg/m³ is 27 kg
        let mut b = Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0).unwrap();
        let mut sc = container(40, 1.0, false, &b.array_types());
        let mut ledger = MassBalance::new();
        b.prepare_for_model_run(&mut ledger);

        let mut removed_per_step = Vec::new();
        let mut active_per_step = Vec::new();
        for k in 0..8 {
            let c = ctx(5.0 * k as f64, 5.0);
            let before = ledger.get("burned").unwrap();
            b.prepare_for_model_step(&c, &mut sc).unwrap();
            active_per_step.push(b.is_active());
            b.weather_elements(&c, &mut sc, &mut ledger).unwrap();
            removed_per_step.push(ledger.get("burned").unwrap() - before);
        }

        // 1 mm at 0.058 mm/s takes about 17.2 s: steps 0..=3 burn
        assert_eq!(&active_per_step[..4], &[true; 4]);
        assert!(removed_per_step[..4].iter().all(|m| *m > 0.0));
        assert!(removed_per_step[4..].iter().all(|m| *m == 0.0));
        assert!(!b.is_active());
        assert!(b.thickness() <= MIN_THICKNESS + 1e-12);

        // volume burned = rate * duration = 10 m² * 1 mm
        assert_relative_eq!(ledger.get("burned").unwrap(), 9.0, max_relative = 1e-9);
        sc.store().check_mass_invariant(1e-9).unwrap();
    }

    #[test]
    fn thickness_holds_when_nothing_is_marked() {
        let mut b = Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0).unwrap();
        let mut sc = container(40, 1.0, false, &b.array_types());
        let mut ledger = MassBalance::new();
        b.prepare_for_model_run(&mut ledger);

        let c = ctx(0.0, 5.0);
        b.prepare_for_model_step(&c, &mut sc).unwrap();
        assert!(b.is_active());
        // The marked oil leaves the burn before it is weathered.
        for f in sc.store_mut().fate_mut() {
            *f = FateFlags::SURFACE_WEATHER;
        }
        let before = b.thickness();
        b.weather_elements(&c, &mut sc, &mut ledger).unwrap();

        assert_eq!(b.thickness(), before);
        assert_eq!(ledger.get("burned"), Some(0.0));
        assert!(b.is_active());
        assert_relative_eq!(sc.store().total_mass(), 40.0, max_relative = 1e-12);
    }

    #[test]
    fn missing_wind_defaults_to_full_efficiency() {
        let mut b = Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0)
            .unwrap()
            .with_computed_efficiency();
        assert_eq!(b.efficiency_at(t0()).unwrap(), 1.0);
    }

    #[test]
    fn strong_wind_stops_burning() {
        let mut b = Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0)
            .unwrap()
            .with_wind_efficiency(Wind::constant(20.0, 0.0));
        assert_eq!(b.efficiency_at(t0()).unwrap(), 0.0);
    }
}
