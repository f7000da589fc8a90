//! [`Biodegradation`]: first-order microbial decay of dispersed droplets.

use std::f64::consts::PI;

use slick_core::{ActiveWindow, ComponentKind, FateFlags, Substance};
use slick_env::Water;
use slick_store::{names, ArrayDef, SpillContainer};

use crate::cleanup::{population, Activity};
use crate::error::WeathererError;
use crate::mass_balance::MassBalance;
use crate::weatherer::{WeatherContext, Weatherer};

/// Water temperature (°C) below which arctic rates apply.
pub const ARCTIC_THRESHOLD_C: f64 = 6.0;

/// Boiling point (K) splitting light from heavy aromatics.
pub const AROMATIC_SPLIT_K: f64 = 630.0;

/// Decay rate constant of a component.
///
/// Only saturates and aromatics degrade; resins and asphaltenes get 0.
pub fn rate_constant(kind: ComponentKind, boiling_point: f64, water_temp_c: f64) -> f64 {
    let arctic = water_temp_c < ARCTIC_THRESHOLD_C;
    let light = boiling_point < AROMATIC_SPLIT_K;
    match (kind, arctic, light) {
        (ComponentKind::Saturate, true, _) => 0.128807242,
        (ComponentKind::Saturate, false, _) => 0.941386396,
        (ComponentKind::Aromatic, true, true) => 0.126982603,
        (ComponentKind::Aromatic, true, false) => 0.021054707,
        (ComponentKind::Aromatic, false, true) => 0.575541103,
        (ComponentKind::Aromatic, false, false) => 0.084840485,
        _ => 0.0,
    }
}

/// Per-component rate constants for `substance` in water at `temp_c`.
pub fn rate_constants(substance: &dyn Substance, temp_c: f64) -> Vec<f64> {
    let kinds = substance.component_kinds();
    let bps = substance.boiling_points();
    (0..substance.num_components())
        .map(|i| match (kinds.get(i), bps.get(i)) {
            (Some(&k), Some(&bp)) => rate_constant(k, bp, temp_c),
            _ => 0.0,
        })
        .collect()
}

/// Degrades saturate and aromatic mass of subsurface droplets.
///
/// Each component of a particle of total mass `M` and droplet diameter
/// `d` decays over `dt` as `m * exp(-4 pi d^2 k dt / M)`.
#[derive(Debug)]
pub struct Biodegradation {
    name: String,
    water: Water,
    window: ActiveWindow,
    activity: [Activity; 2],
}

impl Biodegradation {
    /// Biodegradation driven by `water` temperature.
    pub fn new(water: Water) -> Self {
        Self {
            name: "biodegradation".to_string(),
            water,
            window: ActiveWindow::always(),
            activity: [Activity::default(); 2],
        }
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

    /// Water temperature in °C.
    pub fn water_temp_c(&self) -> f64 {
        self.water.temperature() - 273.15
    }
}

impl Weatherer for Biodegradation {
    fn name(&self) -> &str {
        &self.name
    }

    fn ledger_key(&self) -> &'static str {
        "bio_degradation"
    }

    fn array_types(&self) -> Vec<ArrayDef> {
        vec![ArrayDef::droplet_diameter()]
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
        self.activity[population(sc)] = Activity::from_window(&self.window, ctx);
        Ok(())
    }

    fn weather_elements(
        &mut self,
        _ctx: &WeatherContext,
        sc: &mut SpillContainer,
        ledger: &mut MassBalance,
    ) -> Result<(), WeathererError> {
        let activity = self.activity[population(sc)];
        if !activity.active || sc.num_released() == 0 {
            return Ok(());
        }
        let temp_c = self.water_temp_c();
        let mut data =
            sc.itersubstancedata(&[names::DROPLET_DIAMETER], Some(FateFlags::SUBSURFACE))?;
        for d in &mut data {
            if d.view.is_empty() {
                continue;
            }
            let k = rate_constants(d.substance.as_ref(), temp_c);
            let width = d.view.num_components();
            let diameters = d.view.array(names::DROPLET_DIAMETER)?.to_vec();
            let totals = d.view.mass().to_vec();
            let before = d.view.total_mass();
            let components = d.view.mass_components_mut();
            for (row, (diam, total)) in diameters.iter().zip(&totals).enumerate() {
                if *total <= 0.0 {
                    continue;
                }
                let area = 4.0 * PI * diam * diam;
                for (c, kc) in components[row * width..(row + 1) * width].iter_mut().zip(&k) {
                    *c *= (-area * kc * activity.timestep / total).exp();
                }
            }
            d.view.recompute_mass();
            let removed = before - d.view.total_mass();
            ledger.add(self.ledger_key(), removed);
            tracing::debug!(
                weatherer = %self.name,
                substance = d.substance.name(),
                removed,
                "biodegraded"
            );
        }
        sc.update_from_fatedataview(&data)?;
        Ok(())
    }
}
