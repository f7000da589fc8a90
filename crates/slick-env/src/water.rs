//! [`Water`]: bulk properties of the receiving water body.

use std::fmt;

use serde::{Deserialize, Serialize};
use slick_core::{EnvError, TimeBounds};

use crate::units::Quantity;

/// Standard gravity used by the environment objects, m/s².
pub const GRAVITY: f64 = 9.80665;

/// Attributes of [`Water`] addressable through [`Water::get`] and
/// [`Water::set`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterAttr {
    /// Water temperature.
    Temperature,
    /// Salinity.
    Salinity,
    /// Suspended sediment concentration.
    Sediment,
    /// Significant wave height, if imposed.
    WaveHeight,
    /// Fetch, if limited.
    Fetch,
    /// Kinematic viscosity.
    KinematicViscosity,
    /// Density (derived; read-only).
    Density,
}

impl WaterAttr {
    /// Unit quantity of the attribute.
    pub fn quantity(self) -> Quantity {
        match self {
            WaterAttr::Temperature => Quantity::Temperature,
            WaterAttr::Salinity => Quantity::Salinity,
            WaterAttr::Sediment | WaterAttr::Density => Quantity::Concentration,
            WaterAttr::WaveHeight | WaterAttr::Fetch => Quantity::Length,
            WaterAttr::KinematicViscosity => Quantity::KinematicViscosity,
        }
    }
}

impl fmt::Display for WaterAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaterAttr::Temperature => "temperature",
            WaterAttr::Salinity => "salinity",
            WaterAttr::Sediment => "sediment",
            WaterAttr::WaveHeight => "wave_height",
            WaterAttr::Fetch => "fetch",
            WaterAttr::KinematicViscosity => "kinematic_viscosity",
            WaterAttr::Density => "density",
        };
        f.write_str(s)
    }
}

/// Serializable water parameters, all SI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    /// Temperature in K.
    pub temperature: f64,
    /// Salinity in psu.
    pub salinity: f64,
    /// Sediment load in kg/m³.
    pub sediment: f64,
    /// Imposed significant wave height in m.
    pub wave_height: Option<f64>,
    /// Fetch in m.
    pub fetch: Option<f64>,
    /// Kinematic viscosity in m²/s.
    pub kinematic_viscosity: f64,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            temperature: 300.0,
            salinity: 35.0,
            sediment: 0.005,
            wave_height: None,
            fetch: None,
            kinematic_viscosity: 1e-6,
        }
    }
}

/// Water properties, constant in space and time.
///
/// Density follows the EOS-80 one-atmosphere equation of state and is
/// cached for the last two `(salinity, temperature)` pairs seen by
/// [`set`](Self::set).
#[derive(Clone, Debug, PartialEq)]
pub struct Water {
    params: WaterParams,
    density_cache: [Option<((f64, f64), f64)>; 2],
}

impl Default for Water {
    fn default() -> Self {
        Self::new(WaterParams::default())
    }
}

impl Water {
    /// Water with the given parameters.
    pub fn new(params: WaterParams) -> Self {
        let mut w = Self {
            params,
            density_cache: [None, None],
        };
        w.refresh_density();
        w
    }

    /// The parameters, SI.
    pub fn params(&self) -> &WaterParams {
        &self.params
    }

    /// Water never limits the model's time range.
    pub fn time_bounds(&self) -> TimeBounds {
        TimeBounds::unbounded()
    }

    /// Temperature in K.
    pub fn temperature(&self) -> f64 {
        self.params.temperature
    }

    /// Salinity in psu.
    pub fn salinity(&self) -> f64 {
        self.params.salinity
    }

    /// Kinematic viscosity in m²/s.
    pub fn kinematic_viscosity(&self) -> f64 {
        self.params.kinematic_viscosity
    }

    /// Imposed wave height, if any.
    pub fn wave_height(&self) -> Option<f64> {
        self.params.wave_height
    }

    /// Fetch, if any.
    pub fn fetch(&self) -> Option<f64> {
        self.params.fetch
    }

    /// Density in kg/m³.
    pub fn density(&self) -> f64 {
        let key = (self.params.salinity, self.params.temperature);
        self.density_cache
            .iter()
            .flatten()
            .find(|(k, _)| *k == key)
            .map_or_else(|| density_eos80(key.1 - 273.15, key.0), |&(_, rho)| rho)
    }

    fn refresh_density(&mut self) {
        let key = (self.params.salinity, self.params.temperature);
        if self.density_cache.iter().flatten().any(|(k, _)| *k == key) {
            return;
        }
        let rho = density_eos80(key.1 - 273.15, key.0);
        tracing::debug!(salinity = key.0, temperature = key.1, rho, "water density updated");
        self.density_cache = [Some((key, rho)), self.density_cache[0]];
    }

    /// Read an attribute in `unit`. `None` for unset optional attributes.
    pub fn get(&self, attr: WaterAttr, unit: &str) -> Result<Option<f64>, EnvError> {
        let si = match attr {
            WaterAttr::Temperature => Some(self.params.temperature),
            WaterAttr::Salinity => Some(self.params.salinity),
            WaterAttr::Sediment => Some(self.params.sediment),
            WaterAttr::WaveHeight => self.params.wave_height,
            WaterAttr::Fetch => self.params.fetch,
            WaterAttr::KinematicViscosity => Some(self.params.kinematic_viscosity),
            WaterAttr::Density => Some(self.density()),
        };
        si.map(|v| attr.quantity().from_si(v, unit)).transpose()
    }

    /// Set an attribute from a value in `unit`.
    pub fn set(&mut self, attr: WaterAttr, value: f64, unit: &str) -> Result<(), EnvError> {
        let si = attr.quantity().to_si(value, unit)?;
        match attr {
            WaterAttr::Temperature => self.params.temperature = si,
            WaterAttr::Salinity => self.params.salinity = si,
            WaterAttr::Sediment => self.params.sediment = si,
            WaterAttr::WaveHeight => self.params.wave_height = Some(si),
            WaterAttr::Fetch => self.params.fetch = Some(si),
            WaterAttr::KinematicViscosity => self.params.kinematic_viscosity = si,
            WaterAttr::Density => {
                return Err(EnvError::UnknownAttribute {
                    name: "density (read-only)".to_string(),
                })
            }
        }
        self.refresh_density();
        Ok(())
    }
}

/// Seawater density at one atmosphere (UNESCO EOS-80), `t` in °C and
/// `s` in psu.
pub fn density_eos80(t: f64, s: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;
    let rho_w = 999.842594 + 6.793952e-2 * t - 9.095290e-3 * t2 + 1.001685e-4 * t3
        - 1.120083e-6 * t4
        + 6.536336e-9 * t5;
    let a = 8.24493e-1 - 4.0899e-3 * t + 7.6438e-5 * t2 - 8.2467e-7 * t3 + 5.3875e-9 * t4;
    let b = -5.72466e-3 + 1.0227e-4 * t - 1.6546e-6 * t2;
    let c0 = 4.8314e-4;
    rho_w + a * s + b * s.max(0.0).powf(1.5) + c0 * s * s
}
