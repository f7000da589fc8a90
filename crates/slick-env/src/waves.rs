//! [`Waves`]: wave height and period derived from wind and water.

use chrono::NaiveDateTime;
use slick_core::{EnvError, TimeBounds};

use crate::water::{Water, GRAVITY};
use crate::wind::Wind;

/// Sea state computed from a [`Wind`] and a [`Water`].
///
/// An imposed `wave_height` on the water wins over the wind-derived
/// estimate. Otherwise height follows the fully developed sea relation
/// `0.243 U² / g`, limited by fetch when the water has one.
#[derive(Clone, Debug)]
pub struct Waves {
    wind: Wind,
    water: Water,
}

impl Waves {
    /// Waves driven by `wind` over `water`.
    pub fn new(wind: Wind, water: Water) -> Self {
        Self { wind, water }
    }

    /// The driving wind.
    pub fn wind(&self) -> &Wind {
        &self.wind
    }

    /// The water body.
    pub fn water(&self) -> &Water {
        &self.water
    }

    /// Valid range is the wind's.
    pub fn time_bounds(&self) -> TimeBounds {
        slick_core::EnvironmentField::time_bounds(&self.wind)
    }

    /// Significant wave height in m at `time`.
    pub fn height(&self, time: NaiveDateTime) -> Result<f64, EnvError> {
        if let Some(h) = self.water.wave_height() {
            return Ok(h);
        }
        let u = self.wind.speed_at(time)?;
        Ok(height_from_wind(u, self.water.fetch()))
    }

    /// Peak wave period in s at `time`.
    pub fn period(&self, time: NaiveDateTime) -> Result<f64, EnvError> {
        let u = self.wind.speed_at(time)?;
        Ok(7.54 * u / GRAVITY)
    }

    /// Efficiency of chemical dispersion for the sea state at `time`.
    pub fn dispersion_efficiency(&self, time: NaiveDateTime) -> Result<f64, EnvError> {
        Ok(dispersion_efficiency(self.height(time)?))
    }
}

/// Wave height for wind speed `u` (m/s), optionally fetch limited.
pub fn height_from_wind(u: f64, fetch: Option<f64>) -> f64 {
    let developed = 0.243 * u * u / GRAVITY;
    match fetch {
        Some(f) => developed.min(0.0016 * (GRAVITY * f).sqrt() * u / GRAVITY),
        None => developed,
    }
}

/// Dispersant efficiency as a function of significant wave height `h`.
/// Never negative.
pub fn dispersion_efficiency(h: f64) -> f64 {
    let w = 0.3 * h;
    let eff = 0.241 + 0.587 * w - 0.191 * w.powi(2) + 0.02616 * w.powi(3)
        - 0.0016 * w.powi(4)
        - 0.000037 * w.powi(5);
    eff.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::{WaterAttr, WaterParams};
    use approx::assert_relative_eq;

    fn t() -> NaiveDateTime {
        NaiveDateTime::default()
    }

    #[test]
    fn developed_sea_height() {
        let waves = Waves::new(Wind::constant(10.0, 0.0), Water::default());
        assert_relative_eq!(waves.height(t()).unwrap(), 24.3 / GRAVITY, epsilon = 1e-9);
        assert_relative_eq!(waves.period(t()).unwrap(), 75.4 / GRAVITY, epsilon = 1e-9);
    }

    #[test]
    fn fetch_limits_height() {
        let water = Water::new(WaterParams {
            fetch: Some(1000.0),
            ..WaterParams::default()
        });
        let waves = Waves::new(Wind::constant(10.0, 0.0), water);
        let limited = 0.0016 * (GRAVITY * 1000.0).sqrt() * 10.0 / GRAVITY;
        assert_relative_eq!(waves.height(t()).unwrap(), limited, epsilon = 1e-12);
    }

    #[test]
    fn imposed_height_wins() {
        let mut water = Water::default();
        water.set(WaterAttr::WaveHeight, 2.0, "m").unwrap();
        let waves = Waves::new(Wind::constant(30.0, 0.0), water);
        assert_eq!(waves.height(t()).unwrap(), 2.0);
    }

    #[test]
    fn calm_water_disperses_at_baseline() {
        assert_relative_eq!(dispersion_efficiency(0.0), 0.241);
        assert!(dispersion_efficiency(1.0) > 0.241);
        assert!(dispersion_efficiency(100.0) >= 0.0);
    }
}
