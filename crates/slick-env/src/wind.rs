//! [`Wind`]: a spatially uniform wind time series.

use chrono::NaiveDateTime;
use slick_core::{EnvError, EnvironmentField, TimeBounds, WorldPoint};

use crate::field::TimeSeries;

/// `(u, v)` components of a wind blowing *from* `direction` degrees
/// (meteorological convention, clockwise from north) at `speed`.
pub fn uv_from_speed_direction(speed: f64, direction: f64) -> [f64; 2] {
    let rad = direction.to_radians();
    [-speed * rad.sin(), -speed * rad.cos()]
}

/// Wind velocity in m/s, uniform in space and linear in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Wind {
    series: TimeSeries<[f64; 2]>,
}

impl Wind {
    /// Wrap an existing `(u, v)` series in m/s.
    pub fn new(series: TimeSeries<[f64; 2]>) -> Self {
        Self { series }
    }

    /// Build from `(time, u, v)` samples.
    pub fn from_uv(
        samples: Vec<(NaiveDateTime, [f64; 2])>,
        extrapolate: bool,
    ) -> Result<Self, EnvError> {
        Ok(Self::new(TimeSeries::new("wind", "m/s", samples, extrapolate)?))
    }

    /// Build from `(time, speed, direction)` samples, direction in
    /// degrees the wind blows from.
    pub fn from_speed_direction(
        samples: Vec<(NaiveDateTime, f64, f64)>,
        extrapolate: bool,
    ) -> Result<Self, EnvError> {
        let uv = samples
            .into_iter()
            .map(|(t, s, d)| (t, uv_from_speed_direction(s, d)))
            .collect();
        Self::from_uv(uv, extrapolate)
    }

    /// A steady wind valid at all times.
    pub fn constant(speed: f64, direction: f64) -> Self {
        Self::new(TimeSeries::constant(
            "wind",
            "m/s",
            uv_from_speed_direction(speed, direction),
        ))
    }

    /// Velocity at `time`.
    pub fn velocity_at(&self, time: NaiveDateTime) -> Result<[f64; 2], EnvError> {
        self.series.value_at(time)
    }

    /// Speed magnitude at `time`.
    pub fn speed_at(&self, time: NaiveDateTime) -> Result<f64, EnvError> {
        let [u, v] = self.velocity_at(time)?;
        Ok(u.hypot(v))
    }

    /// Mean speed over `[time, time + dt]`, sampled at both ends and the
    /// midpoint.
    pub fn mean_speed(&self, time: NaiveDateTime, dt: f64) -> Result<f64, EnvError> {
        let mid = slick_core::add_seconds(time, dt / 2.0);
        let end = slick_core::add_seconds(time, dt);
        Ok((self.speed_at(time)? + 2.0 * self.speed_at(mid)? + self.speed_at(end)?) / 4.0)
    }
}

impl EnvironmentField for Wind {
    type Value = [f64; 2];

    fn name(&self) -> &str {
        self.series.name()
    }

    fn units(&self) -> &str {
        self.series.units()
    }

    fn time_bounds(&self) -> TimeBounds {
        self.series.time_bounds()
    }

    fn at(
        &self,
        points: &[WorldPoint],
        time: NaiveDateTime,
    ) -> Result<Vec<Option<[f64; 2]>>, EnvError> {
        self.series.at(points, time)
    }
}
