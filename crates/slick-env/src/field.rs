//! Concrete [`EnvironmentField`] implementations.
//!
//! - [`ConstantField`]: one value everywhere, always.
//! - [`TimeSeries`]: spatially uniform, linear in time.
//! - [`GridField`]: regular lon/lat grid, bilinear in space and linear in
//!   time. Points outside the grid sample as `None`.

use chrono::NaiveDateTime;
use slick_core::{EnvError, EnvironmentField, Interpolate, TimeBounds, WorldPoint};

use crate::time_index::{Bracket, TimeIndex};

fn blend<V: Interpolate>(values: &[V], b: Bracket) -> V {
    if b.lo == b.hi {
        values[b.lo]
    } else {
        V::lerp(values[b.lo], values[b.hi], b.frac)
    }
}

// ── ConstantField ──────────────────────────────────────────────────

/// A field with the same value at every position and time.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantField<V> {
    name: String,
    units: String,
    value: V,
}

impl<V: Interpolate> ConstantField<V> {
    /// A constant field.
    pub fn new(name: impl Into<String>, units: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            value,
        }
    }

    /// The constant value.
    pub fn value(&self) -> V {
        self.value
    }
}

impl<V: Interpolate> EnvironmentField for ConstantField<V> {
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn time_bounds(&self) -> TimeBounds {
        TimeBounds::unbounded()
    }

    fn at(&self, points: &[WorldPoint], _time: NaiveDateTime) -> Result<Vec<Option<V>>, EnvError> {
        Ok(vec![Some(self.value); points.len()])
    }
}

// ── TimeSeries ─────────────────────────────────────────────────────

/// A spatially uniform value varying linearly between samples.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries<V> {
    name: String,
    units: String,
    index: TimeIndex,
    values: Vec<V>,
}

impl<V: Interpolate> TimeSeries<V> {
    /// Build from `(time, value)` samples.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        samples: Vec<(NaiveDateTime, V)>,
        extrapolate: bool,
    ) -> Result<Self, EnvError> {
        let (times, values): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        Ok(Self {
            name: name.into(),
            units: units.into(),
            index: TimeIndex::new(times, extrapolate)?,
            values,
        })
    }

    /// A series holding `value` at all times.
    pub fn constant(name: impl Into<String>, units: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            index: TimeIndex::single(NaiveDateTime::default()),
            values: vec![value],
        }
    }

    /// Value at `time`.
    pub fn value_at(&self, time: NaiveDateTime) -> Result<V, EnvError> {
        Ok(blend(&self.values, self.index.locate(time)?))
    }

    /// The underlying time index.
    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Toggle extrapolation.
    pub fn set_extrapolate(&mut self, extrapolate: bool) {
        self.index.set_extrapolate(extrapolate);
    }
}

impl<V: Interpolate> EnvironmentField for TimeSeries<V> {
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn time_bounds(&self) -> TimeBounds {
        self.index.bounds()
    }

    fn at(&self, points: &[WorldPoint], time: NaiveDateTime) -> Result<Vec<Option<V>>, EnvError> {
        let v = self.value_at(time)?;
        Ok(vec![Some(v); points.len()])
    }
}

// ── GridField ──────────────────────────────────────────────────────

/// Geometry of a regular lon/lat grid of nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Longitude of the first column of nodes.
    pub lon0: f64,
    /// Latitude of the first row of nodes.
    pub lat0: f64,
    /// Node spacing in longitude (degrees, > 0).
    pub dlon: f64,
    /// Node spacing in latitude (degrees, > 0).
    pub dlat: f64,
    /// Number of node columns (>= 2).
    pub nlon: usize,
    /// Number of node rows (>= 2).
    pub nlat: usize,
}

impl GridSpec {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nlon * self.nlat
    }

    /// Cell index and fractional offsets for a point, or `None` outside.
    fn locate(&self, lon: f64, lat: f64) -> Option<(usize, usize, f64, f64)> {
        let x = (lon - self.lon0) / self.dlon;
        let y = (lat - self.lat0) / self.dlat;
        let max_x = (self.nlon - 1) as f64;
        let max_y = (self.nlat - 1) as f64;
        if !(0.0..=max_x).contains(&x) || !(0.0..=max_y).contains(&y) {
            return None;
        }
        let i = (x.floor() as usize).min(self.nlon - 2);
        let j = (y.floor() as usize).min(self.nlat - 2);
        Some((i, j, x - i as f64, y - j as f64))
    }
}

/// A gridded field: one frame of node values per sample time.
///
/// Frames are row-major with longitude varying fastest:
/// `frame[j * nlon + i]` is the node at `(lon0 + i*dlon, lat0 + j*dlat)`.
#[derive(Clone, Debug, PartialEq)]
pub struct GridField<V> {
    name: String,
    units: String,
    spec: GridSpec,
    index: TimeIndex,
    frames: Vec<Vec<V>>,
}

/// A gridded `(u, v)` velocity field, e.g. surface currents.
pub type GridVectorField = GridField<[f64; 2]>;

impl<V: Interpolate> GridField<V> {
    /// Build from a grid, sample times and one frame per time.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        spec: GridSpec,
        times: Vec<NaiveDateTime>,
        frames: Vec<Vec<V>>,
        extrapolate: bool,
    ) -> Result<Self, EnvError> {
        if spec.nlon < 2 || spec.nlat < 2 || !(spec.dlon > 0.0) || !(spec.dlat > 0.0) {
            return Err(EnvError::ShapeMismatch {
                expected: 4,
                actual: spec.node_count(),
            });
        }
        if frames.len() != times.len() {
            return Err(EnvError::ShapeMismatch {
                expected: times.len(),
                actual: frames.len(),
            });
        }
        if let Some(bad) = frames.iter().find(|f| f.len() != spec.node_count()) {
            return Err(EnvError::ShapeMismatch {
                expected: spec.node_count(),
                actual: bad.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            units: units.into(),
            spec,
            index: TimeIndex::new(times, extrapolate)?,
            frames,
        })
    }

    /// Grid geometry.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    fn sample_frame(&self, frame: &[V], i: usize, j: usize, fx: f64, fy: f64) -> V {
        let n = self.spec.nlon;
        let bottom = V::lerp(frame[j * n + i], frame[j * n + i + 1], fx);
        let top = V::lerp(frame[(j + 1) * n + i], frame[(j + 1) * n + i + 1], fx);
        V::lerp(bottom, top, fy)
    }
}

impl<V: Interpolate> EnvironmentField for GridField<V> {
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn time_bounds(&self) -> TimeBounds {
        self.index.bounds()
    }

    fn at(&self, points: &[WorldPoint], time: NaiveDateTime) -> Result<Vec<Option<V>>, EnvError> {
        let b = self.index.locate(time)?;
        Ok(points
            .iter()
            .map(|p| {
                let (i, j, fx, fy) = self.spec.locate(p[0], p[1])?;
                let lo = self.sample_frame(&self.frames[b.lo], i, j, fx, fy);
                if b.lo == b.hi {
                    return Some(lo);
                }
                let hi = self.sample_frame(&self.frames[b.hi], i, j, fx, fy);
                Some(V::lerp(lo, hi, b.frac))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use slick_core::add_seconds;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn constant_field_is_everywhere() {
        let f = ConstantField::new("current", "m/s", [1.0, 0.0]);
        let v = f.at(&[[0.0, 0.0, 0.0], [50.0, 50.0, 10.0]], t0()).unwrap();
        assert_eq!(v, vec![Some([1.0, 0.0]); 2]);
        assert_eq!(f.time_bounds(), TimeBounds::unbounded());
    }

    #[test]
    fn time_series_interpolates_linearly() {
        let ts = TimeSeries::new(
            "wind",
            "m/s",
            vec![(t0(), [0.0, 0.0]), (add_seconds(t0(), 3600.0), [10.0, -4.0])],
            false,
        )
        .unwrap();
        let v = ts.value_at(add_seconds(t0(), 900.0)).unwrap();
        assert_relative_eq!(v[0], 2.5);
        assert_relative_eq!(v[1], -1.0);
        assert!(ts.value_at(add_seconds(t0(), 3601.0)).is_err());
    }

    fn grid() -> GridVectorField {
        let spec = GridSpec {
            lon0: -10.0,
            lat0: 40.0,
            dlon: 1.0,
            dlat: 1.0,
            nlon: 3,
            nlat: 2,
        };
        // u grows eastward, v grows northward
        let frame0: Vec<[f64; 2]> = (0..6)
            .map(|k| [(k % 3) as f64, (k / 3) as f64])
            .collect();
        let frame1: Vec<[f64; 2]> = frame0.iter().map(|v| [v[0] * 2.0, v[1] * 2.0]).collect();
        GridField::new(
            "current",
            "m/s",
            spec,
            vec![t0(), add_seconds(t0(), 3600.0)],
            vec![frame0, frame1],
            false,
        )
        .unwrap()
    }

    #[test]
    fn grid_is_bilinear_in_space() {
        let g = grid();
        let v = g.at_point(&[-8.5, 40.25, 0.0], t0()).unwrap().unwrap();
        assert_relative_eq!(v[0], 1.5);
        assert_relative_eq!(v[1], 0.25);
    }

    #[test]
    fn grid_is_linear_in_time() {
        let g = grid();
        let v = g
            .at_point(&[-9.0, 41.0, 0.0], add_seconds(t0(), 1800.0))
            .unwrap()
            .unwrap();
        assert_relative_eq!(v[0], 1.5);
        assert_relative_eq!(v[1], 1.5);
    }

    #[test]
    fn outside_grid_samples_none() {
        let g = grid();
        let v = g.at(&[[-11.0, 40.5, 0.0], [-9.0, 40.5, 0.0]], t0()).unwrap();
        assert!(v[0].is_none());
        assert!(v[1].is_some());
    }

    #[test]
    fn upper_edge_is_inside() {
        let g = grid();
        let v = g.at_point(&[-8.0, 41.0, 0.0], t0()).unwrap().unwrap();
        assert_relative_eq!(v[0], 2.0);
        assert_relative_eq!(v[1], 1.0);
    }

    #[test]
    fn frame_shape_is_checked() {
        let spec = GridSpec {
            lon0: 0.0,
            lat0: 0.0,
            dlon: 1.0,
            dlat: 1.0,
            nlon: 2,
            nlat: 2,
        };
        let err = GridField::new("g", "m/s", spec, vec![t0()], vec![vec![0.0f64; 3]], false)
            .unwrap_err();
        assert_eq!(
            err,
            EnvError::ShapeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }
}
