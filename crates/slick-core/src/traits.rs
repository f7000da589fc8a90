//! The [`EnvironmentField`] collaborator trait.
//!
//! Environment fields answer "what is the value of this quantity at these
//! positions and this time". Implementations live in `slick-env`; movers
//! and weatherers hold them as trait objects.

use chrono::NaiveDateTime;

use crate::error::EnvError;
use crate::geo::WorldPoint;

/// Values that can be linearly interpolated between two samples.
pub trait Interpolate: Copy + Send + Sync + 'static {
    /// `a + (b - a) * frac`, componentwise.
    fn lerp(a: Self, b: Self, frac: f64) -> Self;
}

impl Interpolate for f64 {
    fn lerp(a: Self, b: Self, frac: f64) -> Self {
        a + (b - a) * frac
    }
}

impl<const N: usize> Interpolate for [f64; N] {
    fn lerp(a: Self, b: Self, frac: f64) -> Self {
        let mut out = a;
        for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
            *o = x + (y - x) * frac;
        }
        out
    }
}

/// Valid time range of a field. `None` on either side means unbounded,
/// so static fields report `TimeBounds::unbounded()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TimeBounds {
    /// First valid time, or `None` for negative infinity.
    pub start: Option<NaiveDateTime>,
    /// Last valid time, or `None` for positive infinity.
    pub stop: Option<NaiveDateTime>,
}

impl TimeBounds {
    /// The unbounded range `(-inf, +inf)`.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            stop: None,
        }
    }

    /// Whether `time` lies inside the range (inclusive).
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start.is_none_or(|s| time >= s) && self.stop.is_none_or(|s| time <= s)
    }
}

/// A scalar or vector quantity queryable at `(positions, time)`.
///
/// # Contract
///
/// - `at()` returns exactly one entry per input point.
/// - A point outside the field's spatial domain yields `None` for that
///   entry; callers mark such particles off-map rather than failing.
/// - A time outside [`time_bounds`](Self::time_bounds) fails with
///   [`EnvError::OutOfTimeRange`] unless the field extrapolates.
pub trait EnvironmentField: Send + Sync {
    /// The sampled value type, e.g. `f64` or `[f64; 2]`.
    type Value: Interpolate;

    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Units of the returned values (SI unless stated).
    fn units(&self) -> &str;

    /// Valid time range of the underlying data.
    fn time_bounds(&self) -> TimeBounds;

    /// Sample the field at each point.
    fn at(
        &self,
        points: &[WorldPoint],
        time: NaiveDateTime,
    ) -> Result<Vec<Option<Self::Value>>, EnvError>;

    /// Sample a single point.
    fn at_point(
        &self,
        point: &WorldPoint,
        time: NaiveDateTime,
    ) -> Result<Option<Self::Value>, EnvError> {
        Ok(self
            .at(std::slice::from_ref(point), time)?
            .into_iter()
            .next()
            .flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn lerp_scalar_and_vector() {
        assert_eq!(f64::lerp(1.0, 3.0, 0.5), 2.0);
        assert_eq!(<[f64; 2]>::lerp([0.0, 10.0], [2.0, 0.0], 0.25), [0.5, 7.5]);
    }

    #[test]
    fn unbounded_contains_everything() {
        let t = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(TimeBounds::unbounded().contains(t));
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let day = |d| {
            NaiveDate::from_ymd_opt(2020, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let b = TimeBounds {
            start: Some(day(2)),
            stop: Some(day(4)),
        };
        assert!(b.contains(day(2)));
        assert!(b.contains(day(4)));
        assert!(!b.contains(day(1)));
        assert!(!b.contains(day(5)));
    }
}
