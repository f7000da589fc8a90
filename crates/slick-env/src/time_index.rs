//! [`TimeIndex`]: map a query time onto an ordered list of sample times.

use chrono::NaiveDateTime;
use slick_core::{seconds_between, EnvError, TimeBounds};

/// The samples bracketing a query time and the interpolation weight of
/// the later one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    /// Index of the earlier sample.
    pub lo: usize,
    /// Index of the later sample (equal to `lo` on an exact hit or clamp).
    pub hi: usize,
    /// Weight of `hi` in `[0, 1]`.
    pub frac: f64,
}

impl Bracket {
    fn exact(i: usize) -> Self {
        Self {
            lo: i,
            hi: i,
            frac: 0.0,
        }
    }
}

/// Strictly increasing sample times plus an extrapolation policy.
///
/// A single sample is treated as constant in time. With extrapolation on,
/// queries outside the range clamp to the nearest end sample.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeIndex {
    times: Vec<NaiveDateTime>,
    extrapolate: bool,
}

impl TimeIndex {
    /// Build an index. Times must be non-empty and strictly increasing.
    pub fn new(times: Vec<NaiveDateTime>, extrapolate: bool) -> Result<Self, EnvError> {
        if times.is_empty() {
            return Err(EnvError::EmptyTimeSeries);
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(EnvError::UnsortedTimes { index: index + 1 });
        }
        Ok(Self { times, extrapolate })
    }

    /// A single-sample index, constant at all times.
    pub fn single(time: NaiveDateTime) -> Self {
        Self {
            times: vec![time],
            extrapolate: true,
        }
    }

    /// Sample times.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false; an index cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether out-of-range queries clamp instead of failing.
    pub fn extrapolate(&self) -> bool {
        self.extrapolate
    }

    /// Toggle extrapolation.
    pub fn set_extrapolate(&mut self, extrapolate: bool) {
        self.extrapolate = extrapolate;
    }

    /// Valid range: unbounded for a single sample or with extrapolation.
    pub fn bounds(&self) -> TimeBounds {
        if self.extrapolate || self.times.len() == 1 {
            return TimeBounds::unbounded();
        }
        TimeBounds {
            start: self.times.first().copied(),
            stop: self.times.last().copied(),
        }
    }

    /// Bracket `time`.
    pub fn locate(&self, time: NaiveDateTime) -> Result<Bracket, EnvError> {
        let n = self.times.len();
        let (first, last) = (self.times[0], self.times[n - 1]);
        if n == 1 {
            return Ok(Bracket::exact(0));
        }
        if time < first || time > last {
            if !self.extrapolate {
                return Err(EnvError::OutOfTimeRange {
                    time,
                    start: first,
                    stop: last,
                });
            }
            tracing::trace!(%time, %first, %last, "clamping query to time series range");
            return Ok(Bracket::exact(if time < first { 0 } else { n - 1 }));
        }
        let hi = self.times.partition_point(|&t| t <= time);
        if hi == 0 {
            return Ok(Bracket::exact(0));
        }
        let lo = hi - 1;
        if self.times[lo] == time || hi == n {
            return Ok(Bracket::exact(lo));
        }
        let span = seconds_between(self.times[lo], self.times[hi]);
        let frac = seconds_between(self.times[lo], time) / span;
        Ok(Bracket { lo, hi, frac })
    }
}
