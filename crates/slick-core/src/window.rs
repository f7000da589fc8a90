//! [`ActiveWindow`]: the time range in which a mover or weatherer acts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::{add_seconds, seconds_between};

/// An on/off switch plus an optional `[start, stop)` range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveWindow {
    /// Master switch.
    pub on: bool,
    /// First active time; `None` is unbounded.
    pub start: Option<NaiveDateTime>,
    /// End of activity (exclusive); `None` is unbounded.
    pub stop: Option<NaiveDateTime>,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self::always()
    }
}

impl ActiveWindow {
    /// Switched on with no time bounds.
    pub const fn always() -> Self {
        Self {
            on: true,
            start: None,
            stop: None,
        }
    }

    /// Switched on between `start` and `stop`.
    pub const fn between(start: NaiveDateTime, stop: NaiveDateTime) -> Self {
        Self {
            on: true,
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// Whether `(t, t + dt)` overlaps the window.
    pub fn overlaps(&self, t: NaiveDateTime, dt: f64) -> bool {
        let end = add_seconds(t, dt);
        self.on && self.start.is_none_or(|s| end > s) && self.stop.is_none_or(|s| s > t)
    }

    /// Seconds of `[t, t + dt]` that fall inside the window, never
    /// negative. Equal to `dt` when the step is fully inside.
    pub fn active_timestep(&self, t: NaiveDateTime, dt: f64) -> f64 {
        if !self.overlaps(t, dt) {
            return 0.0;
        }
        let mut lo = 0.0;
        let mut hi = dt;
        if let Some(s) = self.start {
            lo = f64::max(lo, seconds_between(t, s));
        }
        if let Some(s) = self.stop {
            hi = f64::min(hi, seconds_between(t, s));
        }
        (hi - lo).max(0.0)
    }

    /// Window length in seconds, if bounded on both sides.
    pub fn duration(&self) -> Option<f64> {
        Some(seconds_between(self.start?, self.stop?))
    }
}
