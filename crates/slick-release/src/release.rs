//! The [`Release`] enum and the [`ReleaseClock`] every kind shares.

use chrono::NaiveDateTime;
use slick_core::{add_seconds, WorldPoint};

use crate::error::ReleaseError;
use crate::kinds::{ContinuousRelease, PointLineRelease, SpatialRelease, VerticalPlumeRelease};

// ── ReleaseClock ───────────────────────────────────────────────────

/// Release time plus the start-time latch.
///
/// The first query decides whether the model started after the release
/// time. If it did, the release is invalid for the whole run and never
/// yields particles. [`rewind`](Self::rewind) clears the latch.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseClock {
    release_time: NaiveDateTime,
    start_time_invalid: Option<bool>,
}

impl ReleaseClock {
    /// A clock for a release starting at `release_time`.
    pub fn new(release_time: NaiveDateTime) -> Self {
        Self {
            release_time,
            start_time_invalid: None,
        }
    }

    /// When the release starts.
    pub fn release_time(&self) -> NaiveDateTime {
        self.release_time
    }

    /// `None` before the first query, then whether the model started too late.
    pub fn start_time_invalid(&self) -> Option<bool> {
        self.start_time_invalid
    }

    /// Latch the start-time check and report whether particles may appear
    /// in `[current_time, current_time + dt)`.
    pub fn may_release(&mut self, current_time: NaiveDateTime, dt: f64) -> bool {
        let invalid = *self
            .start_time_invalid
            .get_or_insert(current_time > self.release_time);
        if invalid {
            return false;
        }
        add_seconds(current_time, dt) > self.release_time
    }

    /// Forget the latch.
    pub fn rewind(&mut self) {
        self.start_time_invalid = None;
    }
}

// ── Release ────────────────────────────────────────────────────────

/// A release policy. The variants share one contract:
///
/// 1. [`num_elements_to_release`](Self::num_elements_to_release) is called
///    once per step with the step start and length.
/// 2. The caller appends that many rows and passes the new rows'
///    positions to [`set_newparticle_positions`](Self::set_newparticle_positions),
///    which also advances `num_released`.
/// 3. [`rewind`](Self::rewind) restores the pre-run state.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
    /// Instantaneous or continuous point/line release.
    PointLine(PointLineRelease),
    /// Fixed list of positions, all released at once.
    Spatial(SpatialRelease),
    /// Subsurface plume with per-window counts.
    VerticalPlume(VerticalPlumeRelease),
    /// Initial batch followed by a continuous point/line release.
    Continuous(ContinuousRelease),
}

impl Release {
    /// Number of new particles in `[current_time, current_time + dt)`.
    pub fn num_elements_to_release(&mut self, current_time: NaiveDateTime, dt: f64) -> usize {
        let n = match self {
            Release::PointLine(r) => r.num_elements_to_release(current_time, dt),
            Release::Spatial(r) => r.num_elements_to_release(current_time, dt),
            Release::VerticalPlume(r) => r.num_elements_to_release(current_time, dt),
            Release::Continuous(r) => r.num_elements_to_release(current_time, dt),
        };
        if n > 0 {
            tracing::debug!(%current_time, dt, n, "release yields particles");
        }
        n
    }

    /// Fill `positions` (the newest `n` rows) and record them as released.
    pub fn set_newparticle_positions(
        &mut self,
        n: usize,
        current_time: NaiveDateTime,
        dt: f64,
        positions: &mut [WorldPoint],
    ) -> Result<(), ReleaseError> {
        if positions.len() != n {
            return Err(ReleaseError::CountMismatch {
                requested: positions.len(),
                computed: n,
            });
        }
        match self {
            Release::PointLine(r) => r.set_newparticle_positions(n, current_time, dt, positions),
            Release::Spatial(r) => r.set_newparticle_positions(n, positions),
            Release::VerticalPlume(r) => r.set_newparticle_positions(n, current_time, dt, positions),
            Release::Continuous(r) => r.set_newparticle_positions(n, current_time, dt, positions),
        }
    }

    /// Restore the state before any particle was released.
    pub fn rewind(&mut self) {
        match self {
            Release::PointLine(r) => r.rewind(),
            Release::Spatial(r) => r.rewind(),
            Release::VerticalPlume(r) => r.rewind(),
            Release::Continuous(r) => r.rewind(),
        }
    }

    /// Start of the release.
    pub fn release_time(&self) -> NaiveDateTime {
        match self {
            Release::PointLine(r) => r.release_time(),
            Release::Spatial(r) => r.release_time(),
            Release::VerticalPlume(r) => r.release_time(),
            Release::Continuous(r) => r.release_time(),
        }
    }

    /// End of the release window, `None` for instantaneous releases.
    pub fn end_release_time(&self) -> Option<NaiveDateTime> {
        match self {
            Release::PointLine(r) => r.end_release_time(),
            Release::Spatial(_) => None,
            Release::VerticalPlume(r) => Some(r.end_release_time()),
            Release::Continuous(r) => r.end_release_time(),
        }
    }

    /// Length of the release window in seconds (0 if instantaneous).
    pub fn release_duration(&self) -> f64 {
        match self {
            Release::PointLine(r) => r.release_duration(),
            Release::Spatial(_) => 0.0,
            Release::VerticalPlume(r) => r.release_duration(),
            Release::Continuous(r) => r.release_duration(),
        }
    }

    /// Particles released so far.
    pub fn num_released(&self) -> usize {
        match self {
            Release::PointLine(r) => r.num_released(),
            Release::Spatial(r) => r.num_released(),
            Release::VerticalPlume(r) => r.num_released(),
            Release::Continuous(r) => r.num_released(),
        }
    }

    /// Whether the release can yield no further particles after
    /// `current_time`.
    pub fn is_complete(&self, current_time: NaiveDateTime) -> bool {
        match self {
            Release::PointLine(r) => r.is_complete(current_time),
            Release::Spatial(r) => r.is_complete(),
            Release::VerticalPlume(r) => current_time >= r.end_release_time(),
            Release::Continuous(r) => r.is_complete(current_time),
        }
    }

    /// Expected element count over the whole release, used to split the
    /// spill amount into per-element mass. Per-step releases estimate
    /// from the number of steps in the window.
    pub fn estimated_total_elements(&self, dt: f64) -> usize {
        match self {
            Release::PointLine(r) => r.estimated_total_elements(dt),
            Release::Spatial(r) => r.positions().len(),
            Release::VerticalPlume(r) => r.num_elements(),
            Release::Continuous(r) => r.estimated_total_elements(dt),
        }
    }

    /// A representative start position.
    pub fn start_position(&self) -> WorldPoint {
        match self {
            Release::PointLine(r) => r.start_position(),
            Release::Spatial(r) => r.positions()[0],
            Release::VerticalPlume(r) => r.source().coords[0],
            Release::Continuous(r) => r.start_position(),
        }
    }
}

impl From<PointLineRelease> for Release {
    fn from(r: PointLineRelease) -> Self {
        Release::PointLine(r)
    }
}

impl From<SpatialRelease> for Release {
    fn from(r: SpatialRelease) -> Self {
        Release::Spatial(r)
    }
}

impl From<VerticalPlumeRelease> for Release {
    fn from(r: VerticalPlumeRelease) -> Self {
        Release::VerticalPlume(r)
    }
}

impl From<ContinuousRelease> for Release {
    fn from(r: ContinuousRelease) -> Self {
        Release::Continuous(r)
    }
}
