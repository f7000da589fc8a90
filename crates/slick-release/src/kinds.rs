//! Concrete release kinds wrapped by [`Release`](crate::Release).

use chrono::NaiveDateTime;
use slick_core::{add_seconds, seconds_between, WorldPoint};

use crate::error::ReleaseError;
use crate::rate::ReleaseRate;
use crate::release::ReleaseClock;

/// `n` evenly spaced values from `start` to `stop` inclusive. The last
/// value is exactly `stop`; a single value is `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = stop;
            out
        }
    }
}

fn fill_linspace(out: &mut [WorldPoint], start: WorldPoint, end: WorldPoint) {
    let n = out.len();
    for axis in 0..3 {
        for (p, v) in out.iter_mut().zip(linspace(start[axis], end[axis], n)) {
            p[axis] = v;
        }
    }
}

fn allclose(a: WorldPoint, b: WorldPoint) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-10;
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x - y).abs() <= ATOL + RTOL * y.abs())
}

fn validate_window(
    release_time: NaiveDateTime,
    end_release_time: Option<NaiveDateTime>,
) -> Result<(), ReleaseError> {
    match end_release_time {
        Some(end) if end < release_time => Err(ReleaseError::EndBeforeStart {
            release_time,
            end_release_time: end,
        }),
        _ => Ok(()),
    }
}

// ── PointLineRelease ───────────────────────────────────────────────

/// A point or line source, instantaneous or continuous.
///
/// With an end position the particles are spread along the segment. A
/// fixed-total continuous line places element `i` at fraction
/// `i / (num_elements - 1)`; a per-step line walks a cursor along the
/// segment by an estimated spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLineRelease {
    clock: ReleaseClock,
    end_release_time: Option<NaiveDateTime>,
    start_position: WorldPoint,
    end_position: Option<WorldPoint>,
    rate: ReleaseRate,
    num_released: usize,
    next_release_pos: WorldPoint,
    delta_pos: Option<WorldPoint>,
}

/// Builder for [`PointLineRelease`].
///
/// Required: `release_time` and `start_position`. Neither count set
/// means 1000 elements in total.
#[derive(Clone, Debug)]
pub struct PointLineReleaseBuilder {
    release_time: NaiveDateTime,
    start_position: WorldPoint,
    end_position: Option<WorldPoint>,
    end_release_time: Option<NaiveDateTime>,
    num_elements: Option<usize>,
    num_per_timestep: Option<usize>,
}

impl PointLineReleaseBuilder {
    /// Make this a line release ending at `end`.
    pub fn end_position(mut self, end: WorldPoint) -> Self {
        self.end_position = Some(end);
        self
    }

    /// Make this a continuous release ending at `end`.
    pub fn end_release_time(mut self, end: NaiveDateTime) -> Self {
        self.end_release_time = Some(end);
        self
    }

    /// Release a fixed total.
    pub fn num_elements(mut self, n: usize) -> Self {
        self.num_elements = Some(n);
        self
    }

    /// Release a fixed count every step.
    pub fn num_per_timestep(mut self, n: usize) -> Self {
        self.num_per_timestep = Some(n);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<PointLineRelease, ReleaseError> {
        validate_window(self.release_time, self.end_release_time)?;
        let rate = ReleaseRate::from_counts(self.num_elements, self.num_per_timestep)?;
        Ok(PointLineRelease {
            clock: ReleaseClock::new(self.release_time),
            end_release_time: self.end_release_time,
            start_position: self.start_position,
            end_position: self.end_position,
            rate,
            num_released: 0,
            next_release_pos: self.start_position,
            delta_pos: None,
        })
    }
}

impl PointLineRelease {
    /// Start building a release at `release_time` from `start_position`.
    pub fn builder(
        release_time: NaiveDateTime,
        start_position: WorldPoint,
    ) -> PointLineReleaseBuilder {
        PointLineReleaseBuilder {
            release_time,
            start_position,
            end_position: None,
            end_release_time: None,
            num_elements: None,
            num_per_timestep: None,
        }
    }

    /// Start of the release.
    pub fn release_time(&self) -> NaiveDateTime {
        self.clock.release_time()
    }

    /// End of the release window.
    pub fn end_release_time(&self) -> Option<NaiveDateTime> {
        self.end_release_time
    }

    /// Start of the point or line.
    pub fn start_position(&self) -> WorldPoint {
        self.start_position
    }

    /// End of the line, if any.
    pub fn end_position(&self) -> Option<WorldPoint> {
        self.end_position
    }

    /// Counting mode.
    pub fn rate(&self) -> ReleaseRate {
        self.rate
    }

    /// Particles released so far.
    pub fn num_released(&self) -> usize {
        self.num_released
    }

    /// The start-time latch.
    pub fn start_time_invalid(&self) -> Option<bool> {
        self.clock.start_time_invalid()
    }

    /// True without an end position or when it equals the start.
    pub fn is_pointsource(&self) -> bool {
        self.end_position.is_none_or(|e| e == self.start_position)
    }

    /// Window length in seconds, 0 for instantaneous.
    pub fn release_duration(&self) -> f64 {
        self.end_release_time
            .map_or(0.0, |end| seconds_between(self.clock.release_time(), end))
    }

    pub(crate) fn clock_mut(&mut self) -> &mut ReleaseClock {
        &mut self.clock
    }

    /// Whether nothing more will be released after `current_time`.
    pub fn is_complete(&self, current_time: NaiveDateTime) -> bool {
        if self.clock.start_time_invalid() == Some(true) {
            return true;
        }
        match self.rate {
            ReleaseRate::Total(n) => self.num_released >= n,
            ReleaseRate::PerStep(_) if self.is_zero_window() => self.num_released > 0,
            ReleaseRate::PerStep(_) => self.end_release_time.is_some_and(|e| current_time >= e),
        }
    }

    /// An end time equal to the release time: a single shot.
    fn is_zero_window(&self) -> bool {
        self.end_release_time == Some(self.clock.release_time())
    }

    /// Expected total, for mass-per-element.
    pub fn estimated_total_elements(&self, dt: f64) -> usize {
        match self.rate {
            ReleaseRate::Total(n) => n,
            ReleaseRate::PerStep(n) => {
                let dur = self.release_duration();
                if dur > 0.0 && dt > 0.0 {
                    n * ((dur / dt).ceil() as usize).max(1)
                } else {
                    n
                }
            }
        }
    }

    /// Number of new particles in `[current_time, current_time + dt)`.
    pub fn num_elements_to_release(&mut self, current_time: NaiveDateTime, dt: f64) -> usize {
        if !self.clock.may_release(current_time, dt) {
            return 0;
        }
        match self.rate {
            ReleaseRate::Total(n) => self.num_given_total(n, current_time, dt),
            ReleaseRate::PerStep(n) if self.is_zero_window() => {
                if self.num_released == 0 {
                    n
                } else {
                    0
                }
            }
            ReleaseRate::PerStep(n) => match self.end_release_time {
                Some(end) if current_time >= end => 0,
                _ => n,
            },
        }
    }

    fn num_given_total(&self, n: usize, current_time: NaiveDateTime, dt: f64) -> usize {
        if self.num_released >= n {
            return 0;
        }
        let duration = self.release_duration();
        if duration == 0.0 {
            return n;
        }
        let elapsed = seconds_between(self.clock.release_time(), current_time) + dt;
        let last = ((elapsed / duration * (n - 1) as f64) as i64).min(n as i64 - 1);
        let released = self.num_released as i64;
        if last == released - 1 {
            return 0;
        }
        // one extra element in the first interval
        (last - released + 1).max(0) as usize
    }

    fn update_delta_pos(&mut self, n: usize, current_time: NaiveDateTime, dt: f64) {
        let Some(end) = self.end_position else {
            return;
        };
        let span = [
            end[0] - self.start_position[0],
            end[1] - self.start_position[1],
            end[2] - self.start_position[2],
        ];
        let divisor = match (self.rate, self.end_release_time) {
            (ReleaseRate::PerStep(_), Some(end_time)) => {
                let ts = dt.min(seconds_between(current_time, end_time));
                let frac = (seconds_between(self.clock.release_time(), current_time) + ts)
                    / self.release_duration();
                let estimated_total = (self.num_released + n) as f64 / frac;
                estimated_total - 1.0
            }
            (ReleaseRate::Total(total), _) => {
                if self.delta_pos.is_some() {
                    return;
                }
                total.saturating_sub(1) as f64
            }
            (ReleaseRate::PerStep(_), None) => 1.0,
        };
        let divisor = if divisor > 0.0 && divisor.is_finite() {
            divisor
        } else {
            1.0
        };
        self.delta_pos = Some(span.map(|d| d / divisor));
    }

    fn start_end_position(
        &mut self,
        n: usize,
        current_time: NaiveDateTime,
        dt: f64,
    ) -> (WorldPoint, WorldPoint) {
        let end = match self.end_position {
            Some(end) if end != self.start_position => end,
            _ => return (self.start_position, self.start_position),
        };
        if self.release_duration() == 0.0 {
            return (self.start_position, end);
        }
        self.update_delta_pos(n, current_time, dt);
        let delta = self.delta_pos.unwrap_or([0.0; 3]);
        let first = self.next_release_pos;
        let k = n.saturating_sub(1) as f64;
        let last = [
            first[0] + k * delta[0],
            first[1] + k * delta[1],
            first[2] + k * delta[2],
        ];
        if !allclose(last, end) {
            self.next_release_pos = [last[0] + delta[0], last[1] + delta[1], last[2] + delta[2]];
        }
        (first, last)
    }

    /// Lay out `n` new particles and count them released.
    pub fn set_newparticle_positions(
        &mut self,
        n: usize,
        current_time: NaiveDateTime,
        dt: f64,
        positions: &mut [WorldPoint],
    ) -> Result<(), ReleaseError> {
        if n == 0 {
            return Ok(());
        }
        let (start, end) = self.start_end_position(n, current_time, dt);
        let tail = positions.len() - n;
        fill_linspace(&mut positions[tail..], start, end);
        self.num_released += n;
        Ok(())
    }

    /// Back to nothing released.
    pub fn rewind(&mut self) {
        self.clock.rewind();
        self.num_released = 0;
        self.next_release_pos = self.start_position;
        self.delta_pos = None;
    }
}

// ── SpatialRelease ─────────────────────────────────────────────────

/// Particles at pre-specified positions, all released at `release_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialRelease {
    clock: ReleaseClock,
    positions: Vec<WorldPoint>,
    num_released: usize,
}

impl SpatialRelease {
    /// Release one particle at each of `positions`.
    pub fn new(
        release_time: NaiveDateTime,
        positions: Vec<WorldPoint>,
    ) -> Result<Self, ReleaseError> {
        if positions.is_empty() {
            return Err(ReleaseError::EmptyPositions);
        }
        Ok(Self {
            clock: ReleaseClock::new(release_time),
            positions,
            num_released: 0,
        })
    }

    /// Start of the release.
    pub fn release_time(&self) -> NaiveDateTime {
        self.clock.release_time()
    }

    /// Release positions.
    pub fn positions(&self) -> &[WorldPoint] {
        &self.positions
    }

    /// Particles released so far.
    pub fn num_released(&self) -> usize {
        self.num_released
    }

    /// All released, or the start was missed.
    pub fn is_complete(&self) -> bool {
        self.clock.start_time_invalid() == Some(true) || self.num_released >= self.positions.len()
    }

    /// All positions on the first qualifying step, then nothing.
    pub fn num_elements_to_release(&mut self, current_time: NaiveDateTime, dt: f64) -> usize {
        if !self.clock.may_release(current_time, dt) || self.num_released >= self.positions.len() {
            return 0;
        }
        self.positions.len()
    }

    /// Copy the stored positions into the newest rows.
    pub fn set_newparticle_positions(
        &mut self,
        n: usize,
        positions: &mut [WorldPoint],
    ) -> Result<(), ReleaseError> {
        if n == 0 {
            return Ok(());
        }
        if n != self.positions.len() {
            return Err(ReleaseError::CountMismatch {
                requested: n,
                computed: self.positions.len(),
            });
        }
        let tail = positions.len() - n;
        positions[tail..].copy_from_slice(&self.positions);
        self.num_released = n;
        Ok(())
    }

    /// Back to nothing released.
    pub fn rewind(&mut self) {
        self.clock.rewind();
        self.num_released = 0;
    }
}

/// A [`SpatialRelease`] on a `resolution x resolution` lon/lat mesh
/// covering `bounds = [[min_lon, min_lat], [max_lon, max_lat]]` at the
/// surface. Longitude varies fastest.
pub fn grid_release(
    release_time: NaiveDateTime,
    bounds: [[f64; 2]; 2],
    resolution: usize,
) -> Result<SpatialRelease, ReleaseError> {
    let lons = linspace(bounds[0][0], bounds[1][0], resolution);
    let lats = linspace(bounds[0][1], bounds[1][1], resolution);
    let positions = lats
        .iter()
        .flat_map(|&lat| lons.iter().map(move |&lon| [lon, lat, 0.0]))
        .collect();
    SpatialRelease::new(release_time, positions)
}

// ── ContinuousRelease ──────────────────────────────────────────────

/// An initial batch at the start position followed by a continuous
/// point or line release.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousRelease {
    initial: PointLineRelease,
    continuous: PointLineRelease,
    initial_done: bool,
    pending_initial: usize,
}

impl ContinuousRelease {
    /// Release `initial_elements` at once at the start of `continuous`.
    pub fn new(continuous: PointLineRelease, initial_elements: usize) -> Self {
        let initial = PointLineRelease {
            clock: ReleaseClock::new(continuous.release_time()),
            end_release_time: None,
            start_position: continuous.start_position(),
            end_position: None,
            rate: ReleaseRate::PerStep(initial_elements),
            num_released: 0,
            next_release_pos: continuous.start_position(),
            delta_pos: None,
        };
        Self {
            initial,
            continuous,
            initial_done: false,
            pending_initial: 0,
        }
    }

    /// Size of the initial batch.
    pub fn initial_elements(&self) -> usize {
        self.initial.rate.num_per_timestep().unwrap_or(0)
    }

    /// The continuous part.
    pub fn continuous(&self) -> &PointLineRelease {
        &self.continuous
    }

    /// Start of the release.
    pub fn release_time(&self) -> NaiveDateTime {
        self.continuous.release_time()
    }

    /// End of the continuous part.
    pub fn end_release_time(&self) -> Option<NaiveDateTime> {
        self.continuous.end_release_time()
    }

    /// Start position shared by both parts.
    pub fn start_position(&self) -> WorldPoint {
        self.continuous.start_position()
    }

    /// Window length of the continuous part.
    pub fn release_duration(&self) -> f64 {
        self.continuous.release_duration()
    }

    /// Initial plus continuous particles released so far.
    pub fn num_released(&self) -> usize {
        self.initial.num_released + self.continuous.num_released
    }

    /// Both parts done.
    pub fn is_complete(&self, current_time: NaiveDateTime) -> bool {
        (self.initial_done || self.initial.start_time_invalid() == Some(true))
            && self.continuous.is_complete(current_time)
    }

    /// Initial batch plus the continuous share.
    pub fn estimated_total_elements(&self, dt: f64) -> usize {
        self.initial_elements() + self.continuous.estimated_total_elements(dt)
    }

    /// The initial batch on its first qualifying step plus the continuous count.
    pub fn num_elements_to_release(&mut self, current_time: NaiveDateTime, dt: f64) -> usize {
        let mut num = 0;
        if !self.initial_done && self.initial.clock_mut().may_release(current_time, dt) {
            self.pending_initial = self.initial_elements();
            num += self.pending_initial;
        }
        num + self.continuous.num_elements_to_release(current_time, dt)
    }

    /// Initial batch first, at the start position, then the continuous rows.
    pub fn set_newparticle_positions(
        &mut self,
        n: usize,
        current_time: NaiveDateTime,
        dt: f64,
        positions: &mut [WorldPoint],
    ) -> Result<(), ReleaseError> {
        let tail = positions.len() - n;
        let mut rest = n;
        if self.pending_initial > 0 && !self.initial_done {
            let k = self.pending_initial.min(n);
            for p in &mut positions[tail..tail + k] {
                *p = self.initial.start_position;
            }
            self.initial.num_released += k;
            self.initial_done = true;
            self.pending_initial = 0;
            rest -= k;
        }
        self.continuous
            .set_newparticle_positions(rest, current_time, dt, &mut positions[tail + n - rest..])
    }

    /// Back to nothing released.
    pub fn rewind(&mut self) {
        self.initial.rewind();
        self.continuous.rewind();
        self.initial_done = false;
        self.pending_initial = 0;
    }
}

// ── VerticalPlumeRelease ───────────────────────────────────────────

/// Source points of a plume and the oil mass flux leaving each, kg/s.
#[derive(Clone, Debug, PartialEq)]
pub struct PlumeSource {
    /// Release points, typically stacked along a vertical column.
    pub coords: Vec<WorldPoint>,
    /// Mass flux at each point.
    pub mass_fluxes: Vec<f64>,
}

impl PlumeSource {
    /// A vertical column under `top` with one source per depth.
    pub fn vertical_column(top: WorldPoint, depths: &[f64], mass_fluxes: Vec<f64>) -> Self {
        Self {
            coords: depths.iter().map(|&z| [top[0], top[1], z]).collect(),
            mass_fluxes,
        }
    }

    fn total_flux(&self) -> f64 {
        self.mass_fluxes.iter().sum()
    }
}

/// A continuous subsurface release driven by plume mass fluxes.
///
/// Every element carries the same mass, `total_mass / num_elements`. The
/// count released at each source over a window is the number of whole
/// elements its flux produces, so counts per window are reproducible
/// regardless of the step pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalPlumeRelease {
    release_time: NaiveDateTime,
    end_release_time: NaiveDateTime,
    source: PlumeSource,
    num_elements: usize,
    le_mass: f64,
    num_released: usize,
}

impl VerticalPlumeRelease {
    /// A plume releasing `num_elements` (default 1000) between the two times.
    pub fn new(
        release_time: NaiveDateTime,
        end_release_time: NaiveDateTime,
        source: PlumeSource,
        num_elements: Option<usize>,
    ) -> Result<Self, ReleaseError> {
        validate_window(release_time, Some(end_release_time))?;
        let invalid = |reason: &str| ReleaseError::InvalidPlume {
            reason: reason.to_string(),
        };
        if end_release_time == release_time {
            return Err(invalid("release window has zero length"));
        }
        if source.coords.is_empty() {
            return Err(invalid("no source points"));
        }
        if source.coords.len() != source.mass_fluxes.len() {
            return Err(invalid("one mass flux per source point required"));
        }
        if source.mass_fluxes.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(invalid("mass fluxes must be finite and non-negative"));
        }
        if source.total_flux() <= 0.0 {
            return Err(invalid("total mass flux is zero"));
        }
        let num_elements = num_elements.unwrap_or(crate::rate::DEFAULT_NUM_ELEMENTS);
        if num_elements == 0 {
            return Err(invalid("num_elements must be positive"));
        }
        let duration = seconds_between(release_time, end_release_time);
        let le_mass = source.total_flux() * duration / num_elements as f64;
        Ok(Self {
            release_time,
            end_release_time,
            source,
            num_elements,
            le_mass,
            num_released: 0,
        })
    }

    /// Start of the release.
    pub fn release_time(&self) -> NaiveDateTime {
        self.release_time
    }

    /// End of the release.
    pub fn end_release_time(&self) -> NaiveDateTime {
        self.end_release_time
    }

    /// Window length in seconds.
    pub fn release_duration(&self) -> f64 {
        seconds_between(self.release_time, self.end_release_time)
    }

    /// The plume source.
    pub fn source(&self) -> &PlumeSource {
        &self.source
    }

    /// Target element count.
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Mass carried by each element, kg.
    pub fn le_mass(&self) -> f64 {
        self.le_mass
    }

    /// Total mass released over the window, kg.
    pub fn total_mass(&self) -> f64 {
        self.source.total_flux() * self.release_duration()
    }

    /// Particles released so far.
    pub fn num_released(&self) -> usize {
        self.num_released
    }

    fn released_by(&self, flux: f64, time: NaiveDateTime) -> usize {
        let elapsed = seconds_between(self.release_time, time).clamp(0.0, self.release_duration());
        // tolerance keeps whole-element boundaries from rounding down
        (flux * elapsed / self.le_mass + 1e-9).floor() as usize
    }

    /// Element count per source point for `[start, end)`.
    pub fn elems_in_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<usize> {
        self.source
            .mass_fluxes
            .iter()
            .map(|&f| self.released_by(f, end).saturating_sub(self.released_by(f, start)))
            .collect()
    }

    /// Elements produced in `[current_time, current_time + dt)`.
    pub fn num_elements_to_release(&mut self, current_time: NaiveDateTime, dt: f64) -> usize {
        self.elems_in_range(current_time, add_seconds(current_time, dt))
            .iter()
            .sum()
    }

    /// Place each source's elements at its coordinates.
    pub fn set_newparticle_positions(
        &mut self,
        n: usize,
        current_time: NaiveDateTime,
        dt: f64,
        positions: &mut [WorldPoint],
    ) -> Result<(), ReleaseError> {
        let counts = self.elems_in_range(current_time, add_seconds(current_time, dt));
        let computed: usize = counts.iter().sum();
        if computed != n {
            return Err(ReleaseError::CountMismatch {
                requested: n,
                computed,
            });
        }
        let tail = positions.len() - n;
        let coords = self
            .source
            .coords
            .iter()
            .zip(&counts)
            .flat_map(|(c, &k)| std::iter::repeat_n(*c, k));
        for (p, c) in positions[tail..].iter_mut().zip(coords) {
            *p = c;
        }
        self.num_released += n;
        Ok(())
    }

    /// Back to nothing released.
    pub fn rewind(&mut self) {
        self.num_released = 0;
    }
}
