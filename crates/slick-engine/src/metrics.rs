//! Per-step performance metrics for the model.
//!
//! [`StepMetrics`] captures timing and particle counts for a single step.
//! The model overwrites it after each [`step()`](crate::Model::step).

/// Timing and particle counts collected during a single step.
///
/// All durations are in microseconds and cover both populations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent releasing and initializing new particles.
    pub release_us: u64,
    /// Per-mover prepare and `get_move` times: `(name, microseconds)`.
    pub mover_us: Vec<(String, u64)>,
    /// Per-weatherer prepare and weathering times: `(name, microseconds)`.
    pub weatherer_us: Vec<(String, u64)>,
    /// Time spent in outputters.
    pub output_us: u64,
    /// Particles released this step into the certain population.
    pub released: usize,
    /// Particles compacted out of the certain population this step.
    pub removed: usize,
    /// Live particles in the certain population after the step.
    pub live: usize,
}

impl StepMetrics {
    /// Add `us` to the entry for `name`, creating it if needed.
    pub(crate) fn charge(entries: &mut Vec<(String, u64)>, name: &str, us: u64) {
        match entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, total)) => *total += us,
            None => entries.push((name.to_string(), us)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.release_us, 0);
        assert!(m.mover_us.is_empty());
        assert!(m.weatherer_us.is_empty());
        assert_eq!(m.output_us, 0);
        assert_eq!((m.released, m.removed, m.live), (0, 0, 0));
    }

    #[test]
    fn charge_accumulates_by_name() {
        let mut entries = Vec::new();
        StepMetrics::charge(&mut entries, "wind", 5);
        StepMetrics::charge(&mut entries, "current", 2);
        StepMetrics::charge(&mut entries, "wind", 7);
        assert_eq!(entries, vec![("wind".to_string(), 12), ("current".to_string(), 2)]);
    }
}
