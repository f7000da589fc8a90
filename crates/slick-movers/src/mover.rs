//! The [`Mover`] trait and the per-step types it exchanges with the
//! orchestrator.

use std::sync::Arc;

use chrono::NaiveDateTime;
use slick_core::{ActiveWindow, EnvironmentField, LeStatus};
use slick_store::{ArrayDef, ParticleStore, SpillContainer};

use crate::error::MoverError;

/// A shared `(u, v)` field in m/s, e.g. a current grid or a wind series.
pub type VectorField = Arc<dyn EnvironmentField<Value = [f64; 2]>>;

/// Per-step inputs shared by every mover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveContext {
    /// Start of the step.
    pub model_time: NaiveDateTime,
    /// Step length in seconds.
    pub dt: f64,
    /// Seconds since the start of the run.
    pub elapsed: f64,
}

/// Position change for every row of a store, plus the rows whose
/// forcing could not be sampled because they left the field's domain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Displacement {
    /// `(dlon, dlat, dz)` per row, degrees and meters.
    pub delta: Vec<[f64; 3]>,
    /// Rows that left the spatial domain this step.
    pub off_map: Vec<usize>,
}

impl Displacement {
    /// No movement for `n` rows.
    pub fn zeros(n: usize) -> Self {
        Self {
            delta: vec![[0.0; 3]; n],
            off_map: Vec::new(),
        }
    }

    /// Zero the rows of particles that are not in the water.
    pub fn zero_inactive(&mut self, status: &[LeStatus]) {
        for (d, s) in self.delta.iter_mut().zip(status) {
            if *s != LeStatus::InWater {
                *d = [0.0; 3];
            }
        }
    }

    /// Add `other` row by row. Both must cover the same store.
    pub fn accumulate(&mut self, other: &Displacement) {
        for (d, o) in self.delta.iter_mut().zip(&other.delta) {
            d[0] += o[0];
            d[1] += o[1];
            d[2] += o[2];
        }
        self.off_map.extend_from_slice(&other.off_map);
    }
}

/// Rows currently in the water.
pub(crate) fn in_water_rows(store: &ParticleStore) -> Vec<usize> {
    store
        .status()
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == LeStatus::InWater)
        .map(|(i, _)| i)
        .collect()
}

/// Rows flagged for removal at the end of the step.
pub(crate) fn removed_mask(store: &ParticleStore) -> Vec<bool> {
    store
        .status()
        .iter()
        .map(|s| *s == LeStatus::ToBeRemoved)
        .collect()
}

/// A contributor to particle motion.
///
/// # Contract
///
/// - `get_move()` returns exactly one delta per store row. Rows that are
///   not `InWater` get a zero delta.
/// - Deltas from different movers are summed, so a mover must not
///   depend on another mover's output within the step.
/// - All randomness comes from RNGs seeded in
///   [`prepare_for_model_run`](Self::prepare_for_model_run), one stream
///   per population, so the certain population is unaffected by whether
///   an uncertain population exists.
///
/// # Object safety
///
/// This trait is object-safe; the model stores movers as
/// `Vec<Box<dyn Mover>>`.
pub trait Mover: Send + 'static {
    /// Human-readable name for logs and metrics.
    fn name(&self) -> &str;

    /// Optional particle columns this mover needs declared.
    fn array_types(&self) -> Vec<ArrayDef> {
        Vec::new()
    }

    /// When the mover is active.
    fn window(&self) -> ActiveWindow {
        ActiveWindow::always()
    }

    /// Reset per-run state and reseed RNGs.
    fn prepare_for_model_run(&mut self, _seed: u64) {}

    /// Update per-step state for one population before any mover runs.
    fn prepare_for_model_step(
        &mut self,
        _ctx: &MoveContext,
        _sc: &mut SpillContainer,
    ) -> Result<(), MoverError> {
        Ok(())
    }

    /// Displacement of every particle in `sc` over the step.
    fn get_move(&mut self, ctx: &MoveContext, sc: &SpillContainer)
        -> Result<Displacement, MoverError>;

    /// Called after positions are committed and before compaction, so
    /// per-particle state can drop rows flagged for removal.
    fn model_step_is_done(&mut self, _sc: &SpillContainer) -> Result<(), MoverError> {
        Ok(())
    }
}
