//! The [`Outputter`] trait and the per-step snapshot it receives.

use chrono::NaiveDateTime;
use slick_store::SpillContainer;
use slick_weatherers::MassBalance;

/// Failure reported by an outputter.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct OutputError {
    /// What went wrong.
    pub reason: String,
}

impl OutputError {
    /// An error with the given message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Read-only view of the model after a committed step.
#[derive(Clone, Copy, Debug)]
pub struct StepOutput<'a> {
    /// Index of the step just completed.
    pub step: usize,
    /// Model time at the end of the step.
    pub model_time: NaiveDateTime,
    /// Certain population.
    pub certain: &'a SpillContainer,
    /// Certain population's ledger.
    pub certain_ledger: &'a MassBalance,
    /// Uncertain population and its ledger, if enabled.
    pub uncertain: Option<(&'a SpillContainer, &'a MassBalance)>,
}

/// A consumer of per-step snapshots.
///
/// # Contract
///
/// - `write_output()` is called once per step, after the step has been
///   committed. It sees particle state but cannot change it, so a
///   failing outputter never corrupts the run.
/// - An error stops [`Model::step`](crate::Model::step) from returning
///   `Ok`, but the step stays committed; the caller may keep stepping.
///
/// # Object safety
///
/// This trait is object-safe; the model stores outputters as
/// `Vec<Box<dyn Outputter>>`.
pub trait Outputter: Send + 'static {
    /// Human-readable name for logs and metrics.
    fn name(&self) -> &str;

    /// Called once when a run is prepared.
    fn prepare_for_model_run(&mut self, _start_time: NaiveDateTime, _num_steps: usize) {}

    /// Receive the state after a step.
    fn write_output(&mut self, output: &StepOutput<'_>) -> Result<(), OutputError>;
}

/// Logs particle counts and the certain mass balance at `info!`.
#[derive(Clone, Debug, Default)]
pub struct TracingOutputter;

impl Outputter for TracingOutputter {
    fn name(&self) -> &str {
        "tracing"
    }

    fn write_output(&mut self, output: &StepOutput<'_>) -> Result<(), OutputError> {
        let ledger = output.certain_ledger;
        tracing::info!(
            step = output.step,
            model_time = %output.model_time,
            particles = output.certain.len(),
            released_kg = ledger.amount_released(),
            removed_kg = ledger.total_removed(),
            live_kg = output.certain.store().total_mass(),
            "step complete"
        );
        for (process, kg) in ledger.iter() {
            tracing::debug!(step = output.step, process, kg, "mass balance");
        }
        Ok(())
    }
}
