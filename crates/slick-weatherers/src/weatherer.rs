//! The [`Weatherer`] trait and its per-step context.

use chrono::NaiveDateTime;
use slick_core::ActiveWindow;
use slick_store::{ArrayDef, SpillContainer};

use crate::error::WeathererError;
use crate::mass_balance::MassBalance;

/// Per-step inputs shared by every weatherer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherContext {
    /// Start of the step.
    pub model_time: NaiveDateTime,
    /// Step length in seconds.
    pub dt: f64,
    /// Seconds since the start of the run.
    pub elapsed: f64,
    /// Total mass of every active spill over the whole run, released or
    /// not, in kg.
    pub total_spill_mass: f64,
}

/// A mass-removal process.
///
/// # Contract
///
/// - Reads and writes particle data only through
///   [`SpillContainer::itersubstancedata`] views, flushed with
///   [`SpillContainer::update_from_fatedataview`] before returning.
/// - Removal scales every component of a particle by the same factor,
///   so `mass` stays equal to the component sum.
/// - Every kilogram removed is added to the ledger under
///   [`ledger_key`](Self::ledger_key).
/// - State that depends on the particles (marking, burn thickness) is
///   kept per population; the same instance serves the certain and the
///   uncertain container.
///
/// # Object safety
///
/// This trait is object-safe; the model stores weatherers as
/// `Vec<Box<dyn Weatherer>>`.
pub trait Weatherer: Send + 'static {
    /// Human-readable name for logs and metrics.
    fn name(&self) -> &str;

    /// Mass-balance entry this process books into.
    fn ledger_key(&self) -> &'static str;

    /// Optional particle columns this weatherer needs declared.
    fn array_types(&self) -> Vec<ArrayDef> {
        Vec::new()
    }

    /// Configured activity window.
    fn window(&self) -> ActiveWindow;

    /// Whether the last prepared step was active for the certain
    /// population.
    fn is_active(&self) -> bool;

    /// Reset per-run state and register the ledger entry.
    fn prepare_for_model_run(&mut self, ledger: &mut MassBalance) {
        ledger.reset(self.ledger_key());
    }

    /// Decide activity for the step and mark particles if needed.
    fn prepare_for_model_step(
        &mut self,
        ctx: &WeatherContext,
        sc: &mut SpillContainer,
    ) -> Result<(), WeathererError>;

    /// Remove mass over the step.
    fn weather_elements(
        &mut self,
        ctx: &WeatherContext,
        sc: &mut SpillContainer,
        ledger: &mut MassBalance,
    ) -> Result<(), WeathererError>;
}
