//! Reusable mover and outputter fixtures.
//!
//! - [`DriftMover`]: moves every in-water particle by a fixed delta.
//! - [`FailingMover`]: fails deterministically after N moves.
//! - [`FailingOutputter`]: rejects every step.

use slick_engine::{OutputError, Outputter, StepOutput};
use slick_movers::{Displacement, MoveContext, Mover, MoverError};
use slick_store::SpillContainer;

/// Moves every in-water particle by `delta` (degrees, degrees, meters)
/// per step, regardless of `dt`.
pub struct DriftMover {
    pub name: String,
    pub delta: [f64; 3],
}

impl DriftMover {
    pub fn new(name: impl Into<String>, delta: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            delta,
        }
    }
}

impl Mover for DriftMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(
        &mut self,
        _ctx: &MoveContext,
        sc: &SpillContainer,
    ) -> Result<Displacement, MoverError> {
        let mut d = Displacement {
            delta: vec![self.delta; sc.len()],
            off_map: Vec::new(),
        };
        d.zero_inactive(sc.store().status());
        Ok(d)
    }
}

/// Succeeds `succeed_count` times, then fails every `get_move`.
pub struct FailingMover {
    pub succeed_count: usize,
    calls: usize,
}

impl FailingMover {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: 0,
        }
    }
}

impl Mover for FailingMover {
    fn name(&self) -> &str {
        "failing"
    }

    fn prepare_for_model_run(&mut self, _seed: u64) {
        self.calls = 0;
    }

    fn get_move(
        &mut self,
        _ctx: &MoveContext,
        sc: &SpillContainer,
    ) -> Result<Displacement, MoverError> {
        self.calls += 1;
        if self.calls > self.succeed_count {
            return Err(MoverError::InvalidParameter {
                name: "calls",
                value: self.calls as f64,
                reason: "deliberate failure",
            });
        }
        Ok(Displacement::zeros(sc.len()))
    }
}

/// Rejects every step with the same message.
pub struct FailingOutputter;

impl Outputter for FailingOutputter {
    fn name(&self) -> &str {
        "failing"
    }

    fn write_output(&mut self, _output: &StepOutput<'_>) -> Result<(), OutputError> {
        Err(OutputError::new("deliberate failure"))
    }
}
