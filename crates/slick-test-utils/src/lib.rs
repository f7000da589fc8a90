//! Test utilities and mock types for slick development.
//!
//! Provides canned substances, spills and configs, a bounded mock
//! current field for off-map scenarios, and a [`RecordingOutputter`]
//! that keeps every step's snapshot for later assertions. Reusable
//! mover and outputter fixtures live in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use slick_core::{
    ComponentKind, EnvError, EnvironmentField, LeStatus, SimpleSubstance, Substance, TimeBounds,
    WorldPoint,
};
use slick_engine::{ModelConfig, OutputError, Outputter, Spill, StepOutput};
use slick_env::ConstantField;
use slick_movers::VectorField;
use slick_release::PointLineRelease;

/// Start of every canned scenario.
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 5, 14)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// One hour in 15 minute steps from [`t0`].
pub fn hour_config() -> ModelConfig {
    ModelConfig::new(t0())
        .with_duration(3600.0)
        .with_time_step(900.0)
}

/// A three-component crude at 870 kg/m³.
pub fn crude() -> Arc<dyn Substance> {
    let oil = SimpleSubstance::builder("test crude")
        .density(870.0)
        .component(0.5, ComponentKind::Saturate, 480.0)
        .component(0.3, ComponentKind::Aromatic, 590.0)
        .component(0.2, ComponentKind::Resin, 800.0)
        .build();
    match oil {
        Ok(oil) => Arc::new(oil),
        Err(reason) => panic!("canned crude is invalid: {reason}"),
    }
}

/// A substance that never weathers.
pub fn tracer() -> Arc<dyn Substance> {
    Arc::new(SimpleSubstance::non_weathering("tracer", 1000.0))
}

/// An instantaneous point spill of `n` elements and `kg` at `position`,
/// released at [`t0`].
pub fn point_spill(
    substance: Arc<dyn Substance>,
    n: usize,
    kg: f64,
    position: WorldPoint,
) -> Spill {
    let release = PointLineRelease::builder(t0(), position)
        .num_elements(n)
        .build();
    let spill = release
        .map_err(|e| e.to_string())
        .and_then(|r| {
            Spill::builder(r, substance)
                .amount(kg, "kg")
                .build()
                .map_err(|e| e.to_string())
        });
    match spill {
        Ok(spill) => spill,
        Err(reason) => panic!("canned spill is invalid: {reason}"),
    }
}

/// A spatially uniform, steady current in m/s.
pub fn uniform_current(u: f64, v: f64) -> VectorField {
    Arc::new(ConstantField::new("current", "m/s", [u, v]))
}

// ── BoundedField ───────────────────────────────────────────────────

/// Uniform velocity inside `lon <= max_lon`, unsampleable beyond it.
///
/// Particles crossing `max_lon` are reported off-map by movers driven
/// by this field.
pub struct BoundedField {
    pub velocity: [f64; 2],
    pub max_lon: f64,
}

impl BoundedField {
    pub fn shared(velocity: [f64; 2], max_lon: f64) -> VectorField {
        Arc::new(Self { velocity, max_lon })
    }
}

impl EnvironmentField for BoundedField {
    type Value = [f64; 2];

    fn name(&self) -> &str {
        "bounded current"
    }

    fn units(&self) -> &str {
        "m/s"
    }

    fn time_bounds(&self) -> TimeBounds {
        TimeBounds::unbounded()
    }

    fn at(
        &self,
        points: &[WorldPoint],
        _time: NaiveDateTime,
    ) -> Result<Vec<Option<[f64; 2]>>, EnvError> {
        Ok(points
            .iter()
            .map(|p| (p[0] <= self.max_lon).then_some(self.velocity))
            .collect())
    }
}

// ── RecordingOutputter ─────────────────────────────────────────────

/// What a [`RecordingOutputter`] keeps from one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub step: usize,
    pub model_time: NaiveDateTime,
    pub positions: Vec<WorldPoint>,
    pub status: Vec<LeStatus>,
    pub mass: f64,
    pub removed: f64,
    pub uncertain_positions: Option<Vec<WorldPoint>>,
}

/// Records a [`Frame`] per step into a shared buffer.
///
/// The model takes ownership of the outputter, so the test keeps a
/// [`frames`](Self::frames) handle to read the buffer afterwards.
#[derive(Clone, Debug, Default)]
pub struct RecordingOutputter {
    frames: Arc<Mutex<Vec<Frame>>>,
    prepared: Arc<Mutex<Option<(NaiveDateTime, usize)>>>,
}

impl RecordingOutputter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded frames.
    pub fn frames(&self) -> Arc<Mutex<Vec<Frame>>> {
        Arc::clone(&self.frames)
    }

    /// Copy of the recorded frames.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// Start time and step count from the last `prepare_for_model_run`.
    pub fn prepared(&self) -> Option<(NaiveDateTime, usize)> {
        self.prepared.lock().ok().and_then(|p| *p)
    }
}

impl Outputter for RecordingOutputter {
    fn name(&self) -> &str {
        "recorder"
    }

    fn prepare_for_model_run(&mut self, start_time: NaiveDateTime, num_steps: usize) {
        if let Ok(mut p) = self.prepared.lock() {
            *p = Some((start_time, num_steps));
        }
        if let Ok(mut f) = self.frames.lock() {
            f.clear();
        }
    }

    fn write_output(&mut self, output: &StepOutput<'_>) -> Result<(), OutputError> {
        let store = output.certain.store();
        let frame = Frame {
            step: output.step,
            model_time: output.model_time,
            positions: store.positions().to_vec(),
            status: store.status().to_vec(),
            mass: store.total_mass(),
            removed: output.certain_ledger.total_removed(),
            uncertain_positions: output
                .uncertain
                .map(|(sc, _)| sc.store().positions().to_vec()),
        };
        self.frames
            .lock()
            .map_err(|_| OutputError::new("frame buffer poisoned"))?
            .push(frame);
        Ok(())
    }
}
