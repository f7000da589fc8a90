//! The step orchestrator.
//!
//! [`Model`] owns the spills, movers, weatherers and outputters of a run,
//! plus the certain population and its optional uncertain twin. Each call
//! to [`step()`](Model::step) runs one complete step:
//!
//! 1. Release new particles into both populations.
//! 2. Prepare every mover and weatherer.
//! 3. Sum mover displacements and apply them.
//! 4. Weather in registration order.
//! 5. Age particles, retire off-map rows, and compact.
//! 6. Check the mass invariant, advance the clock, run outputters.
//!
//! A step either completes steps 1-6 for both populations or returns an
//! error. Outputters see only committed state.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use slick_core::{add_seconds, LeStatus, SpillId, StoreError, Substance};
use slick_movers::{Displacement, MoveContext, Mover, MoverError};
use slick_release::ReleaseError;
use slick_store::ArrayDef;
use slick_weatherers::{WeatherContext, Weatherer, WeathererError};

use crate::config::{ConfigError, ModelConfig};
use crate::container::{Population, SpillContainerPair};
use crate::metrics::StepMetrics;
use crate::output::{Outputter, StepOutput};
use crate::spill::Spill;

/// Ledger entry for mass carried off the map by retired particles.
pub const OFF_MAPS: &str = "off_maps";

// ── StepError ──────────────────────────────────────────────────────

/// Errors from a single step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A mover failed to prepare or produce a displacement.
    #[error("mover '{mover}' failed: {source}")]
    MoverFailed {
        /// Name of the failing mover.
        mover: String,
        /// The underlying error.
        #[source]
        source: MoverError,
    },
    /// A weatherer failed to prepare or remove mass.
    #[error("weatherer '{weatherer}' failed: {source}")]
    WeathererFailed {
        /// Name of the failing weatherer.
        weatherer: String,
        /// The underlying error.
        #[source]
        source: WeathererError,
    },
    /// A store invariant was violated.
    #[error("particle store: {0}")]
    Store(#[from] StoreError),
    /// A release could not place its particles.
    #[error("release: {0}")]
    Release(#[from] ReleaseError),
    /// An outputter rejected the step. The step itself is committed.
    #[error("outputter '{outputter}' failed: {reason}")]
    OutputFailed {
        /// Name of the failing outputter.
        outputter: String,
        /// The outputter's message.
        reason: String,
    },
    /// Every step of the run has been taken.
    #[error("run complete after {steps} steps")]
    RunComplete {
        /// Steps in the run.
        steps: usize,
    },
}

// ── ModelBuilder ───────────────────────────────────────────────────

/// Builder for [`Model`].
pub struct ModelBuilder {
    config: ModelConfig,
    spills: Vec<Spill>,
    movers: Vec<Box<dyn Mover>>,
    weatherers: Vec<Box<dyn Weatherer>>,
    outputters: Vec<Box<dyn Outputter>>,
}

impl ModelBuilder {
    /// Add a spill.
    pub fn spill(mut self, spill: Spill) -> Self {
        self.spills.push(spill);
        self
    }

    /// Add a mover. Mover contributions are summed, so order is irrelevant.
    pub fn mover(mut self, mover: impl Mover) -> Self {
        self.movers.push(Box::new(mover));
        self
    }

    /// Add a boxed mover.
    pub fn boxed_mover(mut self, mover: Box<dyn Mover>) -> Self {
        self.movers.push(mover);
        self
    }

    /// Add a weatherer. Weatherers run in the order they are added.
    pub fn weatherer(mut self, weatherer: impl Weatherer) -> Self {
        self.weatherers.push(Box::new(weatherer));
        self
    }

    /// Add a boxed weatherer.
    pub fn boxed_weatherer(mut self, weatherer: Box<dyn Weatherer>) -> Self {
        self.weatherers.push(weatherer);
        self
    }

    /// Add an outputter.
    pub fn outputter(mut self, outputter: impl Outputter) -> Self {
        self.outputters.push(Box::new(outputter));
        self
    }

    /// Validate the configuration and assemble the model.
    ///
    /// Substances are shared by identity: spills holding the same `Arc`
    /// share a substance id.
    pub fn build(mut self) -> Result<Model, ConfigError> {
        self.config.validate()?;
        if self.spills.is_empty() {
            return Err(ConfigError::NoSpills);
        }

        let mut substances: Vec<Arc<dyn Substance>> = Vec::new();
        for spill in &self.spills {
            if !substances.iter().any(|s| Arc::ptr_eq(s, spill.substance())) {
                substances.push(Arc::clone(spill.substance()));
            }
        }
        if substances.len() > 1 {
            tracing::error!(
                substances = substances.len(),
                "spills release different substances; weatherers use the first"
            );
        }
        let containers = SpillContainerPair::new(substances, self.config.uncertain)?;
        for spill in &mut self.spills {
            if let Some(id) = containers.substance_id(spill.substance()) {
                spill.set_substance_id(id);
            }
        }

        let start = self.config.start_time;
        Ok(Model {
            config: self.config,
            spills: self.spills,
            movers: self.movers,
            weatherers: self.weatherers,
            outputters: self.outputters,
            containers,
            current_step: 0,
            model_time: start,
            prepared: false,
            last_metrics: StepMetrics::default(),
        })
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// A configured oil-spill run.
///
/// # Example
///
/// ```ignore
/// let mut model = Model::builder(config)
///     .spill(spill)
///     .mover(WindMover::new(wind))
///     .weatherer(skimmer)
///     .build()?;
/// model.full_run()?;
/// let ledger = &model.containers().certain().ledger;
/// ```
pub struct Model {
    config: ModelConfig,
    spills: Vec<Spill>,
    movers: Vec<Box<dyn Mover>>,
    weatherers: Vec<Box<dyn Weatherer>>,
    outputters: Vec<Box<dyn Outputter>>,
    containers: SpillContainerPair,
    current_step: usize,
    model_time: NaiveDateTime,
    prepared: bool,
    last_metrics: StepMetrics,
}

impl Model {
    /// Start building a model with `config`.
    pub fn builder(config: ModelConfig) -> ModelBuilder {
        ModelBuilder {
            config,
            spills: Vec::new(),
            movers: Vec::new(),
            weatherers: Vec::new(),
            outputters: Vec::new(),
        }
    }

    /// The run configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Spills in registration order.
    pub fn spills(&self) -> &[Spill] {
        &self.spills
    }

    /// Mutable spills, e.g. to switch one off between steps.
    pub fn spills_mut(&mut self) -> &mut [Spill] {
        &mut self.spills
    }

    /// Movers in registration order.
    pub fn movers(&self) -> &[Box<dyn Mover>] {
        &self.movers
    }

    /// Weatherers in execution order.
    pub fn weatherers(&self) -> &[Box<dyn Weatherer>] {
        &self.weatherers
    }

    /// The particle populations and their ledgers.
    pub fn containers(&self) -> &SpillContainerPair {
        &self.containers
    }

    /// Steps taken since the last rewind.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Model time at the start of the next step.
    pub fn model_time(&self) -> NaiveDateTime {
        self.model_time
    }

    /// Steps in the full run.
    pub fn num_time_steps(&self) -> usize {
        self.config.num_time_steps()
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Reset everything to the start of the run: empty populations,
    /// declared columns, reseeded RNGs, zeroed ledgers.
    ///
    /// Called automatically by the first [`step()`](Self::step) after
    /// construction or [`rewind()`](Self::rewind).
    pub fn prepare_for_model_run(&mut self) -> Result<(), StepError> {
        for spill in &mut self.spills {
            spill.rewind();
        }
        self.containers.rewind();

        let defs: Vec<ArrayDef> = self
            .movers
            .iter()
            .flat_map(|m| m.array_types())
            .chain(self.weatherers.iter().flat_map(|w| w.array_types()))
            .chain(self.spills.iter().flat_map(Spill::array_types))
            .collect();
        self.containers.declare_all(&defs)?;

        let seed = self.config.seed;
        for mover in &mut self.movers {
            mover.prepare_for_model_run(seed);
        }
        for (index, spill) in self.spills.iter_mut().enumerate() {
            spill.prepare_for_model_run(seed, index);
        }
        for pop in self.containers.iter_mut() {
            pop.ledger.reset(OFF_MAPS);
            for weatherer in &mut self.weatherers {
                weatherer.prepare_for_model_run(&mut pop.ledger);
            }
        }
        let num_steps = self.config.num_time_steps();
        for outputter in &mut self.outputters {
            outputter.prepare_for_model_run(self.config.start_time, num_steps);
        }

        self.current_step = 0;
        self.model_time = self.config.start_time;
        self.prepared = true;
        tracing::info!(
            start = %self.config.start_time,
            steps = num_steps,
            spills = self.spills.len(),
            movers = self.movers.len(),
            weatherers = self.weatherers.len(),
            uncertain = self.containers.has_uncertain(),
            seed,
            "model run prepared"
        );
        Ok(())
    }

    /// Discard all particles and return to the start of the run.
    pub fn rewind(&mut self) {
        for spill in &mut self.spills {
            spill.rewind();
        }
        self.containers.rewind();
        self.current_step = 0;
        self.model_time = self.config.start_time;
        self.prepared = false;
        self.last_metrics = StepMetrics::default();
        tracing::info!("model rewound");
    }

    /// Run one step and return its metrics.
    ///
    /// # Errors
    ///
    /// [`StepError::RunComplete`] once every step has been taken. An
    /// [`OutputFailed`](StepError::OutputFailed) error leaves the step
    /// committed; any other error leaves the model mid-step and it must
    /// be rewound.
    pub fn step(&mut self) -> Result<StepMetrics, StepError> {
        let num_steps = self.config.num_time_steps();
        if self.current_step >= num_steps {
            return Err(StepError::RunComplete { steps: num_steps });
        }
        if !self.prepared {
            self.prepare_for_model_run()?;
        }

        let step_start = Instant::now();
        let step = self.current_step;
        let t = self.model_time;
        let dt = self.config.step_length(step);
        let elapsed = step as f64 * self.config.time_step_secs;
        let mut metrics = StepMetrics::default();

        // 1. Release.
        let release_start = Instant::now();
        metrics.released = self.release_elements(t, dt)?;
        metrics.release_us = release_start.elapsed().as_micros() as u64;

        let total_spill_mass: f64 = self
            .spills
            .iter()
            .filter(|s| s.is_on())
            .map(Spill::amount)
            .sum();
        let move_ctx = MoveContext {
            model_time: t,
            dt,
            elapsed,
        };
        for pop in self.containers.iter_mut() {
            let weather_ctx = WeatherContext {
                model_time: t,
                dt,
                elapsed,
                total_spill_mass,
            };

            // 2. Prepare.
            for mover in &mut self.movers {
                let started = Instant::now();
                mover
                    .prepare_for_model_step(&move_ctx, &mut pop.sc)
                    .map_err(|source| mover_failed(mover.as_ref(), source))?;
                StepMetrics::charge(
                    &mut metrics.mover_us,
                    mover.name(),
                    started.elapsed().as_micros() as u64,
                );
            }
            for weatherer in &mut self.weatherers {
                let started = Instant::now();
                weatherer
                    .prepare_for_model_step(&weather_ctx, &mut pop.sc)
                    .map_err(|source| weatherer_failed(weatherer.as_ref(), source))?;
                StepMetrics::charge(
                    &mut metrics.weatherer_us,
                    weatherer.name(),
                    started.elapsed().as_micros() as u64,
                );
            }

            // 3. Move.
            let mut total = Displacement::zeros(pop.sc.len());
            for mover in &mut self.movers {
                let started = Instant::now();
                let d = mover
                    .get_move(&move_ctx, &pop.sc)
                    .map_err(|source| mover_failed(mover.as_ref(), source))?;
                total.accumulate(&d);
                StepMetrics::charge(
                    &mut metrics.mover_us,
                    mover.name(),
                    started.elapsed().as_micros() as u64,
                );
            }
            apply_displacement(pop, &total);

            // 4. Weather.
            for weatherer in &mut self.weatherers {
                let started = Instant::now();
                weatherer
                    .weather_elements(&weather_ctx, &mut pop.sc, &mut pop.ledger)
                    .map_err(|source| weatherer_failed(weatherer.as_ref(), source))?;
                StepMetrics::charge(
                    &mut metrics.weatherer_us,
                    weatherer.name(),
                    started.elapsed().as_micros() as u64,
                );
            }

            // 5. Finalize.
            let store = pop.sc.store_mut();
            for age in store.age_mut() {
                *age += dt;
            }
            for status in store.status_mut() {
                if *status == LeStatus::OffMap {
                    *status = LeStatus::ToBeRemoved;
                }
            }
        }

        if (step + 1) % self.config.compact_every == 0 {
            for pop in self.containers.iter_mut() {
                for mover in &mut self.movers {
                    mover
                        .model_step_is_done(&pop.sc)
                        .map_err(|source| mover_failed(mover.as_ref(), source))?;
                }
                let removed = compact(pop);
                if !pop.uncertain() {
                    metrics.removed = removed;
                }
            }
        }

        // 6. Commit.
        for pop in self.containers.iter() {
            pop.sc.store().check_mass_invariant(self.config.mass_tolerance)?;
        }
        self.current_step += 1;
        self.model_time = add_seconds(t, dt);
        metrics.live = self.containers.certain().sc.len();
        tracing::debug!(
            step,
            model_time = %self.model_time,
            released = metrics.released,
            removed = metrics.removed,
            live = metrics.live,
            "step committed"
        );

        let output_start = Instant::now();
        let output_result = self.write_outputs(step);
        metrics.output_us = output_start.elapsed().as_micros() as u64;
        metrics.total_us = step_start.elapsed().as_micros() as u64;
        self.last_metrics = metrics.clone();
        output_result.map(|()| metrics)
    }

    /// Step until the run is complete. Returns the number of steps taken
    /// by this call.
    pub fn full_run(&mut self) -> Result<usize, StepError> {
        let num_steps = self.config.num_time_steps();
        let mut taken = 0;
        while self.current_step < num_steps {
            self.step()?;
            taken += 1;
        }
        tracing::info!(steps = taken, end = %self.model_time, "model run complete");
        Ok(taken)
    }

    /// Release this step's particles into every population. The count and
    /// positions are computed once per spill and shared by both
    /// populations; only the initializer draws differ.
    fn release_elements(&mut self, t: NaiveDateTime, dt: f64) -> Result<usize, StepError> {
        let mut released = 0;
        for (index, spill) in self.spills.iter_mut().enumerate() {
            if !spill.is_on() {
                continue;
            }
            let n = spill.release_mut().num_elements_to_release(t, dt);
            if n == 0 {
                continue;
            }
            let mut positions = vec![[0.0; 3]; n];
            spill
                .release_mut()
                .set_newparticle_positions(n, t, dt, &mut positions)?;
            let element_mass = spill.element_mass(self.config.time_step_secs);
            let id = SpillId(index as u32);

            for pop in self.containers.iter_mut() {
                let uncertain = pop.uncertain();
                let store = pop.sc.store_mut();
                let rows = store.append(n, id, spill.substance_id());
                store.positions_mut()[rows.clone()].copy_from_slice(&positions);
                spill.initialize_elements(id, rows, store, element_mass, uncertain)?;
                pop.sc.note_released(n);
                pop.ledger.record_release(element_mass * n as f64);
            }
            tracing::debug!(spill = spill.name(), n, element_mass, "particles released");
            released += n;
        }
        Ok(released)
    }

    fn write_outputs(&mut self, step: usize) -> Result<(), StepError> {
        let certain = self.containers.certain();
        let output = StepOutput {
            step,
            model_time: self.model_time,
            certain: &certain.sc,
            certain_ledger: &certain.ledger,
            uncertain: self.containers.uncertain().map(|p| (&p.sc, &p.ledger)),
        };
        let mut first_error = None;
        for outputter in &mut self.outputters {
            if let Err(e) = outputter.write_output(&output) {
                tracing::error!(outputter = outputter.name(), step, error = %e, "output failed");
                if first_error.is_none() {
                    first_error = Some(StepError::OutputFailed {
                        outputter: outputter.name().to_string(),
                        reason: e.reason,
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn mover_failed(mover: &dyn Mover, source: MoverError) -> StepError {
    StepError::MoverFailed {
        mover: mover.name().to_string(),
        source,
    }
}

fn weatherer_failed(weatherer: &dyn Weatherer, source: WeathererError) -> StepError {
    StepError::WeathererFailed {
        weatherer: weatherer.name().to_string(),
        source,
    }
}

/// Mark off-map rows, then move in-water rows by the summed
/// displacement. Depth never goes above the surface.
fn apply_displacement(pop: &mut Population, total: &Displacement) {
    let store = pop.sc.store_mut();
    for &row in &total.off_map {
        if let Some(status) = store.status_mut().get_mut(row) {
            *status = LeStatus::OffMap;
        }
    }
    let active: Vec<bool> = store.status().iter().map(|s| s.is_active()).collect();
    for ((p, d), active) in store.positions_mut().iter_mut().zip(&total.delta).zip(active) {
        if active {
            p[0] += d[0];
            p[1] += d[1];
            p[2] = (p[2] + d[2]).max(0.0);
        }
    }
}

/// Book the mass of retired rows and drop them.
fn compact(pop: &mut Population) -> usize {
    let store = pop.sc.store();
    let retired: f64 = store
        .status()
        .iter()
        .zip(store.mass())
        .filter(|(s, _)| **s == LeStatus::ToBeRemoved)
        .map(|(_, m)| m)
        .sum();
    if retired > 0.0 {
        pop.ledger.add(OFF_MAPS, retired);
    }
    pop.sc.store_mut().compact_removed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputError;
    use chrono::NaiveDate;
    use slick_core::SimpleSubstance;
    use slick_release::PointLineRelease;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 2, 13)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn spill(n: usize) -> Spill {
        let oil: Arc<dyn Substance> =
            Arc::new(SimpleSubstance::builder("oil").density(900.0).build().unwrap());
        let release = PointLineRelease::builder(t0(), [-128.0, 28.0, 0.0])
            .num_elements(n)
            .build()
            .unwrap();
        Spill::builder(release, oil).amount(100.0, "kg").build().unwrap()
    }

    fn config() -> ModelConfig {
        ModelConfig::new(t0()).with_duration(3600.0).with_time_step(900.0)
    }

    struct Failing;

    impl Outputter for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn write_output(&mut self, _output: &StepOutput<'_>) -> Result<(), OutputError> {
            Err(OutputError::new("disk full"))
        }
    }

    #[test]
    fn build_requires_a_spill() {
        let err = Model::builder(config()).build().err().unwrap();
        assert!(matches!(err, ConfigError::NoSpills));
    }

    #[test]
    fn build_validates_config() {
        let err = Model::builder(config().with_time_step(0.0))
            .spill(spill(1))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidTimeStep { .. }));
    }

    #[test]
    fn first_step_releases_and_ledgers_mass() {
        let mut model = Model::builder(config()).spill(spill(10)).build().unwrap();
        let m = model.step().unwrap();
        assert_eq!(m.released, 10);
        assert_eq!(m.live, 10);
        let certain = model.containers().certain();
        assert_eq!(certain.sc.num_released(), 10);
        assert!((certain.ledger.amount_released() - 100.0).abs() < 1e-9);
        assert!(certain.sc.store().age().iter().all(|&a| a == 900.0));
        assert_eq!(model.current_step(), 1);
        assert_eq!(model.model_time(), add_seconds(t0(), 900.0));
    }

    #[test]
    fn run_complete_after_last_step() {
        let mut model = Model::builder(config()).spill(spill(1)).build().unwrap();
        assert_eq!(model.full_run().unwrap(), 4);
        assert!(matches!(model.step(), Err(StepError::RunComplete { steps: 4 })));
    }

    #[test]
    fn output_failure_commits_the_step() {
        let mut model = Model::builder(config())
            .spill(spill(3))
            .outputter(Failing)
            .build()
            .unwrap();
        let err = model.step().unwrap_err();
        assert!(matches!(
            err,
            StepError::OutputFailed { ref outputter, .. } if outputter == "failing"
        ));
        assert_eq!(model.current_step(), 1);
        assert_eq!(model.containers().certain().sc.len(), 3);
        assert_eq!(model.last_metrics().released, 3);
    }

    #[test]
    fn uncertain_twin_gets_the_same_releases() {
        let mut model = Model::builder(config().with_uncertain(true))
            .spill(spill(7))
            .build()
            .unwrap();
        model.step().unwrap();
        let pair = model.containers();
        let u = pair.uncertain().unwrap();
        assert_eq!(u.sc.len(), 7);
        assert_eq!(u.sc.store().positions(), pair.certain().sc.store().positions());
    }

    #[test]
    fn rewind_empties_the_populations() {
        let mut model = Model::builder(config()).spill(spill(5)).build().unwrap();
        model.full_run().unwrap();
        model.rewind();
        assert_eq!(model.current_step(), 0);
        assert_eq!(model.model_time(), t0());
        assert!(model.containers().certain().sc.is_empty());
        assert_eq!(model.containers().certain().ledger.amount_released(), 0.0);
    }
}
