//! [`Spill`]: a release policy plus the oil it releases.

use std::ops::Range;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slick_core::{FateFlags, SpillId, StoreError, Substance, SubstanceId};
use slick_env::Water;
use slick_release::Release;
use slick_store::{ArrayDef, ParticleStore};
use slick_weatherers::cleanup::REFERENCE_TEMPERATURE;
use slick_weatherers::AmountUnit;

use crate::config::ConfigError;
use crate::initializers::Initializer;

const RNG_SALT: u64 = 0x7370_696c_6c00_0000;

/// One source of oil: where and when particles appear, what they are
/// made of, how much mass they carry, and how their optional columns
/// start out.
///
/// The release counts are shared by both populations; each population
/// draws initializer randomness from its own stream.
#[derive(Debug)]
pub struct Spill {
    name: String,
    release: Release,
    substance: Arc<dyn Substance>,
    substance_id: SubstanceId,
    amount: f64,
    initializers: Vec<Initializer>,
    on: bool,
    rngs: [ChaCha8Rng; 2],
}

/// Builder for [`Spill`].
#[derive(Debug)]
pub struct SpillBuilder {
    name: String,
    release: Release,
    substance: Arc<dyn Substance>,
    amount: f64,
    units: String,
    water: Option<Water>,
    initializers: Vec<Initializer>,
    on: bool,
}

impl SpillBuilder {
    /// Name for logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Total amount released, as a mass or volume. Default: 0 kg.
    pub fn amount(mut self, amount: f64, units: impl Into<String>) -> Self {
        self.amount = amount;
        self.units = units.into();
        self
    }

    /// Water whose temperature converts a volume amount to mass.
    pub fn water(mut self, water: Water) -> Self {
        self.water = Some(water);
        self
    }

    /// Append an initializer.
    pub fn initializer(mut self, init: Initializer) -> Self {
        self.initializers.push(init);
        self
    }

    /// Start switched on or off. Default: on.
    pub fn on(mut self, on: bool) -> Self {
        self.on = on;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Spill, ConfigError> {
        if !(self.amount.is_finite() && self.amount >= 0.0) {
            return Err(ConfigError::Registry {
                kind: "spill",
                reason: format!("amount must be finite and non-negative, got {}", self.amount),
            });
        }
        let (unit, si) = AmountUnit::parse(self.amount, &self.units)?;
        let temp = self
            .water
            .as_ref()
            .map_or(REFERENCE_TEMPERATURE, Water::temperature);
        let amount = unit.to_kg(si, self.substance.density_at_temp(temp));
        for init in &self.initializers {
            init.validate()?;
            if *init == Initializer::MassFromPlume
                && !matches!(self.release, Release::VerticalPlume(_))
            {
                return Err(ConfigError::InvalidInitializer {
                    reason: "mass from plume needs a vertical plume release".to_string(),
                });
            }
        }
        Ok(Spill {
            name: self.name,
            release: self.release,
            substance: self.substance,
            substance_id: SubstanceId(0),
            amount,
            initializers: self.initializers,
            on: self.on,
            rngs: [
                ChaCha8Rng::seed_from_u64(RNG_SALT),
                ChaCha8Rng::seed_from_u64(RNG_SALT ^ 1),
            ],
        })
    }
}

impl Spill {
    /// Start building a spill of `substance` released by `release`.
    pub fn builder(release: impl Into<Release>, substance: Arc<dyn Substance>) -> SpillBuilder {
        SpillBuilder {
            name: "spill".to_string(),
            release: release.into(),
            substance,
            amount: 0.0,
            units: "kg".to_string(),
            water: None,
            initializers: Vec::new(),
            on: true,
        }
    }

    /// Name for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The release policy.
    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Mutable release policy, for the orchestrator.
    pub fn release_mut(&mut self) -> &mut Release {
        &mut self.release
    }

    /// The substance released.
    pub fn substance(&self) -> &Arc<dyn Substance> {
        &self.substance
    }

    /// Index of the substance in the model's containers.
    pub fn substance_id(&self) -> SubstanceId {
        self.substance_id
    }

    pub(crate) fn set_substance_id(&mut self, id: SubstanceId) {
        self.substance_id = id;
    }

    /// Total amount in kg.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Initializers, in application order.
    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    /// Whether the spill releases anything.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Switch the spill on or off.
    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    /// Columns the spill's initializers write.
    pub fn array_types(&self) -> Vec<ArrayDef> {
        self.initializers
            .iter()
            .flat_map(Initializer::array_types)
            .collect()
    }

    /// Mass carried by each element, in kg.
    ///
    /// Plume-driven spills use the plume's per-element mass. Otherwise
    /// the amount is split over the release's expected element count,
    /// estimated from `dt` for per-step releases.
    pub fn element_mass(&self, dt: f64) -> f64 {
        if let (true, Release::VerticalPlume(p)) = (
            self.initializers.contains(&Initializer::MassFromPlume),
            &self.release,
        ) {
            return p.le_mass();
        }
        match self.release.estimated_total_elements(dt) {
            0 => 0.0,
            n => self.amount / n as f64,
        }
    }

    /// Fate given to a new particle at depth `z`.
    pub fn initial_fate(&self, z: f64) -> FateFlags {
        if !self.substance.is_weathering() {
            FateFlags::NON_WEATHERING
        } else if z > 0.0 {
            FateFlags::SUBSURFACE
        } else {
            FateFlags::SURFACE_WEATHER
        }
    }

    /// Reseed the per-population initializer streams. `index` is the
    /// spill's position in the model so spills draw independently.
    pub fn prepare_for_model_run(&mut self, seed: u64, index: usize) {
        let base = seed ^ RNG_SALT ^ ((index as u64) << 1);
        self.rngs = [
            ChaCha8Rng::seed_from_u64(base),
            ChaCha8Rng::seed_from_u64(base ^ 1),
        ];
    }

    /// Back to nothing released.
    pub fn rewind(&mut self) {
        self.release.rewind();
    }

    /// Fill the newly appended `rows` of a population's store: mass and
    /// components, fate, then every initializer in order.
    pub fn initialize_elements(
        &mut self,
        id: SpillId,
        rows: Range<usize>,
        store: &mut ParticleStore,
        element_mass: f64,
        uncertain: bool,
    ) -> Result<(), StoreError> {
        let fractions = self.substance.mass_fractions().to_vec();
        for row in rows.clone() {
            store.set_row_mass(row, element_mass, &fractions);
            let z = store.positions()[row][2];
            store.fate_mut()[row] = self.initial_fate(z);
        }
        let rng = &mut self.rngs[usize::from(uncertain)];
        for init in &self.initializers {
            init.initialize(rows.clone(), store, self.substance.as_ref(), rng)?;
        }
        tracing::trace!(
            spill = %self.name,
            spill_id = id.0,
            rows = rows.len(),
            "elements initialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers::InitWindages;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use slick_core::{add_seconds, ComponentKind, SimpleSubstance};
    use slick_release::{PlumeSource, PointLineRelease, VerticalPlumeRelease};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn oil() -> Arc<dyn Substance> {
        Arc::new(
            SimpleSubstance::builder("oil")
                .density(900.0)
                .component(0.7, ComponentKind::Saturate, 500.0)
                .component(0.3, ComponentKind::Aromatic, 600.0)
                .build()
                .unwrap(),
        )
    }

    fn point(n: usize) -> PointLineRelease {
        PointLineRelease::builder(t0(), [0.0, 0.0, 0.0])
            .num_elements(n)
            .build()
            .unwrap()
    }

    #[test]
    fn mass_is_split_over_elements() {
        let s = Spill::builder(point(100), oil())
            .amount(1000.0, "kg")
            .build()
            .unwrap();
        assert_relative_eq!(s.element_mass(900.0), 10.0);
    }

    #[test]
    fn volume_amount_uses_reference_density() {
        let s = Spill::builder(point(10), oil())
            .amount(1.0, "m^3")
            .build()
            .unwrap();
        assert_relative_eq!(s.amount(), 900.0, max_relative = 1e-12);
    }

    #[test]
    fn per_step_release_estimates_total() {
        let r = PointLineRelease::builder(t0(), [0.0, 0.0, 0.0])
            .end_release_time(add_seconds(t0(), 3600.0))
            .num_per_timestep(5)
            .build()
            .unwrap();
        let s = Spill::builder(r, oil()).amount(20.0, "kg").build().unwrap();
        // two steps of 1800 s, five elements each
        assert_relative_eq!(s.element_mass(1800.0), 2.0);
    }

    #[test]
    fn plume_mass_comes_from_flux() {
        let source = PlumeSource::vertical_column([0.0, 0.0, 0.0], &[100.0], vec![1.0]);
        let plume =
            VerticalPlumeRelease::new(t0(), add_seconds(t0(), 1000.0), source, Some(50)).unwrap();
        let s = Spill::builder(plume, oil())
            .amount(1.0, "kg")
            .initializer(Initializer::MassFromPlume)
            .build()
            .unwrap();
        assert_relative_eq!(s.element_mass(60.0), 20.0);
    }

    #[test]
    fn plume_mass_needs_plume_release() {
        let err = Spill::builder(point(1), oil())
            .initializer(Initializer::MassFromPlume)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInitializer { .. }));
    }

    #[test]
    fn invalid_windage_is_a_release_error() {
        let err = Spill::builder(point(1), oil())
            .initializer(Initializer::Windages(InitWindages {
                windage_range: [0.01, 0.04],
                windage_persist: 0.0,
            }))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Release(_)));
    }

    #[test]
    fn fates_follow_depth_and_substance() {
        let s = Spill::builder(point(1), oil()).build().unwrap();
        assert_eq!(s.initial_fate(0.0), FateFlags::SURFACE_WEATHER);
        assert_eq!(s.initial_fate(50.0), FateFlags::SUBSURFACE);
        let tracer = Arc::new(SimpleSubstance::non_weathering("tracer", 1000.0));
        let inert = Spill::builder(point(1), tracer).build().unwrap();
        assert_eq!(inert.initial_fate(0.0), FateFlags::NON_WEATHERING);
    }

    #[test]
    fn initialize_sets_mass_components() {
        let mut s = Spill::builder(point(3), oil())
            .initializer(Initializer::Windages(InitWindages::default()))
            .build()
            .unwrap();
        let mut store = ParticleStore::new(2);
        for d in s.array_types() {
            store.declare(&d).unwrap();
        }
        let rows = store.append(3, SpillId(0), SubstanceId(0));
        s.initialize_elements(SpillId(0), rows, &mut store, 2.0, false)
            .unwrap();
        assert_eq!(store.component_row(1), &[1.4, 0.6]);
        store.check_mass_invariant(1e-12).unwrap();
        assert!(store.array(slick_store::names::WINDAGES).unwrap()[2] > 0.0);
    }
}
