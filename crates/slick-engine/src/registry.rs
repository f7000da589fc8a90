//! Named constructors for building models from JSON.
//!
//! A description is a JSON object whose `"type"` key selects a
//! constructor; the remaining keys are that constructor's parameters.
//! [`Registry::with_defaults`] knows every mover, weatherer and release
//! kind in the workspace. Callers may register their own types or
//! replace a default under the same name.
//!
//! A whole scenario can be built in one call:
//!
//! ```ignore
//! let model = Registry::with_defaults().build_model(&serde_json::json!({
//!     "config": { "start_time": "2015-05-14T00:00:00", "duration_secs": 86400.0 },
//!     "substance": { "name": "crude", "density": 870.0 },
//!     "spills": [{ "type": "PointLineRelease", "release_time": "2015-05-14T00:00:00",
//!                  "start_position": [-128.0, 28.0, 0.0], "num_elements": 1000,
//!                  "amount": 100.0, "units": "bbl" }],
//!     "movers": [{ "type": "WindMover", "wind": { "kind": "constant", "speed": 5.0, "direction": 45.0 } }],
//! }))?;
//! ```

use std::sync::Arc;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use slick_core::{ActiveWindow, ComponentKind, SimpleSubstance, Substance, WorldPoint};
use slick_env::{ConstantField, TimeSeries, Water, WaterParams, Waves, Wind};
use slick_movers::{
    CurrentMover, Mover, NumMethod, RandomMover, RiseVelocityMover, UncertaintyParams,
    VectorField, WindMover,
};
use slick_release::{
    ContinuousRelease, PlumeSource, PointLineRelease, Release, SpatialRelease,
    VerticalPlumeRelease,
};
use slick_weatherers::{Biodegradation, Burn, ChemicalDispersion, Skimmer, Weatherer};

use crate::config::{ConfigError, ModelConfig};
use crate::initializers::{Distribution, InitWindages, Initializer};
use crate::model::Model;
use crate::spill::Spill;

/// Builds a mover from its description.
pub type MoverCtor = fn(&Value) -> Result<Box<dyn Mover>, ConfigError>;
/// Builds a weatherer from its description.
pub type WeathererCtor = fn(&Value) -> Result<Box<dyn Weatherer>, ConfigError>;
/// Builds a spill of `substance` from its description.
pub type SpillCtor = fn(&Value, &Arc<dyn Substance>) -> Result<Spill, ConfigError>;

// ── Registry ───────────────────────────────────────────────────────

/// Maps type names to constructors, in registration order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    movers: IndexMap<String, MoverCtor>,
    weatherers: IndexMap<String, WeathererCtor>,
    spills: IndexMap<String, SpillCtor>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in type.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register_mover("CurrentMover", current_mover);
        r.register_mover("WindMover", wind_mover);
        r.register_mover("RandomMover", random_mover);
        r.register_mover("RiseVelocityMover", rise_velocity_mover);
        r.register_weatherer("Skimmer", skimmer);
        r.register_weatherer("Burn", burn);
        r.register_weatherer("ChemicalDispersion", chemical_dispersion);
        r.register_weatherer("Biodegradation", biodegradation);
        r.register_spill("PointLineRelease", point_line_spill);
        r.register_spill("SpatialRelease", spatial_spill);
        r.register_spill("ContinuousRelease", continuous_spill);
        r.register_spill("VerticalPlumeRelease", plume_spill);
        r
    }

    /// Register a mover type. Returns the constructor it replaced.
    pub fn register_mover(
        &mut self,
        type_name: impl Into<String>,
        ctor: MoverCtor,
    ) -> Option<MoverCtor> {
        self.movers.insert(type_name.into(), ctor)
    }

    /// Register a weatherer type. Returns the constructor it replaced.
    pub fn register_weatherer(
        &mut self,
        type_name: impl Into<String>,
        ctor: WeathererCtor,
    ) -> Option<WeathererCtor> {
        self.weatherers.insert(type_name.into(), ctor)
    }

    /// Register a spill type. Returns the constructor it replaced.
    pub fn register_spill(
        &mut self,
        type_name: impl Into<String>,
        ctor: SpillCtor,
    ) -> Option<SpillCtor> {
        self.spills.insert(type_name.into(), ctor)
    }

    /// Registered mover type names.
    pub fn mover_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.movers.keys().map(String::as_str)
    }

    /// Registered weatherer type names.
    pub fn weatherer_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.weatherers.keys().map(String::as_str)
    }

    /// Registered spill type names.
    pub fn spill_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.spills.keys().map(String::as_str)
    }

    /// Build a mover from `desc`.
    pub fn mover(&self, desc: &Value) -> Result<Box<dyn Mover>, ConfigError> {
        let ctor = lookup(&self.movers, "mover", desc)?;
        ctor(desc)
    }

    /// Build a weatherer from `desc`.
    pub fn weatherer(&self, desc: &Value) -> Result<Box<dyn Weatherer>, ConfigError> {
        let ctor = lookup(&self.weatherers, "weatherer", desc)?;
        ctor(desc)
    }

    /// Build a spill of `substance` from `desc`.
    pub fn spill(
        &self,
        desc: &Value,
        substance: &Arc<dyn Substance>,
    ) -> Result<Spill, ConfigError> {
        let ctor = lookup(&self.spills, "spill", desc)?;
        ctor(desc, substance)
    }

    /// Build a model from a scenario with `config`, `substance`, `spills`
    /// and optional `movers` and `weatherers`. Every spill shares the one
    /// substance.
    pub fn build_model(&self, scenario: &Value) -> Result<Model, ConfigError> {
        let s: Scenario = params("scenario", scenario)?;
        let substance = s.substance.build()?;
        let mut builder = Model::builder(s.config);
        for desc in &s.spills {
            builder = builder.spill(self.spill(desc, &substance)?);
        }
        for desc in &s.movers {
            builder = builder.boxed_mover(self.mover(desc)?);
        }
        for desc in &s.weatherers {
            builder = builder.boxed_weatherer(self.weatherer(desc)?);
        }
        tracing::debug!(
            spills = s.spills.len(),
            movers = s.movers.len(),
            weatherers = s.weatherers.len(),
            "scenario parsed"
        );
        builder.build()
    }

    /// [`build_model`](Self::build_model) from JSON text.
    pub fn build_model_from_str(&self, json: &str) -> Result<Model, ConfigError> {
        let scenario: Value = serde_json::from_str(json)?;
        self.build_model(&scenario)
    }
}

fn lookup<C: Copy>(
    table: &IndexMap<String, C>,
    kind: &'static str,
    desc: &Value,
) -> Result<C, ConfigError> {
    let type_name = desc
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::Registry {
            kind,
            reason: "description has no string \"type\" key".to_string(),
        })?;
    table
        .get(type_name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownType {
            kind,
            type_name: type_name.to_string(),
        })
}

fn params<T: DeserializeOwned>(kind: &'static str, desc: &Value) -> Result<T, ConfigError> {
    T::deserialize(desc).map_err(|e| ConfigError::Registry {
        kind,
        reason: e.to_string(),
    })
}

// ── Shared descriptions ────────────────────────────────────────────

#[derive(Deserialize)]
struct Scenario {
    config: ModelConfig,
    substance: SubstanceSpec,
    spills: Vec<Value>,
    #[serde(default)]
    movers: Vec<Value>,
    #[serde(default)]
    weatherers: Vec<Value>,
}

#[derive(Deserialize)]
struct SubstanceSpec {
    name: String,
    density: Option<f64>,
    reference_temperature: Option<f64>,
    k_rho: Option<f64>,
    #[serde(default)]
    components: Vec<ComponentSpec>,
    #[serde(default = "yes")]
    weathering: bool,
}

#[derive(Deserialize)]
struct ComponentSpec {
    fraction: f64,
    kind: ComponentKind,
    boiling_point: f64,
}

impl SubstanceSpec {
    fn build(self) -> Result<Arc<dyn Substance>, ConfigError> {
        let mut b = SimpleSubstance::builder(self.name).weathering(self.weathering);
        if let Some(d) = self.density {
            b = b.density(d);
        }
        if let Some(t) = self.reference_temperature {
            b = b.reference_temperature(t);
        }
        if let Some(k) = self.k_rho {
            b = b.k_rho(k);
        }
        for c in self.components {
            b = b.component(c.fraction, c.kind, c.boiling_point);
        }
        let substance = b.build().map_err(|reason| ConfigError::Registry {
            kind: "substance",
            reason,
        })?;
        Ok(Arc::new(substance))
    }
}

fn yes() -> bool {
    true
}

/// Wind forcing: a steady wind or a time series.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WindSpec {
    Constant {
        speed: f64,
        direction: f64,
    },
    Uv {
        samples: Vec<(NaiveDateTime, [f64; 2])>,
        #[serde(default)]
        extrapolate: bool,
    },
    SpeedDirection {
        samples: Vec<(NaiveDateTime, f64, f64)>,
        #[serde(default)]
        extrapolate: bool,
    },
}

impl WindSpec {
    fn build(self) -> Result<Wind, ConfigError> {
        Ok(match self {
            WindSpec::Constant { speed, direction } => Wind::constant(speed, direction),
            WindSpec::Uv {
                samples,
                extrapolate,
            } => Wind::from_uv(samples, extrapolate)?,
            WindSpec::SpeedDirection {
                samples,
                extrapolate,
            } => Wind::from_speed_direction(samples, extrapolate)?,
        })
    }
}

/// Current forcing: uniform in space, steady or varying in time.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CurrentSpec {
    Uniform {
        velocity: [f64; 2],
    },
    TimeSeries {
        samples: Vec<(NaiveDateTime, [f64; 2])>,
        #[serde(default)]
        extrapolate: bool,
    },
}

impl CurrentSpec {
    fn build(self) -> Result<VectorField, ConfigError> {
        let field: VectorField = match self {
            CurrentSpec::Uniform { velocity } => {
                Arc::new(ConstantField::new("current", "m/s", velocity))
            }
            CurrentSpec::TimeSeries {
                samples,
                extrapolate,
            } => Arc::new(TimeSeries::new("current", "m/s", samples, extrapolate)?),
        };
        Ok(field)
    }
}

// ── Movers ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CurrentMoverParams {
    current: CurrentSpec,
    #[serde(default = "unit_scale")]
    scale: f64,
    #[serde(default)]
    method: NumMethod,
    #[serde(default)]
    window: ActiveWindow,
    #[serde(default)]
    uncertainty: UncertaintyParams,
    name: Option<String>,
}

fn unit_scale() -> f64 {
    1.0
}

fn current_mover(desc: &Value) -> Result<Box<dyn Mover>, ConfigError> {
    let p: CurrentMoverParams = params("mover", desc)?;
    let mut b = CurrentMover::builder(p.current.build()?)
        .scale(p.scale)
        .method(p.method)
        .window(p.window)
        .uncertainty(p.uncertainty);
    if let Some(name) = p.name {
        b = b.name(name);
    }
    Ok(Box::new(b.build()?))
}

#[derive(Deserialize)]
struct WindMoverParams {
    wind: WindSpec,
    #[serde(default)]
    window: ActiveWindow,
    uncertainty: Option<UncertaintyParams>,
    name: Option<String>,
}

fn wind_mover(desc: &Value) -> Result<Box<dyn Mover>, ConfigError> {
    let p: WindMoverParams = params("mover", desc)?;
    let field: VectorField = Arc::new(p.wind.build()?);
    let mut m = WindMover::new(field).with_window(p.window);
    if let Some(u) = p.uncertainty {
        m = m.with_uncertainty(u)?;
    }
    if let Some(name) = p.name {
        m = m.with_name(name);
    }
    Ok(Box::new(m))
}

#[derive(Deserialize)]
struct RandomMoverParams {
    #[serde(default = "default_diffusion")]
    diffusion_coef: f64,
    #[serde(default = "default_uncertain_factor")]
    uncertain_factor: f64,
    #[serde(default)]
    window: ActiveWindow,
}

fn default_diffusion() -> f64 {
    RandomMover::DEFAULT_DIFFUSION_COEF
}

fn default_uncertain_factor() -> f64 {
    RandomMover::DEFAULT_UNCERTAIN_FACTOR
}

fn random_mover(desc: &Value) -> Result<Box<dyn Mover>, ConfigError> {
    let p: RandomMoverParams = params("mover", desc)?;
    let m = RandomMover::new(p.diffusion_coef)?
        .with_uncertain_factor(p.uncertain_factor)?
        .with_window(p.window);
    Ok(Box::new(m))
}

#[derive(Deserialize)]
struct WindowOnly {
    #[serde(default)]
    window: ActiveWindow,
}

fn rise_velocity_mover(desc: &Value) -> Result<Box<dyn Mover>, ConfigError> {
    let p: WindowOnly = params("mover", desc)?;
    Ok(Box::new(RiseVelocityMover::new().with_window(p.window)))
}

// ── Weatherers ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SkimmerParams {
    amount: f64,
    units: String,
    efficiency: f64,
    active_start: NaiveDateTime,
    active_stop: NaiveDateTime,
    water: Option<WaterParams>,
    name: Option<String>,
}

fn skimmer(desc: &Value) -> Result<Box<dyn Weatherer>, ConfigError> {
    let p: SkimmerParams = params("weatherer", desc)?;
    let mut s = Skimmer::new(p.amount, &p.units, p.efficiency, p.active_start, p.active_stop)?;
    if let Some(w) = p.water {
        s = s.with_water(Water::new(w));
    }
    if let Some(name) = p.name {
        s = s.with_name(name);
    }
    Ok(Box::new(s))
}

#[derive(Deserialize)]
struct BurnParams {
    area: f64,
    #[serde(default = "square_meters")]
    area_units: String,
    thickness: f64,
    #[serde(default = "meters")]
    thickness_units: String,
    active_start: NaiveDateTime,
    efficiency: Option<f64>,
    wind: Option<WindSpec>,
    water: Option<WaterParams>,
    name: Option<String>,
}

fn square_meters() -> String {
    "m^2".to_string()
}

fn meters() -> String {
    "m".to_string()
}

fn burn(desc: &Value) -> Result<Box<dyn Weatherer>, ConfigError> {
    let p: BurnParams = params("weatherer", desc)?;
    let mut b = Burn::new(
        p.area,
        &p.area_units,
        p.thickness,
        &p.thickness_units,
        p.active_start,
        p.efficiency.unwrap_or(1.0),
    )?;
    match (p.efficiency, p.wind) {
        (_, Some(wind)) => b = b.with_wind_efficiency(wind.build()?),
        (None, None) => b = b.with_computed_efficiency(),
        (Some(_), None) => {}
    }
    if let Some(w) = p.water {
        b = b.with_water(Water::new(w));
    }
    if let Some(name) = p.name {
        b = b.with_name(name);
    }
    Ok(Box::new(b))
}

#[derive(Deserialize)]
struct WavesSpec {
    wind: WindSpec,
    #[serde(default)]
    water: WaterParams,
}

#[derive(Deserialize)]
struct ChemicalDispersionParams {
    fraction_sprayed: f64,
    active_start: NaiveDateTime,
    active_stop: NaiveDateTime,
    efficiency: Option<f64>,
    waves: Option<WavesSpec>,
    name: Option<String>,
}

fn chemical_dispersion(desc: &Value) -> Result<Box<dyn Weatherer>, ConfigError> {
    let p: ChemicalDispersionParams = params("weatherer", desc)?;
    let mut c = ChemicalDispersion::new(
        p.fraction_sprayed,
        p.active_start,
        p.active_stop,
        p.efficiency.unwrap_or(1.0),
    )?;
    if let Some(w) = p.waves {
        c = c.with_waves(Waves::new(w.wind.build()?, Water::new(w.water)));
    }
    if let Some(name) = p.name {
        c = c.with_name(name);
    }
    Ok(Box::new(c))
}

#[derive(Deserialize)]
struct BiodegradationParams {
    #[serde(default)]
    water: WaterParams,
    #[serde(default)]
    window: ActiveWindow,
}

fn biodegradation(desc: &Value) -> Result<Box<dyn Weatherer>, ConfigError> {
    let p: BiodegradationParams = params("weatherer", desc)?;
    Ok(Box::new(
        Biodegradation::new(Water::new(p.water)).with_window(p.window),
    ))
}

// ── Spills ─────────────────────────────────────────────────────────

/// Element initializer as written in a description.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InitializerSpec {
    Windages(InitWindages),
    RiseVelFromDist {
        distribution: Distribution,
    },
    RiseVelFromDropletSize {
        distribution: Distribution,
        #[serde(default)]
        water: WaterParams,
    },
    MassFromPlume,
}

impl From<InitializerSpec> for Initializer {
    fn from(spec: InitializerSpec) -> Self {
        match spec {
            InitializerSpec::Windages(w) => Initializer::Windages(w),
            InitializerSpec::RiseVelFromDist { distribution } => {
                Initializer::RiseVelFromDist(distribution)
            }
            InitializerSpec::RiseVelFromDropletSize {
                distribution,
                water,
            } => Initializer::RiseVelFromDropletSize {
                distribution,
                water: Water::new(water),
            },
            InitializerSpec::MassFromPlume => Initializer::MassFromPlume,
        }
    }
}

/// Keys every spill description accepts besides its release.
#[derive(Deserialize)]
struct SpillCommon {
    name: Option<String>,
    #[serde(default)]
    amount: f64,
    #[serde(default = "kilograms")]
    units: String,
    water: Option<WaterParams>,
    #[serde(default)]
    initializers: Vec<InitializerSpec>,
    #[serde(default = "yes")]
    on: bool,
}

fn kilograms() -> String {
    "kg".to_string()
}

impl SpillCommon {
    fn build(self, release: Release, substance: &Arc<dyn Substance>) -> Result<Spill, ConfigError> {
        let mut b = Spill::builder(release, Arc::clone(substance))
            .amount(self.amount, self.units)
            .on(self.on);
        if let Some(name) = self.name {
            b = b.name(name);
        }
        if let Some(w) = self.water {
            b = b.water(Water::new(w));
        }
        for init in self.initializers {
            b = b.initializer(init.into());
        }
        b.build()
    }
}

#[derive(Deserialize)]
struct PointLineParams {
    release_time: NaiveDateTime,
    start_position: WorldPoint,
    end_position: Option<WorldPoint>,
    end_release_time: Option<NaiveDateTime>,
    num_elements: Option<usize>,
    num_per_timestep: Option<usize>,
}

impl PointLineParams {
    fn build(self) -> Result<PointLineRelease, ConfigError> {
        let mut b = PointLineRelease::builder(self.release_time, self.start_position);
        if let Some(end) = self.end_position {
            b = b.end_position(end);
        }
        if let Some(end) = self.end_release_time {
            b = b.end_release_time(end);
        }
        if let Some(n) = self.num_elements {
            b = b.num_elements(n);
        }
        if let Some(n) = self.num_per_timestep {
            b = b.num_per_timestep(n);
        }
        Ok(b.build()?)
    }
}

#[derive(Deserialize)]
struct PointLineSpill {
    #[serde(flatten)]
    release: PointLineParams,
    #[serde(flatten)]
    common: SpillCommon,
}

fn point_line_spill(desc: &Value, substance: &Arc<dyn Substance>) -> Result<Spill, ConfigError> {
    let p: PointLineSpill = params("spill", desc)?;
    p.common.build(p.release.build()?.into(), substance)
}

#[derive(Deserialize)]
struct SpatialSpill {
    release_time: NaiveDateTime,
    positions: Vec<WorldPoint>,
    #[serde(flatten)]
    common: SpillCommon,
}

fn spatial_spill(desc: &Value, substance: &Arc<dyn Substance>) -> Result<Spill, ConfigError> {
    let p: SpatialSpill = params("spill", desc)?;
    let release = SpatialRelease::new(p.release_time, p.positions)?;
    p.common.build(release.into(), substance)
}

#[derive(Deserialize)]
struct ContinuousSpill {
    initial_elements: usize,
    #[serde(flatten)]
    release: PointLineParams,
    #[serde(flatten)]
    common: SpillCommon,
}

fn continuous_spill(desc: &Value, substance: &Arc<dyn Substance>) -> Result<Spill, ConfigError> {
    let p: ContinuousSpill = params("spill", desc)?;
    let release = ContinuousRelease::new(p.release.build()?, p.initial_elements);
    p.common.build(release.into(), substance)
}

#[derive(Deserialize)]
struct PlumeSpill {
    release_time: NaiveDateTime,
    end_release_time: NaiveDateTime,
    top: WorldPoint,
    depths: Vec<f64>,
    mass_fluxes: Vec<f64>,
    num_elements: Option<usize>,
    #[serde(flatten)]
    common: SpillCommon,
}

fn plume_spill(desc: &Value, substance: &Arc<dyn Substance>) -> Result<Spill, ConfigError> {
    let p: PlumeSpill = params("spill", desc)?;
    let source = PlumeSource::vertical_column(p.top, &p.depths, p.mass_fluxes);
    let release =
        VerticalPlumeRelease::new(p.release_time, p.end_release_time, source, p.num_elements)?;
    p.common.build(release.into(), substance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario() -> Value {
        json!({
            "config": {
                "start_time": "2015-05-14T00:00:00",
                "duration_secs": 3600.0,
                "time_step_secs": 900.0,
                "uncertain": true,
                "seed": 7
            },
            "substance": {
                "name": "crude",
                "density": 870.0,
                "components": [
                    { "fraction": 0.6, "kind": "saturate", "boiling_point": 480.0 },
                    { "fraction": 0.4, "kind": "aromatic", "boiling_point": 650.0 }
                ]
            },
            "spills": [{
                "type": "PointLineRelease",
                "release_time": "2015-05-14T00:00:00",
                "start_position": [-128.0, 28.0, 0.0],
                "num_elements": 50,
                "amount": 500.0,
                "initializers": [{ "type": "windages" }]
            }],
            "movers": [
                { "type": "WindMover", "wind": { "kind": "constant", "speed": 5.0, "direction": 270.0 } },
                { "type": "RandomMover" },
                { "type": "CurrentMover", "current": { "kind": "uniform", "velocity": [0.2, 0.0] } }
            ],
            "weatherers": [{
                "type": "Skimmer",
                "amount": 100.0,
                "units": "kg",
                "efficiency": 0.5,
                "active_start": "2015-05-14T00:15:00",
                "active_stop": "2015-05-14T00:45:00"
            }]
        })
    }

    #[test]
    fn defaults_cover_every_builtin() {
        let r = Registry::with_defaults();
        assert_eq!(
            r.mover_types().collect::<Vec<_>>(),
            ["CurrentMover", "WindMover", "RandomMover", "RiseVelocityMover"]
        );
        assert_eq!(r.weatherer_types().count(), 4);
        assert_eq!(r.spill_types().count(), 4);
    }

    #[test]
    fn builds_and_runs_a_scenario() {
        let mut model = Registry::with_defaults().build_model(&scenario()).unwrap();
        assert!(model.config().uncertain);
        assert_eq!(model.spills().len(), 1);
        model.full_run().unwrap();
        let certain = model.containers().certain();
        assert_eq!(certain.sc.num_released(), 50);
        assert!(certain.ledger.get("skimmed").unwrap() > 0.0);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = Registry::with_defaults()
            .build_model_from_str("{ \"config\": ")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn unknown_type_is_named() {
        let err = Registry::with_defaults()
            .mover(&json!({ "type": "TideMover" }))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::UnknownType { kind: "mover", ref type_name } if type_name == "TideMover"
        ));
    }

    #[test]
    fn missing_type_key_is_rejected() {
        let err = Registry::with_defaults()
            .weatherer(&json!({ "amount": 1.0 }))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Registry { kind: "weatherer", .. }));
    }

    #[test]
    fn bad_parameters_surface_component_errors() {
        let r = Registry::with_defaults();
        let err = r
            .mover(&json!({ "type": "RandomMover", "diffusion_coef": -1.0 }))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Mover(_)));

        let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::builder("oil").build().unwrap());
        let err = r
            .spill(
                &json!({
                    "type": "PointLineRelease",
                    "release_time": "2015-05-14T00:00:00",
                    "start_position": [0.0, 0.0, 0.0],
                    "num_elements": 10,
                    "num_per_timestep": 2
                }),
                &oil,
            )
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Release(_)));
    }

    #[test]
    fn registered_types_can_be_replaced() {
        fn still(_: &Value) -> Result<Box<dyn Mover>, ConfigError> {
            Ok(Box::new(RiseVelocityMover::new()))
        }
        let mut r = Registry::with_defaults();
        assert!(r.register_mover("WindMover", still).is_some());
        assert!(r.register_mover("StillMover", still).is_none());
        let m = r.mover(&json!({ "type": "WindMover" })).unwrap();
        assert_eq!(m.name(), "rise_velocity");
    }
}
