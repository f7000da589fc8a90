//! Benchmark profiles and utilities for the slick oil-spill engine.
//!
//! Provides pre-built [`Model`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 1K-particle continuous spill with the full mover
//!   and cleanup pipeline, certain population only
//! - [`stress_profile`]: 100K particles with the uncertain twin enabled
//! - [`bench_crude`]: the three-component oil both profiles release

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use slick_core::{add_seconds, ComponentKind, SimpleSubstance, Substance};
use slick_engine::{ConfigError, InitWindages, Initializer, Model, ModelConfig, Spill};
use slick_env::{ConstantField, Water, WaterParams, Wind};
use slick_movers::{CurrentMover, RandomMover, VectorField, WindMover};
use slick_release::PointLineRelease;
use slick_weatherers::{Biodegradation, Skimmer};

/// Thirty days of 15 minute steps; long enough that a benchmark loop
/// rarely has to rewind.
const BENCH_DURATION: f64 = 30.0 * 86400.0;

/// Start time shared by every profile.
pub fn bench_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 5, 14)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// A three-component crude at 870 kg/m³.
pub fn bench_crude() -> Result<Arc<dyn Substance>, ConfigError> {
    let oil = SimpleSubstance::builder("bench crude")
        .density(870.0)
        .component(0.5, ComponentKind::Saturate, 480.0)
        .component(0.3, ComponentKind::Aromatic, 590.0)
        .component(0.2, ComponentKind::Resin, 800.0)
        .build()
        .map_err(|reason| ConfigError::Registry {
            kind: "substance",
            reason,
        })?;
    Ok(Arc::new(oil))
}

/// Build a reference benchmark profile: 1K particles released over the
/// first hour.
///
/// Pipeline: current(0.2, 0.1) → wind(8 m/s from 270°) → diffusion,
/// then skimming in the second hour and biodegradation throughout.
pub fn reference_profile(seed: u64) -> Result<Model, ConfigError> {
    profile(1_000, false, seed)
}

/// Build a stress benchmark profile: 100K particles, uncertain twin on.
///
/// Same pipeline as [`reference_profile`] at 100x the particle count and
/// twice the populations.
pub fn stress_profile(seed: u64) -> Result<Model, ConfigError> {
    profile(100_000, true, seed)
}

fn profile(num_elements: usize, uncertain: bool, seed: u64) -> Result<Model, ConfigError> {
    let t0 = bench_start();
    let release = PointLineRelease::builder(t0, [-128.0, 28.0, 0.0])
        .end_position([-128.05, 28.05, 0.0])
        .end_release_time(add_seconds(t0, 3600.0))
        .num_elements(num_elements)
        .build()?;
    let water = Water::new(WaterParams::default());
    let spill = Spill::builder(release, bench_crude()?)
        .amount(num_elements as f64 * 10.0, "kg")
        .water(water.clone())
        .initializer(Initializer::Windages(InitWindages::default()))
        .build()?;

    let current: VectorField = Arc::new(ConstantField::new("current", "m/s", [0.2, 0.1]));
    let wind: VectorField = Arc::new(Wind::constant(8.0, 270.0));
    let config = ModelConfig::new(t0)
        .with_duration(BENCH_DURATION)
        .with_uncertain(uncertain)
        .with_seed(seed);

    Model::builder(config)
        .spill(spill)
        .mover(CurrentMover::builder(current).build()?)
        .mover(WindMover::new(wind))
        .mover(RandomMover::default())
        .weatherer(Skimmer::new(
            num_elements as f64,
            "kg",
            0.5,
            add_seconds(t0, 3600.0),
            add_seconds(t0, 7200.0),
        )?)
        .weatherer(Biodegradation::new(water))
        .build()
}
