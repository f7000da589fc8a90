//! Slick: a Lagrangian particle engine for oil-spill transport and fate.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! slick sub-crates. For most users, adding `slick` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use slick::prelude::*;
//!
//! let t0 = NaiveDate::from_ymd_opt(2015, 5, 14)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//! let oil: Arc<dyn Substance> = Arc::new(SimpleSubstance::non_weathering("tracer", 900.0));
//!
//! // 100 particles and one tonne released at once.
//! let release = PointLineRelease::builder(t0, [-128.0, 28.0, 0.0])
//!     .num_elements(100)
//!     .build()
//!     .unwrap();
//! let spill = Spill::builder(release, oil)
//!     .amount(1000.0, "kg")
//!     .build()
//!     .unwrap();
//!
//! let current: VectorField = Arc::new(slick::env::ConstantField::new("current", "m/s", [0.2, 0.0]));
//! let mut model = Model::builder(ModelConfig::new(t0).with_duration(3600.0))
//!     .spill(spill)
//!     .mover(CurrentMover::builder(current).build().unwrap())
//!     .mover(RandomMover::default())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(model.full_run().unwrap(), 4);
//! let certain = model.containers().certain();
//! assert_eq!(certain.sc.len(), 100);
//! assert!(certain.ledger.conservation_error(certain.sc.store().total_mass()).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `slick-core` | IDs, status and fate flags, substances, field traits, time helpers |
//! | [`store`] | `slick-store` | Columnar particle store, spill containers, fate views |
//! | [`env`] | `slick-env` | Constant, time-series and gridded fields; wind, water, waves |
//! | [`release`] | `slick-release` | Release geometries and the shared release clock |
//! | [`movers`] | `slick-movers` | Current, wind, diffusion and rise-velocity movers; uncertainty |
//! | [`weatherers`] | `slick-weatherers` | Skimming, burning, dispersants, biodegradation; mass balance |
//! | [`engine`] | `slick-engine` | Spills, the step loop, outputters and the JSON registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`slick-core`).
///
/// Contains the [`core::Substance`] and [`core::EnvironmentField`] traits,
/// particle status ([`core::LeStatus`]) and cleanup flags
/// ([`core::FateFlags`]).
pub use slick_core as core;

/// Columnar particle storage (`slick-store`).
///
/// [`store::SpillContainer`] holds one population; [`store::FateView`]
/// gives weatherers filtered, write-back access to its columns.
pub use slick_store as store;

/// Environment fields (`slick-env`).
///
/// [`env::Wind`], [`env::Water`] and [`env::Waves`] plus the generic
/// [`env::ConstantField`], [`env::TimeSeries`] and [`env::GridField`].
pub use slick_env as env;

/// Release geometries (`slick-release`).
///
/// Point and line, spatial, continuous and vertical plume releases, all
/// wrapped by [`release::Release`].
pub use slick_release as release;

/// Particle movers (`slick-movers`).
///
/// The [`movers::Mover`] trait is the extension point for user-defined
/// transport.
pub use slick_movers as movers;

/// Weathering and response operations (`slick-weatherers`).
///
/// The [`weatherers::Weatherer`] trait is the extension point for
/// user-defined mass removal; every removal is booked in a
/// [`weatherers::MassBalance`].
pub use slick_weatherers as weatherers;

/// Model orchestration (`slick-engine`).
///
/// [`engine::Model`] for stepping a run, [`engine::Registry`] for building
/// one from JSON.
pub use slick_engine as engine;

/// Common imports for typical slick usage.
///
/// ```rust
/// use slick::prelude::*;
/// ```
///
/// This imports the model and its builder, spills and releases, the
/// built-in movers and weatherers, and the traits needed to write new ones.
pub mod prelude {
    // Core types and traits
    pub use slick_core::{
        ActiveWindow, ComponentKind, EnvironmentField, FateFlags, LeStatus, SimpleSubstance,
        Substance, WorldPoint,
    };

    // Environment
    pub use slick_env::{Water, WaterParams, Waves, Wind};

    // Releases
    pub use slick_release::{
        ContinuousRelease, PlumeSource, PointLineRelease, Release, SpatialRelease,
        VerticalPlumeRelease,
    };

    // Movers
    pub use slick_movers::{
        CurrentMover, MoveContext, Mover, RandomMover, RiseVelocityMover, UncertaintyParams,
        VectorField, WindMover,
    };

    // Weatherers
    pub use slick_weatherers::{
        Biodegradation, Burn, ChemicalDispersion, MassBalance, Skimmer, WeatherContext, Weatherer,
    };

    // Errors
    pub use slick_core::{EnvError, StoreError};
    pub use slick_engine::{ConfigError, StepError};
    pub use slick_movers::MoverError;
    pub use slick_release::ReleaseError;
    pub use slick_weatherers::WeathererError;

    // Engine
    pub use slick_engine::{
        InitWindages, Initializer, Model, ModelConfig, Outputter, Registry, Spill, StepMetrics,
        StepOutput, TracingOutputter,
    };
}
