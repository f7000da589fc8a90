//! Step orchestrator for slick oil-spill simulations.
//!
//! A [`Model`] drives spills, movers and weatherers through a fixed
//! per-step order for the certain population and, when enabled, an
//! uncertain twin that shares the release schedule but perturbs motion.
//! Models are built directly with [`Model::builder`] or from JSON
//! scenarios through a [`Registry`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod container;
pub mod initializers;
pub mod metrics;
pub mod model;
pub mod output;
pub mod registry;
pub mod spill;

pub use config::{ConfigError, ModelConfig};
pub use container::{Population, SpillContainerPair};
pub use initializers::{Distribution, InitWindages, Initializer};
pub use metrics::StepMetrics;
pub use model::{Model, ModelBuilder, StepError, OFF_MAPS};
pub use output::{OutputError, Outputter, StepOutput, TracingOutputter};
pub use registry::{MoverCtor, Registry, SpillCtor, WeathererCtor};
pub use spill::{Spill, SpillBuilder};
