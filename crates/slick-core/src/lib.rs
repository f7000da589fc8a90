//! Core types and traits for the slick particle-fate engine.
//!
//! This is the leaf crate of the workspace. It defines the vocabulary
//! every other crate shares: particle identifiers, status codes and fate
//! flags, world positions and the flat-earth projection, the error types
//! raised by storage and environment queries, and the collaborator traits
//! ([`Substance`], [`EnvironmentField`]) the engine consumes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geo;
pub mod id;
pub mod status;
pub mod substance;
pub mod time;
pub mod traits;
pub mod window;

pub use error::{EnvError, StoreError};
pub use geo::{FlatEarth, WorldPoint};
pub use id::{ParticleId, SpillId, StepId, SubstanceId};
pub use status::{FateFlags, LeStatus};
pub use substance::{ComponentKind, SimpleSubstance, SimpleSubstanceBuilder, Substance};
pub use time::{add_seconds, seconds_between};
pub use traits::{EnvironmentField, Interpolate, TimeBounds};
pub use window::ActiveWindow;
