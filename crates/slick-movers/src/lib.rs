//! Movers for the slick engine.
//!
//! A [`Mover`] turns environmental forcing into a per-particle position
//! change over one timestep. The orchestrator sums the contributions of
//! every mover, so movers never see each other's output.
//!
//! - [`CurrentMover`]: advection by a gridded or uniform current.
//! - [`WindMover`]: windage drift of surface particles.
//! - [`RandomMover`]: horizontal diffusion.
//! - [`RiseVelocityMover`]: vertical buoyant rise.
//!
//! The uncertain population additionally passes through an
//! [`UncertaintyOverlay`] that perturbs each particle's velocity by
//! persistent along/cross factors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod current;
pub mod error;
pub mod mover;
pub mod num_method;
pub mod random;
pub mod rise_velocity;
pub mod uncertainty;
pub mod wind;

pub use current::CurrentMover;
pub use error::MoverError;
pub use mover::{Displacement, MoveContext, Mover, VectorField};
pub use num_method::NumMethod;
pub use random::RandomMover;
pub use rise_velocity::{rise_velocity_from_drop_size, RiseVelocityMover};
pub use uncertainty::{UncertaintyOverlay, UncertaintyParams};
pub use wind::WindMover;
