//! Release policies for the slick engine.
//!
//! A [`Release`] answers two questions each step: how many particles
//! appear in `[t, t + dt)` ([`Release::num_elements_to_release`]) and
//! where they start ([`Release::set_newparticle_positions`]). The set of
//! release kinds is closed; each variant wraps a concrete policy from
//! [`kinds`].
//!
//! Counting follows a small state machine. The first query latches
//! whether the model started after the release time, in which case the
//! release never fires. Fixed-total continuous releases spread
//! `num_elements` over the release window and hand out one extra element
//! in the first interval.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod kinds;
pub mod rate;
pub mod release;

pub use error::ReleaseError;
pub use kinds::{
    grid_release, linspace, ContinuousRelease, PlumeSource, PointLineRelease,
    PointLineReleaseBuilder, SpatialRelease, VerticalPlumeRelease,
};
pub use rate::ReleaseRate;
pub use release::{Release, ReleaseClock};
