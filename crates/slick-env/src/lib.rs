//! Environment fields for the slick engine.
//!
//! Everything a mover or weatherer samples lives here: the [`TimeIndex`]
//! that brackets query times, spatially uniform [`TimeSeries`] and
//! [`ConstantField`]s, regular-grid [`GridField`]s, and the physical
//! environment objects [`Water`], [`Wind`] and [`Waves`]. All values are
//! held in SI units; [`units`] converts at the edges.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod field;
pub mod time_index;
pub mod units;
pub mod water;
pub mod waves;
pub mod wind;

pub use field::{ConstantField, GridField, GridSpec, GridVectorField, TimeSeries};
pub use time_index::{Bracket, TimeIndex};
pub use units::Quantity;
pub use water::{Water, WaterAttr, WaterParams, GRAVITY};
pub use waves::Waves;
pub use wind::Wind;
