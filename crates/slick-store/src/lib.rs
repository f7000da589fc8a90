//! Columnar particle storage for the slick engine.
//!
//! A [`ParticleStore`] holds one row per Lagrangian element across a set
//! of parallel columns. Core columns (position, status, fate, mass,
//! components, bookkeeping) always exist; optional columns are declared
//! through [`ArrayDef`] by the releases, movers and weatherers that need
//! them.
//!
//! Weatherers never touch the store directly. They go through a
//! [`SpillContainer`], which hands out gathered [`FateView`]s and writes
//! them back atomically.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod container;
pub mod store;
pub mod view;

pub use array::{names, ArrayDef};
pub use container::{SpillContainer, SubstanceData};
pub use store::{ParticleStore, Selection, Selector};
pub use view::FateView;
