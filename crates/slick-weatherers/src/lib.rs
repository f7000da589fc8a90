//! Weathering and cleanup processes for the slick engine.
//!
//! A [`Weatherer`] removes mass from the particles it claims, scoped by
//! their [`FateFlags`](slick_core::FateFlags), and books every kilogram
//! it removes into the population's [`MassBalance`]. Unlike movers,
//! weatherers run in registration order and do not commute.
//!
//! Cleanup operations ([`Skimmer`], [`Burn`], [`ChemicalDispersion`])
//! share a marking step: on their first active step they claim surface
//! particles in release order until the target mass is covered.
//! [`Biodegradation`] acts on subsurface droplets.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod biodegradation;
pub mod burn;
pub mod chem_dispersion;
pub mod cleanup;
pub mod error;
pub mod mass_balance;
pub mod skimmer;
pub mod weatherer;

pub use biodegradation::Biodegradation;
pub use burn::Burn;
pub use chem_dispersion::ChemicalDispersion;
pub use cleanup::AmountUnit;
pub use error::WeathererError;
pub use mass_balance::MassBalance;
pub use skimmer::Skimmer;
pub use weatherer::{WeatherContext, Weatherer};
