//! [`ReleaseRate`]: how a release's element count is specified.

use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;

/// Default element count when neither a total nor a per-step rate is given.
pub const DEFAULT_NUM_ELEMENTS: usize = 1000;

/// Either a fixed total spread over the release window, or a fixed
/// number every qualifying step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseRate {
    /// `num_elements` over the whole release.
    Total(usize),
    /// `num_per_timestep` on every step inside the window.
    PerStep(usize),
}

impl Default for ReleaseRate {
    fn default() -> Self {
        ReleaseRate::Total(DEFAULT_NUM_ELEMENTS)
    }
}

impl ReleaseRate {
    /// Resolve the pair of optional counts accepted by constructors.
    pub fn from_counts(
        num_elements: Option<usize>,
        num_per_timestep: Option<usize>,
    ) -> Result<Self, ReleaseError> {
        match (num_elements, num_per_timestep) {
            (Some(_), Some(_)) => Err(ReleaseError::BothCountsSet),
            (Some(n), None) => Ok(ReleaseRate::Total(n)),
            (None, Some(n)) => Ok(ReleaseRate::PerStep(n)),
            (None, None) => Ok(ReleaseRate::default()),
        }
    }

    /// The fixed total, if this is a `Total` rate.
    pub fn num_elements(self) -> Option<usize> {
        match self {
            ReleaseRate::Total(n) => Some(n),
            ReleaseRate::PerStep(_) => None,
        }
    }

    /// The per-step count, if this is a `PerStep` rate.
    pub fn num_per_timestep(self) -> Option<usize> {
        match self {
            ReleaseRate::Total(_) => None,
            ReleaseRate::PerStep(n) => Some(n),
        }
    }
}
