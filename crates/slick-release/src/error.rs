//! Errors raised while configuring or driving a release.

use chrono::NaiveDateTime;

/// Configuration and consistency errors for releases.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ReleaseError {
    /// Both `num_elements` and `num_per_timestep` were given.
    #[error("num_elements and num_per_timestep are mutually exclusive")]
    BothCountsSet,
    /// The release window ends before it starts.
    #[error("end_release_time {end_release_time} is before release_time {release_time}")]
    EndBeforeStart {
        /// Start of the window.
        release_time: NaiveDateTime,
        /// End of the window.
        end_release_time: NaiveDateTime,
    },
    /// A spatial release was given no positions.
    #[error("spatial release needs at least one position")]
    EmptyPositions,
    /// Plume source data is malformed.
    #[error("invalid plume: {reason}")]
    InvalidPlume {
        /// What is wrong with it.
        reason: String,
    },
    /// Windage initializer parameters are out of range.
    #[error("invalid windage: {reason}")]
    InvalidWindage {
        /// What is wrong with it.
        reason: String,
    },
    /// The caller asked to place a different number of particles than
    /// the release computed for the same interval.
    #[error("asked to place {requested} particles but the release computed {computed}")]
    CountMismatch {
        /// Count passed by the caller.
        requested: usize,
        /// Count the release computed.
        computed: usize,
    },
}
