//! Error types shared across the workspace.
//!
//! Organized by subsystem: environment queries ([`EnvError`]) and the
//! particle store ([`StoreError`]). Higher layers wrap these in their
//! own enums.

use chrono::NaiveDateTime;

/// Errors from environment field queries and environment configuration.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EnvError {
    /// A time-varying field was queried outside its data range with
    /// extrapolation disabled.
    #[error("time {time} outside data range [{start}, {stop}] and extrapolation is off")]
    OutOfTimeRange {
        /// The query time.
        time: NaiveDateTime,
        /// First time with data.
        start: NaiveDateTime,
        /// Last time with data.
        stop: NaiveDateTime,
    },
    /// A time series was built with no samples.
    #[error("time series has no samples")]
    EmptyTimeSeries,
    /// Time samples are not strictly increasing.
    #[error("times must be strictly increasing (violated at index {index})")]
    UnsortedTimes {
        /// Index of the first sample that is not later than the one
        /// before it.
        index: usize,
    },
    /// A unit string is not valid for the quantity.
    #[error("'{unit}' is not a valid unit for {quantity}")]
    InvalidUnit {
        /// The rejected unit string.
        unit: String,
        /// The physical quantity being converted.
        quantity: &'static str,
    },
    /// An attribute name is not known to the environment object.
    #[error("unknown attribute '{name}'")]
    UnknownAttribute {
        /// The rejected attribute name.
        name: String,
    },
    /// A value needs an environment object that was not supplied.
    #[error("{needed_by} requires a {reference} reference")]
    MissingReference {
        /// What needed the value.
        needed_by: String,
        /// The missing collaborator, e.g. "wind".
        reference: &'static str,
    },
    /// Data arrays do not match the declared shape.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// Expected number of values.
        expected: usize,
        /// Number supplied.
        actual: usize,
    },
}

/// Errors from the particle store and its views.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A column was accessed that no active component declared.
    #[error("unknown array '{name}': no active component declares it")]
    UnknownArray {
        /// The requested column name.
        name: String,
    },
    /// A column was declared twice with incompatible layouts.
    #[error("array '{name}' already declared with {existing} components, not {requested}")]
    DuplicateArray {
        /// The column name.
        name: String,
        /// Components of the existing declaration.
        existing: usize,
        /// Components of the conflicting declaration.
        requested: usize,
    },
    /// Supplied data does not match the row count of the store or view.
    #[error("length mismatch for '{name}': expected {expected}, got {actual}")]
    LengthMismatch {
        /// The column or argument name.
        name: String,
        /// Expected length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// A substance's component count differs from the store's.
    #[error("substance has {actual} components but the store holds {expected}")]
    ComponentMismatch {
        /// Components per particle in the store.
        expected: usize,
        /// Components of the substance.
        actual: usize,
    },
    /// `sum(mass_components) != mass` beyond tolerance for some row.
    #[error("mass invariant violated at row {row}: mass {mass}, components sum {component_sum}")]
    MassInvariant {
        /// Row index of the first violation.
        row: usize,
        /// Value of the `mass` column.
        mass: f64,
        /// Sum of the row's components.
        component_sum: f64,
    },
    /// A view was written back into a store it was not taken from.
    #[error("stale view: taken at store length {view_len}, store now has {store_len} rows")]
    StaleView {
        /// Store length when the view was taken.
        view_len: usize,
        /// Current store length.
        store_len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_array_names_the_column() {
        let err = StoreError::UnknownArray {
            name: "windages".to_string(),
        };
        assert!(err.to_string().contains("windages"));
    }

    #[test]
    fn invalid_unit_names_unit_and_quantity() {
        let err = EnvError::InvalidUnit {
            unit: "furlong".to_string(),
            quantity: "length",
        };
        let msg = err.to_string();
        assert!(msg.contains("furlong"));
        assert!(msg.contains("length"));
    }
}
